//! Provider-neutral contract for streaming one turn against a remote agent graph.
//!
//! This crate defines the message, progress-event and lifecycle types shared by
//! transports and the reconciliation engine. It carries no network protocol and
//! no multi-turn orchestration.

use std::fmt;
use std::sync::{atomic::AtomicBool, Arc};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Identifier for one dispatched turn.
pub type TurnId = u64;

/// Shared cancellation flag for a turn.
pub type CancelSignal = Arc<AtomicBool>;

/// Graph node that routes a question to the analytic (SQL aggregation) branch.
pub const ANALYTIC_NODE: &str = "analytic";
/// Graph node that routes a question to the retrieval branch.
pub const RAG_NODE: &str = "rag";
/// Graph node that composes the final answer.
pub const FORMAT_NODE: &str = "format";

/// Reasoning models accepted by the remote agent.
pub const REASONING_MODELS: [&str; 3] = ["gpt-4o-mini", "gpt-4o", "gpt-3.5-turbo"];
pub const DEFAULT_REASONING_MODEL: &str = "gpt-3.5-turbo";

#[must_use]
pub fn is_supported_reasoning_model(model: &str) -> bool {
    REASONING_MODELS.contains(&model)
}

/// Error returned while selecting or constructing a transport before any turn starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportInitError {
    #[error("Unsupported transport '{requested}'. Available transports: {available}")]
    UnsupportedTransport { requested: String, available: String },
}

/// Stable identity of a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "human")]
    Human,
    #[serde(rename = "ai")]
    Agent,
}

/// Branch of the agent graph that produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentTool {
    Rag,
    Analytic,
}

impl AgentTool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rag => RAG_NODE,
            Self::Analytic => ANALYTIC_NODE,
        }
    }
}

/// One entry in the turn's message list.
///
/// Human messages always carry an id. Agent messages carry whatever the remote
/// side assigned, which may be nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    #[serde(rename = "type")]
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<AgentTool>,
}

impl Message {
    #[must_use]
    pub fn human(id: impl Into<MessageId>, content: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            role: Role::Human,
            content: content.into(),
            tool: None,
        }
    }

    #[must_use]
    pub fn agent(id: Option<MessageId>, content: impl Into<String>, tool: Option<AgentTool>) -> Self {
        Self {
            id,
            role: Role::Agent,
            content: content.into(),
            tool,
        }
    }

    #[must_use]
    pub fn is_agent(&self) -> bool {
        self.role == Role::Agent
    }
}

/// Voice the agent answers in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    #[default]
    ProductOwner,
    Marketing,
}

impl Persona {
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "product_owner" => Self::ProductOwner,
            "marketing" => Self::Marketing,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductOwner => "product_owner",
            Self::Marketing => "marketing",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw progress notification: a JSON object keyed by the graph node that emitted it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressEvent(Map<String, Value>);

impl ProgressEvent {
    /// Wraps an arbitrary JSON value. Non-object payloads carry no node updates.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    /// Builds an event carrying a single node update.
    #[must_use]
    pub fn node_update(node: impl Into<String>, update: Value) -> Self {
        let mut map = Map::new();
        map.insert(node.into(), update);
        Self(map)
    }

    /// Returns the update for `node` when it is present and truthy.
    ///
    /// `null`, `false`, `0` and `""` count as absent.
    #[must_use]
    pub fn node(&self, node: &str) -> Option<&Value> {
        self.0.get(node).filter(|value| is_truthy(value))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Input required to stream one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    pub turn_id: TurnId,
    pub messages: Vec<Message>,
    pub persona: Persona,
    pub reasoning_model: String,
}

/// Transport-emitted lifecycle event for a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Started { turn_id: TurnId },
    Progress { turn_id: TurnId, event: ProgressEvent },
    Message { turn_id: TurnId, message: Message },
    Finished { turn_id: TurnId },
    Failed { turn_id: TurnId, error: String },
    Cancelled { turn_id: TurnId },
}

impl TransportEvent {
    /// Returns the turn identifier associated with this event.
    #[must_use]
    pub fn turn_id(&self) -> TurnId {
        match self {
            Self::Started { turn_id }
            | Self::Progress { turn_id, .. }
            | Self::Message { turn_id, .. }
            | Self::Finished { turn_id }
            | Self::Failed { turn_id, .. }
            | Self::Cancelled { turn_id } => *turn_id,
        }
    }

    /// Returns true when this event ends the remote processing of the turn.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Finished { .. } | Self::Failed { .. } | Self::Cancelled { .. }
        )
    }
}

/// Immutable metadata describing a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportProfile {
    pub transport_id: String,
    pub assistant_id: String,
}

/// Transport interface for streaming one turn.
pub trait AgentTransport: Send + Sync + 'static {
    /// Returns transport identity metadata.
    fn profile(&self) -> TransportProfile;

    /// Streams a turn and emits lifecycle events in transport order.
    ///
    /// Implementations poll `cancel` between steps and emit `Cancelled` once it is set.
    fn stream_turn(
        &self,
        req: TurnRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(TransportEvent),
    ) -> Result<(), String>;
}
