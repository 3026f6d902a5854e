//! Deterministic in-process implementation of the `agent_transport` contract.
//!
//! The default script emulates the remote agent graph: the question is routed to
//! either the analytic or the RAG branch, then the format node composes the answer.
//! Nothing here touches the network.

use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use agent_transport::{
    AgentTool, AgentTransport, CancelSignal, Message, MessageId, ProgressEvent, Role,
    TransportEvent, TransportProfile, TurnRequest, ANALYTIC_NODE, FORMAT_NODE, RAG_NODE,
};
use serde_json::json;
use tracing::debug;

/// Stable transport identifier used for explicit startup selection.
pub const MOCK_TRANSPORT_ID: &str = "mock";
/// Graph id the mock pretends to serve.
pub const MOCK_ASSISTANT_ID: &str = "agent";

const ANALYTIC_KEYWORDS: [&str; 9] = [
    "how many",
    "number of",
    "count",
    "sum",
    "total",
    "average",
    "avg",
    "max",
    "min",
];

/// One step replayed by a scripted mock turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Progress(ProgressEvent),
    Reply {
        id: Option<MessageId>,
        content: String,
        tool: Option<AgentTool>,
    },
    Fail(String),
}

/// Deterministic mock transport used by `timeline_client` tests and local runs.
#[derive(Debug, Clone)]
pub struct MockTransport {
    script: Option<Vec<ScriptStep>>,
    step_delay: Duration,
}

impl MockTransport {
    const STEP_DELAY_MS: u64 = 150;

    /// Creates a transport that routes every question through the emulated graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: None,
            step_delay: Duration::from_millis(Self::STEP_DELAY_MS),
        }
    }

    /// Creates a transport that replays `steps` for every turn regardless of the question.
    #[must_use]
    pub fn scripted(steps: Vec<ScriptStep>) -> Self {
        Self {
            script: Some(steps),
            step_delay: Duration::from_millis(Self::STEP_DELAY_MS),
        }
    }

    #[must_use]
    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = step_delay;
        self
    }

    fn steps_for(&self, req: &TurnRequest) -> Result<Vec<ScriptStep>, String> {
        if let Some(script) = &self.script {
            return Ok(script.clone());
        }

        let question = req
            .messages
            .iter()
            .find(|message| message.role == Role::Human)
            .map(|message| message.content.as_str())
            .ok_or_else(|| "Turn request carries no human message".to_string())?;

        Ok(graph_steps(question, req))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Picks the graph branch for a question the way the remote router does: aggregation
/// questions go to the analytic branch, everything else to retrieval.
#[must_use]
pub fn route_question(question: &str) -> AgentTool {
    let lowered = question.to_lowercase();
    if ANALYTIC_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
    {
        AgentTool::Analytic
    } else {
        AgentTool::Rag
    }
}

fn graph_steps(question: &str, req: &TurnRequest) -> Vec<ScriptStep> {
    let turn_id = req.turn_id;
    let tool = route_question(question);
    debug!(turn_id, ?tool, "mock router picked branch");

    let (node, content) = match tool {
        AgentTool::Analytic => (
            ANALYTIC_NODE,
            json!({
                "query": question,
                "columns": ["metric", "value"],
                "data": [["rows_matched", "0"]],
            })
            .to_string(),
        ),
        AgentTool::Rag => (
            RAG_NODE,
            format!(
                "As {} ({}): no indexed document answers \"{question}\" yet.",
                req.persona, req.reasoning_model
            ),
        ),
    };
    let id = MessageId::new(format!("mock-{turn_id}-ai"));

    vec![
        ScriptStep::Progress(ProgressEvent::node_update(
            node,
            json!({ "tool": node }),
        )),
        ScriptStep::Progress(ProgressEvent::node_update(
            FORMAT_NODE,
            json!({ "messages": [{ "type": "ai", "id": id.as_str(), "tool": node }] }),
        )),
        ScriptStep::Reply {
            id: Some(id),
            content,
            tool: Some(tool),
        },
    ]
}

impl AgentTransport for MockTransport {
    fn profile(&self) -> TransportProfile {
        TransportProfile {
            transport_id: MOCK_TRANSPORT_ID.to_string(),
            assistant_id: MOCK_ASSISTANT_ID.to_string(),
        }
    }

    fn stream_turn(
        &self,
        req: TurnRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(TransportEvent),
    ) -> Result<(), String> {
        let turn_id = req.turn_id;
        let steps = self.steps_for(&req)?;

        emit(TransportEvent::Started { turn_id });

        for step in steps {
            if !self.step_delay.is_zero() {
                thread::sleep(self.step_delay);
            }

            if cancel.load(Ordering::SeqCst) {
                emit(TransportEvent::Cancelled { turn_id });
                return Ok(());
            }

            match step {
                ScriptStep::Progress(event) => emit(TransportEvent::Progress { turn_id, event }),
                ScriptStep::Reply { id, content, tool } => emit(TransportEvent::Message {
                    turn_id,
                    message: Message::agent(id, content, tool),
                }),
                ScriptStep::Fail(error) => {
                    emit(TransportEvent::Failed { turn_id, error });
                    return Ok(());
                }
            }
        }

        if cancel.load(Ordering::SeqCst) {
            emit(TransportEvent::Cancelled { turn_id });
        } else {
            emit(TransportEvent::Finished { turn_id });
        }

        Ok(())
    }
}
