//! Maps raw progress events onto activity records.

use agent_transport::{ProgressEvent, ANALYTIC_NODE, FORMAT_NODE, RAG_NODE};

use crate::timeline::ActivityRecord;

/// Recognized kinds of agent activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    Analytic,
    Rag,
    Formatting,
}

impl ActivityKind {
    /// Recognizes the first matching graph node, checked in routing order.
    #[must_use]
    pub fn from_event(event: &ProgressEvent) -> Option<Self> {
        if event.node(ANALYTIC_NODE).is_some() {
            Some(Self::Analytic)
        } else if event.node(RAG_NODE).is_some() {
            Some(Self::Rag)
        } else if event.node(FORMAT_NODE).is_some() {
            Some(Self::Formatting)
        } else {
            None
        }
    }

    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Analytic => "Analytic",
            Self::Rag => "RAG",
            Self::Formatting => "Formatting",
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Analytic => "The query is routed to the analytic agent node",
            Self::Rag => "The query is routed to the RAG agent node",
            Self::Formatting => "Composing and presenting the final answer.",
        }
    }

    /// True for the step that ends the turn.
    #[must_use]
    pub fn is_finishing(&self) -> bool {
        matches!(self, Self::Formatting)
    }

    #[must_use]
    pub fn record(&self) -> ActivityRecord {
        ActivityRecord::new(self.title(), self.description())
    }
}

/// Result of classifying one progress event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub record: Option<ActivityRecord>,
    pub finishing: bool,
}

/// Classifies one event. Unrecognized shapes classify as `(None, false)`.
#[must_use]
pub fn classify(event: &ProgressEvent) -> Classification {
    match ActivityKind::from_event(event) {
        Some(kind) => Classification {
            record: Some(kind.record()),
            finishing: kind.is_finishing(),
        },
        None => Classification::default(),
    }
}
