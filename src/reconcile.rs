//! Decides when a finished turn's live activity becomes history.
//!
//! Three signals update independently: the finalize latch, the working flag and the
//! message list. [`evaluate`] looks at one immutable snapshot of all three and
//! returns the next latch state plus the commit to perform, if any. The session calls
//! it after every signal change; with the latch already clear it never commits, so
//! re-running it is harmless.

use agent_transport::{Message, MessageId};

use crate::latch::FinalizeLatch;
use crate::timeline::{ActivityRecord, LiveTimeline};

/// Point-in-time view of the inputs to a reconciliation.
#[derive(Debug, Clone, Copy)]
pub struct Signals<'a> {
    pub latch: FinalizeLatch,
    pub working: bool,
    pub last_message: Option<&'a Message>,
    pub timeline: &'a LiveTimeline,
}

/// History write requested by a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub message_id: MessageId,
    pub snapshot: Vec<ActivityRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub latch: FinalizeLatch,
    pub commit: Option<Commit>,
}

#[must_use]
pub fn evaluate(signals: Signals<'_>) -> Reconciliation {
    let unchanged = Reconciliation {
        latch: signals.latch,
        commit: None,
    };

    if !signals.latch.is_raised() || signals.working {
        return unchanged;
    }

    let Some(message_id) = signals
        .last_message
        .filter(|message| message.is_agent())
        .and_then(|message| message.id.clone())
    else {
        return unchanged;
    };

    Reconciliation {
        latch: FinalizeLatch::Clear,
        commit: Some(Commit {
            message_id,
            snapshot: signals.timeline.snapshot(),
        }),
    }
}
