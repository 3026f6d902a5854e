use agent_transport::{Message, MessageId, Persona, ProgressEvent, TransportEvent, TurnId};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classifier::classify;
use crate::history::{CommitOutcome, HistoryMap};
use crate::latch::FinalizeLatch;
use crate::reconcile::{evaluate, Signals};
use crate::timeline::{ActivityRecord, LiveTimeline};

/// Host-side operations the session needs to drive a remote turn.
pub trait TurnHost {
    /// Dispatches a turn. Completion is observed later through [`Session::apply`].
    fn submit_turn(
        &mut self,
        messages: Vec<Message>,
        persona: Persona,
        reasoning_model: String,
    ) -> Result<TurnId, String>;

    /// Best-effort abort of an in-flight turn.
    fn abort_turn(&mut self, turn_id: TurnId);
}

/// Client-side state of one chat session.
///
/// All mutation happens through `submit`, `cancel`, `reset` and `apply`, each of
/// which re-runs reconciliation before returning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    messages: Vec<Message>,
    working: bool,
    current_turn: Option<TurnId>,
    live: LiveTimeline,
    latch: FinalizeLatch,
    history: HistoryMap,
    last_error: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_working(&self) -> bool {
        self.working
    }

    /// Turn whose transport events are currently accepted.
    pub fn current_turn(&self) -> Option<TurnId> {
        self.current_turn
    }

    pub fn live_timeline(&self) -> &LiveTimeline {
        &self.live
    }

    pub fn history(&self) -> &HistoryMap {
        &self.history
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// True while a finishing event waits to be committed.
    pub fn finalize_pending(&self) -> bool {
        self.latch.is_raised()
    }

    /// Archived activity for a message, if its turn was committed.
    pub fn activity_for(&self, message: &Message) -> Option<&[ActivityRecord]> {
        message
            .id
            .as_ref()
            .and_then(|message_id| self.history.get(message_id))
    }

    /// Starts a new turn. Blank input is ignored and returns `None`.
    ///
    /// Callers gate on [`Session::is_working`]; overlapping submits are logged but
    /// otherwise passed through to the host.
    pub fn submit(
        &mut self,
        host: &mut dyn TurnHost,
        text: &str,
        persona: Persona,
        reasoning_model: &str,
    ) -> Option<TurnId> {
        let prompt = text.trim();
        if prompt.is_empty() {
            return None;
        }

        if self.working {
            warn!(
                turn_id = ?self.current_turn,
                "submit while the previous turn is still working"
            );
        }

        self.live.reset();
        self.latch.clear();

        let message = Message::human(MessageId::new(Uuid::new_v4().to_string()), prompt);
        self.messages.push(message.clone());

        let dispatched = match host.submit_turn(vec![message], persona, reasoning_model.to_string())
        {
            Ok(turn_id) => {
                info!(turn_id, %persona, reasoning_model, "turn dispatched");
                self.current_turn = Some(turn_id);
                self.working = true;
                Some(turn_id)
            }
            Err(error) => {
                warn!(%error, "turn dispatch failed");
                self.working = false;
                self.last_error = Some(error);
                None
            }
        };

        self.reconcile();
        dispatched
    }

    /// Aborts the in-flight turn, if any, and resets the whole session.
    pub fn cancel(&mut self, host: &mut dyn TurnHost) {
        if let Some(turn_id) = self.current_turn.filter(|_| self.working) {
            info!(turn_id, "cancelling turn");
            host.abort_turn(turn_id);
        }

        self.reset();
    }

    /// Discards messages, activity, history and any error.
    pub fn reset(&mut self) {
        debug!(
            messages = self.messages.len(),
            history = self.history.len(),
            "session reset"
        );
        *self = Self::default();
    }

    /// Applies one transport event and reconciles.
    ///
    /// Events for any turn other than the current one are dropped. Returns the id of
    /// the message whose activity was committed to history by this event, if any.
    pub fn apply(&mut self, event: TransportEvent) -> Option<MessageId> {
        let turn_id = event.turn_id();
        if self.current_turn != Some(turn_id) {
            debug!(turn_id, current = ?self.current_turn, "dropping stale transport event");
            return None;
        }

        match event {
            TransportEvent::Started { .. } => self.working = true,
            TransportEvent::Progress { event, .. } => self.on_progress(turn_id, &event),
            TransportEvent::Message { message, .. } => self.messages.push(message),
            TransportEvent::Finished { .. } => {
                info!(turn_id, "turn finished");
                self.working = false;
            }
            TransportEvent::Failed { error, .. } => {
                warn!(turn_id, %error, "turn failed");
                self.working = false;
                self.last_error = Some(error);
            }
            TransportEvent::Cancelled { .. } => {
                info!(turn_id, "turn cancelled by transport");
                self.working = false;
            }
        }

        self.reconcile()
    }

    fn on_progress(&mut self, turn_id: TurnId, event: &ProgressEvent) {
        let classification = classify(event);
        if classification.finishing {
            self.latch.raise();
        }

        match classification.record {
            Some(record) => {
                debug!(turn_id, title = %record.title, "activity recorded");
                self.live.append(record);
            }
            None => {
                let nodes: Vec<_> = event.nodes().collect();
                debug!(turn_id, ?nodes, "ignoring unrecognized progress event");
            }
        }
    }

    /// Commits the live timeline when latch, working flag and message list agree.
    ///
    /// Returns the committed message id. Safe to call at any time.
    pub fn reconcile(&mut self) -> Option<MessageId> {
        let outcome = evaluate(Signals {
            latch: self.latch,
            working: self.working,
            last_message: self.messages.last(),
            timeline: &self.live,
        });
        self.latch = outcome.latch;

        let commit = outcome.commit?;
        let records = commit.snapshot.len();
        match self.history.commit(commit.message_id.clone(), commit.snapshot) {
            CommitOutcome::Recorded => {
                debug!(message_id = %commit.message_id, records, "activity committed to history");
                Some(commit.message_id)
            }
            CommitOutcome::AlreadyRecorded => {
                warn!(message_id = %commit.message_id, "history entry already exists; keeping it");
                None
            }
        }
    }
}
