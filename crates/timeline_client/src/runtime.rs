use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use agent_timeline::{Message, Persona, Session, TurnHost};
use agent_transport::{AgentTransport, CancelSignal, TransportEvent, TurnId, TurnRequest};
use tracing::{debug, info, warn};

pub const ERROR_TURN_ALREADY_ACTIVE: &str = "Turn already active";

struct ActiveTurn {
    turn_id: TurnId,
    cancel: CancelSignal,
    join_handle: Option<JoinHandle<()>>,
}

/// Runs each turn's transport on a worker thread and feeds its events to the session.
///
/// Workers only enqueue events. They reach the [`Session`] when the owning thread
/// calls [`RuntimeController::flush_pending_events`], one event at a time and in
/// transport order.
pub struct RuntimeController {
    session: Arc<Mutex<Session>>,
    pending_events: Mutex<VecDeque<TransportEvent>>,
    next_turn_id: AtomicU64,
    active_turn: Mutex<Option<ActiveTurn>>,
    transport: Arc<dyn AgentTransport>,
}

impl RuntimeController {
    pub fn new(session: Arc<Mutex<Session>>, transport: Arc<dyn AgentTransport>) -> Arc<Self> {
        Arc::new(Self {
            session,
            pending_events: Mutex::new(VecDeque::new()),
            next_turn_id: AtomicU64::new(1),
            active_turn: Mutex::new(None),
            transport,
        })
    }

    pub fn session(&self) -> &Arc<Mutex<Session>> {
        &self.session
    }

    /// Host handle for [`Session::submit`] and [`Session::cancel`].
    pub fn host(self: &Arc<Self>) -> RuntimeHost {
        RuntimeHost(Arc::clone(self))
    }

    /// True while a worker for a non-aborted turn is still running.
    pub fn has_active_turn(&self) -> bool {
        self.lock_active_turn().is_some()
    }

    fn start_turn_internal(
        self: &Arc<Self>,
        messages: Vec<Message>,
        persona: Persona,
        reasoning_model: String,
    ) -> Result<TurnId, String> {
        let mut active_turn = self.lock_active_turn();
        if active_turn.is_some() {
            return Err(ERROR_TURN_ALREADY_ACTIVE.to_string());
        }

        let turn_id = self.next_turn_id.fetch_add(1, Ordering::SeqCst);
        let cancel = Arc::new(AtomicBool::new(false));
        let request = TurnRequest {
            turn_id,
            messages,
            persona,
            reasoning_model,
        };
        let join_handle = self.spawn_worker(request, Arc::clone(&cancel))?;

        *active_turn = Some(ActiveTurn {
            turn_id,
            cancel,
            join_handle: Some(join_handle),
        });

        Ok(turn_id)
    }

    fn spawn_worker(
        self: &Arc<Self>,
        request: TurnRequest,
        cancel: CancelSignal,
    ) -> Result<JoinHandle<()>, String> {
        let turn_id = request.turn_id;
        let controller = Arc::clone(self);
        thread::Builder::new()
            .name(format!("agent-timeline-turn-{turn_id}"))
            .spawn(move || controller.run_worker(request, cancel))
            .map_err(|error| format!("Failed to spawn turn worker: {error}"))
    }

    fn run_worker(self: Arc<Self>, request: TurnRequest, cancel: CancelSignal) {
        let turn_id = request.turn_id;
        debug!(turn_id, "turn worker started");

        let terminal_emitted = Arc::new(AtomicBool::new(false));
        let terminal_emitted_for_emit = Arc::clone(&terminal_emitted);
        let controller = Arc::clone(&self);
        let transport = Arc::clone(&self.transport);

        let mut emit = move |event: TransportEvent| {
            if event.is_terminal() {
                terminal_emitted_for_emit.store(true, Ordering::SeqCst);
            }

            controller.enqueue_event(event);
        };
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            transport.stream_turn(request, Arc::clone(&cancel), &mut emit)
        }));

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) if terminal_emitted.load(Ordering::SeqCst) => {
                warn!(turn_id, %error, "transport reported an error after its terminal event");
            }
            Ok(Err(error)) => emit(TransportEvent::Failed { turn_id, error }),
            Err(_) => emit(TransportEvent::Failed {
                turn_id,
                error: "Transport panicked".to_string(),
            }),
        }

        if !terminal_emitted.load(Ordering::SeqCst) && self.is_active_turn_id(turn_id) {
            emit(TransportEvent::Failed {
                turn_id,
                error: "Transport exited without terminal event".to_string(),
            });
        }

        debug!(turn_id, "turn worker exited");
    }

    fn enqueue_event(&self, event: TransportEvent) {
        lock_unpoisoned(&self.pending_events).push_back(event);
    }

    /// Applies every queued transport event to the session, in arrival order.
    ///
    /// Returns how many events were applied.
    pub fn flush_pending_events(&self) -> usize {
        let mut drained = 0usize;

        loop {
            let event = {
                let mut pending_events = lock_unpoisoned(&self.pending_events);
                pending_events.pop_front()
            };

            match event {
                Some(event) => {
                    self.apply_event(event);
                    drained += 1;
                }
                None => break,
            }
        }

        drained
    }

    fn apply_event(&self, event: TransportEvent) {
        let turn_id = event.turn_id();
        let terminal = event.is_terminal();

        if let Some(message_id) = lock_unpoisoned(&self.session).apply(event) {
            info!(turn_id, %message_id, "turn activity archived");
        }

        if terminal {
            self.clear_active_turn_if_matching(turn_id);
        }
    }

    fn clear_active_turn_if_matching(&self, turn_id: TurnId) {
        let mut active_turn = self.lock_active_turn();
        let matches = active_turn.as_ref().map(|active| active.turn_id) == Some(turn_id);
        if !matches {
            return;
        }

        let mut completed = match active_turn.take() {
            Some(completed) => completed,
            None => return,
        };

        if let Some(join_handle) = completed.join_handle.take() {
            let is_current_thread = join_handle.thread().id() == thread::current().id();
            if !is_current_thread && join_handle.is_finished() {
                let _ = join_handle.join();
            }
        }
    }

    fn is_active_turn_id(&self, turn_id: TurnId) -> bool {
        self.lock_active_turn().as_ref().map(|active| active.turn_id) == Some(turn_id)
    }

    /// Signals the worker to stop and detaches it, so a new turn can start at once.
    /// Whatever the worker still emits is stale and dropped by the session.
    fn abort_turn_internal(&self, turn_id: TurnId) {
        let mut active_turn = self.lock_active_turn();
        let matches = active_turn.as_ref().map(|active| active.turn_id) == Some(turn_id);
        if !matches {
            return;
        }

        if let Some(aborted) = active_turn.take() {
            aborted.cancel.store(true, Ordering::SeqCst);
            info!(turn_id, "turn aborted");
        }
    }

    fn lock_active_turn(&self) -> MutexGuard<'_, Option<ActiveTurn>> {
        lock_unpoisoned(&self.active_turn)
    }
}

/// [`TurnHost`] handle onto a shared [`RuntimeController`], handed to [`Session`] calls.
#[derive(Clone)]
pub struct RuntimeHost(Arc<RuntimeController>);

impl TurnHost for RuntimeHost {
    fn submit_turn(
        &mut self,
        messages: Vec<Message>,
        persona: Persona,
        reasoning_model: String,
    ) -> Result<TurnId, String> {
        self.0.start_turn_internal(messages, persona, reasoning_model)
    }

    fn abort_turn(&mut self, turn_id: TurnId) {
        self.0.abort_turn_internal(turn_id);
    }
}

pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
