#![allow(dead_code)]

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use agent_timeline::{Persona, Session};
use agent_transport::{
    AgentTransport, CancelSignal, ProgressEvent, TransportEvent, TransportProfile, TurnId,
    TurnRequest, DEFAULT_REASONING_MODEL, RAG_NODE,
};
use serde_json::json;
use timeline_client::runtime::RuntimeController;

pub const WAIT: Duration = Duration::from_secs(2);

fn test_transport_profile() -> TransportProfile {
    TransportProfile {
        transport_id: "test".to_string(),
        assistant_id: "agent".to_string(),
    }
}

/// Emits one retrieval step and then blocks until cancelled.
#[derive(Default)]
pub struct BlockingCancelTransport;

impl AgentTransport for BlockingCancelTransport {
    fn profile(&self) -> TransportProfile {
        test_transport_profile()
    }

    fn stream_turn(
        &self,
        req: TurnRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(TransportEvent),
    ) -> Result<(), String> {
        let turn_id = req.turn_id;

        emit(TransportEvent::Started { turn_id });
        emit(TransportEvent::Progress {
            turn_id,
            event: ProgressEvent::node_update(RAG_NODE, json!({ "tool": RAG_NODE })),
        });

        while !cancel.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(5));
        }

        emit(TransportEvent::Cancelled { turn_id });
        Ok(())
    }
}

#[derive(Default)]
pub struct PanickingTransport;

impl AgentTransport for PanickingTransport {
    fn profile(&self) -> TransportProfile {
        test_transport_profile()
    }

    fn stream_turn(
        &self,
        req: TurnRequest,
        _cancel: CancelSignal,
        emit: &mut dyn FnMut(TransportEvent),
    ) -> Result<(), String> {
        emit(TransportEvent::Started {
            turn_id: req.turn_id,
        });
        panic!("transport exploded");
    }
}

/// Returns without ever emitting a terminal event.
#[derive(Default)]
pub struct SilentTransport;

impl AgentTransport for SilentTransport {
    fn profile(&self) -> TransportProfile {
        test_transport_profile()
    }

    fn stream_turn(
        &self,
        req: TurnRequest,
        _cancel: CancelSignal,
        emit: &mut dyn FnMut(TransportEvent),
    ) -> Result<(), String> {
        emit(TransportEvent::Started {
            turn_id: req.turn_id,
        });
        Ok(())
    }
}

/// Fails before emitting anything.
#[derive(Default)]
pub struct RefusingTransport;

impl AgentTransport for RefusingTransport {
    fn profile(&self) -> TransportProfile {
        test_transport_profile()
    }

    fn stream_turn(
        &self,
        _req: TurnRequest,
        _cancel: CancelSignal,
        _emit: &mut dyn FnMut(TransportEvent),
    ) -> Result<(), String> {
        Err("connection refused".to_string())
    }
}

pub fn runtime_with(transport: impl AgentTransport + 'static) -> Arc<RuntimeController> {
    RuntimeController::new(Arc::new(Mutex::new(Session::new())), Arc::new(transport))
}

pub fn submit(host: &Arc<RuntimeController>, text: &str) -> Option<TurnId> {
    let mut turn_host = host.host();
    lock_unpoisoned(host.session()).submit(
        &mut turn_host,
        text,
        Persona::default(),
        DEFAULT_REASONING_MODEL,
    )
}

/// Flushes queued events until `predicate` holds for the session.
pub fn flush_until(host: &Arc<RuntimeController>, predicate: impl Fn(&Session) -> bool) -> bool {
    wait_until(
        WAIT,
        || {
            host.flush_pending_events();
        },
        || predicate(&lock_unpoisoned(host.session())),
    )
}

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub fn wait_until(
    timeout: Duration,
    mut tick: impl FnMut(),
    mut predicate: impl FnMut() -> bool,
) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        tick();
        if predicate() {
            return true;
        }

        thread::sleep(Duration::from_millis(10));
    }

    false
}
