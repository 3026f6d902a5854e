use std::time::Duration;

use agent_timeline::{ActivityKind, ActivityRecord, AgentTool, MessageId, Persona, TurnHost};
use agent_transport::{ProgressEvent, DEFAULT_REASONING_MODEL, FORMAT_NODE, RAG_NODE};
use agent_transport_mock::{MockTransport, ScriptStep};
use pretty_assertions::assert_eq;
use serde_json::json;
use timeline_client::runtime::ERROR_TURN_ALREADY_ACTIVE;

mod support;

use support::{
    flush_until, lock_unpoisoned, runtime_with, submit, BlockingCancelTransport,
    PanickingTransport, RefusingTransport, SilentTransport,
};

fn instant_mock() -> MockTransport {
    MockTransport::new().with_step_delay(Duration::ZERO)
}

#[test]
fn retrieval_turn_is_archived_under_the_agent_reply() {
    let host = runtime_with(instant_mock());

    let turn_id = submit(&host, "What does the refund policy say?").expect("turn dispatched");
    assert!(flush_until(&host, |session| !session.is_working()));

    let session = lock_unpoisoned(host.session());
    let expected = vec![ActivityKind::Rag.record(), ActivityKind::Formatting.record()];
    assert_eq!(session.live_timeline().records(), expected.as_slice());

    let reply = session.messages().last().expect("agent reply");
    assert!(reply.is_agent());
    assert_eq!(reply.id, Some(MessageId::new(format!("mock-{turn_id}-ai"))));
    assert_eq!(reply.tool, Some(AgentTool::Rag));
    assert_eq!(session.activity_for(reply), Some(expected.as_slice()));
    assert!(!session.finalize_pending());
    drop(session);

    assert!(!host.has_active_turn());
}

#[test]
fn aggregation_turn_routes_through_the_analytic_branch() {
    let host = runtime_with(instant_mock());

    submit(&host, "How many orders were placed in total?").expect("turn dispatched");
    assert!(flush_until(&host, |session| session.history().len() == 1));

    let session = lock_unpoisoned(host.session());
    let titles: Vec<&str> = session
        .live_timeline()
        .records()
        .iter()
        .map(|record| record.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Analytic", "Formatting"]);

    let reply = session.messages().last().expect("agent reply");
    assert_eq!(reply.tool, Some(AgentTool::Analytic));
    let payload: serde_json::Value =
        serde_json::from_str(&reply.content).expect("analytic replies are JSON");
    assert_eq!(payload["query"], "How many orders were placed in total?");
}

#[test]
fn consecutive_turns_keep_earlier_archives() {
    let host = runtime_with(instant_mock());

    let first = submit(&host, "Describe the onboarding guide").expect("first turn");
    assert!(flush_until(&host, |session| !session.is_working()));
    let second = submit(&host, "What is the average order value?").expect("second turn");
    assert!(second > first);
    assert!(flush_until(&host, |session| {
        !session.is_working() && session.history().len() == 2
    }));

    let session = lock_unpoisoned(host.session());
    let first_reply = MessageId::new(format!("mock-{first}-ai"));
    let archived = session.history().get(&first_reply).expect("first archive");
    assert_eq!(archived[0].title, "RAG");
    assert_eq!(session.live_timeline().records()[0].title, "Analytic");
}

#[test]
fn scripted_reply_after_repeated_format_commits_once() {
    let format = ProgressEvent::node_update(FORMAT_NODE, json!({ "messages": [] }));
    let host = runtime_with(
        MockTransport::scripted(vec![
            ScriptStep::Progress(ProgressEvent::node_update(RAG_NODE, json!(true))),
            ScriptStep::Progress(format.clone()),
            ScriptStep::Progress(format),
            ScriptStep::Reply {
                id: Some(MessageId::new("scripted-ai")),
                content: "42".to_string(),
                tool: Some(AgentTool::Rag),
            },
        ])
        .with_step_delay(Duration::ZERO),
    );

    submit(&host, "meaning of life?").expect("turn dispatched");
    assert!(flush_until(&host, |session| !session.is_working()));

    let session = lock_unpoisoned(host.session());
    assert_eq!(session.live_timeline().len(), 3);
    assert_eq!(
        session.history().get(&MessageId::new("scripted-ai")).map(<[ActivityRecord]>::len),
        Some(3)
    );
    assert_eq!(session.history().len(), 1);
}

#[test]
fn scripted_failure_surfaces_as_session_error() {
    let host = runtime_with(
        MockTransport::scripted(vec![
            ScriptStep::Progress(ProgressEvent::node_update(RAG_NODE, json!(true))),
            ScriptStep::Fail("graph unavailable".to_string()),
        ])
        .with_step_delay(Duration::ZERO),
    );

    submit(&host, "anything").expect("turn dispatched");
    assert!(flush_until(&host, |session| !session.is_working()));

    let session = lock_unpoisoned(host.session());
    assert_eq!(session.last_error(), Some("graph unavailable"));
    assert!(session.history().is_empty());
    assert_eq!(session.live_timeline().len(), 1);
}

#[test]
fn transport_panic_becomes_a_failed_turn() {
    let host = runtime_with(PanickingTransport);

    submit(&host, "boom").expect("turn dispatched");
    assert!(flush_until(&host, |session| !session.is_working()));

    assert_eq!(
        lock_unpoisoned(host.session()).last_error(),
        Some("Transport panicked")
    );
    assert!(!host.has_active_turn());
}

#[test]
fn transport_exit_without_terminal_event_becomes_a_failed_turn() {
    let host = runtime_with(SilentTransport);

    submit(&host, "hello?").expect("turn dispatched");
    assert!(flush_until(&host, |session| !session.is_working()));

    assert_eq!(
        lock_unpoisoned(host.session()).last_error(),
        Some("Transport exited without terminal event")
    );
}

#[test]
fn transport_error_is_reported_verbatim() {
    let host = runtime_with(RefusingTransport);

    submit(&host, "hello?").expect("turn dispatched");
    assert!(flush_until(&host, |session| !session.is_working()));

    assert_eq!(
        lock_unpoisoned(host.session()).last_error(),
        Some("connection refused")
    );
}

#[test]
fn runtime_refuses_a_second_concurrent_turn() {
    let host = runtime_with(BlockingCancelTransport);

    let turn_id = submit(&host, "first").expect("turn dispatched");
    assert!(host.has_active_turn());

    let mut turn_host = host.host();
    let refused = turn_host.submit_turn(
        Vec::new(),
        Persona::Marketing,
        DEFAULT_REASONING_MODEL.to_string(),
    );
    assert_eq!(refused, Err(ERROR_TURN_ALREADY_ACTIVE.to_string()));

    turn_host.abort_turn(turn_id);
    assert!(!host.has_active_turn());
}
