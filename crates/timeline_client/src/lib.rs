//! Line-oriented client for the agent timeline engine.
//!
//! ## Transport bootstrap
//!
//! The client resolves its transport from `AGENT_TIMELINE_TRANSPORT`:
//!
//! - `AGENT_TIMELINE_TRANSPORT=mock` (default) replays the agent graph locally
//!
//! Each turn is sent with the persona from `AGENT_TIMELINE_PERSONA`
//! (`product_owner` or `marketing`) and the model from
//! `AGENT_TIMELINE_REASONING_MODEL` (`gpt-4o-mini`, `gpt-4o`, `gpt-3.5-turbo`).
//! Log verbosity follows `RUST_LOG`, falling back to `AGENT_TIMELINE_LOG`.
//!
//! Threading contract: transports run on worker threads and only enqueue events.
//! The session is touched from the thread that calls
//! [`runtime::RuntimeController::flush_pending_events`], so reconciliation never
//! races with input handling.

pub mod commands;
pub mod console;
pub mod runtime;
pub mod transports;
