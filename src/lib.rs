//! Stream reconciliation engine for a multi-branch reasoning agent client.
//!
//! Invariant: a turn's activity reaches [`HistoryMap`] only through
//! [`Session::reconcile`], and only as an owned snapshot of the live timeline.
//!
//! # Public API Overview
//! - Drive turns with [`Session::submit`], [`Session::cancel`] and [`Session::reset`]
//!   against a host implementing [`TurnHost`].
//! - Feed transport notifications in arrival order through [`Session::apply`].
//! - Read [`Session::live_timeline`] while a turn is working and
//!   [`Session::history`] / [`Session::activity_for`] once it has been committed.
//! - [`classify`] and [`evaluate`] are exposed as pure functions for hosts that
//!   keep their own state.

pub mod config;
pub mod logging;

pub mod classifier;
pub mod error;
pub mod history;
pub mod latch;
pub mod reconcile;
pub mod session;
pub mod timeline;

pub use crate::classifier::{classify, ActivityKind, Classification};
pub use crate::config::ClientConfig;
pub use crate::error::{ConfigError, LoggingError};
pub use crate::history::{CommitOutcome, HistoryMap};
pub use crate::latch::FinalizeLatch;
pub use crate::reconcile::{evaluate, Commit, Reconciliation, Signals};
pub use crate::session::{Session, TurnHost};
pub use crate::timeline::{ActivityRecord, LiveTimeline};

/// Transport contract types used across the public API.
pub use agent_transport::{
    AgentTool, Message, MessageId, Persona, ProgressEvent, Role, TransportEvent, TurnId,
};
