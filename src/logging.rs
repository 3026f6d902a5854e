//! Tracing subscriber setup for binaries built on this crate.
//!
//! The library only emits `tracing` events; installing a subscriber is left to the
//! binary. Output goes to stderr so stdout stays free for the conversation.

use tracing_subscriber::EnvFilter;

use crate::error::LoggingError;

/// Builds the filter from `RUST_LOG`, falling back to `fallback` when it is unset or invalid.
pub fn env_filter(fallback: &str) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(fallback).map_err(|source| LoggingError::InvalidFilter {
            filter: fallback.to_string(),
            source,
        }),
    }
}

/// Installs the global fmt subscriber. Fails if one is already installed.
pub fn init(fallback: &str) -> Result<(), LoggingError> {
    let filter = env_filter(fallback)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|error| LoggingError::Install(error.to_string()))
}
