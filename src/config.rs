//! Environment configuration.

use std::env;

use agent_transport::{
    is_supported_reasoning_model, Persona, DEFAULT_REASONING_MODEL, REASONING_MODELS,
};

use crate::error::ConfigError;

pub const TRANSPORT_ENV_VAR: &str = "AGENT_TIMELINE_TRANSPORT";
pub const PERSONA_ENV_VAR: &str = "AGENT_TIMELINE_PERSONA";
pub const REASONING_MODEL_ENV_VAR: &str = "AGENT_TIMELINE_REASONING_MODEL";
pub const LOG_ENV_VAR: &str = "AGENT_TIMELINE_LOG";

pub const DEFAULT_TRANSPORT_ID: &str = "mock";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub transport_id: String,
    pub persona: Persona,
    pub reasoning_model: String,
    /// Used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            transport_id: DEFAULT_TRANSPORT_ID.to_string(),
            persona: Persona::default(),
            reasoning_model: DEFAULT_REASONING_MODEL.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ClientConfig {
    /// Reads configuration from the environment. Blank values fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let persona = match env_string_opt(PERSONA_ENV_VAR) {
            Some(value) => Persona::parse(&value).ok_or(ConfigError::UnknownPersona {
                var: PERSONA_ENV_VAR,
                value,
            })?,
            None => defaults.persona,
        };

        let reasoning_model = match env_string_opt(REASONING_MODEL_ENV_VAR) {
            Some(value) if is_supported_reasoning_model(&value) => value,
            Some(value) => {
                return Err(ConfigError::UnsupportedModel {
                    var: REASONING_MODEL_ENV_VAR,
                    value,
                    expected: REASONING_MODELS.join(", "),
                })
            }
            None => defaults.reasoning_model,
        };

        Ok(Self {
            transport_id: env_string_opt(TRANSPORT_ENV_VAR).unwrap_or(defaults.transport_id),
            persona,
            reasoning_model,
            log_filter: env_string_opt(LOG_ENV_VAR).unwrap_or(defaults.log_filter),
        })
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
