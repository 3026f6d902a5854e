use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has unknown persona '{value}'; expected product_owner or marketing")]
    UnknownPersona { var: &'static str, value: String },

    #[error("{var} has unsupported reasoning model '{value}'; expected one of: {expected}")]
    UnsupportedModel {
        var: &'static str,
        value: String,
        expected: String,
    },
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{filter}': {source}")]
    InvalidFilter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}
