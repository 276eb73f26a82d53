//! Error types for the gateway.

/// Configuration-related errors. Only these are process-fatal, and only
/// at startup; once the listener is up, every fault is reduced to an
/// SMTP reply (see [`crate::reply`]).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Content-extraction errors.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("no Subject header found in message")]
    MissingSubject,
}
