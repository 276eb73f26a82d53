//! Gateway configuration, built from environment variables.

use crate::error::ConfigError;

/// Default mail submission port when `SMTP_PORT` is not set.
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default listen address for the inbound SMTP server.
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8025";

/// Process-wide gateway configuration. Populated once at startup,
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the Signal REST endpoint (e.g. `http://signal-api:8080`).
    pub signal_rest_url: String,
    /// Own Signal number used as the sender of forwarded messages.
    pub sender_number: String,
    /// Upstream mail relay host.
    pub smtp_host: String,
    /// Upstream mail relay submission port.
    pub smtp_port: u16,
    /// Relay credentials.
    pub smtp_user: String,
    pub smtp_password: String,
    /// Interface/port the inbound SMTP listener binds to.
    pub listen_addr: String,
}

impl GatewayConfig {
    /// Build config from environment variables.
    ///
    /// Fails on the first missing required variable so the process can
    /// terminate with a diagnostic before binding any listener.
    pub fn from_env() -> Result<Self, ConfigError> {
        let signal_rest_url = require("SIGNAL_REST_URL")?;
        let sender_number = require("SENDER_NUMBER")?;
        let smtp_host = require("SMTP_HOST")?;
        let smtp_user = require("SMTP_USER")?;
        let smtp_password = require("SMTP_PASSWORD")?;
        let smtp_port = parse_port("SMTP_PORT", std::env::var("SMTP_PORT").ok())?;
        let listen_addr =
            std::env::var("LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());

        Ok(Self {
            signal_rest_url,
            sender_number,
            smtp_host,
            smtp_port,
            smtp_user,
            smtp_password,
            listen_addr,
        })
    }
}

fn require(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse an optional port value, falling back to the submission default.
fn parse_port(key: &str, raw: Option<String>) -> Result<u16, ConfigError> {
    match raw {
        None => Ok(DEFAULT_SMTP_PORT),
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("not a valid port number: {value:?}"),
        }),
    }
}
