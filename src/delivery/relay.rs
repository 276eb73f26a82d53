//! Upstream mail relay delivery.
//!
//! Submits the raw message to the configured relay over a fresh STARTTLS
//! session: greet, upgrade, re-greet, authenticate, submit. The transport
//! is unpooled, so the connection lives exactly as long as one submission
//! and is released when the transport drops, on every path, failed
//! handshakes included.

use async_trait::async_trait;
use lettre::address::Envelope;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};

use crate::config::GatewayConfig;
use crate::delivery::MailDelivery;
use crate::reply::Failure;

/// Stateless adapter for the upstream mail relay.
#[derive(Debug, Clone)]
pub struct SmtpRelay {
    host: String,
    port: u16,
    user: String,
    password: String,
}

impl SmtpRelay {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            user: config.smtp_user.clone(),
            password: config.smtp_password.clone(),
        }
    }

    /// One blocking relay submission. Runs on the blocking pool.
    fn submit(&self, from: &str, recipients: &[String], raw: &[u8]) -> Result<(), Failure> {
        let envelope = build_envelope(from, recipients)?;

        let transport = SmtpTransport::starttls_relay(&self.host)
            .map_err(classify_error)?
            .port(self.port)
            .credentials(Credentials::new(self.user.clone(), self.password.clone()))
            .build();

        transport.send_raw(&envelope, raw).map_err(classify_error)?;
        Ok(())
    }
}

#[async_trait]
impl MailDelivery for SmtpRelay {
    async fn send(&self, from: &str, recipients: &[String], raw: &[u8]) -> Result<(), Failure> {
        tracing::info!(
            from = %from,
            recipients = recipients.len(),
            relay = %self.host,
            "Relaying mail upstream"
        );

        let relay = self.clone();
        let from = from.to_string();
        let recipients = recipients.to_vec();
        let raw = raw.to_vec();

        let result = tokio::task::spawn_blocking(move || relay.submit(&from, &recipients, &raw))
            .await
            .map_err(|e| Failure::RelayProtocol(format!("relay task failed: {e}")))?;

        if let Err(failure) = &result {
            tracing::warn!(error = ?failure, "Relay submission failed");
        }
        result
    }
}

/// Build the relay envelope from the inbound transaction's sender and the
/// mail-classified recipients. An empty reverse path stays a null sender.
fn build_envelope(from: &str, recipients: &[String]) -> Result<Envelope, Failure> {
    let sender = if from.is_empty() || from == "<>" {
        None
    } else {
        Some(from.parse().map_err(|e| {
            Failure::RelayProtocol(format!("invalid sender address {from:?}: {e}"))
        })?)
    };

    let to = recipients
        .iter()
        .map(|addr| addr.parse())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| Failure::RelayProtocol(format!("invalid recipient address: {e}")))?;

    Envelope::new(sender, to).map_err(|e| Failure::RelayProtocol(format!("invalid envelope: {e}")))
}

/// Map a lettre transport error onto the relay failure taxonomy.
///
/// Errors without any relay status are connection-level (DNS, refused,
/// TLS, timeout); authentication rejections come back as permanent 53x
/// codes; everything else keeps the relay's own message.
fn classify_error(err: lettre::transport::smtp::Error) -> Failure {
    match err.status().map(|code| code.to_string()) {
        Some(code) if matches!(code.as_str(), "530" | "534" | "535" | "538") => {
            Failure::RelayAuth(err.to_string())
        }
        Some(_) => Failure::RelayProtocol(err.to_string()),
        None => Failure::RelayConnect(err.to_string()),
    }
}
