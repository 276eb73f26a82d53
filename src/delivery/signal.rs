//! Signal REST delivery.
//!
//! Builds the `/v2/send` JSON payload from extracted content and performs
//! one POST per transaction. The endpoint signals success with 201
//! Created; any other status, and any transport-level failure, is a
//! failed outcome. Retry policy is the operator's problem, not ours.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

use crate::config::GatewayConfig;
use crate::content::ExtractedContent;
use crate::delivery::ChatDelivery;
use crate::reply::Failure;

/// JSON body for the `/v2/send` endpoint.
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    message: &'a str,
    number: &'a str,
    recipients: &'a [String],
    /// At most one attachment; omitted entirely when no image was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    base64_attachments: Option<Vec<&'a str>>,
}

/// Stateless adapter for the Signal REST endpoint.
pub struct SignalClient {
    base_url: String,
    sender_number: String,
    client: reqwest::Client,
}

impl SignalClient {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            base_url: config.signal_rest_url.clone(),
            sender_number: config.sender_number.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn send_url(&self) -> String {
        format!("{}/v2/send", self.base_url.trim_end_matches('/'))
    }

    fn payload<'a>(
        &'a self,
        content: &'a ExtractedContent,
        recipients: &'a [String],
    ) -> SendMessageRequest<'a> {
        SendMessageRequest {
            message: &content.subject,
            number: &self.sender_number,
            recipients,
            base64_attachments: content.image.as_deref().map(|image| vec![image]),
        }
    }
}

#[async_trait]
impl ChatDelivery for SignalClient {
    async fn send(
        &self,
        content: &ExtractedContent,
        recipients: &[String],
    ) -> Result<(), Failure> {
        tracing::info!(
            recipients = recipients.len(),
            attachment = content.image.is_some(),
            "Forwarding message to signal"
        );

        let response = self
            .client
            .post(self.send_url())
            .json(&self.payload(content, recipients))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Signal endpoint unreachable");
                Failure::ChatSend(e.to_string())
            })?;

        match response.status() {
            StatusCode::CREATED => Ok(()),
            status => {
                let detail = response.text().await.unwrap_or_default();
                tracing::warn!(%status, detail = %detail, "Signal endpoint rejected message");
                Err(Failure::ChatSend(format!("endpoint returned {status}")))
            }
        }
    }
}
