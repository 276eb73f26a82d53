//! Delivery channel adapters.
//!
//! Two stateless adapters sit behind small trait seams so the router can
//! be exercised against recording fakes: [`SignalClient`] posts to the
//! Signal REST endpoint, [`SmtpRelay`] submits to the upstream mail relay.

pub mod relay;
pub mod signal;

use async_trait::async_trait;

use crate::content::ExtractedContent;
use crate::reply::Failure;

pub use relay::SmtpRelay;
pub use signal::SignalClient;

/// Chat-side delivery: one attempt per transaction, no retries.
#[async_trait]
pub trait ChatDelivery: Send + Sync {
    async fn send(
        &self,
        content: &ExtractedContent,
        recipients: &[String],
    ) -> Result<(), Failure>;
}

/// Mail-side delivery: one relay submission per transaction.
#[async_trait]
pub trait MailDelivery: Send + Sync {
    async fn send(
        &self,
        from: &str,
        recipients: &[String],
        raw: &[u8],
    ) -> Result<(), Failure>;
}
