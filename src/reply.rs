//! Per-channel delivery outcomes and reduction to a single SMTP reply.
//!
//! One transaction produces up to two delivery attempts (chat, mail). Each
//! attempt yields a tagged [`Outcome`]; [`reduce`] folds the pair into the
//! one reply code the inbound session gets back. Failure beats success,
//! and when both channels fail the most severe failure wins, by an
//! explicit ordering rather than nested conditionals.

/// Failure taxonomy across both delivery channels.
///
/// Each variant maps to a distinct reply code; the payload carries the
/// human-readable cause that ends up in the reply text.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Failure {
    /// No subject could be extracted from the message body.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// The Signal endpoint answered with a non-201 status or was unreachable.
    #[error("Sending signal message has failed")]
    ChatSend(String),

    /// The mail relay could not be reached at all.
    #[error("Failed to connect to the server. Bad connection settings?")]
    RelayConnect(String),

    /// The mail relay rejected the configured credentials.
    #[error("Failed to connect to the server. Wrong user/password?")]
    RelayAuth(String),

    /// Any other relay-reported submission error.
    #[error("SMTP error occurred: {0}")]
    RelayProtocol(String),
}

impl Failure {
    /// Reply code for this failure.
    pub fn code(&self) -> u16 {
        match self {
            Failure::MalformedMessage(_) => 554,
            Failure::ChatSend(_) => 554,
            Failure::RelayConnect(_) => 421,
            Failure::RelayAuth(_) => 530,
            Failure::RelayProtocol(_) => 554,
        }
    }

    /// Rank used when both channels fail; the highest-ranked failure
    /// becomes the transaction reply. Malformed input outranks relay
    /// failures, relay failures outrank a chat failure, and an
    /// unreachable relay reports the transient 421 over the permanent
    /// relay codes.
    fn severity(&self) -> u8 {
        match self {
            Failure::MalformedMessage(_) => 5,
            Failure::RelayConnect(_) => 4,
            Failure::RelayAuth(_) => 3,
            Failure::RelayProtocol(_) => 2,
            Failure::ChatSend(_) => 1,
        }
    }
}

/// Outcome of one delivery channel for one transaction.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The channel had no recipients; trivially successful by absence.
    Skipped,
    Delivered,
    Failed(Failure),
}

impl Outcome {
    fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Failed(failure) => Some(failure),
            Outcome::Skipped | Outcome::Delivered => None,
        }
    }
}

/// A three-digit SMTP reply with text, as returned to the inbound session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub text: String,
}

impl Reply {
    /// Per-recipient acceptance.
    pub fn ok() -> Self {
        Self { code: 250, text: "OK".to_string() }
    }

    /// Whole-transaction acceptance.
    pub fn accepted() -> Self {
        Self {
            code: 250,
            text: "Message accepted for delivery".to_string(),
        }
    }

    /// An event arrived outside any open transaction.
    pub fn bad_sequence() -> Self {
        Self {
            code: 503,
            text: "Bad sequence of commands".to_string(),
        }
    }
}

impl From<&Failure> for Reply {
    fn from(failure: &Failure) -> Self {
        Self {
            code: failure.code(),
            text: failure.to_string(),
        }
    }
}

/// Fold the two channel outcomes into the single transaction reply.
///
/// Both outcomes must already be final. This is the join point; nothing
/// here re-attempts or suppresses a delivery.
pub fn reduce(chat: &Outcome, mail: &Outcome) -> Reply {
    match (chat.failure(), mail.failure()) {
        (None, None) => Reply::accepted(),
        (Some(failure), None) | (None, Some(failure)) => Reply::from(failure),
        (Some(chat_failure), Some(mail_failure)) => {
            if chat_failure.severity() >= mail_failure.severity() {
                Reply::from(chat_failure)
            } else {
                Reply::from(mail_failure)
            }
        }
    }
}
