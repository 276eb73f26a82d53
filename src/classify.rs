//! Recipient address classification.
//!
//! Decides, per RCPT address, whether a message goes out as a Signal
//! message (numeric local part on the chat domain) or as ordinary mail
//! (everything else). Classification is structural only; no lookup
//! against the Signal account or the relay happens here.

use regex::Regex;

/// Domain suffix that marks an address as a Signal recipient.
pub const CHAT_DOMAIN: &str = "signal.localdomain";

/// A classified recipient address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// A Signal number, normalized to always carry a leading `+`.
    Chat(String),
    /// An ordinary mail address, passed through unchanged.
    Mail(String),
}

/// Classifies recipient addresses against the chat-number pattern.
#[derive(Debug, Clone)]
pub struct AddressClassifier {
    chat_pattern: Regex,
}

impl AddressClassifier {
    pub fn new() -> Self {
        Self {
            // The leading `+` is optional on the wire; the capture holds
            // the bare digit run so normalization is a single prepend.
            chat_pattern: Regex::new(r"^\+?(\d+)@signal\.localdomain$")
                .expect("chat address pattern is valid"),
        }
    }

    /// Classify one recipient address.
    ///
    /// Total and infallible: anything that does not match the chat
    /// pattern falls through to the Mail branch. A real mail address
    /// never starts with `+`, so the two buckets stay disjoint.
    pub fn classify(&self, address: &str) -> Recipient {
        match self.chat_pattern.captures(address) {
            Some(caps) => Recipient::Chat(format!("+{}", &caps[1])),
            None => Recipient::Mail(address.to_string()),
        }
    }
}

impl Default for AddressClassifier {
    fn default() -> Self {
        Self::new()
    }
}
