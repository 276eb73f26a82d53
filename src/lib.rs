//! SMTP-to-Signal gateway.
//!
//! Accepts mail on an embedded SMTP listener and forwards each envelope
//! per recipient: numeric addresses on the chat domain become Signal
//! messages via a REST endpoint, everything else is relayed upstream as
//! ordinary mail.

pub mod classify;
pub mod config;
pub mod content;
pub mod delivery;
pub mod error;
pub mod gateway;
pub mod reply;
