//! The envelope router — inbound SMTP callbacks and dual-delivery routing.
//!
//! `mailin-embedded` owns the session and protocol state machine and calls
//! into [`GatewayHandler`] per event. The handler owns one [`Transaction`]
//! at a time: opened at MAIL FROM, recipients classified and bucketed at
//! RCPT, body buffered through DATA, and routed at end-of-data. The two
//! delivery attempts run concurrently and are joined before the single
//! reply goes back; a failed channel never suppresses the other attempt.
//!
//! Every connection gets its own handler clone, so transaction state is
//! connection-local and concurrent sessions never share it.

use std::net::IpAddr;
use std::sync::Arc;

use mailin_embedded::{Handler, Response};

use crate::classify::{AddressClassifier, Recipient};
use crate::content::ContentExtractor;
use crate::delivery::{ChatDelivery, MailDelivery};
use crate::reply::{Failure, Outcome, Reply, reduce};

/// Per-submission state: one inbound envelope on its way through the
/// gateway. Exclusively owned by the handler clone serving the session.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    /// Envelope sender as announced at MAIL FROM.
    pub sender: String,
    /// Recipients classified as Signal numbers, already normalized.
    pub chat_numbers: Vec<String>,
    /// Recipients classified as ordinary mail addresses.
    pub mail_addresses: Vec<String>,
    /// Raw message bytes, headers and body, as received.
    pub raw: Vec<u8>,
}

impl Transaction {
    fn new(sender: &str) -> Self {
        Self {
            sender: sender.to_string(),
            ..Default::default()
        }
    }
}

/// Route one finalized transaction: attempt chat and mail delivery for
/// whichever recipient buckets are non-empty, join both outcomes, and
/// reduce them to the transaction reply.
///
/// Content extraction only happens on the chat path; an extraction
/// failure fails that channel without touching the mail attempt.
pub async fn route<C, M>(
    transaction: &Transaction,
    extractor: &ContentExtractor,
    chat: &C,
    mail: &M,
) -> Reply
where
    C: ChatDelivery + ?Sized,
    M: MailDelivery + ?Sized,
{
    let chat_attempt = async {
        if transaction.chat_numbers.is_empty() {
            return Outcome::Skipped;
        }
        match extractor.extract(&transaction.raw) {
            Err(err) => Outcome::Failed(Failure::MalformedMessage(err.to_string())),
            Ok(content) => match chat.send(&content, &transaction.chat_numbers).await {
                Ok(()) => Outcome::Delivered,
                Err(failure) => Outcome::Failed(failure),
            },
        }
    };

    let mail_attempt = async {
        if transaction.mail_addresses.is_empty() {
            return Outcome::Skipped;
        }
        match mail
            .send(
                &transaction.sender,
                &transaction.mail_addresses,
                &transaction.raw,
            )
            .await
        {
            Ok(()) => Outcome::Delivered,
            Err(failure) => Outcome::Failed(failure),
        }
    };

    // A join, not a race: no reply until both channels are final.
    let (chat_outcome, mail_outcome) = tokio::join!(chat_attempt, mail_attempt);
    reduce(&chat_outcome, &mail_outcome)
}

/// Inbound SMTP handler, cloned per connection by `mailin-embedded`.
pub struct GatewayHandler<C, M> {
    classifier: AddressClassifier,
    extractor: ContentExtractor,
    chat: Arc<C>,
    mail: Arc<M>,
    runtime: tokio::runtime::Handle,
    transaction: Option<Transaction>,
}

impl<C, M> Clone for GatewayHandler<C, M> {
    fn clone(&self) -> Self {
        Self {
            classifier: self.classifier.clone(),
            extractor: self.extractor.clone(),
            chat: Arc::clone(&self.chat),
            mail: Arc::clone(&self.mail),
            runtime: self.runtime.clone(),
            transaction: self.transaction.clone(),
        }
    }
}

impl<C, M> GatewayHandler<C, M>
where
    C: ChatDelivery,
    M: MailDelivery,
{
    pub fn new(chat: Arc<C>, mail: Arc<M>, runtime: tokio::runtime::Handle) -> Self {
        Self {
            classifier: AddressClassifier::new(),
            extractor: ContentExtractor::new(),
            chat,
            mail,
            runtime,
            transaction: None,
        }
    }

    /// Open a fresh transaction. Any stale one from an aborted submission
    /// on the same connection is discarded.
    pub fn begin(&mut self, sender: &str) {
        self.transaction = Some(Transaction::new(sender));
    }

    /// Classify and bucket one recipient (lenient policy: everything is
    /// accepted; unmatched addresses go to the mail bucket).
    pub fn accept_recipient(&mut self, address: &str) -> Reply {
        let Some(transaction) = self.transaction.as_mut() else {
            return Reply::bad_sequence();
        };
        match self.classifier.classify(address) {
            Recipient::Chat(number) => transaction.chat_numbers.push(number),
            Recipient::Mail(address) => transaction.mail_addresses.push(address),
        }
        Reply::ok()
    }

    /// Append a chunk of message data.
    pub fn append_data(&mut self, buf: &[u8]) {
        if let Some(transaction) = self.transaction.as_mut() {
            transaction.raw.extend_from_slice(buf);
        }
    }

    /// Finalize the transaction: partition is already done, so run the
    /// deliveries and reduce. The transaction is consumed; the state is
    /// terminal once a reply is produced.
    pub fn finish(&mut self) -> Reply {
        let Some(transaction) = self.transaction.take() else {
            return Reply::bad_sequence();
        };

        tracing::debug!(
            sender = %transaction.sender,
            chat = transaction.chat_numbers.len(),
            mail = transaction.mail_addresses.len(),
            bytes = transaction.raw.len(),
            "Transaction finalized"
        );

        self.runtime.block_on(route(
            &transaction,
            &self.extractor,
            self.chat.as_ref(),
            self.mail.as_ref(),
        ))
    }
}

fn respond(reply: Reply) -> Response {
    Response::custom(reply.code, reply.text)
}

impl<C, M> Handler for GatewayHandler<C, M>
where
    C: ChatDelivery + 'static,
    M: MailDelivery + 'static,
{
    fn helo(&mut self, _ip: IpAddr, _domain: &str) -> Response {
        respond(Reply::ok())
    }

    fn mail(&mut self, _ip: IpAddr, _domain: &str, from: &str) -> Response {
        self.begin(from);
        respond(Reply::ok())
    }

    fn rcpt(&mut self, to: &str) -> Response {
        respond(self.accept_recipient(to))
    }

    fn data_start(
        &mut self,
        _domain: &str,
        _from: &str,
        _is8bit: bool,
        _to: &[String],
    ) -> Response {
        if self.transaction.is_some() {
            respond(Reply::ok())
        } else {
            respond(Reply::bad_sequence())
        }
    }

    fn data(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.append_data(buf);
        Ok(())
    }

    fn data_end(&mut self) -> Response {
        respond(self.finish())
    }
}
