//! Transaction-level routing scenarios against recording delivery fakes.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use signal_gateway::content::ExtractedContent;
use signal_gateway::delivery::{ChatDelivery, MailDelivery};
use signal_gateway::gateway::GatewayHandler;
use signal_gateway::reply::{Failure, Reply};

// ── Recording fakes ─────────────────────────────────────────────────

#[derive(Default)]
struct RecordingChat {
    calls: Mutex<Vec<(ExtractedContent, Vec<String>)>>,
    fail: Option<Failure>,
}

impl RecordingChat {
    fn failing(failure: Failure) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: Some(failure),
        }
    }

    fn calls(&self) -> Vec<(ExtractedContent, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatDelivery for RecordingChat {
    async fn send(
        &self,
        content: &ExtractedContent,
        recipients: &[String],
    ) -> Result<(), Failure> {
        self.calls
            .lock()
            .unwrap()
            .push((content.clone(), recipients.to_vec()));
        match &self.fail {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
struct RecordingMail {
    calls: Mutex<Vec<(String, Vec<String>, Vec<u8>)>>,
    fail: Option<Failure>,
}

impl RecordingMail {
    fn failing(failure: Failure) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: Some(failure),
        }
    }

    fn calls(&self) -> Vec<(String, Vec<String>, Vec<u8>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailDelivery for RecordingMail {
    async fn send(&self, from: &str, recipients: &[String], raw: &[u8]) -> Result<(), Failure> {
        self.calls
            .lock()
            .unwrap()
            .push((from.to_string(), recipients.to_vec(), raw.to_vec()));
        match &self.fail {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }
}

// ── Scenario driver ─────────────────────────────────────────────────

/// Run one full transaction through the handler: MAIL, RCPTs, DATA, end.
fn run_transaction(
    chat: &Arc<RecordingChat>,
    mail: &Arc<RecordingMail>,
    recipients: &[&str],
    body: &[u8],
) -> Reply {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut handler =
        GatewayHandler::new(Arc::clone(chat), Arc::clone(mail), runtime.handle().clone());

    handler.begin("sender@example.com");
    for recipient in recipients {
        assert_eq!(handler.accept_recipient(recipient).code, 250);
    }
    handler.append_data(body);
    handler.finish()
}

// ── Scenarios ───────────────────────────────────────────────────────

#[test]
fn chat_only_success_is_accepted() {
    let chat = Arc::new(RecordingChat::default());
    let mail = Arc::new(RecordingMail::default());

    let reply = run_transaction(
        &chat,
        &mail,
        &["+15551234@signal.localdomain"],
        b"Subject: Test\n\n",
    );

    assert_eq!(reply.code, 250);
    assert_eq!(reply.text, "Message accepted for delivery");

    let calls = chat.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.subject, "Test");
    assert_eq!(calls[0].0.image, None);
    assert_eq!(calls[0].1, vec!["+15551234"]);
    assert!(mail.calls().is_empty());
}

#[test]
fn chat_only_failure_is_the_final_reply() {
    let chat = Arc::new(RecordingChat::failing(Failure::ChatSend(
        "endpoint returned 500".into(),
    )));
    let mail = Arc::new(RecordingMail::default());

    let reply = run_transaction(
        &chat,
        &mail,
        &["+15551234@signal.localdomain"],
        b"Subject: Test\n\n",
    );

    assert_eq!(reply.code, 554);
    assert_eq!(reply.text, "Sending signal message has failed");
    assert!(mail.calls().is_empty());
}

#[test]
fn bare_number_is_normalized_before_delivery() {
    let chat = Arc::new(RecordingChat::default());
    let mail = Arc::new(RecordingMail::default());

    run_transaction(
        &chat,
        &mail,
        &["15551234@signal.localdomain"],
        b"Subject: Test\n\n",
    );

    assert_eq!(chat.calls()[0].1, vec!["+15551234"]);
}

#[test]
fn mail_only_success_never_touches_chat() {
    let chat = Arc::new(RecordingChat::default());
    let mail = Arc::new(RecordingMail::default());
    let body: &[u8] = b"Subject: ignored by mail path\n\nbody\n";

    let reply = run_transaction(&chat, &mail, &["bob@example.com"], body);

    assert_eq!(reply, Reply::accepted());
    assert!(chat.calls().is_empty());

    let calls = mail.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "sender@example.com");
    assert_eq!(calls[0].1, vec!["bob@example.com"]);
    // The relay gets the message bytes untouched.
    assert_eq!(calls[0].2, body);
}

#[test]
fn mail_failure_wins_but_chat_is_still_attempted_once() {
    let chat = Arc::new(RecordingChat::default());
    let mail = Arc::new(RecordingMail::failing(Failure::RelayProtocol(
        "554 relay says no".into(),
    )));

    let reply = run_transaction(
        &chat,
        &mail,
        &["+15551234@signal.localdomain", "bob@example.com"],
        b"Subject: Split\n\n",
    );

    assert_eq!(reply.code, 554);
    assert_eq!(reply.text, "SMTP error occurred: 554 relay says no");
    assert_eq!(chat.calls().len(), 1);
    assert_eq!(mail.calls().len(), 1);
}

#[test]
fn relay_connect_failure_maps_to_421() {
    let chat = Arc::new(RecordingChat::default());
    let mail = Arc::new(RecordingMail::failing(Failure::RelayConnect(
        "dns failure".into(),
    )));

    let reply = run_transaction(&chat, &mail, &["bob@example.com"], b"Subject: x\n\n");

    assert_eq!(reply.code, 421);
    assert_eq!(
        reply.text,
        "Failed to connect to the server. Bad connection settings?"
    );
}

#[test]
fn relay_auth_failure_maps_to_530() {
    let chat = Arc::new(RecordingChat::default());
    let mail = Arc::new(RecordingMail::failing(Failure::RelayAuth(
        "535 authentication failed".into(),
    )));

    let reply = run_transaction(&chat, &mail, &["bob@example.com"], b"Subject: x\n\n");

    assert_eq!(reply.code, 530);
    assert_eq!(
        reply.text,
        "Failed to connect to the server. Wrong user/password?"
    );
}

#[test]
fn malformed_message_fails_chat_but_mail_is_still_attempted() {
    let chat = Arc::new(RecordingChat::default());
    let mail = Arc::new(RecordingMail::default());

    let reply = run_transaction(
        &chat,
        &mail,
        &["+15551234@signal.localdomain", "bob@example.com"],
        b"no subject header here\n",
    );

    assert_eq!(reply.code, 554);
    assert!(reply.text.starts_with("Malformed message"));
    // No HTTP attempt is made without extractable content,
    assert!(chat.calls().is_empty());
    // but the mail channel still runs independently.
    assert_eq!(mail.calls().len(), 1);
}

#[test]
fn image_attachment_reaches_the_chat_channel() {
    let chat = Arc::new(RecordingChat::default());
    let mail = Arc::new(RecordingMail::default());

    let body = b"Subject: Photo\n\
                 \n\
                 Content-Type: image/png; name=\"shot.png\"\n\
                 \n\
                 aGVsbG8g\n\
                 d29ybGQh\n";
    run_transaction(&chat, &mail, &["+15551234@signal.localdomain"], body);

    let calls = chat.calls();
    assert_eq!(calls[0].0.image.as_deref(), Some("aGVsbG8gd29ybGQh"));
}
