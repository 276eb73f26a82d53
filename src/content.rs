//! Message content extraction.
//!
//! Pulls the pieces a Signal message needs out of raw message bytes: the
//! subject line (the forwarded text) and, when present, one base64 PNG
//! attachment body. This is not a MIME parser: the gateway matches the
//! two shapes it cares about and ignores everything else.
//! Subject text is taken verbatim; encoded-word decoding is a known
//! simplification left out on purpose.

use regex::Regex;

use crate::error::ContentError;

/// Read-only view of a finalized message, as far as chat delivery cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    /// Subject line, verbatim.
    pub subject: String,
    /// Base64 PNG payload with line breaks removed, if any part matched.
    pub image: Option<String>,
}

/// Extracts subject and image payload from raw message bytes.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    subject_pattern: Regex,
    image_pattern: Regex,
}

impl ContentExtractor {
    pub fn new() -> Self {
        Self {
            subject_pattern: Regex::new(r"Subject: (.*)\n")
                .expect("subject pattern is valid"),
            // A PNG part header followed by a base64 body: groups of four
            // base64 characters interleaved with line breaks, closed by an
            // optionally padded final group.
            image_pattern: Regex::new(
                r#"Content-Type: image/png; name=".*"\n+((?:[A-Za-z\d+/]{4}|\n)*(?:[A-Za-z\d+/]{2}==|[A-Za-z\d+/]{3}=)?)"#,
            )
            .expect("image pattern is valid"),
        }
    }

    /// Extract subject and optional image from raw message bytes.
    ///
    /// Carriage returns are stripped up front; line-ending variance
    /// breaks the multi-line image body match otherwise. A missing
    /// subject is a hard error; a missing image is not. Pure: the same
    /// input always yields the same output.
    pub fn extract(&self, raw: &[u8]) -> Result<ExtractedContent, ContentError> {
        let text = String::from_utf8_lossy(raw).replace('\r', "");

        let subject = self
            .subject_pattern
            .captures(&text)
            .map(|caps| caps[1].to_string())
            .ok_or(ContentError::MissingSubject)?;

        // First matching part wins; further image parts are ignored.
        let image = self.image_pattern.captures(&text).and_then(|caps| {
            let block = caps[1].replace('\n', "");
            if block.is_empty() { None } else { Some(block) }
        });

        Ok(ExtractedContent { subject, image })
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}
