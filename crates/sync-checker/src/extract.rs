//! Body and subject extraction from raw mail service messages.
//!
//! Payloads come in several shapes (single part, multipart, nested multipart),
//! so the body is searched for in order:
//! 1. inline data on the top-level payload
//! 2. the first `text/plain` or `text/html` part with data, depth first
//! 3. nothing found: empty string
//!
//! Extraction never fails. A candidate whose data does not decode is skipped.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use sync_types::{Message, MessagePart, RawMessage};

use crate::keywords::SystemKeywords;

/// URL-safe alphabet, padding optional
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decoded body text of a message, `""` when none can be found
pub fn extract_body(message: &RawMessage) -> String {
    let payload = &message.payload;

    if let Some(text) = payload.inline_data().and_then(decode_body_data) {
        return text;
    }

    match find_in_parts(&payload.parts) {
        Some(text) => text,
        None => {
            tracing::debug!("No body data found in message {}", message.id);
            String::new()
        }
    }
}

fn find_in_parts(parts: &[MessagePart]) -> Option<String> {
    for part in parts {
        if part.is_text_body() {
            if let Some(text) = part.inline_data().and_then(decode_body_data) {
                return Some(text);
            }
        }

        // multipart/alternative and friends
        if let Some(text) = find_in_parts(&part.parts) {
            return Some(text);
        }
    }

    None
}

/// Decode URL-safe base64 into text, dropping byte sequences that are not UTF-8.
/// Returns `None` only when the base64 itself is malformed.
pub fn decode_body_data(data: &str) -> Option<String> {
    let normalized: String = data
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();

    match URL_SAFE_LENIENT.decode(normalized.as_bytes()) {
        Ok(bytes) => Some(utf8_lossless_subset(&bytes)),
        Err(e) => {
            tracing::debug!("Skipping undecodable body data: {}", e);
            None
        }
    }
}

fn utf8_lossless_subset(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Value of the first `Subject` header (any case), `""` when absent
pub fn extract_subject(message: &RawMessage) -> String {
    message
        .payload
        .header("subject")
        .unwrap_or_default()
        .to_string()
}

fn extract_received_at(message: &RawMessage) -> Option<DateTime<Utc>> {
    let date = message.payload.header("date")?;
    match DateTime::parse_from_rfc2822(date.trim()) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(_) => {
            tracing::debug!("Unparseable Date header on {}: {}", message.id, date);
            None
        }
    }
}

/// Build the decoded `Message` record for a raw message
pub fn extract_message(raw: &RawMessage, keywords: &SystemKeywords) -> Message {
    let subject = extract_subject(raw);
    let body = extract_body(raw);

    Message {
        id: raw.id.clone(),
        is_system_notification: keywords.matches_subject(&subject),
        received_at: extract_received_at(raw),
        subject,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(payload: MessagePart) -> RawMessage {
        RawMessage {
            id: "m1".to_string(),
            payload,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_part_inline_data() {
        // "Hello world" without padding, as Gmail sends it
        let msg = raw(MessagePart::leaf("text/plain", "SGVsbG8gd29ybGQ"));
        assert_eq!(extract_body(&msg), "Hello world");
    }

    #[test]
    fn test_top_level_data_wins_regardless_of_mime() {
        let mut payload = MessagePart::leaf("application/octet-stream", "dG9w");
        payload.parts = vec![MessagePart::leaf("text/plain", "Y2hpbGQ=")];
        assert_eq!(extract_body(&raw(payload)), "top");
    }

    #[test]
    fn test_nested_multipart_html_first() {
        let payload = MessagePart::container(
            "multipart/mixed",
            vec![MessagePart::container(
                "multipart/alternative",
                vec![
                    MessagePart::leaf("text/html", "SGVsbG8="),
                    MessagePart::leaf("text/plain", "cGxhaW4="),
                ],
            )],
        );
        assert_eq!(extract_body(&raw(payload)), "Hello");
    }

    #[test]
    fn test_first_in_tree_order_wins() {
        let payload = MessagePart::container(
            "multipart/mixed",
            vec![
                MessagePart::container(
                    "multipart/alternative",
                    vec![MessagePart::leaf("text/plain", "ZGVlcA==")],
                ),
                MessagePart::leaf("text/plain", "c2hhbGxvdw=="),
            ],
        );
        assert_eq!(extract_body(&raw(payload)), "deep");
    }

    #[test]
    fn test_charset_parameter_qualifies() {
        let payload = MessagePart::container(
            "multipart/alternative",
            vec![MessagePart::leaf("text/plain; charset=utf-8", "SGk=")],
        );
        assert_eq!(extract_body(&raw(payload)), "Hi");
    }

    #[test]
    fn test_attachments_are_skipped() {
        let payload = MessagePart::container(
            "multipart/mixed",
            vec![
                MessagePart::leaf("application/pdf", "JVBERi0="),
                MessagePart::leaf("text/plain", "Ym9keQ=="),
            ],
        );
        assert_eq!(extract_body(&raw(payload)), "body");
    }

    #[test]
    fn test_no_data_anywhere_is_empty() {
        let payload = MessagePart::container(
            "multipart/mixed",
            vec![MessagePart::container(
                "multipart/alternative",
                vec![MessagePart::container("text/plain", vec![])],
            )],
        );
        assert_eq!(extract_body(&raw(payload)), "");
        assert_eq!(extract_body(&RawMessage::default()), "");
    }

    #[test]
    fn test_undecodable_candidate_falls_through() {
        let payload = MessagePart::container(
            "multipart/alternative",
            vec![
                MessagePart::leaf("text/plain", "!!not base64!!"),
                MessagePart::leaf("text/html", "b2s="),
            ],
        );
        assert_eq!(extract_body(&raw(payload)), "ok");
    }

    #[test]
    fn test_decode_tolerates_standard_alphabet_and_whitespace() {
        // 0xfb 0xff encodes as "+/8=" in the standard alphabet
        assert_eq!(decode_body_data("+/8="), Some(String::new()));
        assert_eq!(decode_body_data("SGVs\r\nbG8="), Some("Hello".to_string()));
    }

    #[test]
    fn test_decode_drops_invalid_utf8() {
        // b"ok\xffyes"
        assert_eq!(decode_body_data("b2v_eWVz"), Some("okyes".to_string()));
    }

    #[test]
    fn test_extract_subject() {
        let payload = MessagePart::default()
            .with_header("From", "a@example.com")
            .with_header("subject", "Task: X");
        assert_eq!(extract_subject(&raw(payload)), "Task: X");
        assert_eq!(extract_subject(&RawMessage::default()), "");
    }

    #[test]
    fn test_extract_message() {
        let payload = MessagePart::leaf("text/plain", "Y29kZSAxMjM0")
            .with_header("Subject", "Your verification code")
            .with_header("Date", "Tue, 1 Jul 2025 10:52:37 +0200");
        let msg = extract_message(&raw(payload), &SystemKeywords::default());

        assert_eq!(msg.id, "m1");
        assert_eq!(msg.subject, "Your verification code");
        assert_eq!(msg.body, "code 1234");
        assert!(msg.is_system_notification);
        assert_eq!(
            msg.received_at.map(|d| d.to_rfc3339()),
            Some("2025-07-01T08:52:37+00:00".to_string())
        );
    }
}
