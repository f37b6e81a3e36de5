//! MIME body selection and decoding for provider messages.
//!
//! The provider returns part bodies as base64url. Decoded bytes are
//! interpreted as UTF-8 directly (lossily for stray bytes); there is no
//! intermediate byte-to-percent-escape step, which would corrupt
//! multi-byte sequences.

use base64::Engine;
use chrono::{DateTime, Utc};

use crate::mailbox::mailbox_model::{
    MailMessage, MessageBody, MessageHeader, MessagePart, MessagePayload, MessageResponse,
};

/// Converts a raw provider message response into a `MailMessage` with a
/// plain-text body.
pub(crate) fn parse_message(raw: MessageResponse) -> MailMessage {
    let payload = raw.payload.unwrap_or_default();

    let from = find_header(&payload.headers, "From").unwrap_or_default();
    let subject = find_header(&payload.headers, "Subject").unwrap_or_default();

    let body_text = extract_body_text(&payload);

    // internalDate is milliseconds since epoch
    let received_at = raw
        .internal_date
        .as_deref()
        .and_then(|d| d.parse::<i64>().ok())
        .and_then(|ms| DateTime::from_timestamp(ms / 1000, ((ms % 1000) * 1_000_000) as u32))
        .unwrap_or_else(Utc::now);

    MailMessage {
        id: raw.id,
        from: remove_control_chars(&from),
        subject: remove_control_chars(&subject),
        body_text,
        received_at,
    }
}

/// Finds a header value by name (case-insensitive).
fn find_header(headers: &[MessageHeader], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.clone())
}

/// Selects and decodes the message body: an HTML part is preferred, a
/// plain-text part is the fallback, then the top-level body.
fn extract_body_text(payload: &MessagePayload) -> String {
    if let Some(html) = find_part(&payload.parts, "text/html") {
        return remove_control_chars(&html_to_text(&html));
    }
    if let Some(plain) = find_part(&payload.parts, "text/plain") {
        return remove_control_chars(&plain);
    }

    if let Some(MessageBody { data: Some(data) }) = payload.body.as_ref() {
        let decoded = decode_base64url_text(data);
        if payload.mime_type.eq_ignore_ascii_case("text/html") {
            return remove_control_chars(&html_to_text(&decoded));
        }
        return remove_control_chars(&decoded);
    }

    String::new()
}

/// Recursively searches MIME parts for the given media type.
fn find_part(parts: &[MessagePart], mime_type: &str) -> Option<String> {
    for part in parts {
        if part.mime_type.eq_ignore_ascii_case(mime_type) {
            if let Some(MessageBody { data: Some(data) }) = part.body.as_ref() {
                return Some(decode_base64url_text(data));
            }
        }
        if let Some(text) = find_part(&part.parts, mime_type) {
            return Some(text);
        }
    }
    None
}

/// Decodes base64url content straight to UTF-8 text.
pub(crate) fn decode_base64url_text(encoded: &str) -> String {
    let trimmed = encoded.trim_end_matches('=');
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(trimmed)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Strips HTML tags, inserting newlines for block-level elements, and
/// decodes common entities. A state machine, not a full parser; bank
/// notification markup is simple enough for this to hold.
pub(crate) fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut tag_name = String::new();
    let mut in_entity = false;
    let mut entity_buf = String::new();

    for ch in html.chars() {
        if in_entity {
            if ch == ';' {
                out.push_str(&decode_entity(&entity_buf));
                entity_buf.clear();
                in_entity = false;
            } else if entity_buf.len() < 10 {
                entity_buf.push(ch);
            } else {
                // Too long to be an entity, emit raw
                out.push('&');
                out.push_str(&entity_buf);
                out.push(ch);
                entity_buf.clear();
                in_entity = false;
            }
            continue;
        }

        if in_tag {
            if ch == '>' {
                // First token is the tag name; attributes are ignored
                let lower = tag_name
                    .split_whitespace()
                    .next()
                    .unwrap_or("")
                    .to_ascii_lowercase();
                if matches!(
                    lower.as_str(),
                    "br" | "br/" | "p" | "/p" | "div" | "/div" | "li" | "tr" | "/tr"
                ) {
                    out.push('\n');
                }
                tag_name.clear();
                in_tag = false;
            } else if tag_name.len() < 80 {
                tag_name.push(ch);
            }
            continue;
        }

        match ch {
            '<' => {
                in_tag = true;
                tag_name.clear();
            }
            '&' => {
                in_entity = true;
                entity_buf.clear();
            }
            _ => out.push(ch),
        }
    }

    if in_entity {
        out.push('&');
        out.push_str(&entity_buf);
    }

    out
}

/// Decodes a single HTML entity (without the leading `&` / trailing `;`).
fn decode_entity(entity: &str) -> String {
    match entity {
        "amp" => "&".to_string(),
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "quot" => "\"".to_string(),
        "apos" => "'".to_string(),
        "nbsp" => " ".to_string(),
        s if s.starts_with('#') => {
            let num_str = &s[1..];
            let codepoint = if let Some(hex) = num_str.strip_prefix('x') {
                u32::from_str_radix(hex, 16).ok()
            } else {
                num_str.parse::<u32>().ok()
            };
            codepoint
                .and_then(char::from_u32)
                .map(|c| c.to_string())
                .unwrap_or_else(|| format!("&{};", entity))
        }
        _ => format!("&{};", entity),
    }
}

/// Removes control characters (except newline, carriage return, tab).
pub(crate) fn remove_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\r' || *c == '\t')
        .collect()
}
