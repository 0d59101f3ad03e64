//! Message body normalization.
//!
//! Turns one raw mail message, possibly multi-part and possibly HTML, into a
//! single plain text string the matcher can scan. Decoding is best-effort by
//! design: malformed charsets, broken parts, or unparseable messages degrade
//! to lossy text, never to an error. A message that cannot be decoded simply
//! yields text that will not match.
//!
//! Part policy, for multi-part messages:
//! - `text/plain` leaves accumulate into a plain buffer, verbatim.
//! - `text/html` leaves are tag-stripped and whitespace-collapsed into a
//!   separate buffer.
//! - Everything else (attachments, images, nested containers' own payloads)
//!   is skipped.
//!
//! The plain buffer wins whenever it contains anything non-whitespace;
//! otherwise the HTML buffer is the result. Single-part messages are decoded
//! directly as plain text, whatever their declared type.

use crate::transport::RawMessage;
use mailparse::ParsedMail;
use tracing::debug;

/// Decodes a raw message into normalized text.
///
/// Never fails: a message that cannot be parsed at all is decoded as lossy
/// UTF-8 of its raw bytes.
#[must_use]
pub fn decode(message: &RawMessage) -> String {
    let parsed = match mailparse::parse_mail(message.bytes()) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!(id = %message.id(), error = %e, "Message unparseable, using lossy raw text");
            return String::from_utf8_lossy(message.bytes()).into_owned();
        }
    };

    if parsed.subparts.is_empty() {
        return best_effort_body(&parsed).unwrap_or_default();
    }

    let mut plain = String::new();
    let mut html = String::new();
    collect_parts(&parsed, &mut plain, &mut html);

    if plain.chars().any(|c| !c.is_whitespace()) {
        plain
    } else {
        html
    }
}

/// Walks the part tree depth-first, accumulating plain and HTML text.
fn collect_parts(part: &ParsedMail<'_>, plain: &mut String, html: &mut String) {
    for subpart in &part.subparts {
        if !subpart.subparts.is_empty() {
            collect_parts(subpart, plain, html);
            continue;
        }

        match subpart.ctype.mimetype.to_ascii_lowercase().as_str() {
            "text/plain" => {
                if let Some(text) = best_effort_body(subpart) {
                    plain.push_str(&text);
                }
            }
            "text/html" => {
                if let Some(text) = best_effort_body(subpart) {
                    let stripped = strip_html(&text);
                    if !stripped.is_empty() {
                        if !html.is_empty() {
                            html.push(' ');
                        }
                        html.push_str(&stripped);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Decodes one part's payload, falling back to lossy UTF-8 when the declared
/// charset fails. Returns `None` only when the payload itself is unreadable.
fn best_effort_body(part: &ParsedMail<'_>) -> Option<String> {
    match part.get_body() {
        Ok(text) => Some(text),
        Err(e) => {
            debug!(error = %e, "Charset decode failed, using lossy UTF-8");
            part.get_body_raw()
                .ok()
                .map(|raw| String::from_utf8_lossy(&raw).into_owned())
        }
    }
}

/// Removes markup tags, decodes the common entities, and collapses all
/// whitespace runs to single spaces.
fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MessageId, RawMessage};

    fn message(raw: &str) -> RawMessage {
        RawMessage::new(MessageId(1), raw.as_bytes().to_vec())
    }

    fn multipart(parts: &[(&str, &str)]) -> RawMessage {
        let mut raw = String::from(
            "From: sender@example.com\r\n\
             To: user@example.com\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: multipart/alternative; boundary=\"sep\"\r\n\r\n",
        );
        for (ctype, body) in parts {
            raw.push_str("--sep\r\n");
            raw.push_str(&format!("Content-Type: {ctype}\r\n\r\n"));
            raw.push_str(body);
            raw.push_str("\r\n");
        }
        raw.push_str("--sep--\r\n");
        message(&raw)
    }

    #[test]
    fn test_single_part_plain() {
        let msg = message(
            "From: a@b.c\r\nTo: x@y.z\r\n\r\nYour code is 123456.",
        );
        assert_eq!(decode(&msg), "Your code is 123456.");
    }

    #[test]
    fn test_single_part_html_not_stripped() {
        // Single-part messages are taken as plain text whatever the type
        let msg = message(
            "From: a@b.c\r\nContent-Type: text/html\r\n\r\n<p>code 1234</p>",
        );
        assert_eq!(decode(&msg), "<p>code 1234</p>");
    }

    #[test]
    fn test_multipart_plain_wins_over_html() {
        let msg = multipart(&[
            ("text/html; charset=utf-8", "<b>html code 999999</b>"),
            ("text/plain; charset=utf-8", "plain code 111111"),
        ]);
        let text = decode(&msg);
        assert!(text.contains("plain code 111111"));
        assert!(!text.contains("999999"));
    }

    #[test]
    fn test_multipart_plain_wins_regardless_of_order() {
        let msg = multipart(&[
            ("text/plain; charset=utf-8", "plain code 111111"),
            ("text/html; charset=utf-8", "<b>html code 999999</b>"),
        ]);
        let text = decode(&msg);
        assert!(text.contains("plain code 111111"));
        assert!(!text.contains("999999"));
    }

    #[test]
    fn test_multipart_html_only_strips_tags() {
        let msg = multipart(&[(
            "text/html; charset=utf-8",
            "<html><body><p>Your   verification\r\npin is: <b>483920</b>.</p></body></html>",
        )]);
        let text = decode(&msg);
        assert_eq!(text, "Your verification pin is: 483920.");
        assert!(!text.contains('<'));
        assert!(!text.contains('>'));
    }

    #[test]
    fn test_whitespace_collapsed_to_single_spaces() {
        let msg = multipart(&[(
            "text/html",
            "<div>one</div>\r\n\t<div>two&nbsp;&nbsp;three</div>",
        )]);
        assert_eq!(decode(&msg), "one two three");
    }

    #[test]
    fn test_html_entities_decoded() {
        let msg = multipart(&[("text/html", "a &amp; b &lt;c&gt; &#39;d&#39;")]);
        assert_eq!(decode(&msg), "a & b <c> 'd'");
    }

    #[test]
    fn test_whitespace_only_plain_falls_back_to_html() {
        let msg = multipart(&[
            ("text/plain", "  \r\n\t "),
            ("text/html", "<p>html 483920</p>"),
        ]);
        assert_eq!(decode(&msg), "html 483920");
    }

    #[test]
    fn test_other_parts_skipped() {
        let msg = multipart(&[
            ("application/pdf", "%PDF-1.4 binary-ish payload"),
            ("text/plain", "the real body"),
        ]);
        assert_eq!(decode(&msg), "the real body");
    }

    #[test]
    fn test_nested_multipart_walked_depth_first() {
        let raw = "From: a@b.c\r\n\
                   MIME-Version: 1.0\r\n\
                   Content-Type: multipart/mixed; boundary=\"outer\"\r\n\r\n\
                   --outer\r\n\
                   Content-Type: multipart/alternative; boundary=\"inner\"\r\n\r\n\
                   --inner\r\n\
                   Content-Type: text/html\r\n\r\n\
                   <p>nested html</p>\r\n\
                   --inner\r\n\
                   Content-Type: text/plain\r\n\r\n\
                   nested plain 123456\r\n\
                   --inner--\r\n\
                   --outer--\r\n";
        let text = decode(&message(raw));
        assert!(text.contains("nested plain 123456"));
        assert!(!text.contains("nested html"));
    }

    #[test]
    fn test_multiple_plain_parts_accumulate() {
        let msg = multipart(&[
            ("text/plain", "first half "),
            ("text/plain", "second half"),
        ]);
        let text = decode(&msg);
        assert!(text.contains("first half"));
        assert!(text.contains("second half"));
    }

    #[test]
    fn test_malformed_bytes_degrade_to_lossy_text() {
        // Invalid UTF-8 in the body is replaced, never fatal
        let mut raw = b"From: a@b.c\r\nContent-Type: text/plain; charset=utf-8\r\n\r\ncode 555555 ".to_vec();
        raw.extend_from_slice(&[0xff, 0xfe]);
        raw.extend_from_slice(b" end");
        let msg = RawMessage::new(MessageId(7), raw);
        let text = decode(&msg);
        assert!(text.contains("code 555555"));
    }

    #[test]
    fn test_empty_message() {
        let msg = message("From: a@b.c\r\n\r\n");
        assert_eq!(decode(&msg), "");
    }

    #[test]
    fn test_decode_does_not_consume_message() {
        let msg = multipart(&[("text/plain", "same every time")]);
        assert_eq!(decode(&msg), decode(&msg));
    }
}
