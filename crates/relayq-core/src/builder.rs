//! Message builder
//!
//! Pure translation from a [`SendRequest`] into a broker [`Message`].

use relayq_types::{Message, SendRequest};

/// Build the broker message for a request.
///
/// The body is carried verbatim (`null` becomes an empty body). A non-empty
/// session ID and a scheduled enqueue time are attached when present;
/// nothing else is touched. Malformed payloads never reach this point, they
/// are rejected while deserializing the request.
pub fn build(request: &SendRequest) -> Message {
    let mut message = Message::new(request.body_text());

    if let Some(session_id) = request.session_id.as_deref().filter(|s| !s.is_empty()) {
        message = message.with_session_id(session_id);
    }

    if let Some(at) = request.scheduled_enqueue_time_utc {
        message = message.with_scheduled_enqueue_time(at);
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn parse(json: &str) -> SendRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_plain_body() {
        let msg = build(&parse(
            r#"{"body":"hello","sessionId":null,"scheduledEnqueueTimeUtc":null}"#,
        ));
        assert_eq!(msg.body(), "hello");
        assert_eq!(msg.session_id(), None);
        assert_eq!(msg.scheduled_enqueue_time(), None);
    }

    #[test]
    fn test_body_is_carried_verbatim() {
        for body in ["", "  padded  ", "line\nbreak", "{\"json\":true}", "ünïcødé ✓"] {
            assert_eq!(build(&SendRequest::new(body)).body(), body);
        }
    }

    #[test]
    fn test_null_body_builds_empty_message() {
        let msg = build(&parse(r#"{"body":null}"#));
        assert_eq!(msg.body(), "");
    }

    #[test]
    fn test_session_id() {
        let msg = build(&parse(r#"{"body":"order-42","sessionId":"order-42"}"#));
        assert_eq!(msg.session_id(), Some("order-42"));

        let msg = build(&parse(r#"{"body":"x","sessionId":""}"#));
        assert_eq!(msg.session_id(), None);
    }

    #[test]
    fn test_scheduled_enqueue_time() {
        let msg = build(&parse(
            r#"{"body":"later","scheduledEnqueueTimeUtc":"2030-01-01T00:00:00Z"}"#,
        ));
        assert_eq!(
            msg.scheduled_enqueue_time(),
            Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(msg.session_id(), None);
    }

    #[test]
    fn test_build_is_idempotent() {
        let request = SendRequest::new("same")
            .with_session_id("s-1")
            .with_scheduled_enqueue_time(Utc.with_ymd_and_hms(2030, 6, 1, 12, 30, 0).unwrap());

        assert_eq!(build(&request), build(&request));
    }
}
