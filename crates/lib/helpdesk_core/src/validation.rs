//! Chat payload validation and sanitization.
//!
//! Collects every field-level violation instead of stopping at the first one,
//! so a client gets the full list back in a single 400 response.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::uuid::parse_id;

/// Maximum accepted message length, in Unicode scalar values.
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Raised when a chat payload is malformed.
#[derive(Debug, Clone, Error)]
#[error("Validation error: {}", summarize(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation::new(field, message)],
        }
    }
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// A validated, sanitized chat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<Uuid>,
}

/// Validate an arbitrary JSON payload as a chat request.
///
/// `message` must be a string of 1..=1000 characters as received; it is then
/// passed through [`sanitize_message`] and rejected if nothing is left.
/// `sessionId` is optional (`null` counts as absent) but must be UUID-shaped
/// when given.
pub fn validate_chat_request(payload: &Value) -> Result<ChatRequest, ValidationError> {
    let Some(obj) = payload.as_object() else {
        return Err(ValidationError::single("body", "Expected a JSON object"));
    };

    let mut violations = Vec::new();

    let message = match obj.get("message") {
        Some(Value::String(raw)) => {
            let len = raw.chars().count();
            if len == 0 {
                violations.push(FieldViolation::new("message", "Message cannot be empty"));
                None
            } else if len > MAX_MESSAGE_CHARS {
                violations.push(FieldViolation::new("message", "Message too long"));
                None
            } else {
                let clean = sanitize_message(raw);
                if clean.is_empty() {
                    violations.push(FieldViolation::new("message", "Message cannot be empty"));
                    None
                } else {
                    Some(clean)
                }
            }
        }
        Some(_) => {
            violations.push(FieldViolation::new("message", "Expected string"));
            None
        }
        None => {
            violations.push(FieldViolation::new("message", "Required"));
            None
        }
    };

    let session_id = match obj.get("sessionId") {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => match parse_id(raw) {
            Some(id) => Some(id),
            None => {
                violations.push(FieldViolation::new("sessionId", "Invalid uuid"));
                None
            }
        },
        Some(_) => {
            violations.push(FieldViolation::new("sessionId", "Expected string"));
            None
        }
    };

    match message {
        Some(message) if violations.is_empty() => Ok(ChatRequest {
            message,
            session_id,
        }),
        _ => Err(ValidationError { violations }),
    }
}

/// Trim surrounding whitespace and strip literal `<` and `>`.
///
/// This only defangs the most obvious markup. It is not an HTML sanitizer and
/// does nothing against entity-encoded or attribute-based payloads; anything
/// rendering message text must still escape it.
pub fn sanitize_message(message: &str) -> String {
    message
        .trim()
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_message_without_session() {
        let req = validate_chat_request(&json!({"message": "What's your return policy?"})).unwrap();
        assert_eq!(req.message, "What's your return policy?");
        assert!(req.session_id.is_none());
    }

    #[test]
    fn accepts_uuid_session_id() {
        let id = Uuid::now_v7();
        let req =
            validate_chat_request(&json!({"message": "hi", "sessionId": id.to_string()})).unwrap();
        assert_eq!(req.session_id, Some(id));
    }

    #[test]
    fn rejects_non_hyphenated_session_ids() {
        let id = Uuid::now_v7();
        for form in [
            id.simple().to_string(),
            id.braced().to_string(),
            id.urn().to_string(),
        ] {
            let err =
                validate_chat_request(&json!({"message": "hi", "sessionId": form})).unwrap_err();
            assert_eq!(err.violations[0].field, "sessionId");
            assert_eq!(err.violations[0].message, "Invalid uuid");
        }
    }

    #[test]
    fn null_session_id_is_absent() {
        let req = validate_chat_request(&json!({"message": "hi", "sessionId": null})).unwrap();
        assert!(req.session_id.is_none());
    }

    #[test]
    fn rejects_empty_message() {
        let err = validate_chat_request(&json!({"message": ""})).unwrap_err();
        assert_eq!(err.violations[0].field, "message");
        assert_eq!(err.violations[0].message, "Message cannot be empty");
    }

    #[test]
    fn rejects_whitespace_only_message() {
        let err = validate_chat_request(&json!({"message": "   \n\t "})).unwrap_err();
        assert_eq!(err.violations[0].message, "Message cannot be empty");
    }

    #[test]
    fn rejects_message_that_sanitizes_to_nothing() {
        assert!(validate_chat_request(&json!({"message": " <> "})).is_err());
    }

    #[test]
    fn length_bound_is_inclusive() {
        let at_limit = "a".repeat(MAX_MESSAGE_CHARS);
        assert!(validate_chat_request(&json!({ "message": at_limit })).is_ok());

        let over = "a".repeat(MAX_MESSAGE_CHARS + 1);
        let err = validate_chat_request(&json!({ "message": over })).unwrap_err();
        assert_eq!(err.violations[0].message, "Message too long");
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let accented = "é".repeat(MAX_MESSAGE_CHARS);
        assert!(validate_chat_request(&json!({ "message": accented })).is_ok());
    }

    #[test]
    fn length_counts_unicode_scalars() {
        // Each emoji is one scalar value but two UTF-16 code units.
        let emoji = "😀".repeat(MAX_MESSAGE_CHARS);
        assert!(validate_chat_request(&json!({ "message": emoji })).is_ok());

        let over = "😀".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(validate_chat_request(&json!({ "message": over })).is_err());
    }

    #[test]
    fn collects_all_violations() {
        let err = validate_chat_request(&json!({"message": 42, "sessionId": "abc"})).unwrap_err();
        let fields: Vec<_> = err.violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["message", "sessionId"]);
    }

    #[test]
    fn rejects_missing_message_and_non_object() {
        let err = validate_chat_request(&json!({})).unwrap_err();
        assert_eq!(err.violations[0].message, "Required");
        assert!(validate_chat_request(&json!(["hi"])).is_err());
    }

    #[test]
    fn sanitize_trims_and_strips_angle_brackets() {
        assert_eq!(
            sanitize_message("  <script>alert(1)</script>  "),
            "scriptalert(1)/script"
        );
    }
}
