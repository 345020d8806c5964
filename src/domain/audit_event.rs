//! Audit event model for asynchronous audit delivery.

use chrono::Utc;
use serde::Serialize;

/// Kind of user-facing operation an audit event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    /// A long URL was shortened.
    Shorten,
    /// A short URL was followed (redirect served).
    Follow,
}

/// An immutable record of a successful shorten or follow operation.
///
/// Created by a request handler right after the operation succeeds and handed
/// to [`crate::audit::AuditDispatcher::publish`]. The dispatcher forwards a
/// copy to every registered sink; nothing inside the audit core persists it.
///
/// # Wire Format
///
/// Sinks encode events as a single JSON object:
///
/// ```json
/// {"ts":1700000000,"action":"follow","user_id":"4b1c...","url":"https://example.com"}
/// ```
///
/// `user_id` is omitted when the operation was anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEvent {
    pub ts: i64,
    pub action: AuditAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub url: String,
}

impl AuditEvent {
    /// Creates an event stamped with the current unix time.
    pub fn new(action: AuditAction, user_id: Option<String>, url: impl Into<String>) -> Self {
        Self {
            ts: Utc::now().timestamp(),
            action,
            user_id,
            url: url.into(),
        }
    }

    pub fn shorten(user_id: Option<String>, url: impl Into<String>) -> Self {
        Self::new(AuditAction::Shorten, user_id, url)
    }

    pub fn follow(user_id: Option<String>, url: impl Into<String>) -> Self {
        Self::new(AuditAction::Follow, user_id, url)
    }

    /// Encodes the event as one JSON document without a trailing newline.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_event_serializes_all_fields() {
        let event = AuditEvent {
            ts: 1_700_000_000,
            action: AuditAction::Shorten,
            user_id: Some("user-1".to_string()),
            url: "https://example.com".to_string(),
        };

        let json = String::from_utf8(event.to_json().unwrap()).unwrap();

        assert_eq!(
            json,
            r#"{"ts":1700000000,"action":"shorten","user_id":"user-1","url":"https://example.com"}"#
        );
    }

    #[test]
    fn test_audit_event_omits_missing_user() {
        let event = AuditEvent {
            ts: 1,
            action: AuditAction::Follow,
            user_id: None,
            url: "https://example.com/a".to_string(),
        };

        let json = String::from_utf8(event.to_json().unwrap()).unwrap();

        assert!(!json.contains("user_id"));
        assert!(json.contains(r#""action":"follow""#));
    }

    #[test]
    fn test_audit_event_constructors_stamp_current_time() {
        let before = Utc::now().timestamp();
        let event = AuditEvent::follow(None, "https://example.com");
        let after = Utc::now().timestamp();

        assert_eq!(event.action, AuditAction::Follow);
        assert!(event.ts >= before && event.ts <= after);

        let event = AuditEvent::shorten(Some("u".to_string()), "https://example.com");
        assert_eq!(event.action, AuditAction::Shorten);
        assert_eq!(event.user_id.as_deref(), Some("u"));
    }
}
