use serde::Deserialize;
use serde_json::{Value, json};

use crate::types::Notification;

// ---------------------------------------------------------------------------
// Inbound events
// ---------------------------------------------------------------------------

/// Typed events delivered to local subscribers. Consumers never see the
/// raw wire frames.
#[derive(Debug, Clone)]
pub enum SocketEvent {
    /// The duplex connection is up and authenticated.
    Connected,
    /// The connection dropped; carries the server or transport reason.
    Disconnected { reason: String },
    /// A notification was created server-side.
    NewNotification(Notification),
    /// An existing notification changed server-side.
    NotificationUpdated(Notification),
    /// Another session marked this notification read.
    NotificationRead { id: String },
    /// Another session toggled importance.
    ImportanceChanged { id: String, is_important: bool },
    /// The notification was deleted server-side.
    NotificationDeleted { id: String },
    /// A transport or protocol error. Non-fatal; forwarded, never thrown.
    Error(String),
}

/// Outcome of parsing one inbound text frame.
pub(crate) enum ParsedFrame {
    Event(SocketEvent),
    /// Recognized shape, unrecognized event name. Skipped with a debug log.
    Ignored(String),
}

#[derive(Deserialize)]
struct Frame {
    event: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdPayload {
    id: String,
    #[serde(default)]
    is_important: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// Parse one `{"event": ..., "data": ...}` frame into a typed event.
///
/// Malformed frames come back as `Err` so the reader can forward them as
/// a `SocketEvent::Error` instead of dropping the connection.
pub(crate) fn parse_frame(text: &str) -> Result<ParsedFrame, String> {
    let frame: Frame =
        serde_json::from_str(text).map_err(|e| format!("malformed socket frame: {e}"))?;

    let event = match frame.event.as_str() {
        "connected" => SocketEvent::Connected,
        "disconnected" => {
            let payload: IdPayload = serde_json::from_value(frame.data).unwrap_or(IdPayload {
                id: String::new(),
                is_important: false,
                reason: None,
            });
            SocketEvent::Disconnected {
                reason: payload.reason.unwrap_or_else(|| "server closed".to_owned()),
            }
        }
        "newNotification" => {
            let mut n: Notification = serde_json::from_value(frame.data)
                .map_err(|e| format!("bad newNotification payload: {e}"))?;
            n.normalize();
            SocketEvent::NewNotification(n)
        }
        "notificationUpdated" => {
            let mut n: Notification = serde_json::from_value(frame.data)
                .map_err(|e| format!("bad notificationUpdated payload: {e}"))?;
            n.normalize();
            SocketEvent::NotificationUpdated(n)
        }
        "notificationRead" => {
            let payload: IdPayload = serde_json::from_value(frame.data)
                .map_err(|e| format!("bad notificationRead payload: {e}"))?;
            SocketEvent::NotificationRead { id: payload.id }
        }
        "notificationImportant" => {
            let payload: IdPayload = serde_json::from_value(frame.data)
                .map_err(|e| format!("bad notificationImportant payload: {e}"))?;
            SocketEvent::ImportanceChanged {
                id: payload.id,
                is_important: payload.is_important,
            }
        }
        "notificationDeleted" => {
            let payload: IdPayload = serde_json::from_value(frame.data)
                .map_err(|e| format!("bad notificationDeleted payload: {e}"))?;
            SocketEvent::NotificationDeleted { id: payload.id }
        }
        "error" => SocketEvent::Error(crate::types::notification::display_text(&frame.data)),
        other => return Ok(ParsedFrame::Ignored(other.to_owned())),
    };

    Ok(ParsedFrame::Event(event))
}

// ---------------------------------------------------------------------------
// Outbound intents
// ---------------------------------------------------------------------------

/// Fire-and-forget intents sent back over the socket. The REST path is
/// the authoritative mutation; these only let the server fan out to other
/// sessions faster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketIntent {
    MarkRead { id: String },
    MarkImportant { id: String, is_important: bool },
    Delete { id: String },
}

impl SocketIntent {
    pub(crate) fn to_frame(&self) -> String {
        let frame = match self {
            Self::MarkRead { id } => json!({
                "event": "markRead",
                "data": { "id": id },
            }),
            Self::MarkImportant { id, is_important } => json!({
                "event": "markImportant",
                "data": { "id": id, "isImportant": is_important },
            }),
            Self::Delete { id } => json!({
                "event": "delete",
                "data": { "id": id },
            }),
        };
        frame.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_new_notification() {
        let text = r#"{
            "event": "newNotification",
            "data": {
                "id": "n1",
                "type": "reward_earned",
                "title": "Reward earned",
                "message": "You earned 50 points",
                "createdAt": "2026-01-04T10:00:00Z"
            }
        }"#;
        match parse_frame(text) {
            Ok(ParsedFrame::Event(SocketEvent::NewNotification(n))) => {
                assert_eq!(n.id, "n1");
                assert_eq!(n.title, "Reward earned");
            }
            _ => panic!("expected NewNotification"),
        }
    }

    #[test]
    fn parses_importance_change() {
        let text = r#"{"event": "notificationImportant", "data": {"id": "n2", "isImportant": true}}"#;
        match parse_frame(text) {
            Ok(ParsedFrame::Event(SocketEvent::ImportanceChanged { id, is_important })) => {
                assert_eq!(id, "n2");
                assert!(is_important);
            }
            _ => panic!("expected ImportanceChanged"),
        }
    }

    #[test]
    fn unknown_event_is_ignored_not_fatal() {
        let text = r#"{"event": "serverGossip", "data": {}}"#;
        assert!(matches!(
            parse_frame(text),
            Ok(ParsedFrame::Ignored(name)) if name == "serverGossip"
        ));
    }

    #[test]
    fn malformed_frame_is_an_error() {
        assert!(parse_frame("not json").is_err());
        assert!(parse_frame(r#"{"event": "newNotification", "data": {"nope": 1}}"#).is_err());
    }

    #[test]
    fn intents_serialize_to_frames() {
        let frame = SocketIntent::MarkImportant {
            id: "n3".to_owned(),
            is_important: false,
        }
        .to_frame();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["event"], "markImportant");
        assert_eq!(value["data"]["id"], "n3");
        assert_eq!(value["data"]["isImportant"], false);
    }
}
