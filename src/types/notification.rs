use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Notification enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PaymentReceived,
    PaymentFailed,
    PointsExpiring,
    EventReminder,
    EventRegistration,
    EventCancelled,
    OrderConfirmed,
    OrderShipped,
    RewardEarned,
    RewardRedeemed,
    AchievementUnlocked,
    FriendActivity,
    Announcement,
    SecurityAlert,
    #[serde(other)]
    #[default]
    Unknown,
}

impl NotificationKind {
    /// Stable wire name, also used as the key in per-kind preference maps.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PaymentReceived => "payment_received",
            Self::PaymentFailed => "payment_failed",
            Self::PointsExpiring => "points_expiring",
            Self::EventReminder => "event_reminder",
            Self::EventRegistration => "event_registration",
            Self::EventCancelled => "event_cancelled",
            Self::OrderConfirmed => "order_confirmed",
            Self::OrderShipped => "order_shipped",
            Self::RewardEarned => "reward_earned",
            Self::RewardRedeemed => "reward_redeemed",
            Self::AchievementUnlocked => "achievement_unlocked",
            Self::FriendActivity => "friend_activity",
            Self::Announcement => "announcement",
            Self::SecurityAlert => "security_alert",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Payment,
    Event,
    Order,
    #[default]
    System,
    Social,
    Security,
    Achievement,
    #[serde(other)]
    Unknown,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Event => "event",
            Self::Order => "order",
            Self::System => "system",
            Self::Social => "social",
            Self::Security => "security",
            Self::Achievement => "achievement",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    // Unrecognized priorities fold into the middle of the scale rather than
    // failing the whole record.
    #[serde(other)]
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

// ---------------------------------------------------------------------------
// Notification record
// ---------------------------------------------------------------------------

/// A single notification as held in the client's canonical list.
///
/// Server-created records arrive via REST or the socket; ephemeral local
/// records (never persisted) are built client-side with a `local-` id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(deserialize_with = "coerce_display_text", default = "placeholder_text")]
    pub title: String,
    #[serde(deserialize_with = "coerce_display_text", default = "placeholder_text")]
    pub message: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_important: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_text: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Kind-specific payload (order id, event id, ...). Opaque to this layer.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl Notification {
    /// Restore the `read_at` iff `read` invariant on a record that crossed
    /// the trust boundary. Called once at ingestion.
    pub(crate) fn normalize(&mut self) {
        if self.read {
            if self.read_at.is_none() {
                self.read_at = Some(self.created_at);
            }
        } else {
            self.read_at = None;
        }
    }

    /// Transition to read, stamping `read_at` on the first transition only.
    pub(crate) fn mark_read(&mut self) {
        if !self.read {
            self.read = true;
            self.read_at = Some(Utc::now());
        }
    }

    /// True for records synthesized client-side and never sent to the server.
    pub fn is_local(&self) -> bool {
        self.id.starts_with("local-")
    }
}

// ---------------------------------------------------------------------------
// Display-text coercion
// ---------------------------------------------------------------------------

fn placeholder_text() -> String {
    "Notification".to_owned()
}

/// The server occasionally sends `title`/`message` as a nested object
/// instead of a string. Coerce once here so everything downstream can
/// assume strict strings.
fn coerce_display_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(display_text(&value))
}

/// Best-effort extraction: string as-is, then `.title`, `.message`, `.name`
/// inside objects, then the raw JSON text, then a placeholder for null.
pub(crate) fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => ["title", "message", "name"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map_or_else(|| value.to_string(), str::to_owned),
        Value::Null => placeholder_text(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_round_trips_through_wire_name() {
        let kind: NotificationKind = serde_json::from_value(json!("reward_earned")).unwrap();
        assert_eq!(kind, NotificationKind::RewardEarned);
        assert_eq!(kind.as_str(), "reward_earned");
    }

    #[test]
    fn unknown_kind_falls_back() {
        let kind: NotificationKind = serde_json::from_value(json!("carrier_pigeon")).unwrap();
        assert_eq!(kind, NotificationKind::Unknown);
    }

    #[test]
    fn unknown_priority_folds_to_medium() {
        let p: Priority = serde_json::from_value(json!("extreme")).unwrap();
        assert_eq!(p, Priority::Medium);
    }

    #[test]
    fn priority_orders_by_severity() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::High < Priority::Urgent);
    }

    #[test]
    fn display_text_passes_strings_through() {
        assert_eq!(display_text(&json!("Order shipped")), "Order shipped");
    }

    #[test]
    fn display_text_extracts_from_objects() {
        assert_eq!(display_text(&json!({"title": "Hi", "message": "ignored"})), "Hi");
        assert_eq!(display_text(&json!({"message": "Hello"})), "Hello");
        assert_eq!(display_text(&json!({"name": "Named"})), "Named");
    }

    #[test]
    fn display_text_stringifies_unextractable_values() {
        assert_eq!(display_text(&json!({"weird": 1})), r#"{"weird":1}"#);
        assert_eq!(display_text(&json!(42)), "42");
    }

    #[test]
    fn display_text_placeholder_for_null() {
        assert_eq!(display_text(&Value::Null), "Notification");
    }

    #[test]
    fn record_deserializes_with_object_title() {
        let n: Notification = serde_json::from_value(json!({
            "id": "n1",
            "type": "order_confirmed",
            "title": {"title": "Order #12"},
            "message": {"unexpected": true},
            "category": "order",
            "priority": "high",
            "createdAt": "2026-01-04T10:00:00Z",
        }))
        .unwrap();
        assert_eq!(n.title, "Order #12");
        assert_eq!(n.message, r#"{"unexpected":true}"#);
        assert_eq!(n.kind, NotificationKind::OrderConfirmed);
        assert!(!n.read);
    }

    #[test]
    fn normalize_enforces_read_at_invariant() {
        let mut n: Notification = serde_json::from_value(json!({
            "id": "n2",
            "title": "t",
            "message": "m",
            "read": true,
            "createdAt": "2026-01-04T10:00:00Z",
        }))
        .unwrap();
        n.normalize();
        assert!(n.read_at.is_some());

        n.read = false;
        n.normalize();
        assert!(n.read_at.is_none());
    }

    #[test]
    fn mark_read_stamps_once() {
        let mut n: Notification = serde_json::from_value(json!({
            "id": "n3",
            "title": "t",
            "message": "m",
            "createdAt": "2026-01-04T10:00:00Z",
        }))
        .unwrap();
        n.mark_read();
        let first = n.read_at;
        assert!(first.is_some());
        n.mark_read();
        assert_eq!(n.read_at, first);
    }
}
