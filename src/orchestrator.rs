//! Intent-level façade over the store plus the pure display helpers.
//!
//! Presentation layers talk to this module and never to the transport:
//! the store methods are re-exported with their contracts unchanged, and
//! the helpers are pure functions of their inputs — no network, no
//! mutation, unit-testable in isolation.

use chrono::{DateTime, NaiveTime, Timelike, Utc};

use crate::api::{ApiError, FilterQuery};
use crate::store::{InitialLoad, NotificationStore, StoreSnapshot, SubscriptionId};
use crate::types::{
    Category, Channel, FrequencyPrefs, Notification, NotificationKind, NotificationStats,
    Preferences, Priority, QuietHours,
};

// ---------------------------------------------------------------------------
// Façade
// ---------------------------------------------------------------------------

/// Thin wrapper owning the store. Each method forwards 1:1; the value of
/// the layer is the stable surface and the derived helpers below.
pub struct Orchestrator {
    store: NotificationStore,
}

impl Orchestrator {
    pub fn new(store: NotificationStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn notifications(&self) -> &[Notification] {
        self.store.notifications()
    }

    pub fn preferences(&self) -> &Preferences {
        self.store.preferences()
    }

    pub fn subscribe(
        &mut self,
        callback: impl Fn(&StoreSnapshot) + Send + 'static,
    ) -> SubscriptionId {
        self.store.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    pub async fn load_initial(&mut self, limit: u32) -> InitialLoad {
        self.store.load_initial(limit).await
    }

    pub async fn refresh(&mut self, limit: u32) -> Result<u64, ApiError> {
        self.store.refresh(limit).await
    }

    pub async fn fetch(&mut self, page: u32, limit: u32) -> Result<u64, ApiError> {
        self.store.fetch(page, limit).await
    }

    pub async fn fetch_filtered(&self, query: &FilterQuery) -> Result<Vec<Notification>, ApiError> {
        self.store.fetch_filtered(query).await
    }

    pub async fn search(&self, q: &str) -> Result<Vec<Notification>, ApiError> {
        self.store.search(q).await
    }

    pub async fn fetch_stats(&self) -> Result<NotificationStats, ApiError> {
        self.store.fetch_stats().await
    }

    pub async fn fetch_important(&self) -> Result<Vec<Notification>, ApiError> {
        self.store.fetch_important().await
    }

    pub async fn fetch_by_category(
        &self,
        category: Category,
    ) -> Result<Vec<Notification>, ApiError> {
        self.store.fetch_by_category(category).await
    }

    pub async fn fetch_unread_count(&self) -> Result<u64, ApiError> {
        self.store.fetch_unread_count().await
    }

    pub async fn fetch_preferences(&mut self) -> Result<(), ApiError> {
        self.store.fetch_preferences().await
    }

    pub async fn mark_as_read(&mut self, id: &str) -> Result<(), ApiError> {
        self.store.mark_read(id).await
    }

    pub async fn mark_as_important(&mut self, id: &str, is_important: bool) -> Result<(), ApiError> {
        self.store.mark_important(id, is_important).await
    }

    pub async fn mark_all_as_read(&mut self) -> Result<(), ApiError> {
        self.store.mark_all_read().await
    }

    pub async fn delete_notification(&mut self, id: &str) -> Result<(), ApiError> {
        self.store.delete(id).await
    }

    pub async fn update_preferences(&mut self, prefs: &Preferences) -> Result<(), ApiError> {
        self.store.update_preferences(prefs).await
    }

    pub async fn set_kind_enabled(
        &mut self,
        kind: NotificationKind,
        channel: Channel,
        enabled: bool,
    ) -> Result<(), ApiError> {
        self.store.set_kind_enabled(kind, channel, enabled).await
    }

    pub async fn set_frequency(&mut self, frequency: &FrequencyPrefs) -> Result<(), ApiError> {
        self.store.set_frequency(frequency).await
    }

    pub async fn set_quiet_hours(&mut self, quiet_hours: &QuietHours) -> Result<(), ApiError> {
        self.store.set_quiet_hours(quiet_hours).await
    }

    pub async fn reset_preferences(&mut self) -> Result<(), ApiError> {
        self.store.reset_preferences().await
    }

    pub fn insert_local(&mut self, notification: Notification) -> bool {
        self.store.insert_local(notification)
    }
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

/// Display glyph for a notification kind. Unrecognized kinds get the
/// generic bell.
pub fn icon_for(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::PaymentReceived | NotificationKind::PaymentFailed => "\u{1f4b0}", // 💰
        NotificationKind::PointsExpiring => "\u{23f3}",                                     // ⏳
        NotificationKind::EventReminder
        | NotificationKind::EventRegistration
        | NotificationKind::EventCancelled => "\u{1f4c5}", // 📅
        NotificationKind::OrderConfirmed | NotificationKind::OrderShipped => "\u{1f4e6}",   // 📦
        NotificationKind::RewardEarned | NotificationKind::RewardRedeemed => "\u{1f381}",   // 🎁
        NotificationKind::AchievementUnlocked => "\u{1f3c6}",                               // 🏆
        NotificationKind::FriendActivity => "\u{1f465}",                                    // 👥
        NotificationKind::Announcement => "\u{1f4e3}",                                      // 📣
        NotificationKind::SecurityAlert => "\u{1f512}",                                     // 🔒
        NotificationKind::Unknown => "\u{1f514}",                                           // 🔔
    }
}

/// Display hint for a priority. The parse layer folds unrecognized
/// priorities into `Medium`, so the medium hint is the effective default.
pub fn color_class_for(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "cyan",
        Priority::Medium => "yellow",
        Priority::High => "magenta",
        Priority::Urgent => "red",
    }
}

/// Coarse relative age for list rows: "Just now" under an hour, hours
/// under a day, "Yesterday" under two, then a plain date. Clock skew
/// (timestamps slightly in the future) clamps to "Just now".
pub fn relative_time(timestamp: DateTime<Utc>) -> String {
    relative_time_at(timestamp, Utc::now())
}

fn relative_time_at(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);
    let hours = elapsed.num_hours();
    if hours < 1 {
        return "Just now".to_owned();
    }
    if hours < 24 {
        return format!("{hours}h ago");
    }
    if hours < 48 {
        return "Yesterday".to_owned();
    }
    timestamp.format("%b %-d, %Y").to_string()
}

/// Whether a notification should be surfaced in-app at all.
///
/// False when the in-app channel is off, or when the kind carries an
/// explicit `false` entry. A `true` entry and no entry both mean
/// deliverable — default-allow.
pub fn should_deliver(notification: &Notification, prefs: &Preferences) -> bool {
    if !prefs.in_app.enabled {
        return false;
    }
    prefs
        .in_app
        .kinds
        .get(notification.kind.as_str())
        .copied()
        .unwrap_or(true)
}

/// Whether the local clock currently falls inside the quiet window.
pub fn is_quiet_now(quiet_hours: &QuietHours) -> bool {
    is_quiet_at(quiet_hours, chrono::Local::now().time())
}

/// Minute-of-day membership check, closed on both ends. A window whose
/// start is after its end wraps midnight: [start, 1440) ∪ [0, end].
/// Disabled or unparseable windows are never quiet.
pub fn is_quiet_at(quiet_hours: &QuietHours, time: NaiveTime) -> bool {
    if !quiet_hours.enabled {
        return false;
    }
    let (Some(start), Some(end)) = (
        minutes_of_day(&quiet_hours.start_time),
        minutes_of_day(&quiet_hours.end_time),
    ) else {
        tracing::warn!(
            "unparseable quiet-hours window {:?}..{:?}",
            quiet_hours.start_time,
            quiet_hours.end_time
        );
        return false;
    };
    let current = time.hour() * 60 + time.minute();
    if start <= end {
        current >= start && current <= end
    } else {
        current >= start || current <= end
    }
}

/// Parse `"HH:MM"` to minutes since midnight.
fn minutes_of_day(text: &str) -> Option<u32> {
    let (hours, minutes) = text.split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Unread badge text for the bell icon, capped at "99+".
pub fn badge_label(unread_count: u64) -> String {
    if unread_count > 99 {
        "99+".to_owned()
    } else {
        unread_count.to_string()
    }
}
