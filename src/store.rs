use std::collections::HashSet;

use crate::api::{self, ApiClient, ApiError, FilterQuery};
use crate::types::{
    Category, Channel, FrequencyPrefs, Notification, NotificationKind, NotificationStats,
    Preferences, QuietHours,
};

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// Handle returned by [`NotificationStore::subscribe`]; pass it back to
/// [`NotificationStore::unsubscribe`] to stop receiving snapshots.
pub type SubscriptionId = u64;

/// The state handed to subscribers after every settled mutation. Treat as
/// read-only — all intent goes back through store methods.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub notifications: Vec<Notification>,
    pub preferences: Preferences,
}

type Callback = Box<dyn Fn(&StoreSnapshot) + Send>;

// ---------------------------------------------------------------------------
// Initial load
// ---------------------------------------------------------------------------

/// Outcome of the four-way startup fetch. Branch failures have already
/// been replaced with safe defaults; only the values the store does not
/// own come back to the caller.
#[derive(Debug, Clone)]
pub struct InitialLoad {
    pub unread_count: u64,
    pub stats: NotificationStats,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Owner of the canonical client-side notification list and preferences.
///
/// All REST traffic goes through here. Mutations are server-confirmed:
/// the REST call runs first, and only an HTTP success applies the local
/// change and notifies subscribers — blind optimism would leave the
/// client permanently diverged on failure. No retries.
///
/// One instance per session, constructed at the composition root with an
/// injected [`ApiClient`].
pub struct NotificationStore {
    api: ApiClient,
    notifications: Vec<Notification>,
    preferences: Preferences,
    subscribers: Vec<(SubscriptionId, Callback)>,
    next_subscription: SubscriptionId,
}

impl NotificationStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            notifications: Vec::new(),
            preferences: Preferences::default(),
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn notification(&self, id: &str) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Unread count over the records currently held. Under pagination the
    /// server's `/unread-count` is the accurate figure; this is the local
    /// approximation.
    pub fn local_unread_count(&self) -> u64 {
        self.notifications.iter().filter(|n| !n.read).count() as u64
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Register a snapshot callback. Subscribers are invoked in
    /// subscription order, synchronously, exactly once per settled
    /// mutation.
    pub fn subscribe(&mut self, callback: impl Fn(&StoreSnapshot) + Send + 'static) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscriber. Returns false when the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    fn notify_subscribers(&self) {
        let snapshot = StoreSnapshot {
            notifications: self.notifications.clone(),
            preferences: self.preferences.clone(),
        };
        for (_, callback) in &self.subscribers {
            callback(&snapshot);
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Four-way concurrent startup fetch: list, unread count, preferences,
    /// stats. Branches are independent; each failure degrades to a safe
    /// default without failing the others.
    pub async fn load_initial(&mut self, limit: u32) -> InitialLoad {
        let (page, unread, prefs, stats) = tokio::join!(
            api::notifications::fetch_page(&self.api, 1, limit),
            api::notifications::fetch_unread_count(&self.api),
            api::preferences::fetch(&self.api),
            api::notifications::fetch_stats(&self.api),
        );

        let page_unread = page.as_ref().map(|p| p.unread_count).ok();
        match page {
            Ok(p) => self.replace_list(p.notifications),
            Err(e) => {
                tracing::warn!("store: initial list fetch failed: {e}");
                self.notifications.clear();
            }
        }

        // Prefer the dedicated endpoint; fall back to the page header,
        // then to the local count.
        let unread_count = match unread {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("store: unread-count fetch failed: {e}");
                page_unread.unwrap_or_else(|| self.local_unread_count())
            }
        };

        match prefs {
            Ok(p) => self.preferences = p,
            Err(e) => {
                tracing::warn!("store: preferences fetch failed: {e}");
                self.preferences = Preferences::default();
            }
        }

        let stats = match stats {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("store: stats fetch failed: {e}");
                NotificationStats::default()
            }
        };

        self.notify_subscribers();
        InitialLoad {
            unread_count,
            stats,
        }
    }

    /// Re-fetch the list and unread count together. The list failure is
    /// the caller's error; a failed unread branch falls back to the
    /// freshly fetched page's figure.
    pub async fn refresh(&mut self, limit: u32) -> Result<u64, ApiError> {
        let (page, unread) = tokio::join!(
            api::notifications::fetch_page(&self.api, 1, limit),
            api::notifications::fetch_unread_count(&self.api),
        );
        let page = page?;
        let unread_count = unread.unwrap_or(page.unread_count);
        self.replace_list(page.notifications);
        self.notify_subscribers();
        Ok(unread_count)
    }

    /// Fetch one page of the unfiltered list, replacing the main
    /// collection. Returns the server's unread count.
    pub async fn fetch(&mut self, page: u32, limit: u32) -> Result<u64, ApiError> {
        let response = api::notifications::fetch_page(&self.api, page, limit).await?;
        let unread_count = response.unread_count;
        self.replace_list(response.notifications);
        self.notify_subscribers();
        Ok(unread_count)
    }

    /// `GET /filtered` — fetch-and-return, the main collection is untouched.
    pub async fn fetch_filtered(&self, query: &FilterQuery) -> Result<Vec<Notification>, ApiError> {
        api::notifications::fetch_filtered(&self.api, query).await
    }

    /// `GET /search?q=` — fetch-and-return.
    pub async fn search(&self, q: &str) -> Result<Vec<Notification>, ApiError> {
        api::notifications::search(&self.api, q).await
    }

    /// `GET /stats` — fetch-and-return.
    pub async fn fetch_stats(&self) -> Result<NotificationStats, ApiError> {
        api::notifications::fetch_stats(&self.api).await
    }

    /// `GET /important` — fetch-and-return.
    pub async fn fetch_important(&self) -> Result<Vec<Notification>, ApiError> {
        api::notifications::fetch_important(&self.api).await
    }

    /// `GET /category/:category` — fetch-and-return.
    pub async fn fetch_by_category(&self, category: Category) -> Result<Vec<Notification>, ApiError> {
        api::notifications::fetch_by_category(&self.api, category).await
    }

    /// `GET /unread-count` — the authoritative figure under pagination.
    pub async fn fetch_unread_count(&self) -> Result<u64, ApiError> {
        api::notifications::fetch_unread_count(&self.api).await
    }

    /// `GET /preferences`, replacing the in-memory record.
    pub async fn fetch_preferences(&mut self) -> Result<(), ApiError> {
        let prefs = api::preferences::fetch(&self.api).await?;
        self.preferences = prefs;
        self.notify_subscribers();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Mutations (server-confirmed)
    // -----------------------------------------------------------------------

    pub async fn mark_read(&mut self, id: &str) -> Result<(), ApiError> {
        api::notifications::mark_read(&self.api, id).await?;
        if let Some(n) = self.notifications.iter_mut().find(|n| n.id == id) {
            n.mark_read();
        }
        self.notify_subscribers();
        Ok(())
    }

    pub async fn mark_important(&mut self, id: &str, is_important: bool) -> Result<(), ApiError> {
        api::notifications::mark_important(&self.api, id, is_important).await?;
        if let Some(n) = self.notifications.iter_mut().find(|n| n.id == id) {
            n.is_important = is_important;
        }
        self.notify_subscribers();
        Ok(())
    }

    pub async fn mark_all_read(&mut self) -> Result<(), ApiError> {
        api::notifications::mark_all_read(&self.api).await?;
        for n in &mut self.notifications {
            n.mark_read();
        }
        self.notify_subscribers();
        Ok(())
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), ApiError> {
        api::notifications::delete(&self.api, id).await?;
        self.notifications.retain(|n| n.id != id);
        self.notify_subscribers();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Preference mutations
    // -----------------------------------------------------------------------

    /// `PUT /preferences` — full replace.
    pub async fn update_preferences(&mut self, prefs: &Preferences) -> Result<(), ApiError> {
        let updated = api::preferences::replace(&self.api, prefs).await?;
        self.preferences = updated;
        self.notify_subscribers();
        Ok(())
    }

    /// Toggle one kind on one channel.
    pub async fn set_kind_enabled(
        &mut self,
        kind: NotificationKind,
        channel: Channel,
        enabled: bool,
    ) -> Result<(), ApiError> {
        let updated = api::preferences::set_kind(&self.api, kind, channel, enabled).await?;
        self.preferences = updated;
        self.notify_subscribers();
        Ok(())
    }

    pub async fn set_frequency(&mut self, frequency: &FrequencyPrefs) -> Result<(), ApiError> {
        let updated = api::preferences::set_frequency(&self.api, frequency).await?;
        self.preferences = updated;
        self.notify_subscribers();
        Ok(())
    }

    pub async fn set_quiet_hours(&mut self, quiet_hours: &QuietHours) -> Result<(), ApiError> {
        let updated = api::preferences::set_quiet_hours(&self.api, quiet_hours).await?;
        self.preferences = updated;
        self.notify_subscribers();
        Ok(())
    }

    pub async fn reset_preferences(&mut self) -> Result<(), ApiError> {
        let updated = api::preferences::reset(&self.api).await?;
        self.preferences = updated;
        self.notify_subscribers();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Local records
    // -----------------------------------------------------------------------

    /// Prepend an ephemeral client-side record. Duplicate ids are
    /// rejected — the list never holds the same identifier twice.
    pub fn insert_local(&mut self, notification: Notification) -> bool {
        if self.notifications.iter().any(|n| n.id == notification.id) {
            tracing::debug!(
                "store: duplicate local notification {} ignored",
                notification.id
            );
            return false;
        }
        self.notifications.insert(0, notification);
        self.notify_subscribers();
        true
    }

    /// Replace the main collection, deduplicating by id (socket pushes
    /// and REST refreshes can race the same record in).
    fn replace_list(&mut self, list: Vec<Notification>) {
        let mut seen = HashSet::with_capacity(list.len());
        let mut deduped = Vec::with_capacity(list.len());
        for n in list {
            if seen.insert(n.id.clone()) {
                deduped.push(n);
            } else {
                tracing::debug!("store: dropping duplicate notification {}", n.id);
            }
        }
        self.notifications = deduped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn test_store() -> NotificationStore {
        NotificationStore::new(ApiClient::new("http://127.0.0.1:0", "test-token"))
    }

    fn record(id: &str) -> Notification {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": "t",
            "message": "m",
            "createdAt": "2026-01-04T10:00:00Z",
        }))
        .unwrap()
    }

    #[test]
    fn subscribers_fire_in_subscription_order() {
        let mut store = test_store();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o1 = Arc::clone(&order);
        store.subscribe(move |_| o1.lock().unwrap().push(1));
        let o2 = Arc::clone(&order);
        store.subscribe(move |_| o2.lock().unwrap().push(2));

        store.insert_local(record("local-a"));
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut store = test_store();
        let count = Arc::new(Mutex::new(0));

        let c = Arc::clone(&count);
        let id = store.subscribe(move |_| *c.lock().unwrap() += 1);
        store.insert_local(record("local-a"));
        assert!(store.unsubscribe(id));
        store.insert_local(record("local-b"));

        assert_eq!(*count.lock().unwrap(), 1);
        assert!(!store.unsubscribe(id));
    }

    #[test]
    fn insert_local_rejects_duplicate_ids() {
        let mut store = test_store();
        assert!(store.insert_local(record("local-a")));
        assert!(!store.insert_local(record("local-a")));
        assert_eq!(store.notifications().len(), 1);
    }

    #[test]
    fn replace_list_dedups_by_id() {
        let mut store = test_store();
        store.replace_list(vec![record("a"), record("b"), record("a")]);
        assert_eq!(store.notifications().len(), 2);
        assert_eq!(store.notifications()[0].id, "a");
        assert_eq!(store.notifications()[1].id, "b");
    }

    #[test]
    fn local_unread_count_counts_unread_only() {
        let mut store = test_store();
        let mut read = record("a");
        read.mark_read();
        store.replace_list(vec![read, record("b"), record("c")]);
        assert_eq!(store.local_unread_count(), 2);
    }
}
