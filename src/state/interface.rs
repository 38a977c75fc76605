use tokio::sync::{mpsc, watch};

use crate::types::{
    Category, Channel, FrequencyPrefs, Notification, NotificationKind, NotificationStats,
    Preferences, Priority, QuietHours,
};

/// The process-wide notification state as seen by UI consumers.
///
/// Handed out read-only through the watch channel; all intent goes back
/// through [`CenterHandle`] actions.
#[derive(Debug, Clone)]
pub struct CenterSnapshot {
    pub notifications: Vec<Notification>,
    pub unread_count: u64,
    pub preferences: Preferences,
    pub stats: NotificationStats,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for CenterSnapshot {
    fn default() -> Self {
        Self {
            notifications: Vec::new(),
            unread_count: 0,
            preferences: Preferences::default(),
            stats: NotificationStats::default(),
            loading: true,
            error: None,
        }
    }
}

/// Details for an ephemeral, client-only notification. The id is
/// generated unless given explicitly (explicit ids enable dedup of
/// repeated feedback).
#[derive(Debug, Clone, Default)]
pub struct LocalNotification {
    pub id: Option<String>,
    pub message: String,
    pub kind: NotificationKind,
    pub category: Category,
    pub priority: Priority,
    pub action_url: Option<String>,
    pub action_text: Option<String>,
}

/// All operations UI consumers can send to the center.
pub enum Command {
    /// Run the four-way startup fetch. Duplicate init requests are
    /// no-ops.
    Init,
    /// Re-fetch the list and unread count only.
    Refresh,

    // -----------------------------------------------------------------------
    // Notification mutations
    // -----------------------------------------------------------------------
    MarkAsRead {
        id: String,
    },
    MarkAsImportant {
        id: String,
        is_important: bool,
    },
    MarkAllAsRead,
    DeleteNotification {
        id: String,
    },
    /// Synthesize an ephemeral local notification for immediate
    /// feedback. Never sent to the server.
    ShowLocalNotification {
        title: String,
        details: LocalNotification,
    },

    // -----------------------------------------------------------------------
    // Preference mutations
    // -----------------------------------------------------------------------
    UpdatePreferences(Box<Preferences>),
    SetKindEnabled {
        kind: NotificationKind,
        channel: Channel,
        enabled: bool,
    },
    SetFrequency(FrequencyPrefs),
    SetQuietHours(QuietHours),
    ResetPreferences,

    // -----------------------------------------------------------------------
    // Control
    // -----------------------------------------------------------------------
    /// Tear down and re-establish the socket connection.
    ReconnectSocket,
    /// Clear the error slot (the retry affordance usually pairs this
    /// with `Refresh`).
    ClearError,
    Shutdown,
}

/// Handle to the notification center held by UI consumers.
///
/// Cheaply cloneable. Sends are non-blocking; when the last handle is
/// dropped the command channel closes, signalling the center to shut
/// down.
#[derive(Clone)]
pub struct CenterHandle {
    tx: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<CenterSnapshot>,
}

impl CenterHandle {
    pub(super) fn new(
        tx: mpsc::UnboundedSender<Command>,
        snapshot: watch::Receiver<CenterSnapshot>,
    ) -> Self {
        Self { tx, snapshot }
    }

    /// Send a command to the center. Non-blocking — returns immediately.
    pub fn send(&self, command: Command) {
        // Ignore errors: if the receiver is gone the center has already
        // shut down.
        let _ = self.tx.send(command);
    }

    /// The current state. For change notifications use [`watch`](Self::watch).
    pub fn snapshot(&self) -> CenterSnapshot {
        self.snapshot.borrow().clone()
    }

    /// A watch receiver that resolves whenever the state changes.
    pub fn watch(&self) -> watch::Receiver<CenterSnapshot> {
        self.snapshot.clone()
    }

    // -----------------------------------------------------------------------
    // Convenience wrappers
    // -----------------------------------------------------------------------

    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    pub fn mark_as_read(&self, id: impl Into<String>) {
        self.send(Command::MarkAsRead { id: id.into() });
    }

    pub fn mark_as_important(&self, id: impl Into<String>, is_important: bool) {
        self.send(Command::MarkAsImportant {
            id: id.into(),
            is_important,
        });
    }

    pub fn mark_all_as_read(&self) {
        self.send(Command::MarkAllAsRead);
    }

    pub fn delete_notification(&self, id: impl Into<String>) {
        self.send(Command::DeleteNotification { id: id.into() });
    }

    pub fn show_local_notification(&self, title: impl Into<String>, details: LocalNotification) {
        self.send(Command::ShowLocalNotification {
            title: title.into(),
            details,
        });
    }

    pub fn update_preferences(&self, prefs: Preferences) {
        self.send(Command::UpdatePreferences(Box::new(prefs)));
    }

    pub fn set_kind_enabled(&self, kind: NotificationKind, channel: Channel, enabled: bool) {
        self.send(Command::SetKindEnabled {
            kind,
            channel,
            enabled,
        });
    }

    pub fn set_frequency(&self, frequency: FrequencyPrefs) {
        self.send(Command::SetFrequency(frequency));
    }

    pub fn set_quiet_hours(&self, quiet_hours: QuietHours) {
        self.send(Command::SetQuietHours(quiet_hours));
    }

    pub fn reset_preferences(&self) {
        self.send(Command::ResetPreferences);
    }

    pub fn reconnect_socket(&self) {
        self.send(Command::ReconnectSocket);
    }

    pub fn clear_error(&self) {
        self.send(Command::ClearError);
    }

    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }
}
