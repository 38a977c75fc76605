use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};

use crate::api::ApiClient;
use crate::orchestrator::{self, Orchestrator};
use crate::socket::{SocketClient, SocketEvent, SocketIntent};
use crate::store::NotificationStore;
use crate::types::Notification;

use super::interface::{CenterHandle, CenterSnapshot, Command, LocalNotification};
use super::sync::SyncMarker;

/// How often the sync marker is polled for foreign writes.
const DEFAULT_SYNC_POLL: Duration = Duration::from_millis(1000);

/// Page size for the list fetches issued by init and refresh.
const DEFAULT_PAGE_LIMIT: u32 = 50;

/// The process-wide shared notification state.
///
/// Owns the orchestrator (and through it the store) on a background
/// task: commands come in over a channel, snapshots fan out over a watch
/// channel to every UI consumer. One instance per session, started from
/// the composition root.
///
/// Three external signals funnel into the same `refresh()`: socket
/// new/updated events, the in-process `CenterHandle::refresh`, and
/// foreign writes to the cross-instance sync marker. Refresh is a full
/// replace from the server, so redundant triggers are harmless.
///
/// When the loop exits (explicit shutdown or last handle dropped), any
/// late-arriving responses are dropped with it — nothing is ever applied
/// to torn-down state.
pub struct NotificationCenter {
    orchestrator: Orchestrator,
    socket: Option<SocketClient>,
    socket_events: Option<broadcast::Receiver<SocketEvent>>,
    sync: Option<SyncMarker>,
    sync_poll: Duration,
    page_limit: u32,
}

impl NotificationCenter {
    pub fn new(api: ApiClient) -> Self {
        Self {
            orchestrator: Orchestrator::new(NotificationStore::new(api)),
            socket: None,
            socket_events: None,
            sync: None,
            sync_poll: DEFAULT_SYNC_POLL,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    /// Attach the real-time transport. The center connects it on start
    /// and bridges its events into refreshes.
    pub fn with_socket(mut self, socket: SocketClient) -> Self {
        self.socket_events = Some(socket.subscribe());
        self.socket = Some(socket);
        self
    }

    /// Attach a bare event stream without a transport — for tests and
    /// alternate transports.
    pub fn with_socket_events(mut self, events: broadcast::Receiver<SocketEvent>) -> Self {
        self.socket_events = Some(events);
        self
    }

    /// Enable cross-instance sync through the marker file at `path`.
    pub fn with_sync_marker(mut self, path: impl Into<PathBuf>) -> Self {
        self.sync = Some(SyncMarker::new(path.into()));
        self
    }

    pub fn with_sync_poll_interval(mut self, interval: Duration) -> Self {
        self.sync_poll = interval;
        self
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit;
        self
    }

    /// Spawn the run loop on the current tokio runtime and queue the
    /// initial load. The returned handle is the only way in.
    pub fn start(self) -> CenterHandle {
        let (tx, rx) = mpsc::unbounded_channel::<Command>();
        let (watch_tx, watch_rx) = watch::channel(CenterSnapshot::default());
        let handle = CenterHandle::new(tx.clone(), watch_rx);
        let _ = tx.send(Command::Init);
        tokio::spawn(self.run_loop(rx, watch_tx));
        handle
    }

    async fn run_loop(
        mut self,
        mut rx: mpsc::UnboundedReceiver<Command>,
        watch_tx: watch::Sender<CenterSnapshot>,
    ) {
        if let Some(socket) = &mut self.socket
            && let Err(e) = socket.connect().await
        {
            tracing::warn!("center: socket connect failed: {e}");
        }
        let mut socket_rx = self.socket_events.take();

        let mut sync_tick = tokio::time::interval(self.sync_poll);
        // Consume the first immediate tick so polling starts after one
        // full interval.
        sync_tick.tick().await;

        let mut snap = CenterSnapshot::default();
        let mut initialized = false;

        loop {
            tokio::select! {
                biased;
                maybe_cmd = rx.recv() => {
                    match maybe_cmd {
                        None | Some(Command::Shutdown) => {
                            tracing::debug!("center: shutting down");
                            break;
                        }
                        Some(cmd) => {
                            self.handle_command(cmd, &mut snap, &mut initialized, &watch_tx).await;
                        }
                    }
                }
                event = recv_socket(&mut socket_rx) => {
                    match event {
                        Some(event) => self.handle_socket_event(event, &mut snap, &watch_tx).await,
                        None => socket_rx = None,
                    }
                }
                _ = sync_tick.tick() => {
                    let foreign = self
                        .sync
                        .as_mut()
                        .is_some_and(SyncMarker::poll_foreign_change);
                    if foreign {
                        tracing::debug!("center: sync marker changed, refreshing");
                        self.do_refresh(&mut snap, &watch_tx).await;
                    }
                }
            }
        }

        if let Some(socket) = &mut self.socket {
            socket.disconnect();
        }
    }

    // -----------------------------------------------------------------------
    // Command dispatch
    // -----------------------------------------------------------------------

    async fn handle_command(
        &mut self,
        command: Command,
        snap: &mut CenterSnapshot,
        initialized: &mut bool,
        watch_tx: &watch::Sender<CenterSnapshot>,
    ) {
        match command {
            Command::Init => {
                if *initialized {
                    tracing::debug!("center: init ignored, already running");
                    return;
                }
                *initialized = true;
                snap.loading = true;
                publish(watch_tx, snap);

                let load = self.orchestrator.load_initial(self.page_limit).await;
                snap.notifications = self.orchestrator.notifications().to_vec();
                snap.preferences = self.orchestrator.preferences().clone();
                snap.unread_count = load.unread_count;
                snap.stats = load.stats;
                snap.loading = false;
                publish(watch_tx, snap);
            }

            Command::Refresh => {
                self.do_refresh(snap, watch_tx).await;
            }

            Command::MarkAsRead { id } => {
                let was_unread = self
                    .orchestrator
                    .store()
                    .notification(&id)
                    .is_some_and(|n| !n.read);
                match self.orchestrator.mark_as_read(&id).await {
                    Ok(()) => {
                        snap.notifications = self.orchestrator.notifications().to_vec();
                        if was_unread {
                            snap.unread_count = snap.unread_count.saturating_sub(1);
                        }
                        self.emit(SocketIntent::MarkRead { id });
                        self.touch_marker();
                    }
                    Err(e) => {
                        tracing::warn!("center: mark read failed: {e}");
                        snap.error = Some(e.to_string());
                    }
                }
                publish(watch_tx, snap);
            }

            Command::MarkAsImportant { id, is_important } => {
                match self.orchestrator.mark_as_important(&id, is_important).await {
                    Ok(()) => {
                        snap.notifications = self.orchestrator.notifications().to_vec();
                        self.emit(SocketIntent::MarkImportant { id, is_important });
                        self.touch_marker();
                    }
                    Err(e) => {
                        tracing::warn!("center: mark important failed: {e}");
                        snap.error = Some(e.to_string());
                    }
                }
                publish(watch_tx, snap);
            }

            Command::MarkAllAsRead => {
                match self.orchestrator.mark_all_as_read().await {
                    Ok(()) => {
                        snap.notifications = self.orchestrator.notifications().to_vec();
                        snap.unread_count = 0;
                        self.touch_marker();
                    }
                    Err(e) => {
                        tracing::warn!("center: mark all read failed: {e}");
                        snap.error = Some(e.to_string());
                    }
                }
                publish(watch_tx, snap);
            }

            Command::DeleteNotification { id } => {
                let was_unread = self
                    .orchestrator
                    .store()
                    .notification(&id)
                    .is_some_and(|n| !n.read);
                match self.orchestrator.delete_notification(&id).await {
                    Ok(()) => {
                        snap.notifications = self.orchestrator.notifications().to_vec();
                        if was_unread {
                            snap.unread_count = snap.unread_count.saturating_sub(1);
                        }
                        self.emit(SocketIntent::Delete { id });
                        self.touch_marker();
                    }
                    Err(e) => {
                        tracing::warn!("center: delete failed: {e}");
                        snap.error = Some(e.to_string());
                    }
                }
                publish(watch_tx, snap);
            }

            Command::ShowLocalNotification { title, details } => {
                self.show_local(title, details, snap, watch_tx);
            }

            Command::UpdatePreferences(prefs) => {
                let result = self.orchestrator.update_preferences(&prefs).await;
                self.finish_preference_update(result, snap, watch_tx);
            }

            Command::SetKindEnabled {
                kind,
                channel,
                enabled,
            } => {
                let result = self
                    .orchestrator
                    .set_kind_enabled(kind, channel, enabled)
                    .await;
                self.finish_preference_update(result, snap, watch_tx);
            }

            Command::SetFrequency(frequency) => {
                let result = self.orchestrator.set_frequency(&frequency).await;
                self.finish_preference_update(result, snap, watch_tx);
            }

            Command::SetQuietHours(quiet_hours) => {
                let result = self.orchestrator.set_quiet_hours(&quiet_hours).await;
                self.finish_preference_update(result, snap, watch_tx);
            }

            Command::ResetPreferences => {
                let result = self.orchestrator.reset_preferences().await;
                self.finish_preference_update(result, snap, watch_tx);
            }

            Command::ReconnectSocket => {
                if let Some(socket) = &mut self.socket
                    && let Err(e) = socket.reconnect().await
                {
                    tracing::warn!("center: reconnect failed: {e}");
                }
            }

            Command::ClearError => {
                snap.error = None;
                publish(watch_tx, snap);
            }

            Command::Shutdown => unreachable!("handled at run_loop level"),
        }
    }

    // -----------------------------------------------------------------------
    // Socket bridge
    // -----------------------------------------------------------------------

    async fn handle_socket_event(
        &mut self,
        event: SocketEvent,
        snap: &mut CenterSnapshot,
        watch_tx: &watch::Sender<CenterSnapshot>,
    ) {
        match event {
            SocketEvent::NewNotification(n) => {
                tracing::debug!("center: socket pushed notification {}", n.id);
                self.do_refresh(snap, watch_tx).await;
            }
            SocketEvent::NotificationUpdated(n) => {
                tracing::debug!("center: socket updated notification {}", n.id);
                self.do_refresh(snap, watch_tx).await;
            }
            SocketEvent::Connected => {
                tracing::info!("center: socket connected");
            }
            SocketEvent::Disconnected { reason } => {
                tracing::info!("center: socket disconnected: {reason}");
            }
            SocketEvent::Error(message) => {
                // Non-fatal; the REST path keeps working without the socket.
                tracing::warn!("center: socket error: {message}");
            }
            SocketEvent::NotificationRead { .. }
            | SocketEvent::ImportanceChanged { .. }
            | SocketEvent::NotificationDeleted { .. } => {
                // Per-field echoes of our own emits or other sessions'
                // actions; the sync marker / next refresh covers them.
                tracing::debug!("center: ignoring per-field socket echo");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn do_refresh(&mut self, snap: &mut CenterSnapshot, watch_tx: &watch::Sender<CenterSnapshot>) {
        match self.orchestrator.refresh(self.page_limit).await {
            Ok(unread_count) => {
                snap.notifications = self.orchestrator.notifications().to_vec();
                snap.unread_count = unread_count;
                snap.error = None;
            }
            Err(e) => {
                tracing::warn!("center: refresh failed: {e}");
                snap.error = Some(e.to_string());
            }
        }
        publish(watch_tx, snap);
    }

    fn show_local(
        &mut self,
        title: String,
        details: LocalNotification,
        snap: &mut CenterSnapshot,
        watch_tx: &watch::Sender<CenterSnapshot>,
    ) {
        let quiet_hours = &self.orchestrator.preferences().quiet_hours;
        if orchestrator::is_quiet_now(quiet_hours) {
            tracing::debug!("center: local notification suppressed by quiet hours");
            return;
        }

        let id = details
            .id
            .unwrap_or_else(|| format!("local-{}", uuid::Uuid::new_v4()));
        let notification = Notification {
            id,
            kind: details.kind,
            title,
            message: details.message,
            category: details.category,
            priority: details.priority,
            read: false,
            read_at: None,
            is_important: false,
            action_url: details.action_url,
            action_text: details.action_text,
            created_at: chrono::Utc::now(),
            data: serde_json::Value::Null,
        };

        if self.orchestrator.insert_local(notification) {
            snap.notifications = self.orchestrator.notifications().to_vec();
            snap.unread_count += 1;
            publish(watch_tx, snap);
        }
    }

    fn finish_preference_update(
        &mut self,
        result: Result<(), crate::api::ApiError>,
        snap: &mut CenterSnapshot,
        watch_tx: &watch::Sender<CenterSnapshot>,
    ) {
        match result {
            Ok(()) => {
                snap.preferences = self.orchestrator.preferences().clone();
            }
            Err(e) => {
                tracing::warn!("center: preference update failed: {e}");
                snap.error = Some(e.to_string());
            }
        }
        publish(watch_tx, snap);
    }

    fn emit(&self, intent: SocketIntent) {
        if let Some(socket) = &self.socket {
            socket.emit(intent);
        }
    }

    fn touch_marker(&mut self) {
        if let Some(marker) = &mut self.sync {
            marker.touch();
        }
    }
}

fn publish(watch_tx: &watch::Sender<CenterSnapshot>, snap: &CenterSnapshot) {
    // Ignore errors: no receivers just means nobody is watching yet.
    let _ = watch_tx.send(snap.clone());
}

/// Resolve the next socket event, pending forever once the stream is
/// gone so the select arm simply never fires.
async fn recv_socket(rx: &mut Option<broadcast::Receiver<SocketEvent>>) -> Option<SocketEvent> {
    match rx {
        Some(rx) => loop {
            match rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("center: socket event stream lagged, skipped {skipped}");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        },
        None => std::future::pending().await,
    }
}
