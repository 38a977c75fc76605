use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use super::events::{ParsedFrame, SocketEvent, SocketIntent, parse_frame};

/// Delay between teardown and reconnect in [`SocketClient::reconnect`].
/// Reconnection is manual by design — there is no backoff loop.
const RECONNECT_DELAY: Duration = Duration::from_millis(500);

/// Capacity of the local event fan-out. Slow subscribers lag rather than
/// block the reader.
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    /// Failed to establish the WebSocket connection.
    #[error("connection error: {0}")]
    Connection(String),
}

/// One live connection: the outbound frame queue plus the tasks pumping
/// both directions. `alive` flips false when the reader exits, so a stale
/// handle is never mistaken for a working connection.
struct Connection {
    outbound: mpsc::UnboundedSender<Message>,
    alive: Arc<AtomicBool>,
    reader: tokio::task::JoinHandle<()>,
}

/// Client for the notification server's real-time channel.
///
/// Maintains at most one authenticated duplex connection. Local
/// subscribers get typed [`SocketEvent`]s through a broadcast channel and
/// never touch the underlying stream; outbound [`SocketIntent`]s are
/// fire-and-forget and silently dropped while disconnected (the REST path
/// is the authoritative mutation).
pub struct SocketClient {
    ws_url: String,
    token: Option<String>,
    events: broadcast::Sender<SocketEvent>,
    conn: Option<Connection>,
}

impl SocketClient {
    /// `ws_url` is the full endpoint, e.g. `wss://rewards.example.edu/socket`.
    /// Without a token, [`connect`](Self::connect) is a no-op.
    pub fn new(ws_url: impl Into<String>, token: Option<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            ws_url: ws_url.into(),
            token,
            events,
            conn: None,
        }
    }

    /// Subscribe to the typed event stream. Valid before or after
    /// `connect`; receivers survive reconnects.
    pub fn subscribe(&self) -> broadcast::Receiver<SocketEvent> {
        self.events.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.conn
            .as_ref()
            .is_some_and(|c| c.alive.load(Ordering::Relaxed))
    }

    /// Establish the connection. Idempotent: a live connection or a
    /// missing credential both make this a no-op.
    pub async fn connect(&mut self) -> Result<(), SocketError> {
        if self.is_connected() {
            tracing::debug!("socket: connect ignored, already connected");
            return Ok(());
        }
        let Some(token) = self.token.clone() else {
            tracing::debug!("socket: connect skipped, no credential");
            return Ok(());
        };
        // A dead connection may still be parked here; clear it first.
        self.teardown();

        let url = format!("{}?token={token}", self.ws_url);
        let (stream, _response) = match connect_async(&url).await {
            Ok(ok) => ok,
            Err(e) => {
                let message = format!("failed to connect to {}: {e}", self.ws_url);
                let _ = self.events.send(SocketEvent::Error(message.clone()));
                return Err(SocketError::Connection(message));
            }
        };
        tracing::info!("socket: connected to {}", self.ws_url);

        let (mut sink, mut source) = stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let alive = Arc::new(AtomicBool::new(true));

        // Writer: drains the outbound queue, closes the sink when every
        // sender is gone.
        tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                if let Err(e) = sink.send(msg).await {
                    tracing::debug!("socket: send failed: {e}");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        // Reader: parses frames into typed events until the stream ends.
        let events = self.events.clone();
        let reader_alive = Arc::clone(&alive);
        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => match parse_frame(&text) {
                        Ok(ParsedFrame::Event(event)) => {
                            let _ = events.send(event);
                        }
                        Ok(ParsedFrame::Ignored(name)) => {
                            tracing::debug!("socket: ignoring event {name:?}");
                        }
                        Err(message) => {
                            tracing::warn!("socket: {message}");
                            let _ = events.send(SocketEvent::Error(message));
                        }
                    },
                    Ok(Message::Close(close)) => {
                        let reason = close
                            .map(|f| f.reason.to_string())
                            .filter(|r| !r.is_empty())
                            .unwrap_or_else(|| "server closed".to_owned());
                        let _ = events.send(SocketEvent::Disconnected { reason });
                        break;
                    }
                    Ok(Message::Ping(_) | Message::Pong(_)) => {
                        // Handled by tungstenite.
                    }
                    Ok(Message::Binary(_) | Message::Frame(_)) => {
                        tracing::trace!("socket: ignoring non-text frame");
                    }
                    Err(e) => {
                        let message = e.to_string();
                        let _ = events.send(SocketEvent::Error(message.clone()));
                        let _ = events.send(SocketEvent::Disconnected { reason: message });
                        break;
                    }
                }
            }
            reader_alive.store(false, Ordering::Relaxed);
        });

        self.conn = Some(Connection {
            outbound,
            alive,
            reader,
        });
        let _ = self.events.send(SocketEvent::Connected);
        Ok(())
    }

    /// Tear down the connection and clear internal state. Safe to call
    /// when already disconnected.
    pub fn disconnect(&mut self) {
        if self.conn.is_some() {
            tracing::info!("socket: disconnecting");
        }
        self.teardown();
    }

    /// Manual reconnect: tear down, wait a fixed short delay, connect.
    pub async fn reconnect(&mut self) -> Result<(), SocketError> {
        self.disconnect();
        tokio::time::sleep(RECONNECT_DELAY).await;
        self.connect().await
    }

    /// Queue an outbound intent. Dropped silently when not connected —
    /// no error surfaces, the REST path remains the source of truth.
    pub fn emit(&self, intent: SocketIntent) {
        match &self.conn {
            Some(conn) if conn.alive.load(Ordering::Relaxed) => {
                let _ = conn
                    .outbound
                    .send(Message::Text(intent.to_frame()));
            }
            _ => {
                tracing::debug!("socket: emit dropped, not connected: {intent:?}");
            }
        }
    }

    fn teardown(&mut self) {
        if let Some(conn) = self.conn.take() {
            // Queue a close frame; the writer drains it before shutting
            // the sink. The reader is aborted directly.
            let _ = conn.outbound.send(Message::Close(None));
            conn.reader.abort();
            conn.alive.store(false, Ordering::Relaxed);
        }
    }
}

impl Drop for SocketClient {
    fn drop(&mut self) {
        self.teardown();
    }
}
