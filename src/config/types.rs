use std::path::PathBuf;

use serde::Deserialize;

/// Top-level app configuration, usually loaded from TOML.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub sync: SyncConfig,
    pub defaults: DefaultsConfig,
}

/// Where the notification server lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server origin, e.g. `https://rewards.example.edu`.
    pub base_url: String,
    /// Path of the real-time endpoint on the same host.
    pub socket_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_owned(),
            socket_path: "/socket".to_owned(),
        }
    }
}

impl ServerConfig {
    /// Derive the WebSocket endpoint from the HTTP origin.
    pub fn socket_url(&self) -> String {
        let ws_origin = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            format!("ws://{}", self.base_url)
        };
        format!("{}{}", ws_origin.trim_end_matches('/'), self.socket_path)
    }
}

/// Cross-instance sync settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    /// Override the marker file location; defaults to the state dir.
    pub marker_path: Option<PathBuf>,
    pub poll_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            marker_path: None,
            poll_interval_ms: 1000,
        }
    }
}

/// Knobs for list fetches.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub page_limit: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self { page_limit: 50 }
    }
}
