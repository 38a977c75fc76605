// config module — TOML discovery and the config types

pub mod loader;
pub mod types;

pub use loader::{default_marker_path, load_config};
pub use types::{AppConfig, DefaultsConfig, ServerConfig, SyncConfig};
