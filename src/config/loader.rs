use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::types::AppConfig;

/// Discover and load the app config.
///
/// Priority:
/// 1. `--config` flag (explicit path)
/// 2. `$REWARDS_NOTIFY_CONFIG` environment variable
/// 3. `$XDG_CONFIG_HOME/rewards-notify/config.toml`
/// 4. `~/.config/rewards-notify/config.toml`
///
/// No config found means defaults (a localhost server).
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit_path {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("parsing TOML from {}", path.display()))?;
        return Ok(config);
    }

    let Some(path) = find_config() else {
        return Ok(AppConfig::default());
    };
    let contents =
        std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML from {}", path.display()))?;
    Ok(config)
}

/// Default location of the cross-instance sync marker:
/// `$XDG_STATE_HOME/rewards-notify/sync.stamp`, falling back to
/// `~/.local/state/rewards-notify/sync.stamp`.
pub fn default_marker_path() -> PathBuf {
    if let Ok(state) = std::env::var("XDG_STATE_HOME")
        && !state.is_empty()
    {
        return PathBuf::from(state).join("rewards-notify/sync.stamp");
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".local/state/rewards-notify/sync.stamp")
}

fn find_config() -> Option<PathBuf> {
    // $REWARDS_NOTIFY_CONFIG
    if let Ok(path) = std::env::var("REWARDS_NOTIFY_CONFIG") {
        let p = PathBuf::from(&path);
        if p.is_file() {
            return Some(p);
        }
    }

    // $XDG_CONFIG_HOME/rewards-notify/config.toml
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let p = PathBuf::from(xdg).join("rewards-notify/config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    // ~/.config/rewards-notify/config.toml
    if let Some(home) = home_dir() {
        let p = home.join(".config/rewards-notify/config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    None
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
base_url = "https://rewards.campus.edu"

[sync]
poll_interval_ms = 250

[defaults]
page_limit = 20
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.server.base_url, "https://rewards.campus.edu");
        assert_eq!(config.sync.poll_interval_ms, 250);
        assert_eq!(config.defaults.page_limit, 20);
        // Unspecified sections keep their defaults.
        assert!(config.sync.enabled);
        assert_eq!(config.server.socket_path, "/socket");
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "server = not toml").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }
}
