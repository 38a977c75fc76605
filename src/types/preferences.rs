use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Delivery channels
// ---------------------------------------------------------------------------

/// Delivery channels the preference endpoints understand. Push delivery is
/// carried in the data model but never acted on by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    InApp,
    Push,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InApp => "inApp",
            Self::Push => "push",
        }
    }
}

/// Per-channel settings: a master switch plus explicit per-kind opt-outs.
///
/// Absence of a kind entry means enabled — only an explicit `false`
/// disables delivery for that kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPrefs {
    pub enabled: bool,
    #[serde(default, rename = "types", skip_serializing_if = "BTreeMap::is_empty")]
    pub kinds: BTreeMap<String, bool>,
}

impl ChannelPrefs {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            kinds: BTreeMap::new(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            kinds: BTreeMap::new(),
        }
    }
}

impl Default for ChannelPrefs {
    fn default() -> Self {
        Self::disabled()
    }
}

// ---------------------------------------------------------------------------
// Frequency
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyMode {
    #[default]
    Instant,
    Digest,
    Weekly,
}

/// Delivery cadence. Exactly one mode is active; the digest/weekly fields
/// are preserved but ignored while their mode is not selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyPrefs {
    #[serde(rename = "type", default)]
    pub mode: FrequencyMode,
    /// Time of day for digest delivery, `"HH:MM"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest_time: Option<String>,
    /// Day of week for weekly delivery, e.g. `"monday"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_day: Option<String>,
}

// ---------------------------------------------------------------------------
// Quiet hours
// ---------------------------------------------------------------------------

/// A daily do-not-disturb window. `start_time > end_time` means the window
/// wraps midnight (e.g. 22:00 to 06:00).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuietHours {
    pub enabled: bool,
    /// `"HH:MM"`, 24-hour clock.
    pub start_time: String,
    /// `"HH:MM"`, 24-hour clock.
    pub end_time: String,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            enabled: false,
            start_time: "22:00".to_owned(),
            end_time: "08:00".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Preferences record
// ---------------------------------------------------------------------------

/// Per-user delivery configuration, fetched once at startup and replaced
/// wholesale (or per-section) by the preference endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub in_app: ChannelPrefs,
    pub push: ChannelPrefs,
    pub frequency: FrequencyPrefs,
    pub quiet_hours: QuietHours,
}

impl Default for Preferences {
    /// The safe fallback shape: in-app on, push off.
    fn default() -> Self {
        Self {
            in_app: ChannelPrefs::enabled(),
            push: ChannelPrefs::disabled(),
            frequency: FrequencyPrefs::default(),
            quiet_hours: QuietHours::default(),
        }
    }
}

impl Preferences {
    pub fn channel(&self, channel: Channel) -> &ChannelPrefs {
        match channel {
            Channel::InApp => &self.in_app,
            Channel::Push => &self.push,
        }
    }
}
