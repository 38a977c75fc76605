use serde_json::json;

use crate::api::client::{ApiClient, ApiError};
use crate::types::{Channel, FrequencyPrefs, NotificationKind, Preferences, QuietHours};

/// `GET /preferences`.
pub async fn fetch(client: &ApiClient) -> Result<Preferences, ApiError> {
    client.get("/preferences", &[]).await
}

/// `PUT /preferences` — full replace. Returns the server's updated record.
pub async fn replace(client: &ApiClient, prefs: &Preferences) -> Result<Preferences, ApiError> {
    client.put("/preferences", prefs).await
}

/// `PUT /preferences/type` — toggle one kind on one channel.
pub async fn set_kind(
    client: &ApiClient,
    kind: NotificationKind,
    channel: Channel,
    enabled: bool,
) -> Result<Preferences, ApiError> {
    let body = json!({
        "type": kind.as_str(),
        "channel": channel.as_str(),
        "enabled": enabled,
    });
    client.put("/preferences/type", &body).await
}

/// `PUT /preferences/frequency`.
pub async fn set_frequency(
    client: &ApiClient,
    frequency: &FrequencyPrefs,
) -> Result<Preferences, ApiError> {
    client.put("/preferences/frequency", frequency).await
}

/// `PUT /preferences/quiet-hours`.
pub async fn set_quiet_hours(
    client: &ApiClient,
    quiet_hours: &QuietHours,
) -> Result<Preferences, ApiError> {
    client.put("/preferences/quiet-hours", quiet_hours).await
}

/// `POST /preferences/reset` — back to server defaults.
pub async fn reset(client: &ApiClient) -> Result<Preferences, ApiError> {
    client.post("/preferences/reset").await
}
