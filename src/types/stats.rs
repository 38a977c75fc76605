use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Aggregate counters from `GET /stats`. Zeroed when the fetch fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationStats {
    pub total: u64,
    pub unread: u64,
    pub important: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub by_category: BTreeMap<String, u64>,
}
