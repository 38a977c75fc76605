use serde::Deserialize;

use crate::api::client::{ApiClient, ApiError};
use crate::types::{Category, Notification, NotificationStats, Priority};

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Newest,
    Oldest,
    Priority,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Priority => "priority",
        }
    }
}

/// Parameters for `GET /filtered`. Unset fields are omitted from the query.
#[derive(Debug, Clone, Default)]
pub struct FilterQuery {
    pub read: Option<bool>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub sort: Option<SortOrder>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl FilterQuery {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(read) = self.read {
            pairs.push(("read", read.to_string()));
        }
        if let Some(category) = self.category {
            pairs.push(("category", category.as_str().to_owned()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority", priority.as_str().to_owned()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.as_str().to_owned()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

/// One page of the unfiltered list, plus the server's authoritative unread
/// count (the local page may only hold a slice of all notifications).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub unread_count: u64,
    pub total: u64,
    pub page: u32,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ListResponse {
    notifications: Vec<Notification>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct UnreadCountResponse {
    unread_count: u64,
}

fn normalized(mut list: Vec<Notification>) -> Vec<Notification> {
    for n in &mut list {
        n.normalize();
    }
    list
}

// ---------------------------------------------------------------------------
// Read endpoints
// ---------------------------------------------------------------------------

/// `GET /api/notifications?page=&limit=` — the only call whose result
/// replaces the store's main collection.
pub async fn fetch_page(
    client: &ApiClient,
    page: u32,
    limit: u32,
) -> Result<NotificationPage, ApiError> {
    let mut response: NotificationPage = client
        .get("", &[("page", page.to_string()), ("limit", limit.to_string())])
        .await?;
    response.notifications = normalized(response.notifications);
    Ok(response)
}

/// `GET /filtered` — fetch-and-return, never touches the main collection.
pub async fn fetch_filtered(
    client: &ApiClient,
    query: &FilterQuery,
) -> Result<Vec<Notification>, ApiError> {
    let response: ListResponse = client.get("/filtered", &query.to_query()).await?;
    Ok(normalized(response.notifications))
}

/// `GET /search?q=` — free-text match, fetch-and-return.
pub async fn search(client: &ApiClient, q: &str) -> Result<Vec<Notification>, ApiError> {
    let response: ListResponse = client.get("/search", &[("q", q.to_owned())]).await?;
    Ok(normalized(response.notifications))
}

pub async fn fetch_stats(client: &ApiClient) -> Result<NotificationStats, ApiError> {
    client.get("/stats", &[]).await
}

pub async fn fetch_important(client: &ApiClient) -> Result<Vec<Notification>, ApiError> {
    let response: ListResponse = client.get("/important", &[]).await?;
    Ok(normalized(response.notifications))
}

pub async fn fetch_by_category(
    client: &ApiClient,
    category: Category,
) -> Result<Vec<Notification>, ApiError> {
    let path = format!("/category/{}", category.as_str());
    let response: ListResponse = client.get(&path, &[]).await?;
    Ok(normalized(response.notifications))
}

pub async fn fetch_unread_count(client: &ApiClient) -> Result<u64, ApiError> {
    let response: UnreadCountResponse = client.get("/unread-count", &[]).await?;
    Ok(response.unread_count)
}

// ---------------------------------------------------------------------------
// Mutation endpoints
// ---------------------------------------------------------------------------

/// `PUT /:id/read`.
pub async fn mark_read(client: &ApiClient, id: &str) -> Result<(), ApiError> {
    client.put_empty(&format!("/{id}/read")).await
}

/// `PUT /:id/important` with the target state.
pub async fn mark_important(
    client: &ApiClient,
    id: &str,
    is_important: bool,
) -> Result<(), ApiError> {
    let body = serde_json::json!({ "isImportant": is_important });
    client
        .put_no_response(&format!("/{id}/important"), &body)
        .await
}

/// `PUT /mark-all-read`.
pub async fn mark_all_read(client: &ApiClient) -> Result<(), ApiError> {
    client.put_empty("/mark-all-read").await
}

/// `DELETE /:id`.
pub async fn delete(client: &ApiClient, id: &str) -> Result<(), ApiError> {
    client.delete(&format!("/{id}")).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_builds_empty_query() {
        assert!(FilterQuery::default().to_query().is_empty());
    }

    #[test]
    fn full_filter_builds_all_pairs() {
        let query = FilterQuery {
            read: Some(false),
            category: Some(Category::Payment),
            priority: Some(Priority::Urgent),
            sort: Some(SortOrder::Priority),
            page: Some(2),
            limit: Some(25),
        };
        assert_eq!(
            query.to_query(),
            vec![
                ("read", "false".to_owned()),
                ("category", "payment".to_owned()),
                ("priority", "urgent".to_owned()),
                ("sort", "priority".to_owned()),
                ("page", "2".to_owned()),
                ("limit", "25".to_owned()),
            ]
        );
    }

    #[test]
    fn page_response_tolerates_missing_fields() {
        let page: NotificationPage = serde_json::from_str(r#"{"notifications": []}"#).unwrap();
        assert_eq!(page.unread_count, 0);
        assert!(page.notifications.is_empty());
    }
}
