use std::sync::{Arc, Mutex};

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rewards_notify::api::{ApiClient, FilterQuery};
use rewards_notify::store::NotificationStore;
use rewards_notify::types::{FrequencyMode, Preferences};

fn record(id: &str, read: bool) -> serde_json::Value {
    json!({
        "id": id,
        "type": "reward_earned",
        "title": format!("Title {id}"),
        "message": "You earned points",
        "category": "achievement",
        "priority": "medium",
        "read": read,
        "createdAt": "2026-01-04T10:00:00Z",
    })
}

async fn store_for(server: &MockServer) -> NotificationStore {
    NotificationStore::new(ApiClient::new(server.uri(), "test-token"))
}

#[tokio::test]
async fn fetch_replaces_list_and_dedups() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            // Same id twice: socket pushes and refreshes can race the
            // same record in. Only one survives.
            "notifications": [record("n1", false), record("n2", true), record("n1", false)],
            "unreadCount": 7,
        })))
        .mount(&server)
        .await;

    let mut store = store_for(&server).await;
    let unread = store.fetch(1, 50).await.expect("fetch");

    assert_eq!(unread, 7);
    assert_eq!(store.notifications().len(), 2);
    assert_eq!(store.notifications()[0].id, "n1");
    assert_eq!(store.notifications()[1].id, "n2");
    // Normalization: read without read_at got one stamped.
    assert!(store.notifications()[1].read_at.is_some());
}

#[tokio::test]
async fn server_error_message_is_surfaced_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/notifications/n1/read"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Notification not found"})),
        )
        .mount(&server)
        .await;

    let mut store = store_for(&server).await;
    let err = store.mark_read("n1").await.expect_err("must fail");
    assert_eq!(err.to_string(), "Notification not found");
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn non_json_error_body_gets_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/notifications/n1/read"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let mut store = store_for(&server).await;
    let err = store.mark_read("n1").await.expect_err("must fail");
    assert!(
        err.to_string().starts_with("request failed with status 500"),
        "got: {err}"
    );
}

#[tokio::test]
async fn confirmed_mutation_patches_locally_and_notifies_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "notifications": [record("n1", false)],
            "unreadCount": 1,
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/notifications/n1/read"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut store = store_for(&server).await;
    store.fetch(1, 50).await.expect("fetch");

    let notifications = Arc::new(Mutex::new(0u32));
    let seen = Arc::clone(&notifications);
    store.subscribe(move |snapshot| {
        *seen.lock().unwrap() += 1;
        assert!(snapshot.notifications.iter().all(|n| n.read == n.read_at.is_some()));
    });

    store.mark_read("n1").await.expect("mark read");

    let n = store.notification("n1").expect("still present");
    assert!(n.read);
    assert!(n.read_at.is_some());
    assert_eq!(*notifications.lock().unwrap(), 1);
}

#[tokio::test]
async fn failed_mutation_leaves_state_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "notifications": [record("n1", false)],
            "unreadCount": 1,
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/notifications/n1/read"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "nope"})))
        .mount(&server)
        .await;

    let mut store = store_for(&server).await;
    store.fetch(1, 50).await.expect("fetch");

    let count = Arc::new(Mutex::new(0u32));
    let seen = Arc::clone(&count);
    store.subscribe(move |_| *seen.lock().unwrap() += 1);

    assert!(store.mark_read("n1").await.is_err());

    // No local change, no subscriber notification.
    assert!(!store.notification("n1").unwrap().read);
    assert_eq!(*count.lock().unwrap(), 0);
}

#[tokio::test]
async fn mark_all_read_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "notifications": [record("n1", false), record("n2", false), record("n3", true)],
            "unreadCount": 2,
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/notifications/mark-all-read"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut store = store_for(&server).await;
    store.fetch(1, 50).await.expect("fetch");

    store.mark_all_read().await.expect("first pass");
    assert!(store.notifications().iter().all(|n| n.read));
    assert_eq!(store.local_unread_count(), 0);
    let stamps: Vec<_> = store.notifications().iter().map(|n| n.read_at).collect();

    store.mark_all_read().await.expect("second pass");
    let after: Vec<_> = store.notifications().iter().map(|n| n.read_at).collect();
    assert_eq!(stamps, after, "second pass must not restamp read_at");
}

#[tokio::test]
async fn filtered_and_search_do_not_touch_main_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "notifications": [record("main", false)],
            "unreadCount": 1,
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/notifications/filtered"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "notifications": [record("filtered-1", true), record("filtered-2", true)],
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/notifications/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "notifications": [record("hit", true)],
        })))
        .mount(&server)
        .await;

    let mut store = store_for(&server).await;
    store.fetch(1, 50).await.expect("fetch");

    let filtered = store
        .fetch_filtered(&FilterQuery {
            read: Some(true),
            ..FilterQuery::default()
        })
        .await
        .expect("filtered");
    let hits = store.search("points").await.expect("search");

    assert_eq!(filtered.len(), 2);
    assert_eq!(hits.len(), 1);
    assert_eq!(store.notifications().len(), 1);
    assert_eq!(store.notifications()[0].id, "main");
}

#[tokio::test]
async fn category_important_and_unread_queries_fetch_and_return() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notifications/category/payment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "notifications": [record("p1", false)],
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/notifications/important"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "notifications": [record("i1", true), record("i2", false)],
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/notifications/unread-count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unreadCount": 9})))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let payment = store
        .fetch_by_category(rewards_notify::types::Category::Payment)
        .await
        .expect("category");
    let important = store.fetch_important().await.expect("important");
    let unread = store.fetch_unread_count().await.expect("unread count");

    assert_eq!(payment.len(), 1);
    assert_eq!(important.len(), 2);
    assert_eq!(unread, 9);
    // None of these queries touch the main collection.
    assert!(store.notifications().is_empty());
}

#[tokio::test]
async fn preference_update_replaces_in_memory_record() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/notifications/preferences/quiet-hours"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "inApp": {"enabled": true},
            "push": {"enabled": false},
            "frequency": {"type": "digest", "digestTime": "09:00"},
            "quietHours": {"enabled": true, "startTime": "23:00", "endTime": "07:00"},
        })))
        .mount(&server)
        .await;

    let mut store = store_for(&server).await;
    assert!(!store.preferences().quiet_hours.enabled);

    let quiet_hours = rewards_notify::types::QuietHours {
        enabled: true,
        start_time: "23:00".to_owned(),
        end_time: "07:00".to_owned(),
    };
    store.set_quiet_hours(&quiet_hours).await.expect("update");

    // The whole record is replaced with the server's version, not just
    // the section we sent.
    assert!(store.preferences().quiet_hours.enabled);
    assert_eq!(store.preferences().quiet_hours.start_time, "23:00");
    assert_eq!(store.preferences().frequency.mode, FrequencyMode::Digest);
}

#[tokio::test]
async fn reset_restores_server_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/notifications/preferences/reset"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::to_value(Preferences::default()).unwrap()),
        )
        .mount(&server)
        .await;

    let mut store = store_for(&server).await;
    store.reset_preferences().await.expect("reset");
    assert_eq!(store.preferences(), &Preferences::default());
}
