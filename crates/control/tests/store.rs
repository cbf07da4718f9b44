mod common;

use common::*;
use mailer_models::{EmailStatus, MailerError};

#[tokio::test]
async fn create_pending_assigns_ids_and_defaults() {
    let store = memory_store().await;

    let first = store.create_pending(&request("a@example.org", "One")).await.unwrap();
    let second = store.create_pending(&request("b@example.org", "Two")).await.unwrap();

    assert!(second.id > first.id);
    assert_eq!(first.status, EmailStatus::Pending);
    assert_eq!(first.response.as_deref(), Some("Email queued for sending"));

    let loaded = store.get(first.id).await.unwrap();
    assert_eq!(loaded.receiver_email, "a@example.org");
    assert_eq!(loaded.subject, "One");
    assert_eq!(loaded.status, EmailStatus::Pending);
}

#[tokio::test]
async fn get_missing_log_is_not_found() {
    let store = memory_store().await;
    let err = store.get(42).await.unwrap_err();
    assert!(matches!(err, MailerError::EmailLogNotFound { id: 42 }));
}

#[tokio::test]
async fn update_status_persists_outcome() {
    let store = memory_store().await;
    let log = store.create_pending(&request("a@example.org", "One")).await.unwrap();

    store.update_status(log.id, EmailStatus::Sent, "{\"ok\":true}").await.unwrap();

    let loaded = store.get(log.id).await.unwrap();
    assert_eq!(loaded.status, EmailStatus::Sent);
    assert_eq!(loaded.response.as_deref(), Some("{\"ok\":true}"));

    let err = store.update_status(999, EmailStatus::Failed, "x").await.unwrap_err();
    assert!(matches!(err, MailerError::EmailLogNotFound { id: 999 }));
}

#[tokio::test]
async fn list_pages_newest_first() {
    let store = memory_store().await;
    for i in 0..25 {
        store
            .create_pending(&request(&format!("user{i}@example.org"), &format!("Subject {i}")))
            .await
            .unwrap();
    }

    let (total, first_page) = store.list(1, 10, None).await.unwrap();
    assert_eq!(total, 25);
    assert_eq!(first_page.len(), 10);
    assert_eq!(first_page[0].subject, "Subject 24");
    assert_eq!(first_page[9].subject, "Subject 15");

    let (_, last_page) = store.list(3, 10, None).await.unwrap();
    assert_eq!(last_page.len(), 5);
    assert_eq!(last_page[4].subject, "Subject 0");

    let (total, beyond) = store.list(4, 10, None).await.unwrap();
    assert_eq!(total, 25);
    assert!(beyond.is_empty());
}

#[tokio::test]
async fn list_filters_by_status() {
    let store = memory_store().await;
    let a = store.create_pending(&request("a@example.org", "A")).await.unwrap();
    let b = store.create_pending(&request("b@example.org", "B")).await.unwrap();
    store.create_pending(&request("c@example.org", "C")).await.unwrap();

    store.update_status(a.id, EmailStatus::Sent, "ok").await.unwrap();
    store.update_status(b.id, EmailStatus::Failed, "nope").await.unwrap();

    let (total, sent) = store.list(1, 10, Some("sent")).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(sent[0].id, a.id);

    let (total, pending) = store.list(1, 10, Some("pending")).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(pending[0].subject, "C");

    let (total, unknown) = store.list(1, 10, Some("bounced")).await.unwrap();
    assert_eq!(total, 0);
    assert!(unknown.is_empty());
}

#[tokio::test]
async fn list_clamps_page_below_one() {
    let store = memory_store().await;
    store.create_pending(&request("a@example.org", "A")).await.unwrap();

    let (total, logs) = store.list(0, 10, None).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(logs.len(), 1);

    let (_, logs) = store.list(-5, 10, None).await.unwrap();
    assert_eq!(logs.len(), 1);
}

#[tokio::test]
async fn fail_stale_pending_only_touches_pending_rows() {
    let store = memory_store().await;
    let sent = store.create_pending(&request("a@example.org", "A")).await.unwrap();
    let stale = store.create_pending(&request("b@example.org", "B")).await.unwrap();
    store.update_status(sent.id, EmailStatus::Sent, "ok").await.unwrap();

    let count = store.fail_stale_pending("Delivery interrupted by service restart").await.unwrap();
    assert_eq!(count, 1);

    let stale = store.get(stale.id).await.unwrap();
    assert_eq!(stale.status, EmailStatus::Failed);
    assert_eq!(stale.response.as_deref(), Some("Delivery interrupted by service restart"));
    assert_eq!(store.get(sent.id).await.unwrap().status, EmailStatus::Sent);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let store = memory_store().await;
    mailer_control::run_migrations(store.pool()).await.unwrap();
    store.create_pending(&request("a@example.org", "A")).await.unwrap();
}
