mod common;

use common::*;
use mailer_control::{DeliveryJob, DeliveryQueue};
use mailer_models::{EmailStatus, MailerError};
use mailer_provider::DeliveryReport;
use std::sync::Arc;
use std::time::Duration;

async fn wait_for_status(store: &mailer_control::EmailLogStore, id: i64, status: EmailStatus) {
    for _ in 0..100 {
        if store.get(id).await.unwrap().status == status {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("email {id} never reached {status}");
}

#[tokio::test]
async fn successful_report_marks_sent() {
    let store = memory_store().await;
    let provider = Arc::new(ScriptedProvider::always(DeliveryReport::new(202, "{\"id\":\"abc\"}")));
    let (deliverer, metrics) = deliverer(&store, provider.clone());

    let req = request("ana@example.org", "Hello");
    let log = store.create_pending(&req).await.unwrap();
    let status = deliverer
        .deliver(&DeliveryJob { email_id: log.id, request: req })
        .await
        .unwrap();

    assert_eq!(status, Some(EmailStatus::Sent));
    let log = store.get(log.id).await.unwrap();
    assert_eq!(log.status, EmailStatus::Sent);
    assert_eq!(log.response.as_deref(), Some("{\"id\":\"abc\"}"));

    let sent = provider.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].html, "<p>Hello</p>");
    assert_eq!(sent[0].to[0].email, "ana@example.org");

    let text = metrics.get_prometheus_metrics().unwrap();
    assert!(text.contains("mailer_emails_sent_total 1"));
}

#[tokio::test]
async fn non_2xx_report_marks_failed_with_body() {
    let store = memory_store().await;
    let provider = Arc::new(ScriptedProvider::always(DeliveryReport::new(401, "Unauthenticated.")));
    let (deliverer, metrics) = deliverer(&store, provider);

    let req = request("ana@example.org", "Hello");
    let log = store.create_pending(&req).await.unwrap();
    let status = deliverer
        .deliver(&DeliveryJob { email_id: log.id, request: req })
        .await
        .unwrap();

    assert_eq!(status, Some(EmailStatus::Failed));
    let log = store.get(log.id).await.unwrap();
    assert_eq!(log.status, EmailStatus::Failed);
    assert_eq!(log.response.as_deref(), Some("Unauthenticated."));
    assert!(metrics.get_prometheus_metrics().unwrap().contains("mailer_emails_failed_total 1"));
}

#[tokio::test]
async fn template_requests_send_rendered_html() {
    let store = memory_store().await;
    let provider = Arc::new(ScriptedProvider::always(DeliveryReport::new(200, "ok")));
    let (deliverer, _) = deliverer(&store, provider.clone());

    let req = welcome_request("ana@example.org");
    let log = store.create_pending(&req).await.unwrap();
    deliverer
        .deliver(&DeliveryJob { email_id: log.id, request: req })
        .await
        .unwrap();

    let sent = provider.sent();
    assert!(sent[0].html.contains("Welcome, Ana!"));
    assert!(sent[0].html.contains("Thanks for joining Acme."));
}

#[tokio::test]
async fn render_failure_marks_failed_without_sending() {
    let store = memory_store().await;
    let provider = Arc::new(ScriptedProvider::always(DeliveryReport::new(200, "ok")));
    let (deliverer, _) = deliverer(&store, provider.clone());

    let mut req = welcome_request("ana@example.org");
    req.template = Some("newsletter".into());
    let log = store.create_pending(&req).await.unwrap();
    let status = deliverer
        .deliver(&DeliveryJob { email_id: log.id, request: req })
        .await
        .unwrap();

    assert_eq!(status, Some(EmailStatus::Failed));
    assert!(provider.sent().is_empty());
    let log = store.get(log.id).await.unwrap();
    assert_eq!(log.response.as_deref(), Some("Email template not found: newsletter"));
}

#[tokio::test]
async fn missing_log_drops_job() {
    let store = memory_store().await;
    let provider = Arc::new(ScriptedProvider::always(DeliveryReport::new(200, "ok")));
    let (deliverer, _) = deliverer(&store, provider.clone());

    let status = deliverer
        .deliver(&DeliveryJob { email_id: 77, request: request("ana@example.org", "Hello") })
        .await
        .unwrap();

    assert_eq!(status, None);
    assert!(provider.sent().is_empty());
}

#[tokio::test]
async fn queue_workers_process_jobs_in_background() {
    let store = memory_store().await;
    let provider = Arc::new(
        ScriptedProvider::always(DeliveryReport::new(202, "accepted"))
            .then(DeliveryReport::new(503, "Connection error - could not reach email service")),
    );
    let (deliverer, _) = deliverer(&store, provider.clone());
    let queue = DeliveryQueue::start(deliverer, 1, 8);

    let first = store.create_pending(&request("a@example.org", "A")).await.unwrap();
    let second = store.create_pending(&request("b@example.org", "B")).await.unwrap();
    queue
        .enqueue(DeliveryJob { email_id: first.id, request: request("a@example.org", "A") })
        .await
        .unwrap();
    queue
        .enqueue(DeliveryJob { email_id: second.id, request: request("b@example.org", "B") })
        .await
        .unwrap();

    wait_for_status(&store, first.id, EmailStatus::Failed).await;
    wait_for_status(&store, second.id, EmailStatus::Sent).await;
    assert_eq!(provider.sent().len(), 2);
}

#[tokio::test]
async fn shutdown_drains_buffered_jobs_then_rejects() {
    let store = memory_store().await;
    let provider = Arc::new(
        ScriptedProvider::always(DeliveryReport::new(200, "ok")).with_delay(Duration::from_millis(50)),
    );
    let (deliverer, _) = deliverer(&store, provider.clone());
    let queue = DeliveryQueue::start(deliverer, 2, 16);

    let mut ids = Vec::new();
    for i in 0..5 {
        let req = request(&format!("user{i}@example.org"), "Hi");
        let log = store.create_pending(&req).await.unwrap();
        queue.enqueue(DeliveryJob { email_id: log.id, request: req }).await.unwrap();
        ids.push(log.id);
    }

    assert!(queue.shutdown(Duration::from_secs(5)).await);
    assert!(!queue.is_open());
    for id in ids {
        assert_eq!(store.get(id).await.unwrap().status, EmailStatus::Sent);
    }

    let err = queue
        .enqueue(DeliveryJob { email_id: 1, request: request("late@example.org", "Late") })
        .await
        .unwrap_err();
    assert!(matches!(err, MailerError::QueueUnavailable));
}
