//! HttpQueueClient against a programmable backend.

use std::sync::{Arc, Mutex};

use claim_tracker::claims::{rewards_to_claim, RewardCatalog};
use claim_tracker::config::QueueConfig;
use claim_tracker::queue::{DeliveryQueueClient, HttpQueueClient, QueueError, QueueStatus};

mod common;
use common::{addr, event, start_programmable_backend, RecordedRequest, ALICE};

fn client_for(addr: std::net::SocketAddr) -> HttpQueueClient {
    HttpQueueClient::new(QueueConfig {
        api_url: format!("http://{addr}"),
        request_timeout_secs: 2,
        ..QueueConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_submit_claim_posts_checksummed_address() {
    let seen: Arc<Mutex<Vec<RecordedRequest>>> = Arc::default();
    let log = seen.clone();
    let backend = start_programmable_backend(move |req| {
        log.lock().unwrap().push(req);
        async { (200, r#"{"queue_uid":"q-123"}"#.to_string()) }
    })
    .await;

    let ack = client_for(backend)
        .submit_claim(42, addr(&ALICE.to_lowercase()))
        .await
        .unwrap();
    assert_eq!(ack.queue_uid, "q-123");

    let requests = seen.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/actions/claim-delivery-v2");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["id"], 42);
    assert_eq!(body["address"], ALICE);
}

#[tokio::test]
async fn test_backend_rejection_surfaces_status() {
    let backend =
        start_programmable_backend(|_| async { (500, "queue down".to_string()) }).await;

    let err = client_for(backend)
        .submit_claim(1, addr(ALICE))
        .await
        .unwrap_err();
    match err {
        QueueError::Rejected { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "queue down");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_queue_status_lookup() {
    let backend = start_programmable_backend(|req| async move {
        if req.path == "/queue-message/q1" {
            (
                200,
                r#"{"uid":"q1","status":"FINISH","result":{"tx_hash":"0xabc"}}"#.to_string(),
            )
        } else {
            (404, "{}".to_string())
        }
    })
    .await;
    let client = client_for(backend);

    let record = client.queue_status("q1").await.unwrap();
    assert_eq!(record.status, QueueStatus::Finished);
    assert_eq!(record.tx_hash(), Some("0xabc"));

    assert!(matches!(
        client.queue_status("missing").await,
        Err(QueueError::Rejected { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_queue_uid_with_reserved_characters_stays_in_path() {
    let seen: Arc<Mutex<Vec<RecordedRequest>>> = Arc::default();
    let log = seen.clone();
    let backend = start_programmable_backend(move |req| {
        log.lock().unwrap().push(req);
        async { (200, r#"{"status":"IN_PROCESS"}"#.to_string()) }
    })
    .await;

    let record = client_for(backend).queue_status("a/b?c").await.unwrap();
    assert_eq!(record.status, QueueStatus::Pending);
    assert_eq!(seen.lock().unwrap()[0].path, "/queue-message/a%2Fb%3Fc");
}

#[tokio::test]
async fn test_garbage_body_is_malformed() {
    let backend = start_programmable_backend(|_| async { (200, "not json".to_string()) }).await;
    assert!(matches!(
        client_for(backend).queue_status("q1").await,
        Err(QueueError::Malformed(_))
    ));
}

#[tokio::test]
async fn test_unreachable_backend_is_http_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    assert!(matches!(
        client_for(addr).queue_status("q1").await,
        Err(QueueError::Http(_))
    ));
}

#[tokio::test]
async fn test_reward_catalog_filtered_to_event() {
    let backend = start_programmable_backend(|req| async move {
        assert_eq!(req.path, "/events");
        (
            200,
            r#"[
                {"id": 3, "name": "Three", "image_url": "https://img/3.png"},
                {"id": 9, "name": "Nine", "image_url": "https://img/9.png", "description": "late"},
                {"id": 5, "name": "Five", "image_url": "https://img/5.png"}
            ]"#
            .to_string(),
        )
    })
    .await;

    let mut campaign = event("drop", &[ALICE]);
    campaign.event_ids.extend([3, 9]);

    let all = client_for(backend).reward_events().await.unwrap();
    let rewards = rewards_to_claim(&all, &campaign);
    let ids: Vec<u64> = rewards.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![9, 3]);
    assert_eq!(rewards[0].description.as_deref(), Some("late"));
}
