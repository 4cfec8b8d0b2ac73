//! End-to-end lifecycle tests for the ticket service: creation, asynchronous
//! status ingestion, redemption and batch polling against a real store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use clipshare_core::testing::MockDispatcher;
use clipshare_core::{
    GameplayInfo, SqliteTicketStore, StatusPayload, StatusUpdate, StatusUpdateIngress, TicketError,
    TicketService, TicketStage, TicketStore,
};

fn test_gameplay() -> GameplayInfo {
    GameplayInfo::new(
        1_461_870_653_220,
        "Lucky Star",
        "Atlas",
        "New Money",
        1_200_000,
        "wow! what a win!",
    )
}

fn build_service() -> (Arc<TicketService>, Arc<dyn TicketStore>, Arc<MockDispatcher>) {
    let store: Arc<dyn TicketStore> = Arc::new(SqliteTicketStore::in_memory().unwrap());
    let dispatcher = Arc::new(MockDispatcher::new());
    let service = Arc::new(TicketService::new(Arc::clone(&store), dispatcher.clone()));
    (service, store, dispatcher)
}

#[tokio::test]
async fn test_full_lifecycle_from_submission_to_claim() {
    let (service, store, dispatcher) = build_service();

    let ticket = service.submit(test_gameplay()).await.unwrap();
    assert_eq!(ticket.status().stage(), TicketStage::Received);
    assert_eq!(dispatcher.dispatched_jobs().len(), 1);

    // The worker walks the job through every stage.
    let updates = [
        (TicketStage::Dispatched, None),
        (TicketStage::Recording, None),
        (
            TicketStage::Recorded,
            Some(StatusPayload::VideoBytes(vec![0x01, 0x02, 0x03])),
        ),
        (TicketStage::Uploading, None),
        (TicketStage::Uploaded, None),
        (
            TicketStage::Completed,
            Some(StatusPayload::VideoUrl("https://cdn.example/clip123".into())),
        ),
    ];
    for (stage, payload) in updates {
        service
            .apply_status_update(ticket.ticket_id(), stage, payload)
            .unwrap();
    }

    let stored = store.find_by_ticket_id(ticket.ticket_id()).unwrap().unwrap();
    assert_eq!(stored.status().stage(), TicketStage::Completed);
    assert_eq!(stored.video_bytes(), Some(&[0x01, 0x02, 0x03][..]));
    for stage in [
        TicketStage::Dispatched,
        TicketStage::Recording,
        TicketStage::Recorded,
        TicketStage::Uploading,
        TicketStage::Uploaded,
        TicketStage::Completed,
    ] {
        assert!(
            stored.status().entered_at(stage).is_some(),
            "missing milestone for {}",
            stage.as_str()
        );
    }

    let url = service.redeem(ticket.ticket_id()).unwrap();
    assert_eq!(url.as_deref(), Some("https://cdn.example/clip123"));

    let stored = store.find_by_ticket_id(ticket.ticket_id()).unwrap().unwrap();
    assert_eq!(stored.status().stage(), TicketStage::Claimed);
}

#[tokio::test]
async fn test_duplicated_and_reordered_delivery_converges() {
    let (service, store, _) = build_service();
    let ticket = service.submit(test_gameplay()).await.unwrap();

    // At-least-once delivery: duplicates and reordering are routine.
    let deliveries = [
        (
            TicketStage::Completed,
            Some(StatusPayload::VideoUrl("https://cdn.example/clip123".into())),
        ),
        (TicketStage::Dispatched, None),
        (TicketStage::Recording, None),
        (
            TicketStage::Completed,
            Some(StatusPayload::VideoUrl("https://cdn.example/other".into())),
        ),
    ];
    for (stage, payload) in deliveries {
        service
            .apply_status_update(ticket.ticket_id(), stage, payload)
            .unwrap();
    }

    let stored = store.find_by_ticket_id(ticket.ticket_id()).unwrap().unwrap();
    assert_eq!(stored.status().stage(), TicketStage::Completed);
    assert_eq!(stored.video_url(), Some("https://cdn.example/clip123"));
}

#[tokio::test]
async fn test_racing_updates_settle_on_the_highest_stage() {
    let (service, store, _) = build_service();
    let ticket = service.submit(test_gameplay()).await.unwrap();

    let mut handles = Vec::new();
    for stage in [
        TicketStage::Dispatched,
        TicketStage::Recording,
        TicketStage::Recorded,
    ] {
        let service = Arc::clone(&service);
        let ticket_id = ticket.ticket_id().to_string();
        handles.push(tokio::task::spawn_blocking(move || {
            service.apply_status_update(&ticket_id, stage, None)
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = store.find_by_ticket_id(ticket.ticket_id()).unwrap().unwrap();
    assert_eq!(stored.status().stage(), TicketStage::Recorded);
    assert!(stored.status().entered_at(TicketStage::Recorded).is_some());
}

#[tokio::test]
async fn test_updates_for_different_tickets_do_not_interfere() {
    let (service, store, _) = build_service();

    let mut tickets = Vec::new();
    for _ in 0..5 {
        tickets.push(service.submit(test_gameplay()).await.unwrap());
    }

    let mut handles = Vec::new();
    for ticket in &tickets {
        let service = Arc::clone(&service);
        let ticket_id = ticket.ticket_id().to_string();
        handles.push(tokio::task::spawn_blocking(move || {
            service.apply_status_update(&ticket_id, TicketStage::Recording, None)
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for ticket in &tickets {
        let stored = store.find_by_ticket_id(ticket.ticket_id()).unwrap().unwrap();
        assert_eq!(stored.status().stage(), TicketStage::Recording);
    }
}

#[tokio::test]
async fn test_failure_is_reachable_from_any_point_and_sticks() {
    let (service, store, _) = build_service();
    let ticket = service.submit(test_gameplay()).await.unwrap();

    service
        .apply_status_update(ticket.ticket_id(), TicketStage::Recording, None)
        .unwrap();
    service
        .apply_status_update(ticket.ticket_id(), TicketStage::Failed, None)
        .unwrap();

    // Late progress for a failed job is ignored.
    service
        .apply_status_update(ticket.ticket_id(), TicketStage::Uploaded, None)
        .unwrap();

    let stored = store.find_by_ticket_id(ticket.ticket_id()).unwrap().unwrap();
    assert_eq!(stored.status().stage(), TicketStage::Failed);
    assert!(stored.status().entered_at(TicketStage::Uploaded).is_none());

    assert!(service.redeem(ticket.ticket_id()).unwrap().is_none());
}

#[tokio::test]
async fn test_batch_poll_returns_only_the_completed_member() {
    let (service, _, _) = build_service();

    let dispatched_only = service.submit(test_gameplay()).await.unwrap();
    service
        .apply_status_update(dispatched_only.ticket_id(), TicketStage::Dispatched, None)
        .unwrap();

    let completed = service.submit(test_gameplay()).await.unwrap();
    service
        .apply_status_update(
            completed.ticket_id(),
            TicketStage::Completed,
            Some(StatusPayload::VideoUrl("https://cdn.example/clip123".into())),
        )
        .unwrap();

    let ids = vec![
        "550e8400-e29b-41d4-a716-446655440000".to_string(),
        dispatched_only.ticket_id().to_string(),
        completed.ticket_id().to_string(),
    ];

    let result = service.redeem_batch(&ids).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(
        result.get(completed.ticket_id()).map(String::as_str),
        Some("https://cdn.example/clip123")
    );
}

#[tokio::test]
async fn test_batch_poll_is_repeatable_after_claiming() {
    let (service, _, _) = build_service();

    let completed = service.submit(test_gameplay()).await.unwrap();
    service
        .apply_status_update(
            completed.ticket_id(),
            TicketStage::Completed,
            Some(StatusPayload::VideoUrl("https://cdn.example/clip123".into())),
        )
        .unwrap();

    let ids = vec![completed.ticket_id().to_string()];

    let first = service.redeem_batch(&ids).unwrap();
    let second = service.redeem_batch(&ids).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_ingress_drives_the_lifecycle_end_to_end() {
    let (service, store, _) = build_service();
    let ticket = service.submit(test_gameplay()).await.unwrap();

    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(StatusUpdateIngress::new(Arc::clone(&service), rx).run());

    for (code, payload) in [
        (TicketStage::Dispatched.code(), None),
        (TicketStage::Recording.code(), None),
        (
            TicketStage::Recorded.code(),
            Some(StatusPayload::VideoBytes(vec![9, 9, 9])),
        ),
        (TicketStage::Uploading.code(), None),
        (TicketStage::Uploaded.code(), None),
        (
            TicketStage::Completed.code(),
            Some(StatusPayload::VideoUrl("https://cdn.example/clip123".into())),
        ),
    ] {
        tx.send(StatusUpdate {
            ticket_id: ticket.ticket_id().to_string(),
            status_code: code,
            payload,
        })
        .await
        .unwrap();
    }

    // Wait for the consumer to drain the channel.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let stored = store.find_by_ticket_id(ticket.ticket_id()).unwrap().unwrap();
        if stored.status().stage() == TicketStage::Completed {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "ingress did not finish applying updates in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let url = service.redeem(ticket.ticket_id()).unwrap();
    assert_eq!(url.as_deref(), Some("https://cdn.example/clip123"));
}

#[tokio::test]
async fn test_redeem_rejects_unknown_but_well_formed_ticket() {
    let (service, _, _) = build_service();
    let result = service.redeem("550e8400-e29b-41d4-a716-446655440000");
    assert!(matches!(result, Err(TicketError::NotFound(_))));
}
