//! Integration tests for tallyd
//!
//! These tests verify the end-to-end behavior of the service's
//! building blocks: store + calculator for the recording/stats flows,
//! config parsing, and the IPC round trip.

use std::sync::Arc;
use tally_api::{
    AddOn, Command, Event, EventPayload, Response, ResponsePayload, ResponseResult, Service,
    SessionFilter, SessionRecord,
};
use tally_ipc::{IpcClient, IpcServer, ServerMessage};
use tally_store::{SqliteStore, Store, StoreError, SyncAction, SyncLogEntry};
use tally_util::{DeviceId, Money, SessionId};

fn make_session(id: &str, location: &str, date: &str, tips: f64) -> SessionRecord {
    SessionRecord {
        id: SessionId::new(id),
        location: location.into(),
        date: date.parse().unwrap(),
        services: vec![Service {
            service_type: Some("massage".into()),
            duration: Some(60.0),
            rate: Some(90.0),
        }],
        add_ons: vec![AddOn {
            name: Some("oil".into()),
            price: Money::from_dollars(10.0),
        }],
        tips: Money::from_dollars(tips),
        review: None,
        rating: None,
        has_client_review: false,
    }
}

#[test]
fn record_and_report_flow() {
    let store = SqliteStore::in_memory().unwrap();

    store.insert_session(&make_session("s1", "halo", "2026-02-16", 20.0)).unwrap();
    store.insert_session(&make_session("s2", "halo", "2026-02-17", 0.0)).unwrap();
    store.insert_session(&make_session("s3", "soul-bridge", "2026-02-17", 5.0)).unwrap();

    // The stats flow: filtered listing feeds the calculator
    let filter = SessionFilter {
        location: Some("halo".into()),
        ..Default::default()
    };
    let sessions = store.list_sessions(&filter).unwrap();
    assert_eq!(sessions.len(), 2);

    let summary = tally_core::summarize(&sessions);
    // 90 + 10 + 20 and 90 + 10 + 0
    assert_eq!(summary.total_earnings, Money::from_dollars(220.0));
    assert_eq!(summary.total_sessions, 2);
    assert_eq!(summary.productivity.work_days, 2);
}

#[test]
fn stats_totals_use_the_full_formula() {
    // A session's contribution is services + add-ons + tips, not just
    // its tips.
    let store = SqliteStore::in_memory().unwrap();
    store.insert_session(&make_session("s1", "halo", "2026-02-17", 20.0)).unwrap();

    let sessions = store.list_sessions(&SessionFilter::default()).unwrap();
    let summary = tally_core::summarize(&sessions);

    assert_eq!(summary.total_earnings, Money::from_dollars(120.0));
    assert_eq!(summary.tips.total_tips, Money::from_dollars(20.0));
    assert_eq!(
        summary.earnings_by_location["halo"],
        Money::from_dollars(120.0)
    );
}

#[test]
fn duplicate_create_is_rejected() {
    let store = SqliteStore::in_memory().unwrap();
    let record = make_session("s1", "halo", "2026-02-17", 0.0);

    store.insert_session(&record).unwrap();
    assert!(matches!(
        store.insert_session(&record),
        Err(StoreError::Conflict(_))
    ));
}

#[test]
fn sync_is_last_write_wins() {
    let store = SqliteStore::in_memory().unwrap();

    // Initial recording
    store.insert_session(&make_session("s1", "halo", "2026-02-16", 5.0)).unwrap();

    // A device syncs a batch: one replacement, one new record
    let mut replacement = make_session("s1", "halo", "2026-02-16", 25.0);
    replacement.review = Some("updated from phone".into());
    let batch = vec![replacement.clone(), make_session("s2", "soul-bridge", "2026-02-17", 0.0)];

    for record in &batch {
        store.upsert_session(record).unwrap();
    }
    store
        .append_sync(SyncLogEntry::new(
            DeviceId::new("phone"),
            SyncAction::Upload,
            batch.len() as u64,
        ))
        .unwrap();

    assert_eq!(store.session_count().unwrap(), 2);
    let loaded = store.get_session(&SessionId::new("s1")).unwrap().unwrap();
    assert_eq!(loaded, replacement);

    let last = store.last_sync().unwrap().unwrap();
    assert_eq!(last.device_id, DeviceId::new("phone"));
    assert_eq!(last.session_count, 2);

    // Replaying the same batch changes nothing
    for record in &batch {
        store.upsert_session(record).unwrap();
    }
    assert_eq!(store.session_count().unwrap(), 2);
}

#[test]
fn sync_status_counts_by_date() {
    let store = SqliteStore::in_memory().unwrap();
    store.insert_session(&make_session("s1", "halo", "2026-02-17", 0.0)).unwrap();
    store.insert_session(&make_session("s2", "halo", "2026-02-17", 0.0)).unwrap();
    store.insert_session(&make_session("s3", "halo", "2026-02-18", 0.0)).unwrap();

    let counts = store.session_counts_by_date().unwrap();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts[0].1, 2);
    assert_eq!(counts[1].1, 1);
    assert!(store.last_sync().unwrap().is_none());
}

#[test]
fn closed_dates_do_not_touch_sessions() {
    let store = SqliteStore::in_memory().unwrap();
    let date = "2026-02-17".parse().unwrap();
    store.insert_session(&make_session("s1", "halo", "2026-02-17", 20.0)).unwrap();

    store.close_date(date).unwrap();
    assert_eq!(store.closed_dates().unwrap().len(), 1);

    // Earnings math is unaffected by closed-date bookkeeping
    let sessions = store.list_sessions(&SessionFilter::default()).unwrap();
    assert_eq!(tally_core::total(&sessions), Money::from_dollars(120.0));

    store.reopen_date(date).unwrap();
    assert!(store.closed_dates().unwrap().is_empty());
}

#[test]
fn config_parsing() {
    use tally_config::parse_config;

    let config = r#"
        config_version = 1

        [service]
        data_dir = "/tmp/tallyd-test"

        [[practice.locations]]
        id = "soul-bridge"
        label = "Soul Bridge Wellness"

        [[practice.locations]]
        id = "halo"
    "#;

    let settings = parse_config(config).unwrap();
    assert_eq!(settings.locations.len(), 2);
    assert_eq!(settings.location_label("halo"), Some("halo"));
    assert_eq!(
        settings.service.data_dir.to_string_lossy(),
        "/tmp/tallyd-test"
    );
}

#[tokio::test]
async fn ipc_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("tallyd.sock");

    let mut server = IpcServer::new(&socket);
    server.start().await.unwrap();
    let server = Arc::new(server);

    let mut messages = server.take_message_receiver().await.unwrap();
    let accept = server.clone();
    tokio::spawn(async move {
        let _ = accept.run().await;
    });

    // Minimal responder in place of the full daemon dispatch
    let responder = server.clone();
    tokio::spawn(async move {
        while let Some(msg) = messages.recv().await {
            if let ServerMessage::Request { client_id, request } = msg {
                let payload = match request.command {
                    Command::SubscribeEvents => ResponsePayload::Subscribed {
                        client_id: client_id.clone(),
                    },
                    _ => ResponsePayload::Pong,
                };
                let _ = responder
                    .send_response(&client_id, Response::success(request.request_id, payload))
                    .await;
            }
        }
    });

    let mut client = IpcClient::connect(&socket).await.unwrap();
    let response = client.send(Command::Ping).await.unwrap();
    assert!(matches!(
        response.result,
        ResponseResult::Ok(ResponsePayload::Pong)
    ));

    // A subscribed client receives broadcast events
    let subscriber = IpcClient::connect(&socket).await.unwrap();
    let mut events = subscriber.subscribe().await.unwrap();

    server.broadcast_event(Event::new(EventPayload::SessionDeleted {
        session_id: SessionId::new("s1"),
    }));

    let event = events.next().await.unwrap();
    assert!(matches!(event.payload, EventPayload::SessionDeleted { .. }));
}
