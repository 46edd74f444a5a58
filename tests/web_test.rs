use amberwatch::amber::{Descriptor, Interval, NEM_TIMEZONE, PriceGroup, Snapshot};
use amberwatch::poller::PollState;
use amberwatch::web::{AppState, build_router};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tower::ServiceExt;
use uuid::Uuid;

fn live_state() -> PollState {
    let now = Utc::now();
    let general = PriceGroup::new(vec![
        Interval::new(
            &(now - Duration::minutes(5)).to_rfc3339(),
            12.345,
            40.0,
            Descriptor::Low,
        ),
        Interval::new(
            &(now + Duration::minutes(25)).to_rfc3339(),
            18.0,
            35.0,
            Descriptor::Neutral,
        ),
    ]);
    PollState {
        snapshot: Some(Arc::new(Snapshot::new(
            Some("3000".to_string()),
            Some(general),
            None,
            NEM_TIMEZONE,
        ))),
        last_update_success: true,
        total_polls: 1,
        ..PollState::default()
    }
}

fn app(state: PollState) -> (axum::Router, watch::Sender<Arc<PollState>>) {
    let (tx, rx) = watch::channel(Arc::new(state));
    let router = build_router(AppState::from_receiver("3000", Uuid::nil(), rx));
    (router, tx)
}

async fn get(router: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn get_json(router: axum::Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(router, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn health_and_version() {
    let (router, _tx) = app(PollState::default());
    let (status, body) = get(router.clone(), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");

    let (status, json) = get_json(router, "/api/version").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["version"].as_str().unwrap().starts_with(env!("CARGO_PKG_VERSION")));
}

#[tokio::test]
async fn sensors_lists_all_readings() {
    let (router, _tx) = app(live_state());
    let (status, json) = get_json(router, "/api/sensors").await;
    assert_eq!(status, StatusCode::OK);

    let readings = json.as_array().unwrap();
    assert_eq!(readings.len(), 8);
    assert_eq!(readings[0]["name"], "Amber General Usage Current Price");
    assert_eq!(readings[0]["state"], 12.35);
    assert_eq!(readings[1]["state"], 18.0);
    // Feed-in was absent from the snapshot
    assert_eq!(readings[4]["available"], false);
    assert!(readings[4]["state"].is_null());
}

#[tokio::test]
async fn sensors_for_one_direction() {
    let (router, _tx) = app(live_state());
    let (status, json) = get_json(router.clone(), "/api/sensors/general").await;
    assert_eq!(status, StatusCode::OK);
    let readings = json.as_array().unwrap();
    assert_eq!(readings.len(), 4);
    assert!(readings.iter().all(|r| r["direction"] == "general"));

    let (status, _) = get(router, "/api/sensors/export").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn selection_exposes_raw_intervals() {
    let (router, _tx) = app(live_state());
    let (status, json) = get_json(router.clone(), "/api/selection/general").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["available"], true);
    assert_eq!(json["current"]["per_kwh"], 12.345);
    assert_eq!(json["current"]["descriptor"], "low");
    assert_eq!(json["next"]["per_kwh"], 18.0);

    let (status, json) = get_json(router.clone(), "/api/selection/feedin").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["available"], false);
    assert!(json["next"].is_null());

    let (status, _) = get(router, "/api/selection/sideways").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_reflects_latest_poll_state() {
    let (router, tx) = app(live_state());
    let (_, json) = get_json(router.clone(), "/api/status").await;
    assert_eq!(json["postcode"], "3000");
    assert_eq!(json["has_snapshot"], true);
    assert_eq!(json["stale"], false);

    let mut failed = (*tx.borrow()).as_ref().clone();
    failed.last_update_success = false;
    failed.failed_polls = 1;
    failed.last_error = Some("Connectivity error: timed out".to_string());
    tx.send_replace(Arc::new(failed));

    let (_, json) = get_json(router, "/api/status").await;
    assert_eq!(json["stale"], true);
    assert_eq!(json["failed_polls"], 1);
    assert_eq!(json["last_error"], "Connectivity error: timed out");
    assert_eq!(json["last_update_success"], false);
    assert!(json.get("snapshot").is_none());
}

#[tokio::test]
async fn stale_flag_reaches_sensor_readings() {
    let mut state = live_state();
    state.last_update_success = false;
    let (router, _tx) = app(state);
    let (_, json) = get_json(router, "/api/sensors/general").await;
    let readings = json.as_array().unwrap();
    assert!(readings.iter().all(|r| r["stale"] == true));
    assert_eq!(readings[0]["state"], 12.35);
}
