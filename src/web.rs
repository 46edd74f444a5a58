//! Axum-based HTTP read API over the poll state and sensors

use crate::amber::Direction;
use crate::error::Result;
use crate::poller::{PollState, PricePoller};
use crate::selector::{Selected, select_at};
use crate::sensors::{Sensor, SensorReading, read_all};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub postcode: String,
    pub state_rx: watch::Receiver<Arc<PollState>>,
    pub sensors: Arc<Vec<Sensor>>,
}

impl AppState {
    pub fn new(poller: &PricePoller, entry_id: Uuid) -> Self {
        Self::from_receiver(poller.postcode(), entry_id, poller.subscribe())
    }

    pub fn from_receiver(
        postcode: &str,
        entry_id: Uuid,
        state_rx: watch::Receiver<Arc<PollState>>,
    ) -> Self {
        Self {
            postcode: postcode.to_string(),
            state_rx,
            sensors: Arc::new(Sensor::all(entry_id, postcode)),
        }
    }

    fn current(&self) -> Arc<PollState> {
        self.state_rx.borrow().clone()
    }

    fn readings(&self, direction: Option<Direction>) -> Vec<SensorReading> {
        let state = self.current();
        let readings = read_all(&self.sensors, &state, Utc::now());
        match direction {
            Some(d) => readings.into_iter().filter(|r| r.direction == d).collect(),
            None => readings,
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusView<'a> {
    postcode: &'a str,
    has_snapshot: bool,
    stale: bool,
    fetched_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    poll: &'a PollState,
}

#[derive(Debug, Serialize)]
struct IntervalView {
    nem_time: String,
    starts_at: DateTime<Utc>,
    per_kwh: f64,
    renewables: f64,
    descriptor: String,
}

impl From<Selected<'_>> for IntervalView {
    fn from(selected: Selected<'_>) -> Self {
        Self {
            nem_time: selected.nem_time.clone(),
            starts_at: selected.starts_at,
            per_kwh: selected.per_kwh,
            renewables: selected.renewables,
            descriptor: selected.descriptor.as_str().to_string(),
        }
    }
}

fn unknown_direction(raw: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": format!("unknown direction '{raw}'")})),
    )
        .into_response()
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn version() -> impl IntoResponse {
    Json(json!({"version": env!("APP_VERSION")}))
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let poll = state.current();
    Json(StatusView {
        postcode: &state.postcode,
        has_snapshot: poll.has_snapshot(),
        stale: poll.is_stale(),
        fetched_at: poll.snapshot.as_ref().map(|s| s.fetched_at),
        poll: &poll,
    })
    .into_response()
}

async fn sensors(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.readings(None))
}

async fn sensors_for_direction(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Response {
    match raw.parse::<Direction>() {
        Ok(direction) => Json(state.readings(Some(direction))).into_response(),
        Err(_) => unknown_direction(&raw),
    }
}

async fn selection(State(state): State<AppState>, Path(raw): Path<String>) -> Response {
    let Ok(direction) = raw.parse::<Direction>() else {
        return unknown_direction(&raw);
    };
    let poll = state.current();
    let now = Utc::now();
    let (current, next) = poll.snapshot.as_deref().map_or((None, None), |snapshot| {
        let selection = select_at(snapshot, direction, now);
        (
            selection.current.map(IntervalView::from),
            selection.next.map(IntervalView::from),
        )
    });
    Json(json!({
        "direction": direction,
        "now": now,
        "available": current.is_some(),
        "current": current,
        "next": next,
    }))
    .into_response()
}

async fn events(State(state): State<AppState>) -> impl IntoResponse {
    let sensors = Arc::clone(&state.sensors);
    let stream = WatchStream::new(state.state_rx.clone()).map(move |poll| {
        Event::default()
            .event("sensors")
            .json_data(read_all(&sensors, &poll, Utc::now()))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/version", get(version))
        .route("/api/status", get(status))
        .route("/api/sensors", get(sensors))
        .route("/api/sensors/{direction}", get(sensors_for_direction))
        .route("/api/selection/{direction}", get(selection))
        .route("/api/events", get(events))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve the read API until the task is dropped
pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let logger = crate::logging::get_logger("web");
    let addr = match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port),
        Err(_) => {
            logger.warn(&format!("Invalid host '{host}'; falling back to 127.0.0.1"));
            ([127, 0, 0, 1], port).into()
        }
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    logger.info(&format!("Web server listening on {addr}"));
    axum::serve(listener, build_router(state))
        .await
        .map_err(|e| crate::error::AmberError::web(format!("Server stopped: {e}")))
}
