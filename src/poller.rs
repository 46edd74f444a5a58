//! Periodic price refresh
//!
//! One poller per configured location. It owns the latest snapshot and
//! publishes every state change on a watch channel so readers never block
//! the refresh loop.

use crate::amber::Snapshot;
use crate::config::{AmberConfig, Config};
use crate::error::Result;
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{MissedTickBehavior, interval};

/// Anything able to produce a price snapshot for a location
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(&self, postcode: &str, past_hours: u8) -> Result<Snapshot>;
}

/// Observable state of the poller
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollState {
    /// Last successfully fetched data; kept across failed refreshes
    #[serde(skip)]
    pub snapshot: Option<Arc<Snapshot>>,
    pub last_update_success: bool,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub total_polls: u64,
    pub failed_polls: u64,
}

impl PollState {
    pub const fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Data exists but the most recent refresh failed
    pub const fn is_stale(&self) -> bool {
        self.snapshot.is_some() && !self.last_update_success
    }
}

pub struct PricePoller {
    postcode: String,
    past_hours: u8,
    poll_interval: Duration,
    source: Arc<dyn PriceSource>,
    state_tx: watch::Sender<Arc<PollState>>,
    logger: StructuredLogger,
}

impl PricePoller {
    pub fn new(amber: &AmberConfig, poll_interval: Duration, source: Arc<dyn PriceSource>) -> Self {
        let postcode = amber.postcode().to_string();
        let past_hours = amber.clamped_past_hours();
        let (state_tx, _) = watch::channel(Arc::new(PollState::default()));
        Self {
            logger: get_logger_with_context(
                LogContext::new("poller")
                    .with_postcode(&postcode)
                    .with_field("past_hours", past_hours.to_string()),
            ),
            postcode,
            past_hours,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
            source,
            state_tx,
        }
    }

    pub fn from_config(config: &Config, source: Arc<dyn PriceSource>) -> Self {
        Self::new(
            &config.amber,
            Duration::from_secs(config.poll_interval_secs),
            source,
        )
    }

    pub fn postcode(&self) -> &str {
        &self.postcode
    }

    pub const fn past_hours(&self) -> u8 {
        self.past_hours
    }

    /// Current state
    pub fn state(&self) -> Arc<PollState> {
        self.state_tx.borrow().clone()
    }

    /// Receiver that sees every state published after a refresh
    pub fn subscribe(&self) -> watch::Receiver<Arc<PollState>> {
        self.state_tx.subscribe()
    }

    /// Fetch once and publish the outcome.
    ///
    /// On failure the previous snapshot stays in place and the state is
    /// marked unsuccessful; the error is returned to the caller as well.
    pub async fn refresh(&self) -> Result<()> {
        let attempted = Utc::now();
        let result = self.source.fetch(&self.postcode, self.past_hours).await;

        let mut next = (*self.state()).clone();
        next.total_polls += 1;
        next.last_attempt = Some(attempted);

        let outcome = match result {
            Ok(snapshot) => {
                self.logger.info(&format!(
                    "Price refresh succeeded: {} intervals",
                    snapshot.interval_count()
                ));
                next.snapshot = Some(Arc::new(snapshot));
                next.last_update_success = true;
                next.last_success = Some(Utc::now());
                next.last_error = None;
                Ok(())
            }
            Err(e) => {
                self.logger.error(&format!("Price refresh failed: {e}"));
                next.failed_polls += 1;
                next.last_update_success = false;
                next.last_error = Some(e.to_string());
                Err(e)
            }
        };

        self.state_tx.send_replace(Arc::new(next));
        outcome
    }

    /// Refresh performed before the location is considered ready; a failure
    /// here should abort setup.
    pub async fn first_refresh(&self) -> Result<()> {
        self.refresh().await.inspect_err(|_| {
            self.logger.debug("Location not ready after initial refresh");
        })
    }

    /// Refresh every poll interval until a shutdown signal arrives or every
    /// shutdown sender is dropped.
    pub async fn run(&self, mut shutdown: mpsc::UnboundedReceiver<()>) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // The first tick completes immediately
        ticker.tick().await;
        if self.state().last_attempt.is_none() {
            let _ = self.refresh().await;
        }

        self.logger.info(&format!(
            "Polling every {}s",
            self.poll_interval.as_secs_f64()
        ));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Failures are already logged and recorded in the state
                    let _ = self.refresh().await;
                }
                _ = shutdown.recv() => {
                    self.logger.info("Poller shutting down");
                    break;
                }
            }
        }
    }
}
