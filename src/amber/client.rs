use crate::amber::types::{PricesResponse, Snapshot};
use crate::config::AmberConfig;
use crate::error::{AmberError, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::poller::PriceSource;
use async_trait::async_trait;
use chrono_tz::Tz;
use reqwest::header::{ACCEPT, ORIGIN};
use reqwest::{Client, Url};
use std::time::{Duration, Instant};

const USER_AGENT: &str = concat!("amberwatch/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the Amber price endpoint
#[derive(Debug, Clone)]
pub struct AmberClient {
    http: Client,
    base_url: Url,
    origin: String,
    source_tz: Tz,
    logger: StructuredLogger,
}

impl AmberClient {
    /// Create a client from the price API configuration
    pub fn new(config: &AmberConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AmberError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url()?,
            origin: config.origin.clone(),
            source_tz: config.timezone()?,
            logger: get_logger_with_context(LogContext::new("client").with_postcode(config.postcode())),
        })
    }

    /// `{base}/postcode/{postcode}/prices`
    pub fn prices_url(&self, postcode: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AmberError::config(format!("Base URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(["postcode", postcode.trim(), "prices"]);
        Ok(url)
    }

    /// Fetch recent and forecast prices for a postcode.
    ///
    /// Any transport problem, a non-success status or a body that is not a
    /// JSON object comes back as a connectivity error. Problems inside the
    /// body only drop the affected intervals or direction.
    pub async fn fetch(&self, postcode: &str, past_hours: u8) -> Result<Snapshot> {
        let url = self.prices_url(postcode)?;
        let started = Instant::now();
        self.logger
            .debug(&format!("GET {url} past-hours={past_hours}"));

        let response = self
            .http
            .get(url)
            .query(&[("past-hours", past_hours)])
            .header(ORIGIN, self.origin.as_str())
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?;
        let body: PricesResponse = response.json().await?;

        let snapshot = Snapshot::from_response(body, self.source_tz);
        self.logger.debug(&format!(
            "Fetched {} intervals in {} ms",
            snapshot.interval_count(),
            started.elapsed().as_millis()
        ));
        Ok(snapshot)
    }

    /// Check that the API knows `postcode`; returns the entry title on success
    pub async fn validate_location(&self, postcode: &str, past_hours: u8) -> Result<String> {
        let postcode = postcode.trim();
        let snapshot = self.fetch(postcode, past_hours).await?;
        if !snapshot.has_location() {
            self.logger
                .error(&format!("Price API does not recognise postcode {postcode}"));
            return Err(AmberError::invalid_postcode(postcode));
        }
        let title = format!("Amber Energy - {postcode}");
        self.logger.info(&format!("Location validated: {title}"));
        Ok(title)
    }
}

#[async_trait]
impl PriceSource for AmberClient {
    async fn fetch(&self, postcode: &str, past_hours: u8) -> Result<Snapshot> {
        Self::fetch(self, postcode, past_hours).await
    }
}
