use amberwatch::config::Config;
use amberwatch::logging::init_logging;
use amberwatch::web::{self, AppState};
use amberwatch::{AmberClient, PricePoller};
use anyhow::{Result, anyhow};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| anyhow!("Failed to load configuration: {e}"))?;
    init_logging(&config.logging)?;
    config.validate()?;

    info!("amberwatch {} starting up", env!("APP_VERSION"));

    let amber = &config.amber;
    let client = AmberClient::new(amber)?;
    let title = client
        .validate_location(amber.postcode(), amber.clamped_past_hours())
        .await
        .map_err(|e| anyhow!("Location setup failed: {e}"))?;
    info!("Monitoring {title}");

    let poller = Arc::new(PricePoller::from_config(&config, Arc::new(client)));
    poller
        .first_refresh()
        .await
        .map_err(|e| anyhow!("Initial refresh failed: {e}"))?;

    let web_task = config.web.enabled.then(|| {
        let state = AppState::new(&poller, amber.entry_id());
        let host = config.web.host.clone();
        let port = config.web.port;
        tokio::spawn(async move {
            if let Err(e) = web::serve(state, &host, port).await {
                error!("Web server error: {e}");
            }
        })
    });

    let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel::<()>();
    let poll_task = {
        let poller = Arc::clone(&poller);
        tokio::spawn(async move { poller.run(shutdown_rx).await })
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    let _ = shutdown_tx.send(());
    if let Err(e) = poll_task.await {
        error!("Poller task failed: {e}");
    }
    if let Some(task) = web_task {
        task.abort();
    }
    info!("Shutdown complete");
    Ok(())
}
