use anyhow::{Context, Result};
use ebloc_bridge::config::Config;
use ebloc_bridge::coordinator::{CoordinatorSettings, UpdateCoordinator};
use ebloc_bridge::logging::{get_logger, init_logging};
use ebloc_bridge::portal::{PortalClient, ReqwestTransport};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    init_logging(&config.logging).context("Failed to initialize logging")?;

    info!(
        "ebloc-bridge {} starting up (portal {})",
        env!("APP_VERSION"),
        config.portal.base_url
    );

    let transport = ReqwestTransport::new(&config.portal).context("Failed to build HTTP client")?;
    let client = PortalClient::new(Arc::new(transport), &config.portal.cookie);

    // The cookie is checked once here; the coordinator never re-validates it
    client
        .discover()
        .await
        .context("Portal rejected the configured session cookie")?;

    let mut coordinator = UpdateCoordinator::new(client, CoordinatorSettings::from_config(&config));

    #[cfg(feature = "web")]
    let web_task = if config.web.enabled {
        let state = ebloc_bridge::web::AppState::new(&coordinator, &config);
        let host = config.web.host.clone();
        let port = config.web.port;
        Some(tokio::spawn(async move {
            if let Err(e) = ebloc_bridge::web::serve(state, &host, port).await {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        None
    };

    coordinator.run(shutdown_signal()).await;

    #[cfg(feature = "web")]
    {
        if let Some(task) = web_task {
            task.abort();
        }
    }

    get_logger("main").info("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler, run until the process is killed
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
