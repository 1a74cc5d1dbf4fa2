//! HubSpot Bridge Web Server.
//!
//! This binary receives HubSpot webhook deliveries:
//! - Verifies the `X-HubSpot-Signature` header
//! - Classifies every notification of the batch
//! - Publishes classified events to RabbitMQ when `CLOUDAMQP_URL` is set,
//!   otherwise only logs them

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hubbridge::{router, AppState, Config, EventHandler, EventPublisher, LoggingHandler};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    let config = Config::from_env().context("Invalid configuration")?;
    info!(
        port = config.port,
        api_key_configured = config.api_key.is_some(),
        rabbitmq_configured = config.cloudamqp_url.is_some(),
        events_queue = %config.events_queue,
        "config_loaded"
    );

    let publisher = config
        .cloudamqp_url
        .clone()
        .map(|url| EventPublisher::new(url, config.events_queue.clone()));

    let handler: Arc<dyn EventHandler> = match &publisher {
        Some(publisher) => {
            info!(queue = %publisher.queue(), "rabbitmq_publisher_created");
            Arc::new(publisher.clone())
        }
        None => {
            warn!("rabbitmq_not_configured_logging_events_only");
            Arc::new(LoggingHandler)
        }
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config, handler));

    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(publisher) = publisher {
        publisher.close().await;
    }

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "sigint_handler_install_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "sigterm_handler_install_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
