use anyhow::{bail, Result};
use plate_core::RecognizerConfig;
use plate_service::{
    api,
    backend::{remote::RemoteModelBackend, synthetic::SyntheticBackend},
    BackendRegistry, PlateServiceConfig, PlateServiceState,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize telemetry (logging and metrics)
    let _logging = telemetry::init_with_service("plate-service");

    info!("Starting Plate Service...");

    // Load configuration from environment
    let config = PlateServiceConfig::from_env()?;
    info!(
        "Plate Service configuration: bind={}, node_id={}, default_backend={}",
        config.bind_addr, config.node_id, config.default_backend
    );

    let recognizer_config = RecognizerConfig::default();
    recognizer_config.validate()?;

    // Initialize backend registry
    let registry = BackendRegistry::new();

    let synthetic = SyntheticBackend::new(&recognizer_config, config.synthetic_text.clone())?;
    registry.register(Arc::new(synthetic)).await?;

    if let Some(model_url) = config.model_url.clone() {
        info!("Using model server at: {}", model_url);
        let remote = RemoteModelBackend::new(model_url, config.model_timeout)?;
        registry.register(Arc::new(remote)).await?;
    } else {
        info!("No model server configured, only the synthetic backend is available");
    }

    if !registry.has_backend(&config.default_backend).await {
        bail!("Default backend '{}' is not registered", config.default_backend);
    }
    info!("Backend registry initialized with {} backends", registry.count().await);

    // Create application state
    let state = PlateServiceState::new(&config, recognizer_config, registry);

    // Build HTTP router
    let app = api::router(state);

    // Bind and serve
    info!("Binding to {}", config.bind_addr);
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Plate Service listening on {}", config.bind_addr);

    // Run with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Plate Service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
}
