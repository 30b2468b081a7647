use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use twyn_api::config::ServerConfig;
use twyn_api::router::build_app_router;
use twyn_api::state::AppState;
use twyn_events::{
    ApnsConfig, ApnsTransport, LogOnlyTransport, Notifier, PgDeviceRegistry, PushTransport,
};
use twyn_pipeline::{PgJobStore, Pipeline, PipelineDeps};
use twyn_provider::{HiggsfieldApi, ProviderConfig};
use twyn_storage::{S3BlobStore, S3Config};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "twyn_api=debug,twyn_pipeline=debug,twyn_events=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = twyn_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    twyn_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    twyn_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Blob store ---
    let s3_config = S3Config::from_env().expect("Invalid S3 configuration");
    let blobs = Arc::new(S3BlobStore::connect(s3_config).await);
    tracing::info!(bucket = blobs.bucket(), "S3 blob store ready");

    // --- Provider ---
    let provider_config = ProviderConfig::from_env().expect("Invalid provider configuration");
    let provider =
        Arc::new(HiggsfieldApi::new(&provider_config).expect("Failed to build provider client"));

    // --- Push transport ---
    let transport: Arc<dyn PushTransport> = match ApnsConfig::from_env() {
        Some(apns) => Arc::new(
            ApnsTransport::new(apns)
                .await
                .expect("Failed to load APNs signing key"),
        ),
        None => {
            tracing::warn!("APNs credentials not configured, push notifications will only be logged");
            Arc::new(LogOnlyTransport)
        }
    };
    tracing::info!(transport = transport.name(), "Push transport selected");
    let notifier = Notifier::new(Arc::new(PgDeviceRegistry::new(pool.clone())), transport);

    // --- Pipeline ---
    let store = Arc::new(PgJobStore::new(pool.clone()));
    let pipeline = Pipeline::new(PipelineDeps {
        training_jobs: store.clone(),
        generation_jobs: store.clone(),
        usage: store,
        blobs,
        provider,
        notifier,
    });

    match pipeline.recover_in_flight().await {
        Ok(report) => tracing::info!(?report, "Startup recovery finished"),
        Err(e) => tracing::error!(error = %e, "Startup recovery failed; in-flight jobs left as-is"),
    }

    // --- App state ---
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let state = AppState {
        pool,
        config: Arc::new(config),
        pipeline: pipeline.clone(),
    };
    let app = build_app_router(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!(
        in_flight = pipeline.runner().in_flight(),
        "Server stopped accepting connections, draining detached jobs"
    );
    if pipeline.runner().shutdown(shutdown_timeout).await {
        tracing::info!("All detached jobs finished");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM (Unix) to start graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
