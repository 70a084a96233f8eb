use anyhow::Result;
use movie_api::config::AppConfig;
use movie_api::database::Database;
use movie_api::{api, datasets, indexer, telemetry};
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let _fault_log_guard = telemetry::init(&config.error_log);
    info!(
        data_dir = %config.data_dir.display(),
        index_dir = %config.index_dir.display(),
        bind_addr = %config.bind_addr,
        error_log = %config.error_log.display(),
        "loaded configuration"
    );

    let datasets = datasets::prepare_datasets(&config).await?;
    info!(file_count = datasets.len(), "datasets ready");

    indexer::prepare_store(&config, &datasets).await?;

    let database = Database::open_lazy(&config.index_dir);
    if config.eager_init {
        database.initialize().await?;
    }
    let app_state = api::AppState::new(database);
    let app = api::router(app_state.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "starting http server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    app_state.database().close().await;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
