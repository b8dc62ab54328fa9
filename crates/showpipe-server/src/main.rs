mod api;
mod middleware;

use std::sync::Arc;

use showpipe_core::StatusStoreKind;
use showpipe_pipeline::{
    MemoryStatusStore, PgStatusStore, Pipeline, PipelineConfig, ProgressTracker, StatusStore,
};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = showpipe_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = showpipe_db::PoolConfig::from_app_config(&config);
    let pool = showpipe_db::connect_pool(&config.database_url, pool_config).await?;
    showpipe_db::run_migrations(&pool).await?;

    let store: Arc<dyn StatusStore> = match config.status_store {
        StatusStoreKind::Memory => Arc::new(MemoryStatusStore::new()),
        StatusStoreKind::Postgres => Arc::new(PgStatusStore::new(pool.clone())),
    };
    let pipeline = Pipeline::new(
        pool.clone(),
        PipelineConfig::from_app_config(&config),
        ProgressTracker::new(store),
    )?;

    let app = build_app(AppState {
        pool,
        pipeline: Arc::new(pipeline),
    });

    tracing::info!(
        bind_addr = %config.bind_addr,
        env = %config.env,
        status_store = %config.status_store,
        "showpipe server listening"
    );
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
