//! LeadGen outbox worker.

use std::sync::Arc;

use leadgen_config::Settings;
use leadgen_db::{JobStore, LeadWriter, SchemaCache, create_pool, run_migrations};
use leadgen_worker::Dispatcher;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env()?;

    info!("Connecting to database...");
    let pool = create_pool(&settings.database_url, settings.connect_timeout).await?;
    run_migrations(&pool).await?;
    info!("Database connected");

    let store = Arc::new(JobStore::new(pool.clone()));
    let cache = SchemaCache::new(pool.clone(), settings.leads_table.clone());
    let writer = Arc::new(LeadWriter::new(pool, cache));

    let dispatcher = Dispatcher::new(
        store,
        writer,
        settings.poll_interval,
        settings.max_attempts,
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_shutdown(shutdown.clone()));

    dispatcher.run(shutdown).await;
    Ok(())
}

async fn wait_for_shutdown(token: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
    info!("Shutdown signal received");
    token.cancel();
}
