use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use courier_common::config::AppConfig;
use courier_common::db;
use courier_notifier::delivery::GatewayClient;
use courier_notifier::dispatcher::{Dispatcher, PayloadPaths};
use courier_notifier::pacing::Pacing;
use courier_notifier::store::PgContactStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier_notifier=info,courier_common=info".into()),
        )
        .json()
        .init();

    tracing::info!("Courier notifier starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Connect to database
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    // The gateway owns the paired session; refuse to start without it
    let gateway = GatewayClient::new(
        &config.whatsapp_gateway_url,
        config.whatsapp_gateway_token.clone(),
        Duration::from_secs(config.whatsapp_request_timeout_secs),
    )?;
    gateway.ensure_connected().await?;

    let mut dispatcher = Dispatcher::new(
        Arc::new(PgContactStore::new(pool)),
        Arc::new(gateway),
        Pacing::from_entropy(&config.dispatch),
        PayloadPaths {
            media: config.media_path.clone(),
            caption: config.caption_path.clone(),
        },
    );

    // Ctrl+C raises the flag; the loop finishes the contact in hand and returns
    let shutdown = dispatcher.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received shutdown signal, stopping after current contact...");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    dispatcher.run().await;

    tracing::info!("Courier notifier stopped.");
    Ok(())
}
