use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Open the pool backing the contact store.
///
/// The dispatcher runs one query at a time, so a handful of connections is
/// plenty; idle ones are closed between the long pauses of the loop.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(60))
        .connect(database_url)
        .await?;

    tracing::info!(max_connections, "Contact store pool ready");
    Ok(pool)
}
