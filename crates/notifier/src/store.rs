//! Contact store — reads pending contacts and records terminal outcomes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use courier_common::error::{AppError, Result};
use courier_common::types::Contact;

/// Persistence operations the dispatch loop needs.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// All contacts with `status = true` and no `sent_at`.
    ///
    /// Ordering is whatever the backend returns; callers must not rely on it.
    async fn fetch_pending(&self) -> Result<Vec<Contact>>;

    /// Set `sent_at` and `message` for one contact. Used for both success and
    /// failure outcomes.
    async fn mark_outcome(&self, id: Uuid, sent_at: DateTime<Utc>, message: &str) -> Result<()>;
}

/// PostgreSQL-backed contact store.
pub struct PgContactStore {
    pool: PgPool,
}

impl PgContactStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactStore for PgContactStore {
    async fn fetch_pending(&self) -> Result<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, phone, status, sent_at, message
            FROM contacts
            WHERE status = true AND sent_at IS NULL
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(contacts)
    }

    async fn mark_outcome(&self, id: Uuid, sent_at: DateTime<Utc>, message: &str) -> Result<()> {
        let result = sqlx::query("UPDATE contacts SET sent_at = $2, message = $3 WHERE id = $1")
            .bind(id)
            .bind(sent_at)
            .bind(message)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Validation(format!("contact {id} not found")));
        }

        Ok(())
    }
}
