use chrono::Utc;
use sqlx::{query, query_as, PgPool, Row};
use uuid::Uuid;

use crate::middleware::error_handling::Result;
use crate::models::sync::{SyncLog, SyncStatus};

const SYNC_LOG_COLUMNS: &str = "id, sync_type, status, records_synced, records_failed, \
     error_message, metadata, started_at, completed_at";

pub struct SyncLogRepository {
    pool: PgPool,
}

impl SyncLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a run record before the pipeline starts.
    pub async fn start(&self, sync_type: &str) -> Result<Uuid> {
        let row = query(
            "INSERT INTO sync_logs (sync_type, status) VALUES ($1, $2) RETURNING id",
        )
        .bind(sync_type)
        .bind(SyncStatus::Running.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("id")?)
    }

    pub async fn complete(
        &self,
        id: Uuid,
        status: SyncStatus,
        records_synced: i32,
        records_failed: i32,
        metadata: serde_json::Value,
    ) -> Result<()> {
        query(
            r#"
            UPDATE sync_logs
            SET status = $2, records_synced = $3, records_failed = $4,
                metadata = $5, completed_at = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(records_synced)
        .bind(records_failed)
        .bind(metadata)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Close a run that aborted before reaching the record loop.
    pub async fn fail(&self, id: Uuid, error_message: &str) -> Result<()> {
        query(
            r#"
            UPDATE sync_logs
            SET status = $2, error_message = $3, completed_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(SyncStatus::Error.as_str())
        .bind(error_message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<SyncLog>> {
        let logs = query_as::<_, SyncLog>(&format!(
            "SELECT {} FROM sync_logs ORDER BY started_at DESC LIMIT $1 OFFSET $2",
            SYNC_LOG_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}
