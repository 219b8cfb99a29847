// Append-only audit trail attributing back-office actions to an admin
// identity.

use sqlx::{query, PgPool};
use uuid::Uuid;

use crate::middleware::error_handling::Result;
use crate::services::odoo::ImportStats;

pub struct AuditService {
    db_pool: PgPool,
}

impl AuditService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn log_import_completed(
        &self,
        admin_id: Uuid,
        action: &str,
        stats: &ImportStats,
        duration_ms: i64,
    ) -> Result<()> {
        let detail = serde_json::json!({
            "total": stats.total,
            "created": stats.created,
            "updated": stats.updated,
            "skipped": stats.skipped,
            "errors": stats.errors,
            "images_processed": stats.images_processed,
            "images_failed": stats.images_failed,
            "categories_mapped": stats.categories_mapped,
            "categories_created": stats.categories_created,
            "error_samples": stats.error_samples,
            "duration_ms": duration_ms,
        });

        self.log_event(admin_id, action, detail).await
    }

    pub async fn log_event(
        &self,
        admin_id: Uuid,
        action: &str,
        detail: serde_json::Value,
    ) -> Result<()> {
        query("INSERT INTO admin_logs (admin_id, action, detail) VALUES ($1, $2, $3)")
            .bind(admin_id)
            .bind(action)
            .bind(detail)
            .execute(&self.db_pool)
            .await?;

        Ok(())
    }
}
