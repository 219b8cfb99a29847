// Back-office endpoints that trigger the ERP import pipeline and expose its
// run history. All routes sit behind the auth + admin middleware stack.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
    Extension,
};
use serde::Serialize;
use validator::Validate;

use crate::config::AppConfig;
use crate::middleware::auth::Claims;
use crate::middleware::error_handling::Result;
use crate::models::sync::{SyncLogListResponse, SyncLogQuery};
use crate::repositories::SyncLogRepository;
use crate::services::odoo::{
    ConsultantImportService, ImportErrorDetail, ImportOutcome, ProductImportService,
};

/// Error details echoed inline to the caller; the full bounded sample lives
/// in the admin log.
const RESPONSE_ERROR_SAMPLE: usize = 5;

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub created: i32,
    pub updated: i32,
    pub errors: i32,
    pub total: i32,
    pub details: ImportDetails,
}

#[derive(Debug, Serialize)]
pub struct ImportDetails {
    pub processed: i32,
    pub skipped: i32,
    pub categories_mapped: i32,
    pub categories_created: i32,
    pub images_processed: i32,
    pub images_failed: i32,
    pub error_sample: Vec<ImportErrorDetail>,
    pub duration_ms: i64,
    pub avg_ms_per_record: i64,
}

impl ImportResponse {
    fn from_outcome(outcome: ImportOutcome) -> Self {
        let stats = outcome.stats;
        let avg_ms_per_record = if stats.total > 0 {
            outcome.duration_ms / stats.total as i64
        } else {
            0
        };

        Self {
            success: stats.errors == 0,
            created: stats.created,
            updated: stats.updated,
            errors: stats.errors,
            total: stats.total,
            details: ImportDetails {
                processed: stats.created + stats.updated,
                skipped: stats.skipped,
                categories_mapped: stats.categories_mapped,
                categories_created: stats.categories_created,
                images_processed: stats.images_processed,
                images_failed: stats.images_failed,
                error_sample: stats
                    .error_samples
                    .into_iter()
                    .take(RESPONSE_ERROR_SAMPLE)
                    .collect(),
                duration_ms: outcome.duration_ms,
                avg_ms_per_record,
            },
        }
    }
}

/// POST /api/odoo/import-products
pub async fn import_products(
    State(config): State<AppConfig>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    tracing::info!(
        "Product import triggered by admin {} ({})",
        claims.user_id,
        claims.email
    );

    let service = ProductImportService::new(
        config.database_pool.clone(),
        config.odoo.clone(),
        config.storage.clone(),
    );
    let outcome = service.run(claims.user_id).await?;

    Ok(Json(ImportResponse::from_outcome(outcome)))
}

/// POST /api/odoo/import-consultants
pub async fn import_consultants(
    State(config): State<AppConfig>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    tracing::info!(
        "Consultant import triggered by admin {} ({})",
        claims.user_id,
        claims.email
    );

    let service =
        ConsultantImportService::new(config.database_pool.clone(), config.odoo.clone());
    let outcome = service.run(claims.user_id).await?;

    Ok(Json(ImportResponse::from_outcome(outcome)))
}

/// GET /api/odoo/sync-logs
pub async fn get_sync_logs(
    State(config): State<AppConfig>,
    Query(query): Query<SyncLogQuery>,
) -> Result<impl IntoResponse> {
    query.validate()?;

    let repo = SyncLogRepository::new(config.database_pool.clone());
    let logs = repo
        .list(query.limit.unwrap_or(20), query.offset.unwrap_or(0))
        .await?;

    Ok(Json(SyncLogListResponse {
        total: logs.len(),
        logs,
    }))
}
