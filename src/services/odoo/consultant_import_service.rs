use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::PgPool;
use std::time::Instant;
use uuid::Uuid;

use crate::config::OdooConfig;
use crate::models::consultant::ConsultantDraft;
use crate::models::sync::SyncStatus;
use crate::repositories::{ConsultantRepository, SyncLogRepository};
use crate::services::audit_service::AuditService;
use crate::services::odoo::odoo_client::{OdooClient, OdooPartner};
use crate::services::odoo::{
    ImportError, ImportErrorDetail, ImportOutcome, ImportStats, PROGRESS_INTERVAL,
};

/// Commission assigned to consultants on first import; adjusted later by
/// the back office.
const DEFAULT_COMMISSION_RATE: Decimal = dec!(10);

enum RecordOutcome {
    Created,
    Updated,
}

pub struct ConsultantImportService {
    client: OdooClient,
    consultant_repo: ConsultantRepository,
    sync_log_repo: SyncLogRepository,
    audit: AuditService,
}

impl ConsultantImportService {
    pub fn new(pool: PgPool, odoo: OdooConfig) -> Self {
        Self {
            client: OdooClient::new(odoo),
            consultant_repo: ConsultantRepository::new(pool.clone()),
            sync_log_repo: SyncLogRepository::new(pool.clone()),
            audit: AuditService::new(pool),
        }
    }

    pub async fn run(&self, admin_id: Uuid) -> Result<ImportOutcome, ImportError> {
        let started = Instant::now();
        let log_id = self
            .sync_log_repo
            .start("odoo_consultants")
            .await
            .map_err(|e| ImportError::Bookkeeping(e.to_string()))?;

        match self.execute().await {
            Ok(stats) => {
                let duration_ms = started.elapsed().as_millis() as i64;
                let status = if stats.errors > 0 {
                    SyncStatus::Partial
                } else {
                    SyncStatus::Success
                };

                let metadata = serde_json::json!({
                    "created": stats.created,
                    "updated": stats.updated,
                    "skipped": stats.skipped,
                    "duration_ms": duration_ms,
                });
                self.sync_log_repo
                    .complete(log_id, status, stats.processed(), stats.errors, metadata)
                    .await
                    .map_err(|e| ImportError::Bookkeeping(e.to_string()))?;

                self.audit
                    .log_import_completed(admin_id, "odoo_consultant_import", &stats, duration_ms)
                    .await
                    .ok();

                tracing::info!(
                    "Consultant import finished: {} created, {} updated, {} errors of {} in {}ms",
                    stats.created,
                    stats.updated,
                    stats.errors,
                    stats.total,
                    duration_ms
                );

                Ok(ImportOutcome { stats, duration_ms })
            }
            Err(e) => {
                self.sync_log_repo.fail(log_id, &e.to_string()).await.ok();
                Err(e)
            }
        }
    }

    async fn execute(&self) -> Result<ImportStats, ImportError> {
        let session = self
            .client
            .authenticate()
            .await
            .map_err(|e| ImportError::Authentication(e.to_string()))?;

        let records = self
            .client
            .fetch_partners(&session)
            .await
            .map_err(|e| ImportError::Fetch(e.to_string()))?;

        let mut stats = ImportStats::new(records.len() as i32);

        for (index, record) in records.iter().enumerate() {
            // The fetch domain filters on email, but the projection can
            // still carry records whose address blanked out in between.
            if record.email.is_none() {
                stats.record_skipped();
            } else {
                match self.process_record(record).await {
                    Ok(RecordOutcome::Created) => stats.record_created(),
                    Ok(RecordOutcome::Updated) => stats.record_updated(),
                    Err(e) => {
                        tracing::error!(
                            "Failed to upsert consultant {} ({}): {}",
                            record.id,
                            record.name,
                            e
                        );
                        stats.record_error(ImportErrorDetail {
                            name: record.name.clone(),
                            odoo_id: record.id,
                            sku: None,
                            message: e.to_string(),
                        });
                    }
                }
            }

            if (index + 1) % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    "Import progress: {}/{} ({} created, {} updated, {} errors)",
                    index + 1,
                    stats.total,
                    stats.created,
                    stats.updated,
                    stats.errors
                );
            }
        }

        Ok(stats)
    }

    async fn process_record(
        &self,
        record: &OdooPartner,
    ) -> crate::middleware::error_handling::Result<RecordOutcome> {
        let draft = map_partner(record);

        match self.consultant_repo.find_by_email(&draft.email).await? {
            Some(existing) => {
                self.consultant_repo
                    .update_from_import(existing.id, &draft)
                    .await?;
                Ok(RecordOutcome::Updated)
            }
            None => {
                let code = generate_consultant_code();
                self.consultant_repo
                    .create_from_import(&draft, &code, DEFAULT_COMMISSION_RATE)
                    .await?;
                Ok(RecordOutcome::Created)
            }
        }
    }
}

/// Contact fields carried over from the partner record. The email is the
/// identity key and is normalized to lowercase.
pub fn map_partner(record: &OdooPartner) -> ConsultantDraft {
    ConsultantDraft {
        odoo_partner_id: record.id,
        name: record.name.clone(),
        email: record
            .email
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_lowercase(),
        phone: record.phone.clone(),
        tax_id: record.vat.clone(),
        street: record.street.clone(),
        city: record.city.clone(),
        zip: record.zip.clone(),
        country: record.country_id.as_ref().map(|c| c.name.clone()),
    }
}

fn generate_consultant_code() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..0xFFFF_FFFF);
    format!("CONS-{:08X}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn email_is_normalized_for_identity_matching() {
        let record: OdooPartner = serde_json::from_value(json!({
            "id": 11,
            "name": "Ana Souza",
            "email": "  Ana.Souza@Example.COM ",
            "country_id": [31, "Brazil"]
        }))
        .unwrap();

        let draft = map_partner(&record);
        assert_eq!(draft.email, "ana.souza@example.com");
        assert_eq!(draft.country.as_deref(), Some("Brazil"));
    }

    #[test]
    fn consultant_codes_have_the_expected_shape() {
        let code = generate_consultant_code();
        assert!(code.starts_with("CONS-"));
        assert_eq!(code.len(), 13);
    }
}
