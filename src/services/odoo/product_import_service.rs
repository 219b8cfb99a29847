use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::time::Instant;
use uuid::Uuid;

use crate::config::{OdooConfig, StorageConfig};
use crate::models::catalog::{AvailabilityStatus, ProductDraft};
use crate::models::sync::SyncStatus;
use crate::repositories::{ProductRepository, SyncLogRepository};
use crate::services::audit_service::AuditService;
use crate::services::odoo::category_reconciler::{CategoryMap, CategoryReconciler};
use crate::services::odoo::odoo_client::{OdooClient, OdooProduct};
use crate::services::odoo::{
    ImportError, ImportErrorDetail, ImportOutcome, ImportStats, PROGRESS_INTERVAL,
};
use crate::utils::object_storage::StorageClient;
use crate::utils::slug::slugify_with_key;

enum RecordOutcome {
    Created,
    Updated,
}

pub struct ProductImportService {
    client: OdooClient,
    storage: StorageClient,
    product_repo: ProductRepository,
    reconciler: CategoryReconciler,
    sync_log_repo: SyncLogRepository,
    audit: AuditService,
}

impl ProductImportService {
    pub fn new(pool: PgPool, odoo: OdooConfig, storage: StorageConfig) -> Self {
        Self {
            client: OdooClient::new(odoo),
            storage: StorageClient::new(storage),
            product_repo: ProductRepository::new(pool.clone()),
            reconciler: CategoryReconciler::new(pool.clone()),
            sync_log_repo: SyncLogRepository::new(pool.clone()),
            audit: AuditService::new(pool),
        }
    }

    /// Run the full pipeline once, attributing the run to `admin_id`.
    /// Fatal stages (authenticate, fetch) abort and close the sync log as
    /// an error; per-record failures only show up in the counters.
    pub async fn run(&self, admin_id: Uuid) -> Result<ImportOutcome, ImportError> {
        let started = Instant::now();
        let log_id = self
            .sync_log_repo
            .start("odoo_products")
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
                    "categories_mapped": stats.categories_mapped,
                    "categories_created": stats.categories_created,
                    "images_processed": stats.images_processed,
                    "images_failed": stats.images_failed,
                    "duration_ms": duration_ms,
                });
                self.sync_log_repo
                    .complete(log_id, status, stats.processed(), stats.errors, metadata)
                    .await
                    .map_err(|e| ImportError::Bookkeeping(e.to_string()))?;

                self.audit
                    .log_import_completed(admin_id, "odoo_product_import", &stats, duration_ms)
                    .await
                    .ok();

                tracing::info!(
                    "Product import finished: {} created, {} updated, {} skipped, {} errors of {} in {}ms",
                    stats.created,
                    stats.updated,
                    stats.skipped,
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

        let categories = self
            .client
            .fetch_categories(&session)
            .await
            .map_err(|e| ImportError::Fetch(e.to_string()))?;
        let category_map = self.reconciler.reconcile(&categories).await;

        let records = self
            .client
            .fetch_products(&session)
            .await
            .map_err(|e| ImportError::Fetch(e.to_string()))?;

        let mut stats = ImportStats::new(records.len() as i32);
        stats.categories_mapped = category_map.len() as i32;
        stats.categories_created = category_map.created;

        for (index, record) in records.iter().enumerate() {
            if record.is_service() {
                stats.record_skipped();
            } else {
                match self.process_record(record, &category_map, &mut stats).await {
                    Ok(RecordOutcome::Created) => stats.record_created(),
                    Ok(RecordOutcome::Updated) => stats.record_updated(),
                    Err(e) => {
                        tracing::error!(
                            "Failed to upsert product {} ({}): {}",
                            record.id,
                            record.name,
                            e
                        );
                        stats.record_error(ImportErrorDetail {
                            name: record.name.clone(),
                            odoo_id: record.id,
                            sku: record.default_code.clone(),
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
        record: &OdooProduct,
        categories: &CategoryMap,
        stats: &mut ImportStats,
    ) -> crate::middleware::error_handling::Result<RecordOutcome> {
        let existing = self.product_repo.find_by_odoo_id(record.id).await?;
        let mut draft = map_product(record, categories);

        if let Some(encoded) = &record.image_1920 {
            match self.transfer_image(record.id, encoded).await {
                Ok(url) => {
                    draft.primary_image_url = Some(url);
                    stats.record_image_processed();
                }
                Err(e) => {
                    // Degrade to an imageless upsert; the inline payload is
                    // kept as the fallback until a later run succeeds.
                    tracing::warn!("Image transfer failed for product {}: {}", record.id, e);
                    draft.embedded_image_backup = Some(encoded.clone());
                    stats.record_image_failed();
                }
            }
        }

        let (product, outcome) = match existing {
            Some(existing) => (
                self.product_repo.update_from_import(existing.id, &draft).await?,
                RecordOutcome::Updated,
            ),
            None => (
                self.product_repo.create_from_import(&draft).await?,
                RecordOutcome::Created,
            ),
        };

        if let Some(url) = &draft.primary_image_url {
            self.product_repo
                .upsert_primary_image(product.id, url, &record.name)
                .await?;
        }

        if let Some(category_id) = draft.category_id {
            self.product_repo.link_category(product.id, category_id).await?;
        }

        Ok(outcome)
    }

    async fn transfer_image(&self, odoo_id: i64, encoded: &str) -> anyhow::Result<String> {
        let bytes = BASE64.decode(encoded.trim().as_bytes())?;
        let path = format!("products/{}-{}.jpg", odoo_id, Utc::now().timestamp());
        let url = self.storage.upload(&path, bytes, "image/jpeg").await?;
        Ok(url)
    }
}

/// Compute the local field set from one Odoo record. Pure so the mapping
/// rules stay testable without a database.
pub fn map_product(record: &OdooProduct, categories: &CategoryMap) -> ProductDraft {
    let price = decimal_from(record.list_price);
    let cost = decimal_from(record.standard_price);

    // The ERP's "standard_price" doubles as the promotional price whenever
    // it undercuts the list price.
    let sale_price = if cost < price { Some(cost) } else { None };

    let availability_status = if record.qty_available <= 0.0 {
        AvailabilityStatus::OutOfStock
    } else {
        AvailabilityStatus::Active
    };

    let sku = record
        .default_code
        .clone()
        .unwrap_or_else(generate_synthetic_sku);

    let category_id = record
        .categ_id
        .as_ref()
        .and_then(|reference| categories.resolve(reference.id));

    ProductDraft {
        odoo_id: record.id,
        name: record.name.clone(),
        slug: slugify_with_key(&record.name, record.id),
        description: record.description_sale.clone().unwrap_or_default(),
        price,
        sale_price,
        sku,
        stock_quantity: record.qty_available as i32,
        category_id,
        active: record.active,
        availability_status,
        primary_image_url: None,
        embedded_image_backup: None,
        metadata: serde_json::json!({
            "source": "odoo",
            "odoo_type": record.product_type,
        }),
    }
}

fn decimal_from(value: f64) -> Decimal {
    Decimal::from_f64_retain(value).unwrap_or_default().round_dp(2)
}

fn generate_synthetic_sku() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("SKU-{}-{:04}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use uuid::Uuid;

    fn product(value: serde_json::Value) -> OdooProduct {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn discounted_cost_becomes_sale_price() {
        let record = product(json!({
            "id": 1, "name": "Lamp",
            "list_price": 100.0, "standard_price": 60.0,
            "qty_available": 5.0, "type": "product"
        }));
        let draft = map_product(&record, &CategoryMap::default());
        assert_eq!(draft.price, dec!(100.00));
        assert_eq!(draft.sale_price, Some(dec!(60.00)));
    }

    #[test]
    fn cost_at_or_above_list_price_means_no_sale() {
        let record = product(json!({
            "id": 2, "name": "Lamp",
            "list_price": 100.0, "standard_price": 150.0,
            "qty_available": 5.0, "type": "product"
        }));
        assert_eq!(map_product(&record, &CategoryMap::default()).sale_price, None);

        let record = product(json!({
            "id": 3, "name": "Lamp",
            "list_price": 100.0, "standard_price": 100.0,
            "qty_available": 5.0, "type": "product"
        }));
        assert_eq!(map_product(&record, &CategoryMap::default()).sale_price, None);
    }

    #[test]
    fn zero_stock_is_out_of_stock_even_when_active() {
        let record = product(json!({
            "id": 4, "name": "Lamp",
            "qty_available": 0.0, "active": true, "type": "product"
        }));
        let draft = map_product(&record, &CategoryMap::default());
        assert_eq!(draft.availability_status, AvailabilityStatus::OutOfStock);
        assert!(draft.active);
    }

    #[test]
    fn missing_internal_code_gets_a_synthetic_sku() {
        let record = product(json!({
            "id": 5, "name": "Lamp",
            "default_code": false, "qty_available": 1.0, "type": "product"
        }));
        let draft = map_product(&record, &CategoryMap::default());
        assert!(draft.sku.starts_with("SKU-"));

        let coded = product(json!({
            "id": 6, "name": "Lamp",
            "default_code": "LAMP-01", "qty_available": 1.0, "type": "product"
        }));
        assert_eq!(map_product(&coded, &CategoryMap::default()).sku, "LAMP-01");
    }

    #[test]
    fn category_resolves_through_the_reconciled_map() {
        let local_id = Uuid::new_v4();
        let mut map = CategoryMap::default();
        map.insert(12, local_id);

        let record = product(json!({
            "id": 7, "name": "Shirt",
            "categ_id": [12, "Apparel"], "qty_available": 1.0, "type": "product"
        }));
        assert_eq!(map_product(&record, &map).category_id, Some(local_id));

        let unmapped = product(json!({
            "id": 8, "name": "Shirt",
            "categ_id": [99, "Unknown"], "qty_available": 1.0, "type": "product"
        }));
        assert_eq!(map_product(&unmapped, &map).category_id, None);
    }

    #[test]
    fn slug_is_deterministic_per_record() {
        let record = product(json!({
            "id": 9, "name": "Café Table", "qty_available": 1.0, "type": "product"
        }));
        let draft = map_product(&record, &CategoryMap::default());
        assert!(draft.slug.starts_with("cafe-table-"));
        assert_eq!(draft.slug, map_product(&record, &CategoryMap::default()).slug);
    }
}
