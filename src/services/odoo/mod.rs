// One-way synchronization from the Odoo ERP into the local catalog:
// authenticate, reconcile the category tree, bulk-fetch records, then upsert
// them one at a time while accumulating counters for the run summary.

pub mod category_reconciler;
pub mod consultant_import_service;
pub mod odoo_client;
pub mod product_import_service;

pub use category_reconciler::{CategoryMap, CategoryReconciler};
pub use consultant_import_service::ConsultantImportService;
pub use odoo_client::{OdooClient, OdooError, OdooSession};
pub use product_import_service::ProductImportService;

use serde::Serialize;
use thiserror::Error;

/// Fatal pipeline errors. Everything per-record is swallowed into the stats
/// instead of surfacing here.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Odoo authentication failed: {0}")]
    Authentication(String),

    #[error("Odoo fetch failed: {0}")]
    Fetch(String),

    #[error("Sync bookkeeping failed: {0}")]
    Bookkeeping(String),
}

/// Error samples kept per run; the rest is only counted.
pub const MAX_ERROR_SAMPLES: usize = 10;

/// Records logged between progress lines.
pub const PROGRESS_INTERVAL: usize = 25;

#[derive(Debug, Clone, Serialize)]
pub struct ImportErrorDetail {
    pub name: String,
    pub odoo_id: i64,
    pub sku: Option<String>,
    pub message: String,
}

/// Per-run accumulator threaded through the upsert loop. Every record ends
/// in exactly one of created/updated/skipped/errors.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportStats {
    pub total: i32,
    pub created: i32,
    pub updated: i32,
    pub skipped: i32,
    pub errors: i32,
    pub images_processed: i32,
    pub images_failed: i32,
    pub categories_mapped: i32,
    pub categories_created: i32,
    pub error_samples: Vec<ImportErrorDetail>,
}

impl ImportStats {
    pub fn new(total: i32) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record_created(&mut self) {
        self.created += 1;
    }

    pub fn record_updated(&mut self) {
        self.updated += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_error(&mut self, detail: ImportErrorDetail) {
        self.errors += 1;
        if self.error_samples.len() < MAX_ERROR_SAMPLES {
            self.error_samples.push(detail);
        }
    }

    pub fn record_image_processed(&mut self) {
        self.images_processed += 1;
    }

    pub fn record_image_failed(&mut self) {
        self.images_failed += 1;
    }

    /// Records that went through the write path.
    pub fn processed(&self) -> i32 {
        self.created + self.updated
    }

    /// Loop invariant: every fetched record is accounted for exactly once.
    pub fn is_balanced(&self) -> bool {
        self.created + self.updated + self.skipped + self.errors == self.total
    }
}

/// What an import run hands back to the HTTP layer.
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub stats: ImportStats,
    pub duration_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(n: i64) -> ImportErrorDetail {
        ImportErrorDetail {
            name: format!("Product {}", n),
            odoo_id: n,
            sku: None,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn counters_balance_against_total() {
        let mut stats = ImportStats::new(4);
        stats.record_created();
        stats.record_updated();
        stats.record_skipped();
        stats.record_error(detail(1));
        assert!(stats.is_balanced());
        assert_eq!(stats.processed(), 2);
    }

    #[test]
    fn error_samples_are_bounded_but_counting_is_not() {
        let mut stats = ImportStats::new(50);
        for n in 0..(MAX_ERROR_SAMPLES as i64 + 5) {
            stats.record_error(detail(n));
        }
        assert_eq!(stats.errors, MAX_ERROR_SAMPLES as i32 + 5);
        assert_eq!(stats.error_samples.len(), MAX_ERROR_SAMPLES);
    }
}
