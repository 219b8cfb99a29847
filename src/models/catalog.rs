use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistent link between an Odoo category id and a local category row.
/// Insert-only from the import pipeline.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategoryMapping {
    pub id: Uuid,
    pub odoo_category_id: i64,
    pub odoo_full_path: String,
    pub category_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Active,
    OutOfStock,
}

impl AvailabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityStatus::Active => "active",
            AvailabilityStatus::OutOfStock => "out_of_stock",
        }
    }
}

impl std::str::FromStr for AvailabilityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AvailabilityStatus::Active),
            "out_of_stock" => Ok(AvailabilityStatus::OutOfStock),
            other => Err(format!("unknown availability status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub odoo_id: Option<i64>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub sku: String,
    pub stock_quantity: i32,
    pub category_id: Option<Uuid>,
    pub active: bool,
    pub availability_status: String,
    pub primary_image_url: Option<String>,
    #[serde(skip_serializing)]
    pub embedded_image_backup: Option<String>,
    pub metadata: serde_json::Value,
    pub last_stock_sync_at: Option<DateTime<Utc>>,
    pub imported_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field set computed from one Odoo record, written verbatim on both the
/// create and the update path (full overwrite, not a merge).
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub odoo_id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub sku: String,
    pub stock_quantity: i32,
    pub category_id: Option<Uuid>,
    pub active: bool,
    pub availability_status: AvailabilityStatus,
    pub primary_image_url: Option<String>,
    pub embedded_image_backup: Option<String>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub url: String,
    pub alt_text: String,
    pub position: i32,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchProductsRequest {
    pub search: Option<String>,
    pub category: Option<Uuid>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
    pub total: usize,
}
