use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultantStatus {
    Active,
    Inactive,
    Suspended,
    Pending,
}

impl ConsultantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultantStatus::Active => "active",
            ConsultantStatus::Inactive => "inactive",
            ConsultantStatus::Suspended => "suspended",
            ConsultantStatus::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Consultant {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub commission_rate: Decimal,
    #[serde(skip_serializing)]
    pub iban: Option<String>,
    pub status: String,
    pub odoo_partner_id: Option<i64>,
    pub imported_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contact fields carried over from an Odoo partner record. Locally-owned
/// fields (code, status, commission, IBAN) are never part of this set.
#[derive(Debug, Clone)]
pub struct ConsultantDraft {
    pub odoo_partner_id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
}
