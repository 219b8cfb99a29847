use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{query_as, PgPool};
use uuid::Uuid;

use crate::middleware::error_handling::Result;
use crate::models::consultant::{Consultant, ConsultantDraft, ConsultantStatus};

const CONSULTANT_COLUMNS: &str = "id, code, name, email, phone, tax_id, street, city, zip, \
     country, commission_rate, iban, status, odoo_partner_id, imported_at, created_at, updated_at";

pub struct ConsultantRepository {
    pool: PgPool,
}

impl ConsultantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Consultant>> {
        let consultant = query_as::<_, Consultant>(&format!(
            "SELECT {} FROM consultants WHERE email = $1",
            CONSULTANT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(consultant)
    }

    pub async fn create_from_import(
        &self,
        draft: &ConsultantDraft,
        code: &str,
        commission_rate: Decimal,
    ) -> Result<Consultant> {
        let now = Utc::now();
        let consultant = query_as::<_, Consultant>(&format!(
            r#"
            INSERT INTO consultants (
                code, name, email, phone, tax_id, street, city, zip, country,
                commission_rate, status, odoo_partner_id, imported_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            CONSULTANT_COLUMNS
        ))
        .bind(code)
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&draft.tax_id)
        .bind(&draft.street)
        .bind(&draft.city)
        .bind(&draft.zip)
        .bind(&draft.country)
        .bind(commission_rate)
        .bind(ConsultantStatus::Pending.as_str())
        .bind(draft.odoo_partner_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(consultant)
    }

    /// Overwrite the contact fields mastered in the ERP. Code, status,
    /// commission, and bank details stay untouched.
    pub async fn update_from_import(&self, id: Uuid, draft: &ConsultantDraft) -> Result<Consultant> {
        let now = Utc::now();
        let consultant = query_as::<_, Consultant>(&format!(
            r#"
            UPDATE consultants SET
                name = $2, phone = $3, tax_id = $4, street = $5, city = $6,
                zip = $7, country = $8, odoo_partner_id = $9,
                imported_at = $10, updated_at = $10
            WHERE id = $1
            RETURNING {}
            "#,
            CONSULTANT_COLUMNS
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.phone)
        .bind(&draft.tax_id)
        .bind(&draft.street)
        .bind(&draft.city)
        .bind(&draft.zip)
        .bind(&draft.country)
        .bind(draft.odoo_partner_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(consultant)
    }
}
