use chrono::Utc;
use sqlx::{query, query_as, PgPool};
use uuid::Uuid;

use crate::middleware::error_handling::Result;
use crate::models::catalog::{Product, ProductDraft, SearchProductsRequest};

const PRODUCT_COLUMNS: &str = "id, odoo_id, name, slug, description, price, sale_price, sku, \
     stock_quantity, category_id, active, availability_status, primary_image_url, \
     embedded_image_backup, metadata, last_stock_sync_at, imported_at, created_at, updated_at";

pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_odoo_id(&self, odoo_id: i64) -> Result<Option<Product>> {
        let product = query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE odoo_id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(odoo_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn create_from_import(&self, draft: &ProductDraft) -> Result<Product> {
        let now = Utc::now();
        let product = query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (
                odoo_id, name, slug, description, price, sale_price, sku,
                stock_quantity, category_id, active, availability_status,
                primary_image_url, embedded_image_backup, metadata,
                last_stock_sync_at, imported_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(draft.odoo_id)
        .bind(&draft.name)
        .bind(&draft.slug)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.sale_price)
        .bind(&draft.sku)
        .bind(draft.stock_quantity)
        .bind(draft.category_id)
        .bind(draft.active)
        .bind(draft.availability_status.as_str())
        .bind(&draft.primary_image_url)
        .bind(&draft.embedded_image_backup)
        .bind(&draft.metadata)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    /// Full-field overwrite of an existing row with the values computed from
    /// the current import record.
    pub async fn update_from_import(&self, id: Uuid, draft: &ProductDraft) -> Result<Product> {
        let now = Utc::now();
        let product = query_as::<_, Product>(&format!(
            r#"
            UPDATE products SET
                name = $2, slug = $3, description = $4, price = $5, sale_price = $6,
                sku = $7, stock_quantity = $8, category_id = $9, active = $10,
                availability_status = $11, primary_image_url = $12,
                embedded_image_backup = $13, metadata = $14,
                last_stock_sync_at = $15, imported_at = $15, updated_at = $15
            WHERE id = $1
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.slug)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.sale_price)
        .bind(&draft.sku)
        .bind(draft.stock_quantity)
        .bind(draft.category_id)
        .bind(draft.active)
        .bind(draft.availability_status.as_str())
        .bind(&draft.primary_image_url)
        .bind(&draft.embedded_image_backup)
        .bind(&draft.metadata)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    /// Update the primary image row in place if one exists, else insert it.
    pub async fn upsert_primary_image(
        &self,
        product_id: Uuid,
        url: &str,
        alt_text: &str,
    ) -> Result<()> {
        let updated = query(
            "UPDATE product_images SET url = $2, alt_text = $3
             WHERE product_id = $1 AND is_primary",
        )
        .bind(product_id)
        .bind(url)
        .bind(alt_text)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            query(
                "INSERT INTO product_images (product_id, url, alt_text, position, is_primary)
                 VALUES ($1, $2, $3, 0, TRUE)",
            )
            .bind(product_id)
            .bind(url)
            .bind(alt_text)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    /// Idempotent many-to-many link; the composite primary key absorbs
    /// concurrent duplicate inserts.
    pub async fn link_category(&self, product_id: Uuid, category_id: Uuid) -> Result<()> {
        query(
            "INSERT INTO product_categories (product_id, category_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(product_id)
        .bind(category_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        let product = query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE slug = $1",
            PRODUCT_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn search(&self, request: &SearchProductsRequest) -> Result<Vec<Product>> {
        let limit = request.limit.unwrap_or(50).min(100);
        let offset = request.offset.unwrap_or(0);
        let search = request
            .search
            .as_deref()
            .map(|s| format!("%{}%", s.trim()));

        let products = query_as::<_, Product>(&format!(
            r#"
            SELECT {}
            FROM products
            WHERE active
              AND ($1::text IS NULL OR name ILIKE $1)
              AND ($2::uuid IS NULL OR category_id = $2)
            ORDER BY name
            LIMIT $3 OFFSET $4
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(search)
        .bind(request.category)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}
