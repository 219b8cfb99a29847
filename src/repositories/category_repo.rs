use sqlx::{query, query_as, PgPool, Row};
use uuid::Uuid;

use crate::middleware::error_handling::Result;
use crate::models::catalog::Category;

pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Local category id previously mapped to this Odoo category, if any.
    pub async fn find_mapped_category(&self, odoo_category_id: i64) -> Result<Option<Uuid>> {
        let row = query("SELECT category_id FROM category_mappings WHERE odoo_category_id = $1")
            .bind(odoo_category_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("category_id")?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let category = query_as::<_, Category>(
            "SELECT id, name, slug, description, created_at, updated_at
             FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn create(&self, name: &str, slug: &str, description: &str) -> Result<Category> {
        let category = query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, description, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    /// Atomic get-or-insert on the mapping table. The no-op conflict update
    /// makes RETURNING yield the already-mapped category id when another run
    /// inserted the same Odoo category first.
    pub async fn insert_mapping(
        &self,
        odoo_category_id: i64,
        odoo_full_path: &str,
        category_id: Uuid,
    ) -> Result<Uuid> {
        let row = query(
            r#"
            INSERT INTO category_mappings (odoo_category_id, odoo_full_path, category_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (odoo_category_id)
                DO UPDATE SET odoo_category_id = EXCLUDED.odoo_category_id
            RETURNING category_id
            "#,
        )
        .bind(odoo_category_id)
        .bind(odoo_full_path)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("category_id")?)
    }

    pub async fn list_all(&self) -> Result<Vec<Category>> {
        let categories = query_as::<_, Category>(
            "SELECT id, name, slug, description, created_at, updated_at
             FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }
}
