// Maps the Odoo category tree onto local category rows. Mappings are
// persistent: once an Odoo category id is linked to a local category the
// link is only ever read, never rewritten, so re-running the import creates
// nothing new for already-seen categories.

use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::middleware::error_handling::Result;
use crate::repositories::CategoryRepository;
use crate::services::odoo::odoo_client::OdooCategory;
use crate::utils::slug::slugify;

/// In-memory view of the reconciled tree for one run.
#[derive(Debug, Default)]
pub struct CategoryMap {
    by_odoo_id: HashMap<i64, Uuid>,
    pub created: i32,
    pub reused: i32,
}

impl CategoryMap {
    pub fn resolve(&self, odoo_category_id: i64) -> Option<Uuid> {
        self.by_odoo_id.get(&odoo_category_id).copied()
    }

    pub fn insert(&mut self, odoo_category_id: i64, category_id: Uuid) {
        self.by_odoo_id.insert(odoo_category_id, category_id);
    }

    pub fn len(&self) -> usize {
        self.by_odoo_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_odoo_id.is_empty()
    }
}

pub struct CategoryReconciler {
    repo: CategoryRepository,
}

impl CategoryReconciler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: CategoryRepository::new(pool),
        }
    }

    /// Walk the fetched tree in order (parents first) and resolve every
    /// Odoo category to a local id. A failing category is logged and
    /// skipped; its products will import with no category.
    pub async fn reconcile(&self, categories: &[OdooCategory]) -> CategoryMap {
        let mut map = CategoryMap::default();

        for category in categories {
            match self.resolve_one(category).await {
                Ok((local_id, created)) => {
                    map.insert(category.id, local_id);
                    if created {
                        map.created += 1;
                    } else {
                        map.reused += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "Skipping category {} ({}): {}",
                        category.id,
                        category.name,
                        e
                    );
                }
            }
        }

        tracing::info!(
            "Category reconciliation: {} mapped ({} created, {} reused)",
            map.len(),
            map.created,
            map.reused
        );

        map
    }

    async fn resolve_one(&self, category: &OdooCategory) -> Result<(Uuid, bool)> {
        if let Some(mapped) = self.repo.find_mapped_category(category.id).await? {
            return Ok((mapped, false));
        }

        let slug = slugify(&category.name);
        let (local_id, created) = match self.repo.find_by_slug(&slug).await? {
            Some(existing) => (existing.id, false),
            None => {
                let description =
                    format!("Synchronized from Odoo category {}", category.full_path());
                let inserted = self.repo.create(&category.name, &slug, &description).await?;
                (inserted.id, true)
            }
        };

        // A concurrent run may have mapped this id between our lookup and
        // here; the returned id is authoritative either way.
        let mapped = self
            .repo
            .insert_mapping(category.id, category.full_path(), local_id)
            .await?;

        Ok((mapped, created))
    }
}
