use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use catalog_products::{Product, ProductFilter, ProductId};

use super::{missing_row, require_id, ProductRepository};
use crate::error::{RepositoryError, RepositoryResult};

/// In-memory product store for tests/dev.
///
/// Ids come from a counter that never goes backwards, like a database
/// sequence, so a deleted id is never handed out again.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    inner: RwLock<Table>,
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<ProductId, Product>,
    last_id: i64,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every row and restart id generation.
    pub fn clear(&self) -> RepositoryResult<()> {
        let mut table = self.write("clear")?;
        table.rows.clear();
        table.last_id = 0;
        Ok(())
    }

    fn read(&self, operation: &str) -> RepositoryResult<RwLockReadGuard<'_, Table>> {
        self.inner
            .read()
            .map_err(|_| RepositoryError::storage(operation, "lock poisoned"))
    }

    fn write(&self, operation: &str) -> RepositoryResult<RwLockWriteGuard<'_, Table>> {
        self.inner
            .write()
            .map_err(|_| RepositoryError::storage(operation, "lock poisoned"))
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, product: &mut Product) -> RepositoryResult<()> {
        product.validate()?;

        let id = {
            let mut table = self.write("create_product")?;
            table.last_id += 1;
            let id = ProductId::from(table.last_id);
            let mut stored = product.clone();
            stored.mark_persisted(id);
            table.rows.insert(id, stored);
            id
        };

        product.mark_persisted(id);
        tracing::debug!(product_id = %id, "product created");
        Ok(())
    }

    async fn update(&self, product: &Product) -> RepositoryResult<()> {
        let id = require_id(product, "Update")?;
        product.validate()?;

        let mut table = self.write("update_product")?;
        match table.rows.get_mut(&id) {
            Some(row) => {
                *row = product.clone();
                tracing::debug!(product_id = %id, "product updated");
                Ok(())
            }
            None => Err(missing_row(id)),
        }
    }

    async fn delete(&self, product: &Product) -> RepositoryResult<()> {
        let id = require_id(product, "Delete")?;

        let removed = self.write("delete_product")?.rows.remove(&id);
        if removed.is_none() {
            tracing::debug!(product_id = %id, "delete of absent product");
        }
        Ok(())
    }

    async fn find(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
        Ok(self.read("find_product")?.rows.get(&id).cloned())
    }

    async fn fetch(
        &self,
        filter: &ProductFilter,
        limit: Option<u64>,
    ) -> RepositoryResult<Vec<Product>> {
        let table = self.read("fetch_products")?;
        let limit = limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        Ok(table
            .rows
            .values()
            .filter(|p| filter.matches(p))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &ProductFilter) -> RepositoryResult<u64> {
        let table = self.read("count_products")?;
        Ok(table.rows.values().filter(|p| filter.matches(p)).count() as u64)
    }
}
