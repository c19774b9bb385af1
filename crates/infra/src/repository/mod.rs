//! Product repository boundary.
//!
//! `ProductRepository` is the persistence interface for products. It makes no
//! storage assumptions: `InMemoryProductRepository` backs tests and local
//! development, `PostgresProductRepository` is the production store.
//!
//! ## Write semantics
//!
//! - `create()` validates, inserts, commits, then assigns the generated id to
//!   the caller's value. An id already present on the value is ignored.
//! - `update()` requires an id and rewrites the matching row. It never inserts.
//! - `delete()` requires an id. Deleting a row that is already gone is not an
//!   error; the caller's value keeps its (now orphaned) id.
//!
//! Each write runs in its own transaction and is rolled back before an error
//! is returned.
//!
//! ## Read semantics
//!
//! `find()` returns `None` for an absent id. The `all()`/`find_by_*()` family
//! returns a lazy [`ProductQuery`]; nothing touches the store until it is
//! forced with `fetch_all()`, `count()` or `first()`. Rows come back in id
//! order.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryProductRepository;
pub use postgres::PostgresProductRepository;

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use catalog_products::{Category, Product, ProductFilter, ProductId};

use crate::error::{RepositoryError, RepositoryResult};

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Persist a transient product and assign its id.
    async fn create(&self, product: &mut Product) -> RepositoryResult<()>;

    /// Write the in-memory fields back to the stored row.
    async fn update(&self, product: &Product) -> RepositoryResult<()>;

    /// Remove the stored row.
    async fn delete(&self, product: &Product) -> RepositoryResult<()>;

    async fn find(&self, id: ProductId) -> RepositoryResult<Option<Product>>;

    /// Rows matching `filter`, in id order, at most `limit` of them.
    async fn fetch(
        &self,
        filter: &ProductFilter,
        limit: Option<u64>,
    ) -> RepositoryResult<Vec<Product>>;

    async fn count(&self, filter: &ProductFilter) -> RepositoryResult<u64>;

    fn query(&self, filter: ProductFilter) -> ProductQuery<'_, Self>
    where
        Self: Sized,
    {
        ProductQuery::new(self, filter)
    }

    fn all(&self) -> ProductQuery<'_, Self>
    where
        Self: Sized,
    {
        self.query(ProductFilter::all())
    }

    fn find_by_name(&self, name: &str) -> ProductQuery<'_, Self>
    where
        Self: Sized,
    {
        self.query(ProductFilter::by_name(name))
    }

    fn find_by_availability(&self, available: bool) -> ProductQuery<'_, Self>
    where
        Self: Sized,
    {
        self.query(ProductFilter::by_availability(available))
    }

    fn find_by_category(&self, category: Category) -> ProductQuery<'_, Self>
    where
        Self: Sized,
    {
        self.query(ProductFilter::by_category(category))
    }

    fn find_by_price(&self, price: Decimal) -> ProductQuery<'_, Self>
    where
        Self: Sized,
    {
        self.query(ProductFilter::by_price(price))
    }
}

#[async_trait]
impl<R> ProductRepository for Arc<R>
where
    R: ProductRepository + ?Sized,
{
    async fn create(&self, product: &mut Product) -> RepositoryResult<()> {
        (**self).create(product).await
    }

    async fn update(&self, product: &Product) -> RepositoryResult<()> {
        (**self).update(product).await
    }

    async fn delete(&self, product: &Product) -> RepositoryResult<()> {
        (**self).delete(product).await
    }

    async fn find(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
        (**self).find(id).await
    }

    async fn fetch(
        &self,
        filter: &ProductFilter,
        limit: Option<u64>,
    ) -> RepositoryResult<Vec<Product>> {
        (**self).fetch(filter, limit).await
    }

    async fn count(&self, filter: &ProductFilter) -> RepositoryResult<u64> {
        (**self).count(filter).await
    }
}

/// Lazy result set over a repository.
///
/// Holds the predicate only; each forcing call runs a fresh query, so a
/// `ProductQuery` can be counted and then fetched.
pub struct ProductQuery<'r, R: ?Sized> {
    repo: &'r R,
    filter: ProductFilter,
    limit: Option<u64>,
}

impl<'r, R> ProductQuery<'r, R>
where
    R: ProductRepository + ?Sized,
{
    pub fn new(repo: &'r R, filter: ProductFilter) -> Self {
        Self {
            repo,
            filter,
            limit: None,
        }
    }

    pub fn filter(&self) -> &ProductFilter {
        &self.filter
    }

    /// Cap the number of rows `fetch_all()` returns. `count()` ignores it.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub async fn fetch_all(&self) -> RepositoryResult<Vec<Product>> {
        self.repo.fetch(&self.filter, self.limit).await
    }

    pub async fn count(&self) -> RepositoryResult<u64> {
        self.repo.count(&self.filter).await
    }

    pub async fn first(&self) -> RepositoryResult<Option<Product>> {
        let rows = self.repo.fetch(&self.filter, Some(1)).await?;
        Ok(rows.into_iter().next())
    }
}

impl<R: ?Sized> core::fmt::Debug for ProductQuery<'_, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProductQuery")
            .field("filter", &self.filter)
            .field("limit", &self.limit)
            .finish()
    }
}

/// Id of a persisted product, or the validation error `operation` reports
/// for a transient one.
pub(crate) fn require_id(product: &Product, operation: &str) -> RepositoryResult<ProductId> {
    product
        .id()
        .ok_or_else(|| RepositoryError::validation(format!("{operation} called with empty ID field")))
}

/// Error for an update that targets a row that no longer exists.
pub(crate) fn missing_row(id: ProductId) -> RepositoryError {
    RepositoryError::validation(format!("Update called for product id=[{id}] which is not stored"))
}
