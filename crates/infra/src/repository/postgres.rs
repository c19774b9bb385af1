//! Postgres-backed product repository.
//!
//! Explicit SQL over the `products` table created by [`crate::db::init_db`].
//!
//! ## Column mapping
//!
//! | Field | Column | Rust type |
//! |-------|--------|-----------|
//! | `id` | `BIGSERIAL PRIMARY KEY` | `i64` (`ProductId`) |
//! | `name` | `VARCHAR(100) NOT NULL` | `String` |
//! | `description` | `VARCHAR(250)` | `Option<String>` |
//! | `price` | `NUMERIC(14, 2) NOT NULL` | `rust_decimal::Decimal` |
//! | `available` | `BOOLEAN NOT NULL` | `bool` |
//! | `category` | `SMALLINT NOT NULL` | `i16` (`Category::code`) |
//!
//! ## Error Mapping
//!
//! Every SQLx failure becomes `RepositoryError::Storage` (see
//! `map_sqlx_error`). Writes roll back their transaction first.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::{instrument, Span};

use catalog_products::{Category, Product, ProductFilter, ProductId};

use super::{missing_row, require_id, ProductRepository};
use crate::error::{map_sqlx_error, RepositoryError, RepositoryResult};

// Unset filter fields bind NULL and drop out of the predicate, so one
// statement serves every filter combination.
const SELECT_FILTERED: &str = r#"
    SELECT
        id,
        name,
        description,
        price,
        available,
        category
    FROM products
    WHERE ($1::text IS NULL OR name = $1)
        AND ($2::boolean IS NULL OR available = $2)
        AND ($3::smallint IS NULL OR category = $3)
        AND ($4::numeric IS NULL OR price = $4)
    ORDER BY id ASC
    LIMIT $5
"#;

const COUNT_FILTERED: &str = r#"
    SELECT COUNT(*) AS total
    FROM products
    WHERE ($1::text IS NULL OR name = $1)
        AND ($2::boolean IS NULL OR available = $2)
        AND ($3::smallint IS NULL OR category = $3)
        AND ($4::numeric IS NULL OR price = $4)
"#;

/// Postgres-backed product repository.
///
/// Cloning is cheap; clones share the pool. Each write borrows one
/// connection for the duration of its transaction.
#[derive(Debug, Clone)]
pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self) -> RepositoryResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    #[instrument(
        skip(self, product),
        fields(operation = "create_product", product_id = tracing::field::Empty),
        err
    )]
    async fn create(&self, product: &mut Product) -> RepositoryResult<()> {
        product.validate()?;

        let mut tx = self.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO products (
                name,
                description,
                price,
                available,
                category
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(product.name())
        .bind(product.description())
        .bind(product.price())
        .bind(product.available())
        .bind(product.category().code())
        .fetch_one(&mut *tx)
        .await;

        let id = match inserted.and_then(|row| row.try_get::<i64, _>("id")) {
            Ok(id) => id,
            Err(e) => return Err(rollback(tx, map_sqlx_error("insert_product", e)).await),
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        product.mark_persisted(ProductId::from(id));
        Span::current().record("product_id", id);
        Ok(())
    }

    #[instrument(
        skip(self, product),
        fields(operation = "update_product", product_id = ?product.id()),
        err
    )]
    async fn update(&self, product: &Product) -> RepositoryResult<()> {
        let id = require_id(product, "Update")?;
        product.validate()?;

        let mut tx = self.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE products
            SET
                name = $1,
                description = $2,
                price = $3,
                available = $4,
                category = $5
            WHERE id = $6
            "#,
        )
        .bind(product.name())
        .bind(product.description())
        .bind(product.price())
        .bind(product.available())
        .bind(product.category().code())
        .bind(id.get())
        .execute(&mut *tx)
        .await;

        match updated {
            Ok(result) if result.rows_affected() == 0 => {
                return Err(rollback(tx, missing_row(id)).await);
            }
            Ok(_) => {}
            Err(e) => return Err(rollback(tx, map_sqlx_error("update_product", e)).await),
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(
        skip(self, product),
        fields(operation = "delete_product", product_id = ?product.id()),
        err
    )]
    async fn delete(&self, product: &Product) -> RepositoryResult<()> {
        let id = require_id(product, "Delete")?;

        let mut tx = self.begin().await?;

        let deleted = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await;

        match deleted {
            Ok(result) if result.rows_affected() == 0 => {
                tracing::debug!("delete of absent product");
            }
            Ok(_) => {}
            Err(e) => return Err(rollback(tx, map_sqlx_error("delete_product", e)).await),
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(operation = "find_product", product_id = %id), err)]
    async fn find(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT
                id,
                name,
                description,
                price,
                available,
                category
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_product", e))?;

        row.map(|row| decode_product(&row)).transpose()
    }

    #[instrument(
        skip(self),
        fields(operation = "fetch_products", row_count = tracing::field::Empty),
        err
    )]
    async fn fetch(
        &self,
        filter: &ProductFilter,
        limit: Option<u64>,
    ) -> RepositoryResult<Vec<Product>> {
        let limit = limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));

        let rows = sqlx::query(SELECT_FILTERED)
            .bind(filter.name.as_deref())
            .bind(filter.available)
            .bind(filter.category.map(|c| c.code()))
            .bind(filter.price)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_products", e))?;

        let products = rows
            .iter()
            .map(decode_product)
            .collect::<RepositoryResult<Vec<_>>>()?;

        Span::current().record("row_count", products.len());
        Ok(products)
    }

    #[instrument(skip(self), fields(operation = "count_products"), err)]
    async fn count(&self, filter: &ProductFilter) -> RepositoryResult<u64> {
        let row = sqlx::query(COUNT_FILTERED)
            .bind(filter.name.as_deref())
            .bind(filter.available)
            .bind(filter.category.map(|c| c.code()))
            .bind(filter.price)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_products", e))?;

        let total: i64 = row
            .try_get("total")
            .map_err(|e| map_sqlx_error("count_products", e))?;
        Ok(total.max(0) as u64)
    }
}

/// Roll back `tx`, then hand back the error that caused it.
async fn rollback(tx: Transaction<'_, Postgres>, err: RepositoryError) -> RepositoryError {
    if let Err(rollback_err) = tx.rollback().await {
        tracing::warn!(error = %rollback_err, "transaction rollback failed");
    }
    err
}

fn decode_product(row: &PgRow) -> RepositoryResult<Product> {
    let row = ProductRow::from_row(row).map_err(|e| map_sqlx_error("decode_product", e))?;
    Product::try_from(row)
}

// SQLx row types

#[derive(Debug)]
struct ProductRow {
    id: i64,
    name: String,
    description: Option<String>,
    price: Decimal,
    available: bool,
    category: i16,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            available: row.try_get("available")?,
            category: row.try_get("category")?,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        // An unknown code means the table was written by something else.
        let category = Category::from_code(row.category)
            .map_err(|e| RepositoryError::storage("decode_product", e.message()))?;

        Ok(Product::restore(
            ProductId::from(row.id),
            row.name,
            row.description,
            row.price,
            row.available,
            category,
        ))
    }
}
