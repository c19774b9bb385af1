//! Database bootstrap: connection pool + `products` schema.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::instrument;

use crate::config::DatabaseConfig;
use crate::error::{map_sqlx_error, RepositoryResult};
use crate::repository::PostgresProductRepository;

/// Schema DDL, applied in order. Every statement is idempotent.
const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id          BIGSERIAL PRIMARY KEY,
        name        VARCHAR(100) NOT NULL,
        description VARCHAR(250),
        price       NUMERIC(14, 2) NOT NULL,
        available   BOOLEAN NOT NULL DEFAULT TRUE,
        category    SMALLINT NOT NULL DEFAULT 0
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_products_name ON products (name)",
    "CREATE INDEX IF NOT EXISTS idx_products_available ON products (available)",
    "CREATE INDEX IF NOT EXISTS idx_products_category ON products (category)",
];

/// Handle to the bound database.
///
/// Cloning is cheap; clones share the underlying pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Wrap an existing pool without touching the schema.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Product repository sharing this handle's pool.
    pub fn products(&self) -> PostgresProductRepository {
        PostgresProductRepository::new(self.pool.clone())
    }

    /// Create the `products` table and its indexes if missing.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> RepositoryResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    /// Remove every product row and restart id generation.
    #[instrument(skip(self), err)]
    pub async fn truncate_products(&self) -> RepositoryResult<()> {
        sqlx::query("TRUNCATE TABLE products RESTART IDENTITY")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("truncate_products", e))?;
        Ok(())
    }

    /// Close the pool; outstanding connections are released as they return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Bind the product schema to the database described by `config`.
///
/// Must run before any repository operation. Calling it again rebinds to a
/// fresh pool; the DDL is idempotent so an existing table is left as-is.
#[instrument(
    skip(config),
    fields(
        max_connections = config.max_connections,
        acquire_timeout_ms = config.acquire_timeout.as_millis() as u64
    ),
    err
)]
pub async fn init_db(config: &DatabaseConfig) -> RepositoryResult<Database> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))?;

    let database = Database::from_pool(pool);
    database.ensure_schema().await?;

    tracing::info!("database initialized");
    Ok(database)
}
