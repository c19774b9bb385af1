//! Infrastructure layer: database configuration, connection pool, repositories.

pub mod config;
pub mod db;
pub mod error;
pub mod repository;

pub use config::DatabaseConfig;
pub use db::{init_db, Database};
pub use error::{RepositoryError, RepositoryResult};
pub use repository::{
    InMemoryProductRepository, PostgresProductRepository, ProductQuery, ProductRepository,
};
