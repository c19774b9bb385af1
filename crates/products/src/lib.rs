//! Products domain module.
//!
//! This crate contains the product entity, its schema rules and its flat
//! key/value representation, implemented purely as deterministic domain logic
//! (no IO, no HTTP, no storage).

pub mod category;
pub mod filter;
pub mod product;

pub use category::Category;
pub use filter::ProductFilter;
pub use product::{Product, ProductId, DESCRIPTION_MAX_LEN, NAME_MAX_LEN, PRICE_SCALE};
