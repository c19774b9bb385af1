//! Row predicate shared by every repository implementation.

use rust_decimal::Decimal;
use serde_json::Value;

use catalog_core::DomainResult;

use crate::category::Category;
use crate::product::{parse_price, Product};

/// Conjunction of exact-match conditions over product columns.
///
/// Unset fields match every row, so `ProductFilter::default()` selects all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub name: Option<String>,
    pub available: Option<bool>,
    pub category: Option<Category>,
    pub price: Option<Decimal>,
}

impl ProductFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self::default().with_name(name)
    }

    pub fn by_availability(available: bool) -> Self {
        Self::default().with_available(available)
    }

    pub fn by_category(category: Category) -> Self {
        Self::default().with_category(category)
    }

    pub fn by_price(price: Decimal) -> Self {
        Self::default().with_price(price)
    }

    /// Price given as text, e.g. from a query string (`"12.50"` or `" \"12.50\" "`).
    pub fn by_price_str(price: &str) -> DomainResult<Self> {
        let price = price.trim().trim_matches('"');
        let price = parse_price(&Value::String(price.to_string()))?;
        Ok(Self::by_price(price))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_available(mut self, available: bool) -> Self {
        self.available = Some(available);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn is_unfiltered(&self) -> bool {
        self == &Self::default()
    }

    /// In-memory evaluation. SQL implementations must select the same rows.
    pub fn matches(&self, product: &Product) -> bool {
        self.name.as_deref().is_none_or(|name| product.name() == name)
            && self.available.is_none_or(|available| product.available() == available)
            && self.category.is_none_or(|category| product.category() == category)
            && self.price.is_none_or(|price| product.price() == price)
    }
}
