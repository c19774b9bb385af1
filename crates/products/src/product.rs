use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use catalog_core::{DomainError, DomainResult, Entity, RowId};

use crate::category::Category;

/// Column width of `products.name`.
pub const NAME_MAX_LEN: usize = 100;
/// Column width of `products.description`.
pub const DESCRIPTION_MAX_LEN: usize = 250;
/// Fractional digits kept by `products.price` (`NUMERIC(14, 2)`).
pub const PRICE_SCALE: u32 = 2;
const PRICE_INTEGER_DIGITS: u32 = 12;

/// Product identifier (store-assigned surrogate key).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub RowId);

impl ProductId {
    pub fn new(id: RowId) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0.get()
    }
}

impl From<i64> for ProductId {
    fn from(value: i64) -> Self {
        Self(RowId::new(value))
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Entity: Product.
///
/// A value built in memory is transient (`id() == None`) until a repository
/// persists it. Field setters only touch the in-memory state; repositories
/// write it back on update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Product {
    id: Option<ProductId>,
    name: String,
    description: Option<String>,
    price: Decimal,
    available: bool,
    category: Category,
}

impl Product {
    /// New transient product: available, uncategorized, no description.
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            price,
            available: true,
            category: Category::Unknown,
        }
    }

    /// Rebuild a persisted product from stored column values.
    pub fn restore(
        id: ProductId,
        name: String,
        description: Option<String>,
        price: Decimal,
        available: bool,
        category: Category,
    ) -> Self {
        Self {
            id: Some(id),
            name,
            description,
            price,
            available,
            category,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn id(&self) -> Option<ProductId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn available(&self) -> bool {
        self.available
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn set_price(&mut self, price: Decimal) {
        self.price = price;
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn set_category(&mut self, category: Category) {
        self.category = category;
    }

    /// Record the key generated by the store after a successful insert.
    pub fn mark_persisted(&mut self, id: ProductId) {
        self.id = Some(id);
    }

    /// Check the fields against the storage schema.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("Invalid product: name cannot be empty"));
        }
        if self.name.chars().count() > NAME_MAX_LEN {
            return Err(DomainError::validation(format!(
                "Invalid product: name exceeds {NAME_MAX_LEN} characters"
            )));
        }
        if let Some(description) = &self.description {
            if description.chars().count() > DESCRIPTION_MAX_LEN {
                return Err(DomainError::validation(format!(
                    "Invalid product: description exceeds {DESCRIPTION_MAX_LEN} characters"
                )));
            }
        }
        validate_price(self.price)
    }

    /// Flat key/value representation used at API boundaries.
    ///
    /// `category` is emitted by symbolic name and `price` as a decimal string.
    pub fn serialize(&self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert(
            "id".to_string(),
            self.id.map(|id| Value::from(id.get())).unwrap_or(Value::Null),
        );
        data.insert("name".to_string(), Value::String(self.name.clone()));
        data.insert(
            "description".to_string(),
            self.description.clone().map(Value::String).unwrap_or(Value::Null),
        );
        data.insert(
            "price".to_string(),
            Value::String(canonical_price(self.price).to_string()),
        );
        data.insert("available".to_string(), Value::Bool(self.available));
        data.insert(
            "category".to_string(),
            Value::String(self.category.as_str().to_string()),
        );
        data
    }

    /// Overwrite the fields from a flat key/value representation.
    ///
    /// `id` in `data` is ignored. On error `self` is left untouched.
    pub fn deserialize(&mut self, data: &Value) -> DomainResult<&mut Self> {
        let fields = data.as_object().ok_or_else(|| {
            DomainError::validation(format!(
                "Invalid product: body of request contained bad or no data ({})",
                json_type(data)
            ))
        })?;

        let name = match required(fields, "name")? {
            Value::String(name) => name.clone(),
            other => {
                return Err(DomainError::validation(format!(
                    "Invalid type for string [name]: {}",
                    json_type(other)
                )));
            }
        };

        let description = match fields.get("description") {
            None | Some(Value::Null) => None,
            Some(Value::String(description)) => Some(description.clone()),
            Some(other) => {
                return Err(DomainError::validation(format!(
                    "Invalid type for string [description]: {}",
                    json_type(other)
                )));
            }
        };

        let price = parse_price(required(fields, "price")?)?;

        let available = match required(fields, "available")? {
            Value::Bool(available) => *available,
            other => {
                return Err(DomainError::validation(format!(
                    "Invalid type for boolean [available]: {}",
                    json_type(other)
                )));
            }
        };

        let category = match required(fields, "category")? {
            Value::String(name) => name.parse::<Category>()?,
            other => {
                return Err(DomainError::validation(format!("Invalid attribute: {other}")));
            }
        };

        let candidate = Product {
            id: self.id,
            name,
            description,
            price,
            available,
            category,
        };
        candidate.validate()?;
        *self = candidate;
        Ok(self)
    }

    /// Build a transient product from a flat key/value representation.
    pub fn from_value(data: &Value) -> DomainResult<Self> {
        let mut product = Product::default();
        product.deserialize(data)?;
        Ok(product)
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Option<Self::Id> {
        self.id
    }
}

impl core::fmt::Display for Product {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.id {
            Some(id) => write!(f, "<Product {} id=[{}]>", self.name, id),
            None => write!(f, "<Product {} id=[None]>", self.name),
        }
    }
}

/// Parse a price from a decimal string or a JSON number, never through `f64`.
pub fn parse_price(value: &Value) -> DomainResult<Decimal> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(DomainError::validation(format!(
                "Invalid type for decimal [price]: {}",
                json_type(other)
            )));
        }
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| DomainError::validation(format!("Invalid price: {text}")))
}

/// Same amount at the column scale, so `12.5`, `12.500` and a stored `12.50`
/// all render as `12.50`. Finer amounts keep their digits.
fn canonical_price(price: Decimal) -> Decimal {
    let mut price = price.normalize();
    if price.scale() < PRICE_SCALE {
        price.rescale(PRICE_SCALE);
    }
    price
}

fn validate_price(price: Decimal) -> DomainResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(DomainError::validation("Invalid product: price cannot be negative"));
    }
    if price.normalize().scale() > PRICE_SCALE {
        return Err(DomainError::validation(format!(
            "Invalid product: price has more than {PRICE_SCALE} decimal places"
        )));
    }
    if price.trunc() >= Decimal::from(10_i64.pow(PRICE_INTEGER_DIGITS)) {
        return Err(DomainError::validation(format!(
            "Invalid product: price exceeds {PRICE_INTEGER_DIGITS} integer digits"
        )));
    }
    Ok(())
}

fn required<'a>(fields: &'a Map<String, Value>, key: &str) -> DomainResult<&'a Value> {
    fields
        .get(key)
        .ok_or_else(|| DomainError::validation(format!("Invalid product: missing {key}")))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
