use core::str::FromStr;
use serde::{Deserialize, Serialize};

use catalog_core::DomainError;

/// Product category.
///
/// Stored as a small integer code, exchanged by symbolic name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    #[default]
    Unknown,
    Cloths,
    Food,
    Housewares,
    Automotive,
    Tools,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Unknown,
        Category::Cloths,
        Category::Food,
        Category::Housewares,
        Category::Automotive,
        Category::Tools,
    ];

    /// Symbolic name used at the serialization boundary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Unknown => "UNKNOWN",
            Category::Cloths => "CLOTHS",
            Category::Food => "FOOD",
            Category::Housewares => "HOUSEWARES",
            Category::Automotive => "AUTOMOTIVE",
            Category::Tools => "TOOLS",
        }
    }

    /// Storage code (`SMALLINT` column).
    pub fn code(&self) -> i16 {
        match self {
            Category::Unknown => 0,
            Category::Cloths => 1,
            Category::Food => 2,
            Category::Housewares => 3,
            Category::Automotive => 4,
            Category::Tools => 5,
        }
    }

    pub fn from_code(code: i16) -> Result<Self, DomainError> {
        Self::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| DomainError::validation(format!("Invalid category code: {code}")))
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    /// Exact symbolic name only; `"cloths"` is not a category.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("Invalid attribute: {s}")))
    }
}
