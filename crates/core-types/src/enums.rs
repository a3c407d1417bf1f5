use crate::error::CoreError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The manufacturer of a catalogued vehicle.
///
/// Maps onto the PostgreSQL enum type `brand`; the symbolic names are the
/// upper-cased variant names, both on the wire and at rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "brand", rename_all = "UPPERCASE")]
pub enum Brand {
    #[default]
    Unknown,
    Toyota,
    Honda,
    Ford,
    Chevrolet,
    Bmw,
    Mercedes,
    Audi,
    Tesla,
    Volkswagen,
    Nissan,
}

impl Brand {
    pub const ALL: [Brand; 11] = [
        Brand::Unknown,
        Brand::Toyota,
        Brand::Honda,
        Brand::Ford,
        Brand::Chevrolet,
        Brand::Bmw,
        Brand::Mercedes,
        Brand::Audi,
        Brand::Tesla,
        Brand::Volkswagen,
        Brand::Nissan,
    ];

    /// Returns the symbolic name used in JSON payloads and in the database.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Brand::Unknown => "UNKNOWN",
            Brand::Toyota => "TOYOTA",
            Brand::Honda => "HONDA",
            Brand::Ford => "FORD",
            Brand::Chevrolet => "CHEVROLET",
            Brand::Bmw => "BMW",
            Brand::Mercedes => "MERCEDES",
            Brand::Audi => "AUDI",
            Brand::Tesla => "TESLA",
            Brand::Volkswagen => "VOLKSWAGEN",
            Brand::Nissan => "NISSAN",
        }
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses an exact, case-sensitive symbolic name.
impl FromStr for Brand {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Brand::ALL
            .into_iter()
            .find(|brand| brand.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Invalid brand: {s}")))
    }
}

/// The body style of a catalogued vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "category", rename_all = "UPPERCASE")]
pub enum Category {
    #[default]
    Unknown,
    Suv,
    Sedan,
    Sports,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Unknown,
        Category::Suv,
        Category::Sedan,
        Category::Sports,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Unknown => "UNKNOWN",
            Category::Suv => "SUV",
            Category::Sedan => "SEDAN",
            Category::Sports => "SPORTS",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Invalid category: {s}")))
    }
}
