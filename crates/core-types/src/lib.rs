//! # Core Types
//!
//! The catalog's domain model: the [`Product`] record, its closed
//! [`Brand`] and [`Category`] enumerations, and the validation rules applied
//! when a product is read from or written to JSON.

pub mod enums;
pub mod error;
pub mod product;

// Re-export the core types to provide a clean public API.
pub use enums::{Brand, Category};
pub use error::CoreError;
pub use product::{to_cents, Product};
