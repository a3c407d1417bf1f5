//! # Catalog Database Crate
//!
//! The persistence layer for the product catalog. It is the only crate that
//! knows how products are stored.
//!
//! ## Public API
//!
//! - `connect` / `run_migrations`: build the `PgPool` from the application
//!   settings and bring the `products` schema up to date.
//! - `ProductRepository`: the CRUD contract every store implements, with a
//!   generated `MockProductRepository` for tests.
//! - `DbRepository`: the PostgreSQL implementation.
//! - `InMemoryRepository`: a process-local implementation with the same
//!   column limits, selected by the `memory` storage backend.
//! - `ProductFilter` / `PriceFilter`: the search criteria for `find_by_filters`.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod memory;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::InMemoryRepository;
pub use repository::{
    DbRepository, MockProductRepository, PriceFilter, ProductFilter, ProductRepository,
};
