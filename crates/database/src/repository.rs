use crate::DbError;
use async_trait::async_trait;
use core_types::{Category, Product};
use mockall::automock;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{query, query_as, QueryBuilder};

const PRODUCT_COLUMNS: &str =
    "id, name, brand, category, description, price, model_year, quantity";

/// The persistence contract for products.
///
/// Handlers only ever see this trait, so the same routes run against
/// PostgreSQL, the in-memory store, or a mock.
#[automock]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Inserts a new row and returns it with its freshly assigned id.
    /// Any id already set on `product` is ignored.
    async fn create(&self, product: &Product) -> Result<Product, DbError>;

    /// Persists every field of an already stored product.
    ///
    /// Fails with `DbError::Validation` when `product.id` is `None`.
    async fn update(&self, product: &Product) -> Result<Product, DbError>;

    /// Removes the row with `product.id`. Removing an id that is not stored is a no-op.
    async fn delete(&self, product: &Product) -> Result<(), DbError>;

    /// Point lookup. A missing row is `Ok(None)`, not an error.
    async fn find(&self, id: i32) -> Result<Option<Product>, DbError>;

    async fn find_by_name(&self, name: &str) -> Result<Vec<Product>, DbError>;

    /// Returns the products matching every criterion set on `filter`.
    async fn find_by_filters(&self, filter: &ProductFilter) -> Result<Vec<Product>, DbError>;

    async fn all(&self) -> Result<Vec<Product>, DbError>;
}

/// How a price criterion compares against the stored price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceFilter {
    Exactly(Decimal),
    AtMost(Decimal),
}

impl PriceFilter {
    pub fn matches(&self, price: Decimal) -> bool {
        match *self {
            PriceFilter::Exactly(bound) => price == bound,
            PriceFilter::AtMost(bound) => price <= bound,
        }
    }

    fn sql_operator(&self) -> &'static str {
        match self {
            PriceFilter::Exactly(_) => " = ",
            PriceFilter::AtMost(_) => " <= ",
        }
    }

    fn value(&self) -> Decimal {
        match *self {
            PriceFilter::Exactly(bound) | PriceFilter::AtMost(bound) => bound,
        }
    }
}

/// Conjunctive search criteria. Unset fields are unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub name: Option<String>,
    pub price: Option<PriceFilter>,
    pub category: Option<Category>,
}

impl ProductFilter {
    /// Builds an all-equality filter.
    pub fn new(name: Option<String>, price: Option<Decimal>, category: Option<Category>) -> Self {
        Self {
            name,
            price: price.map(PriceFilter::Exactly),
            category,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Restricts results to products priced at or below `price`.
    pub fn with_max_price(mut self, price: Decimal) -> Self {
        self.price = Some(PriceFilter::AtMost(price));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.category.is_none()
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.name.as_ref().is_none_or(|name| &product.name == name)
            && self.price.is_none_or(|price| price.matches(product.price))
            && self.category.is_none_or(|category| product.category == category)
    }
}

/// The `DbRepository` is the PostgreSQL-backed `ProductRepository`.
/// It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for DbRepository {
    async fn create(&self, product: &Product) -> Result<Product, DbError> {
        let sql = format!(
            "INSERT INTO products (name, brand, category, description, price, model_year, quantity) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {PRODUCT_COLUMNS}"
        );
        let created = query_as::<Postgres, Product>(&sql)
            .bind(&product.name)
            .bind(product.brand)
            .bind(product.category)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.model_year)
            .bind(product.quantity)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(product_id = ?created.id, name = %created.name, "Created product");
        Ok(created)
    }

    async fn update(&self, product: &Product) -> Result<Product, DbError> {
        let id = product.id.ok_or_else(|| {
            DbError::Validation("update called on entity with empty id".to_string())
        })?;

        let sql = format!(
            "UPDATE products SET name = $1, brand = $2, category = $3, description = $4, \
             price = $5, model_year = $6, quantity = $7 WHERE id = $8 RETURNING {PRODUCT_COLUMNS}"
        );
        let updated = query_as::<Postgres, Product>(&sql)
            .bind(&product.name)
            .bind(product.brand)
            .bind(product.category)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.model_year)
            .bind(product.quantity)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;

        tracing::info!(product_id = id, "Updated product");
        Ok(updated)
    }

    async fn delete(&self, product: &Product) -> Result<(), DbError> {
        let id = product.id.ok_or_else(|| {
            DbError::Validation("delete called on entity with empty id".to_string())
        })?;

        let result = query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::info!(product_id = id, rows = result.rows_affected(), "Deleted product");
        Ok(())
    }

    async fn find(&self, id: i32) -> Result<Option<Product>, DbError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let product = query_as::<Postgres, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Product>, DbError> {
        tracing::debug!(name, "Querying products by name");
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE name = $1 ORDER BY id");
        let products = query_as::<Postgres, Product>(&sql)
            .bind(name)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn find_by_filters(&self, filter: &ProductFilter) -> Result<Vec<Product>, DbError> {
        tracing::debug!(?filter, "Querying products by filters");
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));

        if let Some(name) = &filter.name {
            builder.push(" AND name = ").push_bind(name.clone());
        }
        if let Some(price) = filter.price {
            builder
                .push(" AND price")
                .push(price.sql_operator())
                .push_bind(price.value());
        }
        if let Some(category) = filter.category {
            builder.push(" AND category = ").push_bind(category);
        }
        builder.push(" ORDER BY id");

        let products = builder
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn all(&self) -> Result<Vec<Product>, DbError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id");
        let products = query_as::<Postgres, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }
}
