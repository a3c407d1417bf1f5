use crate::repository::{ProductFilter, ProductRepository};
use crate::DbError;
use async_trait::async_trait;
use core_types::product::{DESCRIPTION_MAX_LEN, NAME_MAX_LEN};
use core_types::{to_cents, Product};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Largest value a `NUMERIC(10, 2)` column can hold: 99999999.99.
const PRICE_LIMIT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// A process-local `ProductRepository`.
///
/// Enforces the same column limits as the `products` table so that both
/// backends reject the same rows. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    table: RwLock<Table>,
}

#[derive(Debug, Default)]
struct Table {
    last_id: i32,
    rows: BTreeMap<i32, Product>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Applies the column constraints and returns the row as it would be stored.
fn to_row(product: &Product, id: i32) -> Result<Product, DbError> {
    if product.name.chars().count() > NAME_MAX_LEN {
        return Err(DbError::Constraint(format!(
            "value too long for type character varying({NAME_MAX_LEN})"
        )));
    }
    if product.description.chars().count() > DESCRIPTION_MAX_LEN {
        return Err(DbError::Constraint(format!(
            "value too long for type character varying({DESCRIPTION_MAX_LEN})"
        )));
    }

    let price = to_cents(product.price);
    if price.is_sign_negative() && !price.is_zero() {
        return Err(DbError::Constraint(
            "new row for relation \"products\" violates check constraint \"products_price_check\""
                .to_string(),
        ));
    }
    if price > PRICE_LIMIT {
        return Err(DbError::Constraint("numeric field overflow".to_string()));
    }

    Ok(Product {
        id: Some(id),
        price,
        ..product.clone()
    })
}

#[async_trait]
impl ProductRepository for InMemoryRepository {
    async fn create(&self, product: &Product) -> Result<Product, DbError> {
        let mut table = self.table.write().await;
        let id = table
            .last_id
            .checked_add(1)
            .ok_or_else(|| DbError::Constraint("id sequence exhausted".to_string()))?;
        let row = to_row(product, id)?;

        table.last_id = id;
        table.rows.insert(id, row.clone());
        tracing::info!(product_id = id, name = %row.name, "Created product");
        Ok(row)
    }

    async fn update(&self, product: &Product) -> Result<Product, DbError> {
        let id = product.id.ok_or_else(|| {
            DbError::Validation("update called on entity with empty id".to_string())
        })?;

        let mut table = self.table.write().await;
        let stored = table.rows.get_mut(&id).ok_or(DbError::NotFound)?;
        let row = to_row(product, id)?;
        *stored = row.clone();

        tracing::info!(product_id = id, "Updated product");
        Ok(row)
    }

    async fn delete(&self, product: &Product) -> Result<(), DbError> {
        let id = product.id.ok_or_else(|| {
            DbError::Validation("delete called on entity with empty id".to_string())
        })?;

        let removed = self.table.write().await.rows.remove(&id).is_some();
        tracing::info!(product_id = id, removed, "Deleted product");
        Ok(())
    }

    async fn find(&self, id: i32) -> Result<Option<Product>, DbError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Product>, DbError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|product| product.name == name)
            .cloned()
            .collect())
    }

    async fn find_by_filters(&self, filter: &ProductFilter) -> Result<Vec<Product>, DbError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|product| filter.matches(product))
            .cloned()
            .collect())
    }

    async fn all(&self) -> Result<Vec<Product>, DbError> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }
}
