use crate::{error::AppError, AppState};
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use core_types::{Category, Product};
use database::ProductFilter;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;

/// Query string accepted by the list endpoint. Empty values count as absent.
#[derive(Debug, PartialEq, Eq)]
pub struct ListParams {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<String>,
}

impl ListParams {
    /// The first occurrence of a repeated key wins; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self {
            name: None,
            category: None,
            price: None,
        };
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "name" => &mut params.name,
                "category" => &mut params.category,
                "price" => &mut params.price,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }
}

/// The `:id` path segment. Anything that is not an `i32` is an unknown
/// product, so the route answers 404 instead of a path rejection.
pub struct ProductId(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for ProductId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound("Product not found".to_string()))?;

        raw.parse::<i32>().map(ProductId).map_err(|_| {
            AppError::NotFound(format!("Product with id '{raw}' was not found"))
        })
    }
}

/// # GET /
pub async fn index() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Product Service API!" }))
}

/// # GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

/// # POST /products
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), AppError> {
    tracing::info!("Request to create a product");
    let data = parse_body(&body)?;

    let mut product = Product::default();
    product.deserialize(&data)?;
    let product = state.products.create(&product).await?;

    tracing::info!(product_id = ?product.id, "Product saved");
    Ok((StatusCode::CREATED, Json(product.serialize())))
}

/// # GET /products/:id
pub async fn read_product(
    ProductId(product_id): ProductId,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    tracing::info!(product_id, "Request to read a product");
    let product = state.products.find(product_id).await?.ok_or_else(|| {
        AppError::NotFound(format!("Product with id '{product_id}' was not found"))
    })?;

    Ok(Json(product.serialize()))
}

/// # PUT /products/:id
/// Fields missing from the body keep their stored value only where the
/// product record allows it (`brand` and `category`).
pub async fn update_product(
    ProductId(product_id): ProductId,
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    tracing::info!(product_id, "Request to update a product");
    let mut product = state
        .products
        .find(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let data = parse_body(&body)
        .ok()
        .filter(|data| !is_empty_payload(data))
        .ok_or_else(|| AppError::Validation("No data provided".to_string()))?;

    product.deserialize(&data)?;
    let product = state.products.update(&product).await?;
    Ok(Json(product.serialize()))
}

/// # DELETE /products/:id
/// Both outcomes answer with an empty body.
pub async fn delete_product(
    ProductId(product_id): ProductId,
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    tracing::info!(product_id, "Request to delete a product");
    let Some(product) = state.products.find(product_id).await? else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    state.products.delete(&product).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// # GET /products?name=&category=&price=
///
/// `price` is an inclusive upper bound. An unknown `category` yields an empty
/// list rather than an error, whatever the other parameters say.
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Value>>, AppError> {
    let params = ListParams::from_pairs(pairs);
    tracing::info!(?params, "Request to list products");
    let mut filter = ProductFilter::default();

    if let Some(name) = present(params.name) {
        filter = filter.with_name(name);
    }

    if let Some(raw) = present(params.category) {
        match Category::from_str(&raw.to_uppercase()) {
            Ok(category) => filter = filter.with_category(category),
            Err(_) => {
                tracing::debug!(category = %raw, "Unknown category filter, returning no products");
                return Ok(Json(Vec::new()));
            }
        }
    }

    if let Some(raw) = present(params.price) {
        let price = Decimal::from_str(raw.trim())
            .map_err(|_| AppError::Validation("Invalid price value".to_string()))?;
        filter = filter.with_max_price(price);
    }

    let products = if filter.is_empty() {
        state.products.all().await?
    } else {
        state.products.find_by_filters(&filter).await?
    };

    Ok(Json(products.iter().map(Product::serialize).collect()))
}

fn parse_body(body: &Bytes) -> Result<Value, AppError> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Request body is not valid JSON: {e}")))
}

/// `null`, `{}`, `[]`, `""`, `0` and `false` carry no update.
fn is_empty_payload(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
