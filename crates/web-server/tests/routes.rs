//! End-to-end route tests. The router runs in-process against the in-memory
//! store; failure paths use the mock repository.

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use database::{DbError, InMemoryRepository, MockProductRepository, PriceFilter};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;
use web_server::{app, AppState};

const BASE_URL: &str = "/products";
const JSON: Option<&str> = Some("application/json");

fn router() -> Router {
    app(Arc::new(AppState::new(Arc::new(InMemoryRepository::new()))))
}

fn mocked(repo: MockProductRepository) -> Router {
    app(Arc::new(AppState::new(Arc::new(repo))))
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    content_type: Option<&str>,
    body: Option<String>,
) -> (StatusCode, Bytes) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    let request = builder
        .body(body.map(Body::from).unwrap_or_else(Body::empty))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes)
}

async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(router, method, uri, JSON, body.map(|b| b.to_string())).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn vehicle(name: &str, category: &str, price: &str) -> Value {
    json!({
        "name": name,
        "brand": "TOYOTA",
        "category": category,
        "description": "A dependable family vehicle",
        "price": price,
        "model_year": 2021,
        "quantity": 10,
    })
}

async fn seed_filter_fixtures(router: &Router) {
    for (name, category, price) in [
        ("Car A", "SUV", "30000.00"),
        ("Car B", "SEDAN", "25000.00"),
        ("Car C", "SUV", "35000.00"),
    ] {
        let (status, _) = call(router, "POST", BASE_URL, Some(vehicle(name, category, price))).await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

fn price_of(item: &Value) -> Decimal {
    Decimal::from_str(item["price"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn index_welcomes() {
    let (status, body) = call(&router(), "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to the Product Service API!");

    let (status, body) = call(&router(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
async fn create_returns_the_stored_product() {
    let router = router();
    let (status, body) = call(
        &router,
        "POST",
        BASE_URL,
        Some(json!({
            "name": "Model S",
            "description": "d",
            "price": "79999.99",
            "model_year": 2023,
            "quantity": 5,
            "category": "SEDAN",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_i64().unwrap() > 0);
    assert_eq!(body["price"], "79999.99");
    assert_eq!(body["category"], "SEDAN");
    assert_eq!(body["brand"], "UNKNOWN");
    assert_eq!(body["model_year"], 2023);
    assert_eq!(body["quantity"], 5);
}

#[tokio::test]
async fn create_ignores_a_client_supplied_id() {
    let router = router();
    let mut payload = vehicle("Camry", "SEDAN", "25000");
    payload["id"] = json!(500);

    let (_, first) = call(&router, "POST", BASE_URL, Some(payload.clone())).await;
    let (_, second) = call(&router, "POST", BASE_URL, Some(payload)).await;

    assert_ne!(first["id"], json!(500));
    assert_ne!(first["id"], second["id"]);
    assert_eq!(first["price"], "25000.00");
}

#[tokio::test]
async fn create_rejects_non_json_content_types() {
    let router = router();
    let body = Some(vehicle("Civic", "SEDAN", "21000").to_string());

    let (status, _) = send(&router, "POST", BASE_URL, Some("text/plain"), body.clone()).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let (status, bytes) = send(&router, "POST", BASE_URL, None, body).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let error: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(error["message"], "Content-Type must be application/json");
}

#[tokio::test]
async fn create_rejects_invalid_products() {
    let router = router();

    let mut missing_name = vehicle("Civic", "SEDAN", "21000");
    missing_name.as_object_mut().unwrap().remove("name");
    let (status, body) = call(&router, "POST", BASE_URL, Some(missing_name)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid product: missing name");

    let (status, body) =
        call(&router, "POST", BASE_URL, Some(vehicle("Civic", "TRUCK", "21000"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid category: TRUCK");

    let (status, _) = call(&router, "POST", BASE_URL, Some(vehicle("Civic", "SEDAN", "cheap"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&router, "POST", BASE_URL, JSON, Some("{oops".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        call(&router, "POST", BASE_URL, Some(vehicle("Hypercar", "SPORTS", "100000000"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listed) = call(&router, "GET", BASE_URL, None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn read_returns_a_stored_product() {
    let router = router();
    let (_, created) = call(&router, "POST", BASE_URL, Some(vehicle("Highlander", "SUV", "41000"))).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = call(&router, "GET", &format!("{BASE_URL}/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);
}

#[tokio::test]
async fn read_of_an_unknown_id_is_not_found() {
    let (status, body) = call(&router(), "GET", &format!("{BASE_URL}/0"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product with id '0' was not found");
}

#[tokio::test]
async fn ids_that_are_not_integers_are_not_found() {
    let router = router();
    for uri in [format!("{BASE_URL}/abc"), format!("{BASE_URL}/3000000000")] {
        for method in ["GET", "PUT", "DELETE"] {
            let body = (method == "PUT").then(|| json!({"name": "x"}));
            let (status, error) = call(&router, method, &uri, body).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
            assert_eq!(error["status"], 404);
            assert_eq!(error["error"], "Not Found");
        }
    }

    let (_, error) = call(&router, "GET", &format!("{BASE_URL}/abc"), None).await;
    assert_eq!(error["message"], "Product with id 'abc' was not found");
}

#[tokio::test]
async fn update_changes_the_stored_product() {
    let router = router();
    let (_, mut product) = call(&router, "POST", BASE_URL, Some(vehicle("Accord", "SEDAN", "27000"))).await;
    let uri = format!("{BASE_URL}/{}", product["id"]);

    product["name"] = json!("unknown");
    product["price"] = json!(26500.5);
    let (status, body) = call(&router, "PUT", &uri, Some(product.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "unknown");
    assert_eq!(body["price"], "26500.50");
    assert_eq!(body["id"], product["id"]);

    let (_, stored) = call(&router, "GET", &uri, None).await;
    assert_eq!(stored["name"], "unknown");
}

#[tokio::test]
async fn update_keeps_enums_missing_from_the_body() {
    let router = router();
    let (_, product) = call(&router, "POST", BASE_URL, Some(vehicle("RAV4", "SUV", "32000"))).await;
    let uri = format!("{BASE_URL}/{}", product["id"]);

    let mut partial = vehicle("RAV4 Hybrid", "SUV", "34000");
    partial.as_object_mut().unwrap().remove("brand");
    partial.as_object_mut().unwrap().remove("category");

    let (status, body) = call(&router, "PUT", &uri, Some(partial)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["brand"], "TOYOTA");
    assert_eq!(body["category"], "SUV");
    assert_eq!(body["name"], "RAV4 Hybrid");
}

#[tokio::test]
async fn update_of_an_unknown_id_is_not_found() {
    let (status, body) = call(
        &router(),
        "PUT",
        &format!("{BASE_URL}/0"),
        Some(json!({"name": "Nonexistent Product", "description": "This product does not exist"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");
}

#[tokio::test]
async fn update_rejects_empty_and_invalid_bodies() {
    let router = router();
    let (_, product) = call(&router, "POST", BASE_URL, Some(vehicle("Leaf", "SEDAN", "28000"))).await;
    let uri = format!("{BASE_URL}/{}", product["id"]);

    let (status, body) = call(&router, "PUT", &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No data provided");

    let (status, bytes) = send(&router, "PUT", &uri, JSON, Some("{oops".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(error["message"], "No data provided");

    let (status, _) = send(&router, "PUT", &uri, JSON, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut bad_brand = product.clone();
    bad_brand["brand"] = json!("LADA");
    let (status, body) = call(&router, "PUT", &uri, Some(bad_brand)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid brand: LADA");

    let (status, _) = send(&router, "PUT", &uri, Some("text/plain"), Some(product.to_string())).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let (_, stored) = call(&router, "GET", &uri, None).await;
    assert_eq!(stored, product);
}

#[tokio::test]
async fn delete_removes_the_product() {
    let router = router();
    let (_, product) = call(&router, "POST", BASE_URL, Some(vehicle("Mustang", "SPORTS", "35000"))).await;
    let uri = format!("{BASE_URL}/{}", product["id"]);

    let (status, bytes) = send(&router, "DELETE", &uri, None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(bytes.is_empty());

    let (status, _) = call(&router, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, bytes) = send(&router, "DELETE", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn list_without_filters_returns_everything() {
    let router = router();
    call(&router, "POST", BASE_URL, Some(vehicle("Civic", "SEDAN", "21000"))).await;
    call(&router, "POST", BASE_URL, Some(vehicle("Explorer", "SUV", "38000"))).await;

    let (status, body) = call(&router, "GET", BASE_URL, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn list_filters_by_name() {
    let router = router();
    call(&router, "POST", BASE_URL, Some(vehicle("Car X", "SEDAN", "21000"))).await;
    call(&router, "POST", BASE_URL, Some(vehicle("Car Y", "SEDAN", "22000"))).await;

    let (status, body) = call(&router, "GET", &format!("{BASE_URL}?name=Car%20X"), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Car X");
}

#[tokio::test]
async fn list_uses_the_first_of_repeated_query_keys() {
    let router = router();
    call(&router, "POST", BASE_URL, Some(vehicle("a", "SEDAN", "21000"))).await;
    call(&router, "POST", BASE_URL, Some(vehicle("b", "SEDAN", "22000"))).await;

    let (status, body) = call(&router, "GET", &format!("{BASE_URL}?name=a&name=b"), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "a");

    let (status, body) =
        call(&router, "GET", &format!("{BASE_URL}?category=SUV&category=SEDAN&sort=asc"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn list_combines_category_and_price_filters() {
    let router = router();
    seed_filter_fixtures(&router).await;

    let (status, body) = call(&router, "GET", &format!("{BASE_URL}?category=SUV"), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item["category"] == "SUV"));

    let (_, body) = call(&router, "GET", &format!("{BASE_URL}?price=30000.00"), None).await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| price_of(item) <= dec!(30000.00)));

    let (_, body) = call(&router, "GET", &format!("{BASE_URL}?name=Car%20B"), None).await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Car B");

    let (_, body) = call(&router, "GET", &format!("{BASE_URL}?category=SUV&price=35000.00"), None).await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(
        items
            .iter()
            .all(|item| item["category"] == "SUV" && price_of(item) <= dec!(35000.00))
    );

    let (_, body) = call(&router, "GET", &format!("{BASE_URL}?category=suv"), None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = call(&router, "GET", &format!("{BASE_URL}?category=SUV&price=20000.00"), None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn list_with_an_unknown_category_is_empty() {
    let router = router();
    seed_filter_fixtures(&router).await;

    let (status, body) = call(&router, "GET", &format!("{BASE_URL}?category=TRUCK"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    // The unknown category wins even over an otherwise matching name.
    let (status, body) =
        call(&router, "GET", &format!("{BASE_URL}?name=Car%20A&category=TRUCK"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn list_rejects_an_unparseable_price() {
    let router = router();
    let (status, body) = call(&router, "GET", &format!("{BASE_URL}?price=cheap"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid price value");

    let (status, _) = call(&router, "GET", &format!("{BASE_URL}?price="), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn list_hands_an_upper_price_bound_to_the_repository() {
    let mut repo = MockProductRepository::new();
    repo.expect_find_by_filters()
        .withf(|filter| {
            filter.price == Some(PriceFilter::AtMost(dec!(30000.00)))
                && filter.name.as_deref() == Some("Car A")
                && filter.category.is_none()
        })
        .times(1)
        .returning(|_| Ok(Vec::new()));
    repo.expect_all().never();

    let (status, body) = call(
        &mocked(repo),
        "GET",
        &format!("{BASE_URL}?name=Car%20A&price=30000.00"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn storage_failures_are_internal_errors() {
    let mut repo = MockProductRepository::new();
    repo.expect_all()
        .returning(|| Err(DbError::ConnectionConfigError("pool closed".to_string())));
    repo.expect_find()
        .returning(|_| Err(DbError::ConnectionConfigError("pool closed".to_string())));
    let router = mocked(repo);

    let (status, body) = call(&router, "GET", BASE_URL, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "An internal database error occurred");

    let (status, _) = call(&router, "GET", &format!("{BASE_URL}/1"), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
