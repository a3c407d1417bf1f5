use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use configuration::{Settings, StorageBackend};
use database::{DbRepository, InMemoryRepository, ProductRepository};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod content_type;
pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductRepository>,
}

impl AppState {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }
}

/// Builds the repository selected by `database.backend`.
///
/// The postgres backend connects and applies migrations before returning.
pub async fn build_repository(settings: &Settings) -> anyhow::Result<Arc<dyn ProductRepository>> {
    match settings.database.backend {
        StorageBackend::Postgres => {
            let db_pool = database::connect(&settings.database).await?;
            database::run_migrations(&db_pool).await?;
            Ok(Arc::new(DbRepository::new(db_pool)))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory product store; data is lost on shutdown.");
            Ok(Arc::new(InMemoryRepository::new()))
        }
    }
}

/// Defines the application routes and middleware.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route(
            "/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/products/:id",
            get(handlers::read_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .layer(middleware::from_fn(content_type::require_json))
        .with_state(state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024))
}

/// The main function to configure and run the web server.
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let products = build_repository(&settings).await?;
    let app_state = Arc::new(AppState::new(products));

    let addr: SocketAddr = settings.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", addr);

    axum::serve(listener, app(app_state)).await?;

    Ok(())
}
