use crate::error::DbError;
use configuration::DatabaseSettings;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Establishes a connection pool to the PostgreSQL database.
///
/// The pool is created once at startup and shared by every request through
/// the repository; sqlx hands out connections per query.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, DbError> {
    if settings.url.trim().is_empty() {
        return Err(DbError::ConnectionConfigError(
            "database.url must be set.".to_string(),
        ));
    }

    tracing::info!(
        max_connections = settings.max_connections,
        "Connecting to the product database"
    );
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout())
        .connect(&settings.url)
        .await
        .map_err(DbError::Query)?;

    Ok(pool)
}

/// Applies the embedded migrations so the `products` table and its enum types exist.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    // Use a relative path from the crate root
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
