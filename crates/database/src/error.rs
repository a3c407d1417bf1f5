use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database connection settings: {0}")]
    ConnectionConfigError(String),

    #[error("Database query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    /// The row was rejected by a table constraint or a column type limit.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// The operation was called with an entity it cannot act on.
    #[error("{0}")]
    Validation(String),

    #[error("The requested data was not found in the database.")]
    NotFound,
}

impl From<sqlx::Error> for DbError {
    fn from(error: sqlx::Error) -> Self {
        if matches!(error, sqlx::Error::RowNotFound) {
            return Self::NotFound;
        }

        // SQLSTATE class 22 is "data exception" (value too long, numeric
        // overflow), class 23 is "integrity constraint violation".
        let constraint = error.as_database_error().and_then(|db_err| {
            let code = db_err.code()?;
            (code.starts_with("22") || code.starts_with("23")).then(|| db_err.message().to_string())
        });

        match constraint {
            Some(message) => Self::Constraint(message),
            None => Self::Query(error),
        }
    }
}
