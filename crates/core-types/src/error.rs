use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Malformed or missing input. The message is shown to API clients as-is.
    #[error("{0}")]
    Validation(String),
}
