use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to load environment variables for store connection: {0}")]
    ConnectionConfigError(String),

    #[error("Failed to query the store: {0}")]
    ConnectionError(#[from] sqlx::Error),
}
