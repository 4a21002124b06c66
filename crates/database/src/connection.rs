use crate::error::DbError;
use crate::repository::{StoreRepository, StoreSet};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;
use std::time::Duration;

/// Establishes connection pools to both logical stores and wraps them in a
/// [`StoreSet`].
///
/// Reads `MARKET_DATABASE_URL` and `SERVER_DATABASE_URL` from the environment
/// (the `.env` file is loaded if present). The returned set is cheap to clone
/// and is shared by reference across every component that queries the stores.
pub async fn connect_stores() -> Result<StoreSet, DbError> {
    // Load environment variables from the .env file, if one exists.
    dotenv().ok();

    let market_url = env::var("MARKET_DATABASE_URL").map_err(|_e| {
        DbError::ConnectionConfigError("MARKET_DATABASE_URL must be set.".to_string())
    })?;
    let server_url = env::var("SERVER_DATABASE_URL").map_err(|_e| {
        DbError::ConnectionConfigError("SERVER_DATABASE_URL must be set.".to_string())
    })?;

    let market = connect_pool(&market_url).await?;
    let server = connect_pool(&server_url).await?;

    Ok(StoreSet::new(
        StoreRepository::new(market),
        StoreRepository::new(server),
    ))
}

async fn connect_pool(url: &str) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await?;

    Ok(pool)
}
