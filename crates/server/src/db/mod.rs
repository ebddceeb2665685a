//! Database access layer.
//!
//! Repositories wrap a `PgPool` reference and decode rows into the
//! canonical domain models. Status columns are stored as text; a value
//! that no longer parses is surfaced as `RepositoryError::DataCorruption`
//! rather than a panic.

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod line_items;
pub mod orders;
pub mod transfers;

pub use line_items::{LineItemRepository, PickerItem};
pub use orders::OrderRepository;
pub use transfers::TransferRepository;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value failed to parse back into its domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The referenced row does not exist.
    #[error("row not found")]
    NotFound,
}

/// Create a connection pool and run pending migrations.
///
/// # Errors
///
/// Returns `sqlx::Error` if the pool cannot connect or a migration fails.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url.expose_secret())
        .await?;

    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}

/// Parse a stored status string into its enum, mapping failures to
/// [`RepositoryError::DataCorruption`].
pub(crate) fn parse_status<T: std::str::FromStr<Err = String>>(
    raw: &str,
) -> Result<T, RepositoryError> {
    raw.parse()
        .map_err(|e: String| RepositoryError::DataCorruption(e))
}
