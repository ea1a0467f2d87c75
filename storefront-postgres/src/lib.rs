//! PostgreSQL backend for the storefront stores.
//!
//! [`PostgresStore`] implements [`ProductStockStore`], [`OrderStore`] and
//! [`BillingStore`] over one connection pool. Reservations are single
//! conditional `UPDATE` statements, so stock can never go negative no matter
//! how many processes share the database. Orders are written with all of
//! their lines in one transaction.
//!
//! Driver errors never reach callers verbatim: they are logged with the
//! [`Operation`] that failed and surface as `DatabaseError`.
//!
//! [`ProductStockStore`]: storefront_types::ProductStockStore
//! [`OrderStore`]: storefront_types::OrderStore
//! [`BillingStore`]: storefront_types::BillingStore

use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

use nutype::nutype;
use sqlx::{postgres::PgPoolOptions, query, Pool, Postgres};
use storefront_types::{ErrorKind, Failure};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

mod billing;
mod orders;
mod products;

/// Failures while setting up the store, before any request is served.
#[derive(Debug, Error)]
pub enum PostgresStoreError {
    /// The connection pool could not be created.
    #[error("failed to create postgres connection pool")]
    ConnectionFailed(#[source] sqlx::Error),
    /// The database did not answer a liveness query.
    #[error("postgres did not answer the liveness query")]
    Unavailable(#[source] sqlx::Error),
    /// Schema migrations could not be applied.
    #[error("postgres migration failed")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),
}

/// Maximum number of database connections in the pool.
///
/// MaxConnections represents the connection pool size limit. It must be at least 1,
/// enforced by using NonZeroU32 as the underlying type.
///
/// # Examples
///
/// ```ignore
/// use storefront_postgres::MaxConnections;
/// use std::num::NonZeroU32;
///
/// let small_pool = MaxConnections::new(NonZeroU32::new(5).expect("5 is non-zero"));
/// let large_pool = MaxConnections::new(NonZeroU32::new(50).expect("50 is non-zero"));
/// ```
#[nutype(derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRef, Into))]
pub struct MaxConnections(NonZeroU32);

/// Configuration for the [`PostgresStore`] connection pool.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Maximum number of connections in the pool (default: 10)
    pub max_connections: MaxConnections,
    /// Timeout for acquiring a connection from the pool (default: 30 seconds)
    pub acquire_timeout: Duration,
    /// Idle timeout for connections in the pool (default: 10 minutes)
    pub idle_timeout: Duration,
}

impl PostgresConfig {
    /// Replace the pool size.
    #[must_use]
    pub fn with_max_connections(mut self, max_connections: MaxConnections) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Replace the acquire timeout.
    #[must_use]
    pub fn with_acquire_timeout(mut self, acquire_timeout: Duration) -> Self {
        self.acquire_timeout = acquire_timeout;
        self
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        const DEFAULT_MAX_CONNECTIONS: NonZeroU32 = match NonZeroU32::new(10) {
            Some(v) => v,
            None => unreachable!(),
        };

        Self {
            max_connections: MaxConnections::new(DEFAULT_MAX_CONNECTIONS),
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600), // 10 minutes
        }
    }
}

/// Product, order and billing persistence backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgresStore with default configuration.
    pub async fn new<S: Into<String>>(connection_string: S) -> Result<Self, PostgresStoreError> {
        Self::with_config(connection_string, PostgresConfig::default()).await
    }

    /// Create a new PostgresStore with custom configuration.
    pub async fn with_config<S: Into<String>>(
        connection_string: S,
        config: PostgresConfig,
    ) -> Result<Self, PostgresStoreError> {
        let connection_string = connection_string.into();
        let max_connections: NonZeroU32 = config.max_connections.into();
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.get())
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .connect(&connection_string)
            .await
            .map_err(PostgresStoreError::ConnectionFailed)?;
        Ok(Self { pool })
    }

    /// Create a PostgresStore from an existing connection pool.
    ///
    /// Use this when you need full control over pool configuration or want to
    /// share a pool across multiple components.
    pub const fn from_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Check that the database answers queries.
    pub async fn ping(&self) -> Result<(), PostgresStoreError> {
        let _ = query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(PostgresStoreError::Unavailable)?;
        Ok(())
    }

    /// Apply the embedded schema migrations. Safe to run repeatedly.
    #[instrument(name = "postgres.migrate", skip(self))]
    pub async fn migrate(&self) -> Result<(), PostgresStoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(PostgresStoreError::MigrationFailed)?;
        info!("[postgres.migrate] schema is up to date");
        Ok(())
    }
}

/// Store operation that touched the database, recorded with every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Insert a catalog entry.
    RegisterProduct,
    /// Read one or more catalog entries.
    ReadProducts,
    /// Change price or stock of a catalog entry.
    UpdateProduct,
    /// Remove a catalog entry.
    DeleteProduct,
    /// Conditionally take stock.
    ReserveStock,
    /// Put reserved stock back.
    ReleaseStock,
    /// Open the order transaction.
    BeginTransaction,
    /// Insert an order header or line.
    InsertOrder,
    /// Commit the order transaction.
    CommitTransaction,
    /// Read order history.
    ReadOrders,
    /// Read a billing record.
    ReadBilling,
    /// Upsert a billing record.
    UpdateBilling,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RegisterProduct => "register_product",
            Self::ReadProducts => "read_products",
            Self::UpdateProduct => "update_product",
            Self::DeleteProduct => "delete_product",
            Self::ReserveStock => "reserve_stock",
            Self::ReleaseStock => "release_stock",
            Self::BeginTransaction => "begin_transaction",
            Self::InsertOrder => "insert_order",
            Self::CommitTransaction => "commit_transaction",
            Self::ReadOrders => "read_orders",
            Self::ReadBilling => "read_billing",
            Self::UpdateBilling => "update_billing",
        })
    }
}

fn map_sqlx_error(error: sqlx::Error, operation: Operation) -> Failure {
    if let sqlx::Error::Database(db_error) = &error {
        // 23505: unique constraint violation
        if db_error.code().as_deref() == Some("23505") {
            warn!(
                error = %db_error,
                operation = %operation,
                "[postgres.unique_violation] record already exists"
            );
            return Failure::new(ErrorKind::AlreadyRegistered, "The record already exists.");
        }
    }

    error!(
        error = %error,
        operation = %operation,
        "[postgres.database_error] database operation failed"
    );
    Failure::new(
        ErrorKind::DatabaseError,
        "The storefront database is unavailable. Please try again.",
    )
}

/// A stored value that no longer parses into its domain type.
fn corrupt_row(operation: Operation, column: &'static str, detail: impl fmt::Display) -> Failure {
    error!(
        operation = %operation,
        column,
        detail = %detail,
        "[postgres.corrupt_row] stored value failed validation"
    );
    Failure::new(
        ErrorKind::DatabaseError,
        "The storefront database returned an invalid record.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_ten_connections() {
        let config = PostgresConfig::default();
        let max: NonZeroU32 = config.max_connections.into();

        assert_eq!(max.get(), 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
    }

    #[test]
    fn builders_replace_pool_settings() {
        let config = PostgresConfig::default()
            .with_max_connections(MaxConnections::new(
                NonZeroU32::new(2).expect("2 is non-zero"),
            ))
            .with_acquire_timeout(Duration::from_secs(1));
        let max: NonZeroU32 = config.max_connections.into();

        assert_eq!(max.get(), 2);
        assert_eq!(config.acquire_timeout, Duration::from_secs(1));
    }

    #[test]
    fn pool_errors_become_database_errors_without_driver_detail() {
        let failure = map_sqlx_error(sqlx::Error::PoolTimedOut, Operation::ReserveStock);

        assert_eq!(failure.kind(), &ErrorKind::DatabaseError);
        assert!(!failure.message().contains("pool"));
    }

    #[test]
    fn operations_render_as_snake_case() {
        assert_eq!(Operation::ReserveStock.to_string(), "reserve_stock");
        assert_eq!(Operation::CommitTransaction.to_string(), "commit_transaction");
    }
}
