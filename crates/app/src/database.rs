//! Database connection management

use std::time::Duration;

use sqlx::{Error, PgPool, Postgres, Transaction, query};

/// SQL used to apply a transaction-local runtime setting.
pub const SET_LOCAL_SETTING_SQL: &str = "SELECT set_config($1, $2, true)";

/// `serialization_failure`
const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";

/// `deadlock_detected`
const SQLSTATE_DEADLOCK_DETECTED: &str = "40P01";

/// `lock_not_available`, raised when `lock_timeout` expires.
const SQLSTATE_LOCK_NOT_AVAILABLE: &str = "55P03";

/// `query_canceled`, raised when `statement_timeout` expires.
const SQLSTATE_QUERY_CANCELED: &str = "57014";

/// Server-side limits applied to every checkout or settlement transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionLimits {
    /// Longest time a statement may wait for a row lock.
    pub lock_timeout: Duration,

    /// Longest time a single statement may run.
    pub statement_timeout: Duration,
}

impl Default for TransactionLimits {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(2),
            statement_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
    limits: TransactionLimits,
}

impl Db {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self::with_limits(pool, TransactionLimits::default())
    }

    #[must_use]
    pub fn with_limits(pool: PgPool, limits: TransactionLimits) -> Self {
        Self { pool, limits }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a plain read-committed transaction.
    ///
    /// # Errors
    ///
    /// Returns an error when starting the transaction fails.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, Error> {
        self.pool.begin().await
    }

    /// Begin a transaction with lock and statement timeouts applied.
    ///
    /// The settings are transaction-local and vanish on commit or rollback, so
    /// pooled connections are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error when starting the transaction or applying a setting fails.
    pub async fn begin_checkout_transaction(
        &self,
    ) -> Result<Transaction<'static, Postgres>, Error> {
        let mut tx = self.pool.begin().await?;

        for (name, value) in [
            ("lock_timeout", self.limits.lock_timeout),
            ("statement_timeout", self.limits.statement_timeout),
        ] {
            query(SET_LOCAL_SETTING_SQL)
                .bind(name)
                .bind(format!("{}ms", value.as_millis()))
                .execute(&mut *tx)
                .await?;
        }

        Ok(tx)
    }
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, Error> {
    PgPool::connect(database_url).await
}

/// Apply pending schema migrations.
///
/// # Errors
///
/// Returns an error if a migration fails to apply.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

fn sqlstate(error: &Error) -> Option<String> {
    error
        .as_database_error()
        .and_then(|db_error| db_error.code())
        .map(|code| code.into_owned())
}

/// Whether the error is a concurrency conflict that a fresh transaction may
/// not hit again: serialization failures, deadlocks and lock timeouts.
///
/// Lost or exhausted connections are not conflicts. A connection dropped
/// during `COMMIT` leaves the outcome unknown, so it must not be retried.
#[must_use]
pub fn is_conflict(error: &Error) -> bool {
    matches!(
        sqlstate(error).as_deref(),
        Some(
            SQLSTATE_SERIALIZATION_FAILURE
                | SQLSTATE_DEADLOCK_DETECTED
                | SQLSTATE_LOCK_NOT_AVAILABLE
        )
    )
}

/// Whether the server cancelled a statement because `statement_timeout` expired.
#[must_use]
pub fn is_cancelled(error: &Error) -> bool {
    sqlstate(error).as_deref() == Some(SQLSTATE_QUERY_CANCELED)
}

#[cfg(test)]
mod tests {
    use std::io;

    use crate::test::helpers::sqlstate_error;

    use super::*;

    #[test]
    fn lost_connections_and_pool_timeouts_are_not_conflicts() {
        assert!(!is_conflict(&Error::Io(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "reset"
        ))));
        assert!(!is_conflict(&Error::PoolTimedOut));
        assert!(!is_cancelled(&Error::PoolTimedOut));
    }

    #[test]
    fn lock_and_serialization_failures_are_conflicts() {
        for code in ["40001", "40P01", "55P03"] {
            assert!(
                is_conflict(&sqlstate_error(code)),
                "{code} should be a conflict"
            );
        }

        assert!(!is_conflict(&sqlstate_error("57014")));
        assert!(is_cancelled(&sqlstate_error("57014")));
        assert!(!is_conflict(&sqlstate_error("23505")));
    }

    #[test]
    fn row_not_found_is_not_a_conflict() {
        assert!(!is_conflict(&Error::RowNotFound));
        assert!(!is_cancelled(&Error::RowNotFound));
    }

    #[test]
    fn default_limits_are_ordered() {
        let limits = TransactionLimits::default();

        assert!(
            limits.lock_timeout < limits.statement_timeout,
            "lock waits should give up before the statement does"
        );
    }
}
