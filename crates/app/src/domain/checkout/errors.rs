//! Checkout errors.

use sqlx::Error;
use thiserror::Error;

use crate::{
    database::{is_cancelled, is_conflict},
    domain::products::records::ProductUuid,
    retry::{RetryError, Transient},
};

#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The owner has no active cart, or a concurrent checkout just ordered it.
    #[error("no active cart")]
    NoActiveCart,

    #[error("cart is empty")]
    EmptyCart,

    /// The product was deleted after it was put in the cart.
    #[error("product {0} is no longer available")]
    ProductUnavailable(ProductUuid),

    #[error("insufficient stock for product {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: ProductUuid,
        requested: u32,
        available: u32,
    },

    /// Lock or serialization conflicts persisted through every retry.
    #[error("checkout conflicted with concurrent updates after {attempts} attempts")]
    Conflict { attempts: u32 },

    #[error("checkout timed out")]
    Timeout,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl CheckoutError {
    /// Validation failures the caller caused and can act on.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NoActiveCart
                | Self::EmptyCart
                | Self::ProductUnavailable(_)
                | Self::InsufficientStock { .. }
        )
    }

    /// Failures that may go away if the caller tries again later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Conflict { .. } | Self::Timeout => true,
            Self::Sql(error) => is_conflict(error),
            _ => false,
        }
    }
}

impl Transient for CheckoutError {
    fn is_transient(&self) -> bool {
        Self::is_transient(self)
    }
}

impl From<Error> for CheckoutError {
    fn from(error: Error) -> Self {
        if is_cancelled(&error) {
            return Self::Timeout;
        }

        Self::Sql(error)
    }
}

impl From<RetryError<CheckoutError>> for CheckoutError {
    fn from(error: RetryError<CheckoutError>) -> Self {
        match error {
            RetryError::Permanent(error)
            | RetryError::Exhausted {
                last: error @ Self::Timeout,
                ..
            } => error,
            RetryError::Exhausted { attempts, .. } => Self::Conflict { attempts },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::atomic::{AtomicU32, Ordering},
    };

    use crate::{
        retry::{RetryPolicy, retry_transient},
        test::helpers::sqlstate_error,
    };

    use super::*;

    #[test]
    fn validation_errors_are_client_errors_and_never_transient() {
        let errors = [
            CheckoutError::NoActiveCart,
            CheckoutError::EmptyCart,
            CheckoutError::ProductUnavailable(ProductUuid::new()),
            CheckoutError::InsufficientStock {
                product: ProductUuid::new(),
                requested: 3,
                available: 1,
            },
        ];

        for error in errors {
            assert!(error.is_client_error(), "{error} should be a client error");
            assert!(!error.is_transient(), "{error} should not be transient");
        }
    }

    fn connection_reset() -> Error {
        Error::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
    }

    #[test]
    fn lost_connection_is_a_fatal_storage_error() {
        let error = CheckoutError::from(connection_reset());

        assert!(matches!(error, CheckoutError::Sql(Error::Io(_))));
        assert!(!error.is_transient());
        assert!(!error.is_client_error());
    }

    #[tokio::test]
    async fn lost_connection_is_surfaced_without_retrying() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = retry_transient(&RetryPolicy::default(), "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CheckoutError::from(connection_reset())) }
        })
        .await;

        let error = result.map_err(CheckoutError::from).err();

        assert!(
            matches!(error, Some(CheckoutError::Sql(Error::Io(_)))),
            "expected Sql, got {error:?}"
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn pool_timeout_is_a_fatal_storage_error() {
        let error = CheckoutError::from(Error::PoolTimedOut);

        assert!(matches!(error, CheckoutError::Sql(Error::PoolTimedOut)));
        assert!(!error.is_transient());
    }

    #[test]
    fn deadlocks_are_transient() {
        let error = CheckoutError::from(sqlstate_error("40P01"));

        assert!(matches!(error, CheckoutError::Sql(_)));
        assert!(error.is_transient());
        assert!(!error.is_client_error());
    }

    #[test]
    fn statement_timeouts_become_timeout() {
        assert!(matches!(
            CheckoutError::from(sqlstate_error("57014")),
            CheckoutError::Timeout
        ));
    }

    #[test]
    fn unclassified_storage_errors_are_permanent() {
        let error = CheckoutError::from(Error::RowNotFound);

        assert!(matches!(error, CheckoutError::Sql(_)));
        assert!(!error.is_transient());
    }

    #[test]
    fn exhausted_retries_become_conflict() {
        let error = CheckoutError::from(RetryError::Exhausted {
            attempts: 3,
            last: CheckoutError::from(sqlstate_error("40001")),
        });

        assert!(matches!(error, CheckoutError::Conflict { attempts: 3 }));
        assert!(error.is_transient());
    }

    #[test]
    fn exhausted_timeouts_stay_timeouts() {
        let error = CheckoutError::from(RetryError::Exhausted {
            attempts: 2,
            last: CheckoutError::Timeout,
        });

        assert!(matches!(error, CheckoutError::Timeout));
    }

    #[test]
    fn permanent_errors_pass_through() {
        let error = CheckoutError::from(RetryError::Permanent(CheckoutError::EmptyCart));

        assert!(matches!(error, CheckoutError::EmptyCart));
    }
}
