//! Payment settlement errors.

use sqlx::Error;
use thiserror::Error;

use crate::{
    database::{is_cancelled, is_conflict},
    domain::orders::OrderStatus,
    retry::{RetryError, Transient},
};

#[derive(Debug, Error)]
pub enum PaymentError {
    /// No such order, or it belongs to another owner.
    #[error("order not found")]
    OrderNotFound,

    /// The order is not awaiting payment. A repeated settlement lands here.
    #[error("order is {status}, not pending")]
    InvalidState { status: OrderStatus },

    #[error("settlement conflicted with concurrent updates after {attempts} attempts")]
    Conflict { attempts: u32 },

    #[error("settlement timed out")]
    Timeout,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl PaymentError {
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::OrderNotFound | Self::InvalidState { .. })
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Conflict { .. } | Self::Timeout => true,
            Self::Sql(error) => is_conflict(error),
            _ => false,
        }
    }
}

impl Transient for PaymentError {
    fn is_transient(&self) -> bool {
        Self::is_transient(self)
    }
}

impl From<Error> for PaymentError {
    fn from(error: Error) -> Self {
        if is_cancelled(&error) {
            return Self::Timeout;
        }

        Self::Sql(error)
    }
}

impl From<RetryError<PaymentError>> for PaymentError {
    fn from(error: RetryError<PaymentError>) -> Self {
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
    use std::io;

    use crate::test::helpers::sqlstate_error;

    use super::*;

    #[test]
    fn invalid_state_names_the_current_status() {
        let error = PaymentError::InvalidState {
            status: OrderStatus::Paid,
        };

        assert_eq!(error.to_string(), "order is paid, not pending");
        assert!(error.is_client_error());
        assert!(!error.is_transient());
    }

    #[test]
    fn exhausted_retries_become_conflict() {
        let error = PaymentError::from(RetryError::Exhausted {
            attempts: 4,
            last: PaymentError::from(sqlstate_error("55P03")),
        });

        assert!(matches!(error, PaymentError::Conflict { attempts: 4 }));
        assert!(error.is_transient());
        assert!(!error.is_client_error());
    }

    #[test]
    fn lost_connection_is_a_fatal_storage_error() {
        let error = PaymentError::from(Error::Io(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "reset",
        )));

        assert!(matches!(error, PaymentError::Sql(Error::Io(_))));
        assert!(!error.is_transient());
        assert!(!error.is_client_error());
    }
}
