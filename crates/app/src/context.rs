//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::CheckoutConfig,
    database::{self, Db},
    domain::{
        carts::{CartsService, PgCartsService},
        checkout::{CheckoutService, PgCheckoutService},
        orders::{OrdersService, PgOrdersService},
        payments::{PaymentsService, PgPaymentsService},
        products::{PgProductsService, ProductsService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrdersService>,
    pub checkout: Arc<dyn CheckoutService>,
    pub payments: Arc<dyn PaymentsService>,
}

impl AppContext {
    /// Build application context from checkout configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_config(config: &CheckoutConfig) -> Result<Self, AppInitError> {
        let pool = database::connect(&config.database_url)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::from_db(
            Db::with_limits(pool, config.transaction_limits()),
            config,
        ))
    }

    #[must_use]
    pub fn from_db(db: Db, config: &CheckoutConfig) -> Self {
        let retry_policy = config.retry_policy();
        let operation_timeout = config.operation_timeout();

        Self {
            products: Arc::new(PgProductsService::new(db.clone())),
            carts: Arc::new(PgCartsService::new(db.clone())),
            orders: Arc::new(PgOrdersService::new(db.clone())),
            checkout: Arc::new(PgCheckoutService::with_policy(
                db.clone(),
                retry_policy,
                operation_timeout,
            )),
            payments: Arc::new(PgPaymentsService::with_policy(
                db,
                retry_policy,
                operation_timeout,
            )),
        }
    }
}
