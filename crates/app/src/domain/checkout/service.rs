//! Checkout service.
//!
//! `place_order` turns the owner's active cart into a pending order in one
//! transaction. Locks are taken in a fixed order (cart row first, then the
//! product rows by uuid) so concurrent checkouts sharing products queue
//! rather than deadlock. A concurrent checkout of the same cart waits on the
//! cart row and then finds no active cart.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use tracing::{debug, info, warn};

use crate::{
    database::Db,
    domain::{
        carts::repositories::{PgCartItemsRepository, PgCartsRepository},
        checkout::{
            errors::CheckoutError,
            pricing::{order_total, price_lines},
        },
        orders::{
            data::NewOrder,
            records::{OrderRecord, OrderUuid},
            repositories::{PgOrderItemsRepository, PgOrdersRepository},
        },
        owners::OwnerUuid,
        products::{records::ProductUuid, repository::PgProductsRepository},
    },
    retry::{RetryPolicy, retry_transient},
};

/// Default budget for a whole checkout, retries included.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct PgCheckoutService {
    db: Db,
    retry_policy: RetryPolicy,
    operation_timeout: Duration,
    carts_repository: PgCartsRepository,
    cart_items_repository: PgCartItemsRepository,
    products_repository: PgProductsRepository,
    orders_repository: PgOrdersRepository,
    order_items_repository: PgOrderItemsRepository,
}

impl PgCheckoutService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self::with_policy(db, RetryPolicy::default(), DEFAULT_OPERATION_TIMEOUT)
    }

    #[must_use]
    pub fn with_policy(db: Db, retry_policy: RetryPolicy, operation_timeout: Duration) -> Self {
        Self {
            db,
            retry_policy,
            operation_timeout,
            carts_repository: PgCartsRepository::new(),
            cart_items_repository: PgCartItemsRepository::new(),
            products_repository: PgProductsRepository::new(),
            orders_repository: PgOrdersRepository::new(),
            order_items_repository: PgOrderItemsRepository::new(),
        }
    }

    /// One attempt at the checkout transaction. Returning early drops `tx`,
    /// which rolls back everything written so far.
    async fn try_place_order(&self, owner: OwnerUuid) -> Result<OrderRecord, CheckoutError> {
        let mut tx = self.db.begin_checkout_transaction().await?;

        let cart = self
            .carts_repository
            .lock_active_cart(&mut tx, owner)
            .await?
            .ok_or(CheckoutError::NoActiveCart)?;

        let items = self
            .cart_items_repository
            .get_cart_items(&mut tx, cart.uuid)
            .await?;

        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let product_uuids: Vec<ProductUuid> = items.iter().map(|item| item.product_uuid).collect();

        let products = self
            .products_repository
            .lock_products(&mut tx, &product_uuids)
            .await?;

        let lines = price_lines(&items, &products)?;

        let mut order = self
            .orders_repository
            .create_order(
                &mut tx,
                &NewOrder {
                    uuid: OrderUuid::new(),
                    owner,
                    cart: cart.uuid,
                    total: order_total(&lines),
                },
            )
            .await?;

        for line in &lines {
            let item = self
                .order_items_repository
                .create_order_item(&mut tx, order.uuid, &line.to_order_item())
                .await?;

            order.items.push(item);

            let decremented = self
                .products_repository
                .decrement_stock(&mut tx, line.product, line.quantity)
                .await?;

            if !decremented {
                return Err(CheckoutError::InsufficientStock {
                    product: line.product,
                    requested: line.quantity,
                    available: line.available,
                });
            }
        }

        let rows_affected = self
            .carts_repository
            .mark_cart_ordered(&mut tx, cart.uuid)
            .await?;

        if rows_affected == 0 {
            return Err(CheckoutError::NoActiveCart);
        }

        tx.commit().await?;

        Ok(order)
    }
}

#[async_trait]
impl CheckoutService for PgCheckoutService {
    #[tracing::instrument(name = "checkout.place_order", skip_all, fields(owner = %owner))]
    async fn place_order(&self, owner: OwnerUuid) -> Result<OrderRecord, CheckoutError> {
        let attempts = retry_transient(&self.retry_policy, "place_order", |_| {
            self.try_place_order(owner)
        });

        let result = match tokio::time::timeout(self.operation_timeout, attempts).await {
            Ok(result) => result.map_err(CheckoutError::from),
            Err(_) => Err(CheckoutError::Timeout),
        };

        match &result {
            Ok(order) => info!(
                order = %order.uuid,
                cart = %order.cart_uuid,
                total = %order.total,
                lines = order.items.len(),
                "order placed"
            ),
            Err(error) if error.is_client_error() => debug!(%error, "checkout rejected"),
            Err(error) => warn!(%error, "checkout failed"),
        }

        result
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Materialise the owner's active cart as a pending order.
    ///
    /// Validates every line against the live catalog, captures prices,
    /// decrements stock and marks the cart ordered, all or nothing.
    ///
    /// [`CheckoutError::Timeout`] leaves the outcome unknown: the deadline can
    /// expire while `COMMIT` is in flight. Re-read the owner's orders before
    /// placing again.
    async fn place_order(&self, owner: OwnerUuid) -> Result<OrderRecord, CheckoutError>;
}
