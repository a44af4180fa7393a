//! Payment settlement service.
//!
//! Settlement moves an order from `pending` to `paid` exactly once. The order
//! row is locked for the duration of the transaction and the status write is
//! conditional on `pending`, so of two concurrent settlements the second sees
//! the paid order and fails with `InvalidState`.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use tracing::{debug, info, warn};

use crate::{
    database::Db,
    domain::{
        checkout::DEFAULT_OPERATION_TIMEOUT,
        orders::{
            OrderStatus,
            records::{OrderRecord, OrderUuid},
            repositories::{PgOrderItemsRepository, PgOrdersRepository},
        },
        owners::OwnerUuid,
        payments::errors::PaymentError,
    },
    retry::{RetryPolicy, retry_transient},
};

#[derive(Debug, Clone)]
pub struct PgPaymentsService {
    db: Db,
    retry_policy: RetryPolicy,
    operation_timeout: Duration,
    orders_repository: PgOrdersRepository,
    items_repository: PgOrderItemsRepository,
}

impl PgPaymentsService {
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
            orders_repository: PgOrdersRepository::new(),
            items_repository: PgOrderItemsRepository::new(),
        }
    }

    async fn try_settle_payment(
        &self,
        order: OrderUuid,
        owner: OwnerUuid,
    ) -> Result<OrderRecord, PaymentError> {
        let mut tx = self.db.begin_checkout_transaction().await?;

        let current = self
            .orders_repository
            .lock_order(&mut tx, order, owner)
            .await?
            .ok_or(PaymentError::OrderNotFound)?;

        let next = current
            .status
            .transition_to(OrderStatus::Paid)
            .map_err(|invalid| PaymentError::InvalidState {
                status: invalid.from,
            })?;

        let mut paid = self
            .orders_repository
            .update_status(&mut tx, order, current.status, next)
            .await?
            .ok_or(PaymentError::InvalidState {
                status: current.status,
            })?;

        paid.items = self
            .items_repository
            .get_order_items(&mut tx, &[order])
            .await?;

        tx.commit().await?;

        Ok(paid)
    }
}

#[async_trait]
impl PaymentsService for PgPaymentsService {
    #[tracing::instrument(
        name = "payments.settle_payment",
        skip_all,
        fields(order = %order, owner = %owner)
    )]
    async fn settle_payment(
        &self,
        order: OrderUuid,
        owner: OwnerUuid,
    ) -> Result<OrderRecord, PaymentError> {
        let attempts = retry_transient(&self.retry_policy, "settle_payment", |_| {
            self.try_settle_payment(order, owner)
        });

        let result = match tokio::time::timeout(self.operation_timeout, attempts).await {
            Ok(result) => result.map_err(PaymentError::from),
            Err(_) => Err(PaymentError::Timeout),
        };

        match &result {
            Ok(paid) => info!(total = %paid.total, "payment settled"),
            Err(error) if error.is_client_error() => debug!(%error, "settlement rejected"),
            Err(error) => warn!(%error, "settlement failed"),
        }

        result
    }
}

#[automock]
#[async_trait]
pub trait PaymentsService: Send + Sync {
    /// Mark one of the owner's pending orders as paid.
    ///
    /// A call on an order that is already paid, or in any other non-pending
    /// state, fails with `InvalidState` and changes nothing.
    ///
    /// After [`PaymentError::Timeout`] the order may or may not be paid;
    /// re-read it before settling again.
    async fn settle_payment(
        &self,
        order: OrderUuid,
        owner: OwnerUuid,
    ) -> Result<OrderRecord, PaymentError>;
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use crate::{
        domain::{carts::records::CartStatus, checkout::CheckoutService, orders::OrdersService},
        test::{TestContext, helpers},
    };

    use super::*;

    #[tokio::test]
    async fn settle_payment_marks_order_paid_once() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(dec!(12.50), 5).await?;

        let cart = helpers::fill_cart(&ctx, ctx.owner, &[(product.uuid, 3)]).await?;

        let order = ctx.checkout.place_order(ctx.owner).await?;

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, dec!(37.50));
        assert_eq!(helpers::stock(&ctx, product.uuid).await?, 2);
        assert_eq!(helpers::cart_status(&ctx, cart.uuid).await?, CartStatus::Ordered);

        let paid = ctx.payments.settle_payment(order.uuid, ctx.owner).await?;

        assert_eq!(paid.status, OrderStatus::Paid);
        assert!(paid.paid_at.is_some());
        assert_eq!(paid.items, order.items);

        let again = ctx.payments.settle_payment(order.uuid, ctx.owner).await;

        assert!(
            matches!(
                again,
                Err(PaymentError::InvalidState {
                    status: OrderStatus::Paid
                })
            ),
            "expected InvalidState, got {again:?}"
        );

        let stored = ctx.orders.get_order(order.uuid, ctx.owner).await?;

        assert_eq!(stored.status, OrderStatus::Paid);
        assert_eq!(stored.paid_at, paid.paid_at);

        Ok(())
    }

    #[tokio::test]
    async fn settle_payment_for_another_owner_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(dec!(1.00), 1).await?;

        helpers::fill_cart(&ctx, ctx.owner, &[(product.uuid, 1)]).await?;
        let order = ctx.checkout.place_order(ctx.owner).await?;

        let result = ctx.payments.settle_payment(order.uuid, OwnerUuid::new()).await;

        assert!(
            matches!(result, Err(PaymentError::OrderNotFound)),
            "expected OrderNotFound, got {result:?}"
        );

        let stored = ctx.orders.get_order(order.uuid, ctx.owner).await?;
        assert_eq!(stored.status, OrderStatus::Pending);

        Ok(())
    }

    #[tokio::test]
    async fn settle_payment_unknown_order_is_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.payments.settle_payment(OrderUuid::new(), ctx.owner).await;

        assert!(
            matches!(result, Err(PaymentError::OrderNotFound)),
            "expected OrderNotFound, got {result:?}"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_settlements_succeed_exactly_once() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(dec!(9.99), 10).await?;

        helpers::fill_cart(&ctx, ctx.owner, &[(product.uuid, 2)]).await?;
        let order = ctx.checkout.place_order(ctx.owner).await?;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let payments = ctx.payments.clone();
                let owner = ctx.owner;
                let uuid = order.uuid;

                tokio::spawn(async move { payments.settle_payment(uuid, owner).await })
            })
            .collect();

        let mut settled = 0;
        let mut rejected = 0;

        for handle in handles {
            match handle.await? {
                Ok(paid) => {
                    assert_eq!(paid.status, OrderStatus::Paid);
                    settled += 1;
                }
                Err(PaymentError::InvalidState {
                    status: OrderStatus::Paid,
                }) => rejected += 1,
                Err(error) => return Err(error.into()),
            }
        }

        assert_eq!(settled, 1);
        assert_eq!(rejected, 7);

        Ok(())
    }
}
