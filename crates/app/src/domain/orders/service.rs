//! Orders service.

use std::collections::HashMap;

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};

use crate::{
    database::Db,
    domain::{
        orders::{
            errors::OrdersServiceError,
            records::{OrderItemRecord, OrderRecord, OrderUuid},
            repositories::{PgOrderItemsRepository, PgOrdersRepository},
        },
        owners::OwnerUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    orders_repository: PgOrdersRepository,
    items_repository: PgOrderItemsRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            orders_repository: PgOrdersRepository::new(),
            items_repository: PgOrderItemsRepository::new(),
        }
    }

    async fn attach_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &mut [OrderRecord],
    ) -> Result<(), sqlx::Error> {
        let uuids: Vec<OrderUuid> = orders.iter().map(|order| order.uuid).collect();

        let mut grouped: HashMap<OrderUuid, Vec<OrderItemRecord>> = HashMap::new();

        for item in self.items_repository.get_order_items(tx, &uuids).await? {
            grouped.entry(item.order_uuid).or_default().push(item);
        }

        for order in orders {
            order.items = grouped.remove(&order.uuid).unwrap_or_default();
        }

        Ok(())
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn get_order(
        &self,
        order: OrderUuid,
        owner: OwnerUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let order = self
            .orders_repository
            .get_order(&mut tx, order, owner)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        let mut orders = [order];

        self.attach_items(&mut tx, &mut orders).await?;

        tx.commit().await?;

        let [order] = orders;

        Ok(order)
    }

    async fn list_orders(&self, owner: OwnerUuid) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let mut orders = self.orders_repository.list_orders(&mut tx, owner).await?;

        self.attach_items(&mut tx, &mut orders).await?;

        tx.commit().await?;

        Ok(orders)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Retrieve one of the owner's orders with its items.
    async fn get_order(
        &self,
        order: OrderUuid,
        owner: OwnerUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// All of the owner's orders with their items, newest first.
    async fn list_orders(&self, owner: OwnerUuid) -> Result<Vec<OrderRecord>, OrdersServiceError>;
}
