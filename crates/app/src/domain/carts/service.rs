//! Carts service.
//!
//! Item mutations lock the owner's active cart row first, so they serialize
//! with checkout: a line can never be added to or removed from a cart while
//! an order is being materialised from it.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        carts::{
            data::NewCart,
            errors::CartsServiceError,
            records::{CartItemRecord, CartRecord},
            repositories::{PgCartItemsRepository, PgCartsRepository},
        },
        owners::OwnerUuid,
        products::{records::ProductUuid, repository::PgProductsRepository},
    },
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    carts_repository: PgCartsRepository,
    items_repository: PgCartItemsRepository,
    products_repository: PgProductsRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            carts_repository: PgCartsRepository::new(),
            items_repository: PgCartItemsRepository::new(),
            products_repository: PgProductsRepository::new(),
        }
    }

    async fn write_item(
        &self,
        owner: OwnerUuid,
        product: ProductUuid,
        quantity: u32,
        accumulate: bool,
    ) -> Result<CartItemRecord, CartsServiceError> {
        if quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let mut tx = self.db.begin().await?;

        let cart = self
            .carts_repository
            .lock_active_cart(&mut tx, owner)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        match self.products_repository.get_product(&mut tx, product).await {
            Ok(_) => {}
            Err(sqlx::Error::RowNotFound) => return Err(CartsServiceError::InvalidReference),
            Err(error) => return Err(error.into()),
        }

        let item = if accumulate {
            self.items_repository
                .add_cart_item(&mut tx, cart.uuid, product, quantity)
                .await?
        } else {
            self.items_repository
                .set_cart_item(&mut tx, cart.uuid, product, quantity)
                .await?
        };

        tx.commit().await?;

        Ok(item)
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    async fn get_active_cart(&self, owner: OwnerUuid) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let mut cart = self
            .carts_repository
            .get_active_cart(&mut tx, owner)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        cart.items = self
            .items_repository
            .get_cart_items(&mut tx, cart.uuid)
            .await?;

        tx.commit().await?;

        Ok(cart)
    }

    async fn create_cart(&self, cart: NewCart) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self
            .carts_repository
            .create_cart(&mut tx, cart.uuid, cart.owner)
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn set_item_quantity(
        &self,
        owner: OwnerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<CartItemRecord, CartsServiceError> {
        self.write_item(owner, product, quantity, false).await
    }

    async fn add_item(
        &self,
        owner: OwnerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<CartItemRecord, CartsServiceError> {
        self.write_item(owner, product, quantity, true).await
    }

    async fn remove_item(
        &self,
        owner: OwnerUuid,
        product: ProductUuid,
    ) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self
            .carts_repository
            .lock_active_cart(&mut tx, owner)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        let rows_affected = self
            .items_repository
            .delete_cart_item(&mut tx, cart.uuid, product)
            .await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::ItemNotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Retrieve the owner's active cart with its items.
    async fn get_active_cart(&self, owner: OwnerUuid) -> Result<CartRecord, CartsServiceError>;

    /// Open a new active cart. Fails with `AlreadyExists` while the owner
    /// still has one.
    async fn create_cart(&self, cart: NewCart) -> Result<CartRecord, CartsServiceError>;

    /// Put `quantity` of a product in the active cart, replacing any previous quantity.
    async fn set_item_quantity(
        &self,
        owner: OwnerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<CartItemRecord, CartsServiceError>;

    /// Add `quantity` of a product to the active cart, on top of any already there.
    async fn add_item(
        &self,
        owner: OwnerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<CartItemRecord, CartsServiceError>;

    /// Drop a product from the active cart.
    async fn remove_item(
        &self,
        owner: OwnerUuid,
        product: ProductUuid,
    ) -> Result<(), CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use crate::{
        domain::carts::{records::CartStatus, records::CartUuid},
        test::TestContext,
    };

    use super::*;

    #[tokio::test]
    async fn create_cart_starts_active_and_empty() -> TestResult {
        let ctx = TestContext::new().await;
        let uuid = CartUuid::new();

        let cart = ctx
            .carts
            .create_cart(NewCart {
                uuid,
                owner: ctx.owner,
            })
            .await?;

        assert_eq!(cart.uuid, uuid);
        assert_eq!(cart.owner_uuid, ctx.owner);
        assert_eq!(cart.status, CartStatus::Active);
        assert!(cart.items.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn second_active_cart_for_owner_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.create_cart().await?;

        let result = ctx
            .carts
            .create_cart(NewCart {
                uuid: CartUuid::new(),
                owner: ctx.owner,
            })
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn get_active_cart_without_cart_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.carts.get_active_cart(ctx.owner).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn add_item_accumulates_and_set_item_overwrites() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(dec!(2.50), 10).await?;

        ctx.create_cart().await?;

        ctx.carts.add_item(ctx.owner, product.uuid, 2).await?;
        let item = ctx.carts.add_item(ctx.owner, product.uuid, 3).await?;

        assert_eq!(item.quantity, 5);

        let item = ctx
            .carts
            .set_item_quantity(ctx.owner, product.uuid, 1)
            .await?;

        assert_eq!(item.quantity, 1);

        let cart = ctx.carts.get_active_cart(ctx.owner).await?;

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items.first().map(|item| item.quantity), Some(1));

        Ok(())
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(dec!(1.00), 1).await?;

        ctx.create_cart().await?;

        let result = ctx
            .carts
            .set_item_quantity(ctx.owner, product.uuid, 0)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::InvalidQuantity)),
            "expected InvalidQuantity, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn adding_unknown_product_returns_invalid_reference() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.create_cart().await?;

        let result = ctx.carts.add_item(ctx.owner, ProductUuid::new(), 1).await;

        assert!(
            matches!(result, Err(CartsServiceError::InvalidReference)),
            "expected InvalidReference, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn adding_item_without_active_cart_returns_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(dec!(1.00), 1).await?;

        let result = ctx.carts.add_item(ctx.owner, product.uuid, 1).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn remove_item_drops_line() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(dec!(1.00), 3).await?;

        ctx.create_cart().await?;
        ctx.carts.add_item(ctx.owner, product.uuid, 1).await?;

        ctx.carts.remove_item(ctx.owner, product.uuid).await?;

        let cart = ctx.carts.get_active_cart(ctx.owner).await?;
        assert!(cart.items.is_empty());

        let again = ctx.carts.remove_item(ctx.owner, product.uuid).await;

        assert!(
            matches!(again, Err(CartsServiceError::ItemNotFound)),
            "expected ItemNotFound, got {again:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn carts_are_scoped_to_their_owner() -> TestResult {
        let ctx = TestContext::new().await;
        let other = OwnerUuid::new();

        ctx.create_cart().await?;

        let result = ctx.carts.get_active_cart(other).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound for another owner, got {result:?}"
        );

        Ok(())
    }
}
