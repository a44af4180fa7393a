//! Test Helpers

use sqlx::query_scalar;

use crate::{
    domain::{
        carts::{
            CartsService,
            records::{CartRecord, CartStatus, CartUuid},
        },
        owners::OwnerUuid,
        products::{ProductsService, records::ProductUuid},
    },
    test::TestContext,
};

/// Open a cart for `owner` and fill it with `(product, quantity)` lines.
pub(crate) async fn fill_cart(
    ctx: &TestContext,
    owner: OwnerUuid,
    lines: &[(ProductUuid, u32)],
) -> testresult::TestResult<CartRecord> {
    ctx.create_cart_for(owner).await?;

    for (product, quantity) in lines {
        ctx.carts.add_item(owner, *product, *quantity).await?;
    }

    Ok(ctx.carts.get_active_cart(owner).await?)
}

/// Current status of any cart, active or not.
pub(crate) async fn cart_status(
    ctx: &TestContext,
    cart: CartUuid,
) -> Result<CartStatus, sqlx::Error> {
    query_scalar("SELECT status FROM carts WHERE uuid = $1")
        .bind(cart.into_uuid())
        .fetch_one(ctx.db.pool())
        .await
}

pub(crate) async fn stock(ctx: &TestContext, product: ProductUuid) -> testresult::TestResult<u32> {
    Ok(ctx.products.get_product(product).await?.stock)
}

pub(crate) async fn order_count(ctx: &TestContext) -> Result<i64, sqlx::Error> {
    query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(ctx.db.pool())
        .await
}

/// A server error carrying only a SQLSTATE, for classification tests.
#[derive(Debug)]
struct SqlStateError(&'static str);

impl std::fmt::Display for SqlStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sqlstate {}", self.0)
    }
}

impl std::error::Error for SqlStateError {}

impl sqlx::error::DatabaseError for SqlStateError {
    fn message(&self) -> &str {
        "test error"
    }

    fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
        Some(std::borrow::Cow::Borrowed(self.0))
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> sqlx::error::ErrorKind {
        sqlx::error::ErrorKind::Other
    }
}

/// A `sqlx::Error::Database` reporting the given SQLSTATE.
pub(crate) fn sqlstate_error(code: &'static str) -> sqlx::Error {
    sqlx::Error::Database(Box::new(SqlStateError(code)))
}
