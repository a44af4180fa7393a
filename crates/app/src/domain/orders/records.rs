//! Order Records

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    domain::{
        carts::records::CartUuid, orders::status::OrderStatus, owners::OwnerUuid,
        products::records::ProductUuid,
    },
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Order Record
///
/// An immutable priced snapshot of a purchase. Only `status`, `updated_at`
/// and `paid_at` change after creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    #[serde(rename = "id")]
    pub uuid: OrderUuid,
    #[serde(rename = "ownerId")]
    pub owner_uuid: OwnerUuid,
    #[serde(rename = "cartId")]
    pub cart_uuid: CartUuid,
    pub status: OrderStatus,
    pub total: Decimal,
    pub items: Vec<OrderItemRecord>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub paid_at: Option<Timestamp>,
}

/// Order line: quantity and unit price copied at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRecord {
    #[serde(skip)]
    pub order_uuid: OrderUuid,
    #[serde(rename = "productId")]
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub price: Decimal,
}

impl OrderRecord {
    /// Sum of `quantity × price` over the stored lines.
    #[must_use]
    pub fn items_total(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum()
    }
}
