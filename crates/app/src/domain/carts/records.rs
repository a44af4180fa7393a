//! Cart Records

use jiff::Timestamp;
use serde::Serialize;

use crate::{
    domain::{owners::OwnerUuid, products::records::ProductUuid},
    uuids::TypedUuid,
};

/// Cart UUID
pub type CartUuid = TypedUuid<CartRecord>;

/// Cart lifecycle. `Active` becomes `Ordered` exactly once, when an order is
/// materialised from the cart; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(type_name = "cart_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CartStatus {
    Active,
    Ordered,
}

/// Cart Record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRecord {
    #[serde(rename = "id")]
    pub uuid: CartUuid,
    #[serde(rename = "ownerId")]
    pub owner_uuid: OwnerUuid,
    pub status: CartStatus,
    pub items: Vec<CartItemRecord>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Cart line: one product and how many of it the shopper wants.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRecord {
    #[serde(skip)]
    pub cart_uuid: CartUuid,
    #[serde(rename = "productId")]
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
