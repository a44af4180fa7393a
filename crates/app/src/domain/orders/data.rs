//! Order Data

use rust_decimal::Decimal;

use crate::domain::{
    carts::records::CartUuid, orders::records::OrderUuid, owners::OwnerUuid,
    products::records::ProductUuid,
};

/// New Order Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub owner: OwnerUuid,
    pub cart: CartUuid,
    pub total: Decimal,
}

/// New Order Item Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product: ProductUuid,
    pub quantity: u32,
    pub price: Decimal,
}
