//! Cart Data

use crate::domain::{carts::records::CartUuid, owners::OwnerUuid};

/// New Cart Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewCart {
    pub uuid: CartUuid,
    pub owner: OwnerUuid,
}
