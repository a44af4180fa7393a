//! Storefront Domain Concerns

pub mod carts;
pub mod checkout;
pub(crate) mod columns;
pub mod orders;
pub mod owners;
pub mod payments;
pub mod products;
