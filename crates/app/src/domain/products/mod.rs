//! Products
//!
//! The catalog as seen by checkout: price and stock, looked up by id at
//! transaction time and never held by reference from carts or orders.

pub mod data;
pub mod errors;
pub mod records;
pub(crate) mod repository;
pub mod service;

pub use errors::ProductsServiceError;
pub use service::*;
