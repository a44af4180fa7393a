//! Payments

pub mod errors;
pub mod service;

pub use errors::PaymentError;
pub use service::*;
