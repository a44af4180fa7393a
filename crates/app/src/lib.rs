//! Storefront checkout engine: carts, catalog stock, orders and payment
//! settlement on PostgreSQL.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod observability;
pub mod retry;

#[cfg(test)]
mod test;

pub mod uuids;
