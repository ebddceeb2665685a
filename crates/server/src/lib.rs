//! Packhouse server library.
//!
//! Warehouse fulfillment companion for a Shopify store: mirrors orders
//! into Postgres via the reconciliation engine and serves the picker,
//! packer and transfer workflows.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod shopify;
pub mod state;
pub mod sync;
