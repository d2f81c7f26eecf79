//! Pulpería Core - Shared domain types.
//!
//! This crate provides common types used across all Pulpería components:
//! - `storefront` - the cart engine consumed by the customer-facing UI
//! - future back-office tooling
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no
//! HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, decimal prices, cart records, and guest
//!   checkout data

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
