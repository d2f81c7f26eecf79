//! Core types for Pulpería.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod guest;
pub mod id;
pub mod price;

pub use cart::{Cart, CartItem, ProductSnapshot};
pub use guest::{GuestAddress, GuestInfo, GuestInfoError};
pub use id::*;
pub use price::{CurrencyCode, Price};
