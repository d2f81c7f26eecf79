//! Pulpería Storefront cart engine.
//!
//! This crate provides the cart functionality as a library, allowing it
//! to be tested and reused. The UI consumes exactly one entry point,
//! [`cart::CartService`], which dispatches each operation to the local
//! guest cart store or the remote backend cart depending on the current
//! session state.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod events;
pub mod guest;
pub mod session;
pub mod storage;

pub use cart::CartService;
pub use error::{CartError, Result};

/// Initialize tracing with an `EnvFilter` taken from `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
