//! Unified error taxonomy for cart operations.
//!
//! Every failure the facade can surface to the UI is one of these
//! variants, regardless of whether the guest or the authenticated path
//! produced it. Validation failures are raised before any network call;
//! remote failures wrap the backend-provided message when available.

use thiserror::Error;

use pulperia_core::ProductId;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Cart operation errors surfaced to the UI.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested quantity exceeds the authoritative stock level.
    #[error("insufficient stock: only {available} units available")]
    InsufficientStock { available: u32 },

    /// The product has no line in the cart.
    #[error("product {0} is not in the cart")]
    ItemNotFound(ProductId),

    /// Quantity must be at least 1; use remove instead of zero.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// Checkout attempted on an empty cart.
    #[error("the cart is empty")]
    EmptyCart,

    /// Authenticated checkout requires a delivery address.
    #[error("a delivery address is required")]
    AddressRequired,

    /// Guest checkout data is missing or incomplete.
    #[error("guest checkout data is incomplete: {0}")]
    GuestInfoRequired(String),

    /// The guest undo history is empty.
    #[error("nothing to undo")]
    NothingToUndo,

    /// The guest redo history is empty.
    #[error("nothing to redo")]
    NothingToRedo,

    /// Durable local storage write failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The backend call failed; carries the backend message when present.
    #[error("remote error: {0}")]
    Remote(#[from] ApiError),
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
