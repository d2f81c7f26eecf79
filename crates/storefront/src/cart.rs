//! Cart reconciliation facade.
//!
//! The single entry point for every cart operation in the UI. Each call
//! recomputes the authentication state from storage and routes to the
//! local guest store or the remote backend cart, then normalizes both
//! return shapes into the same view model. Login and logout therefore
//! take effect on the *next* call; an in-flight operation is never
//! migrated.
//!
//! Overlapping calls are not coordinated: no retries, no coalescing,
//! no cancellation - last write wins, exactly like the storage layer.

use std::sync::Arc;

use tracing::instrument;

use pulperia_core::{AddressId, Cart, CurrencyCode, GuestInfo, OrderId, Price, ProductId};

use crate::api::{ApiClient, Backend, RemoteProduct};
use crate::config::StorefrontConfig;
use crate::error::{CartError, Result};
use crate::events::{CartEvent, CartEvents};
use crate::guest::GuestCartStore;
use crate::session::{AuthState, SessionState};
use crate::storage::{FileStore, KeyValueStore};

// =============================================================================
// View models
// =============================================================================

/// One cart line, formatted for display.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    /// Formatted unit price, e.g. "₡1500.00".
    pub unit_price: String,
    /// Formatted line total.
    pub line_total: String,
    pub image_url: Option<String>,
}

/// Cart display data consumed by every summary surface.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSummary {
    pub lines: Vec<CartLineView>,
    /// Total units across all lines.
    pub item_count: u32,
    pub subtotal: Price,
    /// No tax or shipping is modeled: total == subtotal.
    pub total: Price,
    pub formatted_subtotal: String,
    pub formatted_total: String,
    pub is_empty: bool,
}

impl CartSummary {
    /// The canonical empty summary.
    #[must_use]
    pub fn empty() -> Self {
        let zero = Price::zero(CurrencyCode::default());
        Self {
            lines: Vec::new(),
            item_count: 0,
            subtotal: zero,
            total: zero,
            formatted_subtotal: zero.display(),
            formatted_total: zero.display(),
            is_empty: true,
        }
    }
}

impl From<&Cart> for CartSummary {
    fn from(cart: &Cart) -> Self {
        if cart.is_empty() {
            return Self::empty();
        }
        let subtotal = cart.total();
        Self {
            lines: cart
                .items
                .iter()
                .map(|item| CartLineView {
                    product_id: item.product_id.clone(),
                    name: item.name.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price.display(),
                    line_total: item.line_total().display(),
                    image_url: item.image_url.clone(),
                })
                .collect(),
            item_count: cart.item_count(),
            subtotal,
            total: subtotal,
            formatted_subtotal: subtotal.display(),
            formatted_total: subtotal.display(),
            is_empty: false,
        }
    }
}

/// Normalized order confirmation returned by checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub total: Price,
    pub formatted_total: String,
    pub item_count: u32,
}

// =============================================================================
// CartService
// =============================================================================

/// The cart facade: one service instance, constructed by the
/// application root and injected into the UI layer.
#[derive(Clone)]
pub struct CartService<B: Backend> {
    backend: B,
    guest: GuestCartStore,
    session: SessionState,
    events: CartEvents,
}

impl CartService<ApiClient> {
    /// Build the production service from configuration: file-backed
    /// storage, reqwest backend, fresh event channel.
    ///
    /// # Errors
    ///
    /// Returns an error when the storage directory cannot be created or
    /// the HTTP client fails to build.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.storage_dir)?);
        let backend = ApiClient::new(config)?;
        Ok(Self::new(backend, store, config.history_depth))
    }
}

impl<B: Backend> CartService<B> {
    /// Assemble a service from its collaborators.
    #[must_use]
    pub fn new(backend: B, store: Arc<dyn KeyValueStore>, history_depth: usize) -> Self {
        let events = CartEvents::new();
        let guest = GuestCartStore::new(store.clone(), events.clone(), history_depth);
        let session = SessionState::new(store);
        Self {
            backend,
            guest,
            session,
            events,
        }
    }

    /// The cart-change event channel (subscribe for badge refreshes).
    #[must_use]
    pub const fn events(&self) -> &CartEvents {
        &self.events
    }

    /// Direct access to the guest store (checkout forms use the guest
    /// info CRUD without going through the facade).
    #[must_use]
    pub const fn guest(&self) -> &GuestCartStore {
        &self.guest
    }

    /// The session reader.
    #[must_use]
    pub const fn session(&self) -> &SessionState {
        &self.session
    }

    /// Add a quantity of a product to the current cart.
    ///
    /// Product data (price, stock, name, image) is always fetched fresh
    /// from the catalog - a client-side price is never trusted for an
    /// addition.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity`, `InsufficientStock`, remote and storage errors.
    #[instrument(skip(self), fields(product_id = %product_id, quantity))]
    pub async fn add_to_cart(&self, product_id: ProductId, quantity: u32) -> Result<Cart> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let product = self.checked_product(&product_id, quantity).await?;

        match self.session.auth_state() {
            AuthState::Authenticated { token } => {
                self.backend.add_item(&token, &product_id, quantity).await?;
                // Re-fetch rather than guessing: the server cart is truth.
                let cart = self.backend.cart(&token).await?;
                self.publish_updated(&cart);
                Ok(cart)
            }
            AuthState::Guest => self.guest.add_item(product_id, quantity, &product.snapshot()),
        }
    }

    /// Set the quantity of an existing cart line.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity`, `InsufficientStock`, `ItemNotFound`, remote
    /// and storage errors.
    #[instrument(skip(self), fields(product_id = %product_id, quantity))]
    pub async fn update_cart_item(&self, product_id: ProductId, quantity: u32) -> Result<Cart> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        self.checked_product(&product_id, quantity).await?;

        match self.session.auth_state() {
            AuthState::Authenticated { token } => {
                self.backend
                    .update_item(&token, &product_id, quantity)
                    .await?;
                let cart = self.backend.cart(&token).await?;
                self.publish_updated(&cart);
                Ok(cart)
            }
            AuthState::Guest => self.guest.update_quantity(&product_id, quantity),
        }
    }

    /// Remove a line from the current cart.
    ///
    /// # Errors
    ///
    /// `ItemNotFound` (guest path; the backend reports its own),
    /// remote and storage errors.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_cart(&self, product_id: ProductId) -> Result<Cart> {
        match self.session.auth_state() {
            AuthState::Authenticated { token } => {
                self.backend.remove_item(&token, &product_id).await?;
                let cart = self.backend.cart(&token).await?;
                self.publish_updated(&cart);
                Ok(cart)
            }
            AuthState::Guest => self.guest.remove_item(&product_id),
        }
    }

    /// The current cart, as a display summary.
    ///
    /// # Errors
    ///
    /// Remote errors on the authenticated path.
    #[instrument(skip(self))]
    pub async fn cart_summary(&self) -> Result<CartSummary> {
        let cart = self.current_cart().await?;
        Ok(CartSummary::from(&cart))
    }

    /// Finalize the current cart into an order.
    ///
    /// Stock is re-validated against the catalog for every line
    /// immediately before committing - a best-effort guard against
    /// stock changes since the items were added, not a transaction.
    ///
    /// # Errors
    ///
    /// `EmptyCart`, `InsufficientStock`, `AddressRequired` (authenticated),
    /// `GuestInfoRequired` (guest), remote and storage errors.
    #[instrument(skip(self, guest_info))]
    pub async fn complete_purchase(
        &self,
        address_id: Option<AddressId>,
        guest_info: Option<GuestInfo>,
    ) -> Result<OrderConfirmation> {
        let state = self.session.auth_state();
        let cart = match &state {
            AuthState::Authenticated { token } => self.backend.cart(token).await?,
            AuthState::Guest => self.guest.cart(),
        };
        if cart.is_empty() {
            return Err(CartError::EmptyCart);
        }

        let total = cart.total();
        let item_count = cart.item_count();

        // Required checkout fields are validated before the stock loop:
        // a missing address or incomplete guest data must fail without
        // touching the product service.
        match state {
            AuthState::Authenticated { token } => {
                let address = address_id.ok_or(CartError::AddressRequired)?;
                self.revalidate_stock(&cart).await?;

                let order_id = self.backend.finalize_order(&token, &address).await?;
                // The backend clears its cart on finalize.
                self.events.publish(CartEvent::Cleared);
                Ok(OrderConfirmation {
                    order_id,
                    total,
                    formatted_total: total.display(),
                    item_count,
                })
            }
            AuthState::Guest => {
                let info = guest_info
                    .or_else(|| self.guest.guest_info())
                    .ok_or_else(|| CartError::GuestInfoRequired("no guest data".to_string()))?;
                info.validate()
                    .map_err(|e| CartError::GuestInfoRequired(e.to_string()))?;
                self.revalidate_stock(&cart).await?;

                let order_id = self
                    .backend
                    .finalize_guest_order(&info, &cart.items)
                    .await?;
                self.guest.clear()?;
                self.guest.clear_guest_info()?;
                Ok(OrderConfirmation {
                    order_id,
                    total,
                    formatted_total: total.display(),
                    item_count,
                })
            }
        }
    }

    /// Step the cart history back.
    ///
    /// # Errors
    ///
    /// `NothingToUndo` (guest path), remote errors.
    #[instrument(skip(self))]
    pub async fn undo_cart(&self) -> Result<Cart> {
        match self.session.auth_state() {
            AuthState::Authenticated { token } => {
                self.backend.undo(&token).await?;
                let cart = self.backend.cart(&token).await?;
                self.publish_updated(&cart);
                Ok(cart)
            }
            AuthState::Guest => {
                let cart = self.guest.undo()?;
                Ok(cart)
            }
        }
    }

    /// Step the cart history forward.
    ///
    /// # Errors
    ///
    /// `NothingToRedo` (guest path), remote errors.
    #[instrument(skip(self))]
    pub async fn redo_cart(&self) -> Result<Cart> {
        match self.session.auth_state() {
            AuthState::Authenticated { token } => {
                self.backend.redo(&token).await?;
                let cart = self.backend.cart(&token).await?;
                self.publish_updated(&cart);
                Ok(cart)
            }
            AuthState::Guest => {
                let cart = self.guest.redo()?;
                Ok(cart)
            }
        }
    }

    /// Drop the local guest cart and its history.
    ///
    /// Login flows call this when the user chooses to continue with
    /// their account cart; guest carts are never merged implicitly.
    ///
    /// # Errors
    ///
    /// Storage delete failures.
    pub fn discard_guest_cart(&self) -> Result<()> {
        self.guest.clear()?;
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn current_cart(&self) -> Result<Cart> {
        match self.session.auth_state() {
            AuthState::Authenticated { token } => Ok(self.backend.cart(&token).await?),
            AuthState::Guest => Ok(self.guest.cart()),
        }
    }

    /// Fetch the authoritative product and validate stock for the
    /// requested quantity.
    async fn checked_product(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<RemoteProduct> {
        let product = self.backend.product(product_id).await?;
        if quantity > product.stock {
            return Err(CartError::InsufficientStock {
                available: product.stock,
            });
        }
        Ok(product)
    }

    /// Re-check every cart line against live stock before finalizing.
    async fn revalidate_stock(&self, cart: &Cart) -> Result<()> {
        for item in &cart.items {
            self.checked_product(&item.product_id, item.quantity).await?;
        }
        Ok(())
    }

    fn publish_updated(&self, cart: &Cart) {
        self.events.publish(CartEvent::Updated {
            item_count: cart.item_count(),
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pulperia_core::{CartItem, ProductSnapshot};

    fn cart_with(quantity: u32, price: &str) -> Cart {
        let mut cart = Cart::empty();
        cart.merge_add(
            ProductId::new("1"),
            quantity,
            &ProductSnapshot {
                name: "Café".to_string(),
                unit_price: Price::new(price.parse().unwrap(), CurrencyCode::CRC),
                image_url: None,
            },
        );
        cart
    }

    #[test]
    fn test_summary_from_empty_cart_is_canonical() {
        let summary = CartSummary::from(&Cart::empty());
        assert_eq!(summary, CartSummary::empty());
        assert!(summary.is_empty);
        assert_eq!(summary.formatted_total, "₡0.00");
    }

    #[test]
    fn test_summary_formats_lines_and_totals() {
        let summary = CartSummary::from(&cart_with(3, "1000"));
        assert!(!summary.is_empty);
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.lines.len(), 1);
        let line = summary.lines.first().unwrap();
        assert_eq!(line.unit_price, "₡1000.00");
        assert_eq!(line.line_total, "₡3000.00");
        assert_eq!(summary.formatted_subtotal, "₡3000.00");
        // No tax or shipping: total equals subtotal.
        assert_eq!(summary.total, summary.subtotal);
    }

    #[test]
    fn test_line_view_carries_item_fields() {
        let mut cart = cart_with(1, "500");
        cart.items.first_mut().unwrap().image_url = Some("https://img/x.jpg".to_string());
        let summary = CartSummary::from(&cart);
        let line = summary.lines.first().unwrap();
        assert_eq!(line.name, "Café");
        assert_eq!(line.image_url.as_deref(), Some("https://img/x.jpg"));
    }

    #[test]
    fn test_summary_multiple_lines_subtotal() {
        let mut cart = cart_with(2, "1000");
        cart.merge_add(
            ProductId::new("2"),
            1,
            &ProductSnapshot {
                name: "Arroz".to_string(),
                unit_price: Price::new("750.50".parse().unwrap(), CurrencyCode::CRC),
                image_url: None,
            },
        );
        let summary = CartSummary::from(&cart);
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.formatted_total, "₡2750.50");
    }

    #[test]
    fn test_cart_item_line_total_consistency() {
        let item = CartItem {
            product_id: ProductId::new("9"),
            name: "Frijoles".to_string(),
            quantity: 4,
            unit_price: Price::new("325.25".parse().unwrap(), CurrencyCode::CRC),
            image_url: None,
        };
        assert_eq!(item.line_total().display(), "₡1301.00");
    }
}
