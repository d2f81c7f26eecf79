//! Durable anonymous cart store.
//!
//! The guest cart lives entirely in local storage under well-known
//! keys: the cart record itself, a bounded undo/redo snapshot history,
//! and (during checkout only) the guest's contact data. All operations
//! are synchronous read-modify-write over the [`KeyValueStore`];
//! concurrent writers race with last-write-wins semantics.
//!
//! Validation happens before any write, and the cart record is always
//! written before its history snapshot: a failed mutation never leaves
//! an undo entry for a cart state that was not stored.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use pulperia_core::{Cart, CartItem, GuestInfo, ProductId, ProductSnapshot};

use crate::error::{CartError, Result};
use crate::events::{CartEvent, CartEvents};
use crate::storage::{KeyValueStore, keys, read_json, write_json};

/// Persisted cart record, in the backend's wire shape: the aggregates
/// are stored for display-only readers but recomputed on every load.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCart {
    items: Vec<CartItem>,
    total: Decimal,
    cantidad_items: u32,
}

impl From<&Cart> for StoredCart {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items.clone(),
            total: cart.total().amount,
            cantidad_items: cart.item_count(),
        }
    }
}

/// Persisted undo/redo snapshot stacks.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredHistory {
    undo: Vec<Cart>,
    redo: Vec<Cart>,
}

/// Durable client-side store for the anonymous cart.
#[derive(Clone)]
pub struct GuestCartStore {
    store: Arc<dyn KeyValueStore>,
    events: CartEvents,
    history_depth: usize,
}

impl GuestCartStore {
    /// Create a store over the given storage and event channel.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, events: CartEvents, history_depth: usize) -> Self {
        Self {
            store,
            events,
            history_depth,
        }
    }

    /// The current cart. Absent or corrupt stored data reads as empty.
    #[must_use]
    pub fn cart(&self) -> Cart {
        read_json::<StoredCart>(self.store.as_ref(), keys::GUEST_CART)
            .map_or_else(Cart::empty, |stored| Cart {
                items: stored.items,
            })
    }

    /// Add a quantity of a product, merging into an existing line.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` for a zero quantity; storage write failures.
    #[instrument(skip(self, snapshot), fields(product_id = %product_id, quantity))]
    pub fn add_item(
        &self,
        product_id: ProductId,
        quantity: u32,
        snapshot: &ProductSnapshot,
    ) -> Result<Cart> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let mut cart = self.cart();
        let previous = cart.clone();
        cart.merge_add(product_id, quantity, snapshot);
        self.persist(&cart)?;
        self.push_history(&previous)?;
        Ok(cart)
    }

    /// Set the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` for zero (use [`Self::remove_item`]),
    /// `ItemNotFound` for an unknown product. Stored state is untouched
    /// on failure.
    #[instrument(skip(self), fields(product_id = %product_id, quantity))]
    pub fn update_quantity(&self, product_id: &ProductId, quantity: u32) -> Result<Cart> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let mut cart = self.cart();
        if cart.find(product_id).is_none() {
            return Err(CartError::ItemNotFound(product_id.clone()));
        }
        let previous = cart.clone();
        cart.set_quantity(product_id, quantity);
        self.persist(&cart)?;
        self.push_history(&previous)?;
        Ok(cart)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// `ItemNotFound` for an unknown product; stored state is untouched.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn remove_item(&self, product_id: &ProductId) -> Result<Cart> {
        let mut cart = self.cart();
        if cart.find(product_id).is_none() {
            return Err(CartError::ItemNotFound(product_id.clone()));
        }
        let previous = cart.clone();
        cart.remove(product_id);
        self.persist(&cart)?;
        self.push_history(&previous)?;
        Ok(cart)
    }

    /// Delete the stored cart and its history.
    ///
    /// # Errors
    ///
    /// Storage delete failures.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<Cart> {
        self.store.remove(keys::GUEST_CART)?;
        self.store.remove(keys::GUEST_CART_HISTORY)?;
        self.events.publish(CartEvent::Cleared);
        Ok(Cart::empty())
    }

    /// Restore the cart to the previous snapshot.
    ///
    /// # Errors
    ///
    /// `NothingToUndo` when the history is exhausted.
    #[instrument(skip(self))]
    pub fn undo(&self) -> Result<Cart> {
        let mut history = self.history();
        let Some(previous) = history.undo.pop() else {
            return Err(CartError::NothingToUndo);
        };
        history.redo.push(self.cart());
        self.persist(&previous)?;
        write_json(self.store.as_ref(), keys::GUEST_CART_HISTORY, &history)?;
        Ok(previous)
    }

    /// Re-apply the most recently undone snapshot.
    ///
    /// # Errors
    ///
    /// `NothingToRedo` when nothing has been undone.
    #[instrument(skip(self))]
    pub fn redo(&self) -> Result<Cart> {
        let mut history = self.history();
        let Some(next) = history.redo.pop() else {
            return Err(CartError::NothingToRedo);
        };
        history.undo.push(self.cart());
        self.persist(&next)?;
        write_json(self.store.as_ref(), keys::GUEST_CART_HISTORY, &history)?;
        Ok(next)
    }

    // =========================================================================
    // Guest checkout data
    // =========================================================================

    /// Persist guest checkout contact data.
    ///
    /// # Errors
    ///
    /// Storage write failures.
    pub fn save_guest_info(&self, info: &GuestInfo) -> Result<()> {
        write_json(self.store.as_ref(), keys::GUEST_INFO, info)?;
        Ok(())
    }

    /// The stored guest checkout data, if any.
    #[must_use]
    pub fn guest_info(&self) -> Option<GuestInfo> {
        read_json(self.store.as_ref(), keys::GUEST_INFO)
    }

    /// Delete the stored guest checkout data.
    ///
    /// # Errors
    ///
    /// Storage delete failures.
    pub fn clear_guest_info(&self) -> Result<()> {
        self.store.remove(keys::GUEST_INFO)?;
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Write the cart and notify subscribers.
    fn persist(&self, cart: &Cart) -> Result<()> {
        write_json(self.store.as_ref(), keys::GUEST_CART, &StoredCart::from(cart))?;
        self.events.publish(CartEvent::Updated {
            item_count: cart.item_count(),
        });
        Ok(())
    }

    fn history(&self) -> StoredHistory {
        read_json(self.store.as_ref(), keys::GUEST_CART_HISTORY).unwrap_or_default()
    }

    /// Push the pre-mutation snapshot onto the undo stack; a new
    /// mutation invalidates any redo entries.
    fn push_history(&self, cart: &Cart) -> Result<()> {
        let mut history = self.history();
        history.undo.push(cart.clone());
        if history.undo.len() > self.history_depth {
            let excess = history.undo.len() - self.history_depth;
            history.undo.drain(..excess);
            debug!(excess, "Dropped oldest cart history snapshots");
        }
        history.redo.clear();
        write_json(self.store.as_ref(), keys::GUEST_CART_HISTORY, &history)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::storage::{MemoryStore, StorageError};
    use pulperia_core::{CurrencyCode, Price};

    fn snapshot(name: &str, price: &str) -> ProductSnapshot {
        ProductSnapshot {
            name: name.to_string(),
            unit_price: Price::new(price.parse().unwrap(), CurrencyCode::CRC),
            image_url: None,
        }
    }

    fn store() -> (GuestCartStore, Arc<MemoryStore>) {
        let storage = Arc::new(MemoryStore::new());
        let guest = GuestCartStore::new(storage.clone(), CartEvents::new(), 10);
        (guest, storage)
    }

    #[test]
    fn test_empty_when_nothing_stored() {
        let (guest, _) = store();
        let cart = guest.cart();
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert!(cart.total().is_zero());
    }

    #[test]
    fn test_corrupt_stored_cart_reads_as_empty() {
        let (guest, storage) = store();
        storage.set(keys::GUEST_CART, "{{{corrupt").unwrap();
        assert!(guest.cart().is_empty());
    }

    #[test]
    fn test_add_same_product_merges() {
        let (guest, _) = store();
        let id = ProductId::new("A");
        guest.add_item(id.clone(), 1, &snapshot("Café", "1000")).unwrap();
        let cart = guest.add_item(id.clone(), 2, &snapshot("Café", "1000")).unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.find(&id).unwrap().quantity, 3);
        assert_eq!(cart.total().display(), "₡3000.00");
    }

    #[test]
    fn test_add_zero_quantity_rejected() {
        let (guest, _) = store();
        let err = guest
            .add_item(ProductId::new("A"), 0, &snapshot("Café", "1000"))
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity(0)));
        assert!(guest.cart().is_empty());
    }

    #[test]
    fn test_update_quantity_zero_rejected_without_mutation() {
        let (guest, _) = store();
        let id = ProductId::new("B");
        guest.add_item(id.clone(), 1, &snapshot("Arroz", "800")).unwrap();

        let err = guest.update_quantity(&id, 0).unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity(0)));
        assert_eq!(guest.cart().find(&id).unwrap().quantity, 1);
    }

    #[test]
    fn test_update_unknown_product_rejected_without_mutation() {
        let (guest, _) = store();
        guest
            .add_item(ProductId::new("B"), 1, &snapshot("Arroz", "800"))
            .unwrap();

        let err = guest.update_quantity(&ProductId::new("missing"), 2).unwrap_err();
        assert!(matches!(err, CartError::ItemNotFound(_)));
        assert_eq!(guest.cart().item_count(), 1);
    }

    #[test]
    fn test_remove_unknown_product_rejected() {
        let (guest, _) = store();
        let err = guest.remove_item(&ProductId::new("missing")).unwrap_err();
        assert!(matches!(err, CartError::ItemNotFound(_)));
    }

    #[test]
    fn test_clear_then_get_is_canonical_empty() {
        let (guest, _) = store();
        guest
            .add_item(ProductId::new("A"), 2, &snapshot("Café", "1000"))
            .unwrap();
        guest.clear().unwrap();

        let cart = guest.cart();
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert!(cart.total().is_zero());
    }

    #[test]
    fn test_cart_persists_across_store_instances() {
        let storage = Arc::new(MemoryStore::new());
        let events = CartEvents::new();
        let first = GuestCartStore::new(storage.clone(), events.clone(), 10);
        first
            .add_item(ProductId::new("A"), 2, &snapshot("Café", "1250.50"))
            .unwrap();

        // A fresh store over the same storage sees the same cart.
        let second = GuestCartStore::new(storage, events, 10);
        let cart = second.cart();
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total().display(), "₡2501.00");
    }

    #[test]
    fn test_stored_record_uses_wire_field_names() {
        let (guest, storage) = store();
        guest
            .add_item(ProductId::new("A"), 2, &snapshot("Café", "1000"))
            .unwrap();

        let raw = storage.get(keys::GUEST_CART).unwrap();
        assert!(raw.contains("\"cantidadItems\":2"));
        assert!(raw.contains("\"total\":"));
    }

    #[test]
    fn test_mutations_publish_events() {
        let storage = Arc::new(MemoryStore::new());
        let events = CartEvents::new();
        let mut rx = events.subscribe();
        let guest = GuestCartStore::new(storage, events, 10);

        guest
            .add_item(ProductId::new("A"), 2, &snapshot("Café", "1000"))
            .unwrap();
        assert_eq!(rx.try_recv().unwrap(), CartEvent::Updated { item_count: 2 });

        guest.clear().unwrap();
        assert_eq!(rx.try_recv().unwrap(), CartEvent::Cleared);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let (guest, _) = store();
        let id = ProductId::new("A");
        guest.add_item(id.clone(), 1, &snapshot("Café", "1000")).unwrap();
        guest.add_item(id.clone(), 2, &snapshot("Café", "1000")).unwrap();
        assert_eq!(guest.cart().item_count(), 3);

        let cart = guest.undo().unwrap();
        assert_eq!(cart.item_count(), 1);

        let cart = guest.undo().unwrap();
        assert!(cart.is_empty());
        assert!(matches!(guest.undo().unwrap_err(), CartError::NothingToUndo));

        let cart = guest.redo().unwrap();
        assert_eq!(cart.item_count(), 1);
        let cart = guest.redo().unwrap();
        assert_eq!(cart.item_count(), 3);
        assert!(matches!(guest.redo().unwrap_err(), CartError::NothingToRedo));
    }

    #[test]
    fn test_new_mutation_clears_redo() {
        let (guest, _) = store();
        let id = ProductId::new("A");
        guest.add_item(id.clone(), 1, &snapshot("Café", "1000")).unwrap();
        guest.undo().unwrap();

        guest
            .add_item(ProductId::new("B"), 1, &snapshot("Arroz", "800"))
            .unwrap();
        assert!(matches!(guest.redo().unwrap_err(), CartError::NothingToRedo));
    }

    /// Storage that can be told to reject writes to a single key.
    struct RejectingStore {
        inner: MemoryStore,
        reject_key: &'static str,
        rejecting: AtomicBool,
    }

    impl RejectingStore {
        fn new(reject_key: &'static str) -> Self {
            Self {
                inner: MemoryStore::new(),
                reject_key,
                rejecting: AtomicBool::new(false),
            }
        }

        fn set_rejecting(&self, rejecting: bool) {
            self.rejecting.store(rejecting, Ordering::SeqCst);
        }
    }

    impl KeyValueStore for RejectingStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
            if key == self.reject_key && self.rejecting.load(Ordering::SeqCst) {
                return Err(StorageError::Io(std::io::Error::other("write rejected")));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> std::result::Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_failed_cart_write_leaves_history_untouched() {
        let storage = Arc::new(RejectingStore::new(keys::GUEST_CART));
        let guest = GuestCartStore::new(storage.clone(), CartEvents::new(), 10);
        let id = ProductId::new("A");
        guest.add_item(id.clone(), 1, &snapshot("Café", "1000")).unwrap();

        storage.set_rejecting(true);
        let err = guest.add_item(id.clone(), 2, &snapshot("Café", "1000")).unwrap_err();
        assert!(matches!(err, CartError::Storage(_)));
        storage.set_rejecting(false);

        // The failed mutation left no snapshot behind: one undo steps
        // back to the empty cart, and nothing remains after that.
        assert_eq!(guest.cart().item_count(), 1);
        assert!(guest.undo().unwrap().is_empty());
        assert!(matches!(guest.undo().unwrap_err(), CartError::NothingToUndo));
    }

    #[test]
    fn test_history_is_bounded() {
        let storage = Arc::new(MemoryStore::new());
        let guest = GuestCartStore::new(storage, CartEvents::new(), 3);
        let id = ProductId::new("A");
        for _ in 0..6 {
            guest.add_item(id.clone(), 1, &snapshot("Café", "1000")).unwrap();
        }

        let mut undos = 0;
        while guest.undo().is_ok() {
            undos += 1;
        }
        assert_eq!(undos, 3);
    }

    #[test]
    fn test_guest_info_lifecycle() {
        let (guest, _) = store();
        assert!(guest.guest_info().is_none());

        let info = GuestInfo {
            email: "ana@example.com".to_string(),
            nombre: "Ana".to_string(),
            ..GuestInfo::default()
        };
        guest.save_guest_info(&info).unwrap();
        assert_eq!(guest.guest_info().unwrap().email, "ana@example.com");

        guest.clear_guest_info().unwrap();
        assert!(guest.guest_info().is_none());

        // Guest info lifecycle is independent from the cart.
        guest
            .add_item(ProductId::new("A"), 1, &snapshot("Café", "1000"))
            .unwrap();
        guest.save_guest_info(&info).unwrap();
        guest.clear().unwrap();
        assert!(guest.guest_info().is_some());
    }
}
