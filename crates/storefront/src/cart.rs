//! Shopping cart state container.
//!
//! The cart is owned client-side: the backend never sees it until the
//! customer submits an order. Lines with the same service and dimensions are
//! merged (quantity accumulates); every mutation after the initial hydration
//! re-serializes the full line list through [`StateStorage`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use agah_core::{CartLineId, ServiceId};

use crate::storage::{StateStorage, keys};

/// One configured line in the cart.
///
/// Field names match the backend's order-item wire format so a cart line can
/// be submitted as-is when the order is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Locally generated line identifier.
    #[serde(rename = "cart_item_id")]
    pub id: CartLineId,
    /// The fabrication service being ordered.
    pub service: ServiceId,
    /// Free-text description of the piece.
    pub description: String,
    /// Number of identical pieces. Always >= 1; a line whose quantity would
    /// drop to 0 is deleted instead.
    pub quantity: u32,
    /// Piece length in the shop's working unit.
    #[serde(rename = "length_dimensions")]
    pub length: Option<Decimal>,
    /// Piece width.
    #[serde(rename = "width_dimensions")]
    pub width: Option<Decimal>,
    /// Piece height.
    #[serde(rename = "height_dimensions")]
    pub height: Option<Decimal>,
    /// Whether the shop must produce the design.
    pub needs_custom_design: bool,
    /// Opaque reference to an uploaded design file, if any.
    pub design_file: Option<String>,
    /// Quoted price per piece, when the service has one.
    pub estimated_unit_price: Option<Decimal>,
}

impl CartItem {
    /// Merge identity: two lines with the same service and dimensions are
    /// the same line for cart purposes.
    fn merge_key(&self) -> MergeKey {
        (self.service, self.length, self.width, self.height)
    }

    /// Line subtotal. A missing price contributes zero.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.estimated_unit_price.unwrap_or(Decimal::ZERO) * Decimal::from(self.quantity)
    }
}

type MergeKey = (ServiceId, Option<Decimal>, Option<Decimal>, Option<Decimal>);

/// Input for [`Cart::add`]: a configured line without an identifier.
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub service: ServiceId,
    pub description: String,
    pub quantity: u32,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
    pub needs_custom_design: bool,
    pub design_file: Option<String>,
    pub estimated_unit_price: Option<Decimal>,
}

impl NewCartItem {
    fn into_item(self) -> CartItem {
        CartItem {
            id: CartLineId::generate(),
            service: self.service,
            description: self.description,
            quantity: self.quantity,
            length: self.length,
            width: self.width,
            height: self.height,
            needs_custom_design: self.needs_custom_design,
            design_file: self.design_file,
            estimated_unit_price: self.estimated_unit_price,
        }
    }

    fn merge_key(&self) -> MergeKey {
        (self.service, self.length, self.width, self.height)
    }
}

/// Ordered list of cart lines with merge-by-key semantics.
///
/// Pure state: persistence lives in [`CartStore`]. Quantity and dimension
/// range validation is the form layer's job; the cart only enforces the
/// "quantity >= 1" invariant by deleting lines instead of storing zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Add a line, merging into an existing one when the service and all
    /// three dimensions match. Returns the ID of the affected line.
    pub fn add(&mut self, new: NewCartItem) -> CartLineId {
        let key = new.merge_key();
        if let Some(existing) = self.items.iter_mut().find(|item| item.merge_key() == key) {
            existing.quantity = existing.quantity.saturating_add(new.quantity);
            return existing.id;
        }

        let item = new.into_item();
        let id = item.id;
        self.items.push(item);
        id
    }

    /// Remove a line unconditionally. Unknown IDs are a no-op.
    pub fn remove(&mut self, id: CartLineId) {
        self.items.retain(|item| item.id != id);
    }

    /// Replace a line's quantity. Zero deletes the line.
    pub fn set_quantity(&mut self, id: CartLineId, quantity: u32) {
        if quantity == 0 {
            self.remove(id);
            return;
        }

        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.quantity = quantity;
        }
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of `unit price x quantity` over all lines; unpriced lines
    /// contribute zero.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Sum of quantities over all lines, saturating at `u32::MAX`.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |acc, item| acc.saturating_add(item.quantity))
    }

    /// The lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Persisted snapshot format.
///
/// The revision counter lets fragment endpoints detect writes based on a
/// state they no longer hold (a stale response arriving after a newer one).
#[derive(Debug, Serialize, Deserialize)]
struct CartSnapshot {
    revision: u64,
    items: Vec<CartItem>,
}

/// Cart container bound to a persistence backend.
///
/// Hydrates once on open; every mutation bumps the revision and
/// re-serializes the full line list. A corrupted snapshot hydrates as an
/// empty cart rather than failing the request.
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
    cart: Cart,
    revision: u64,
}

impl<S: StateStorage> CartStore<S> {
    /// Open the cart, hydrating from storage.
    pub async fn open(storage: S) -> Self {
        let (cart, revision) = match storage.load(keys::CART).await {
            Some(raw) => match serde_json::from_str::<CartSnapshot>(&raw) {
                Ok(snapshot) => (
                    Cart {
                        items: snapshot.items,
                    },
                    snapshot.revision,
                ),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding corrupted cart snapshot");
                    (Cart::default(), 0)
                }
            },
            None => (Cart::default(), 0),
        };

        Self {
            storage,
            cart,
            revision,
        }
    }

    /// Add a line and persist. Returns the affected line's ID.
    #[instrument(skip(self, item), fields(service = %item.service))]
    pub async fn add(&mut self, item: NewCartItem) -> CartLineId {
        let id = self.cart.add(item);
        self.persist().await;
        id
    }

    /// Remove a line and persist.
    pub async fn remove(&mut self, id: CartLineId) {
        self.cart.remove(id);
        self.persist().await;
    }

    /// Set a line's quantity (zero removes) and persist.
    pub async fn set_quantity(&mut self, id: CartLineId, quantity: u32) {
        self.cart.set_quantity(id, quantity);
        self.persist().await;
    }

    /// Empty the cart and delete the persisted snapshot.
    pub async fn clear(&mut self) {
        self.cart.clear();
        self.revision += 1;
        self.storage.remove(keys::CART).await;
    }

    /// The current cart state.
    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Monotonic revision, bumped on every mutation.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    async fn persist(&mut self) {
        self.revision += 1;
        let snapshot = CartSnapshot {
            revision: self.revision,
            items: self.cart.items.clone(),
        };
        match serde_json::to_string(&snapshot) {
            Ok(raw) => self.storage.save(keys::CART, raw).await,
            Err(e) => tracing::error!(error = %e, "failed to serialize cart snapshot"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn line(service: i32, dims: (i64, i64, i64), quantity: u32) -> NewCartItem {
        NewCartItem {
            service: ServiceId::new(service),
            description: "bracket".to_owned(),
            quantity,
            length: Some(Decimal::from(dims.0)),
            width: Some(Decimal::from(dims.1)),
            height: Some(Decimal::from(dims.2)),
            needs_custom_design: false,
            design_file: None,
            estimated_unit_price: None,
        }
    }

    #[test]
    fn test_add_merges_matching_lines() {
        let mut cart = Cart::default();
        let first = cart.add(line(1, (10, 5, 2), 2));
        let second = cart.add(line(1, (10, 5, 2), 3));

        assert_eq!(first, second);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.count(), 5);
    }

    #[test]
    fn test_add_distinct_dimensions_appends() {
        let mut cart = Cart::default();
        cart.add(line(1, (10, 5, 2), 1));
        cart.add(line(1, (10, 5, 3), 1));
        cart.add(line(2, (10, 5, 2), 1));

        assert_eq!(cart.items().len(), 3);
    }

    #[test]
    fn test_merge_saturates_quantity() {
        let mut cart = Cart::default();
        cart.add(line(1, (10, 5, 2), u32::MAX - 1));
        cart.add(line(1, (10, 5, 2), 5));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, u32::MAX);
        assert_eq!(cart.count(), u32::MAX);
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = Cart::default();
        let id = cart.add(line(1, (10, 5, 2), 2));

        cart.set_quantity(id, 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_replaces() {
        let mut cart = Cart::default();
        let id = cart.add(line(1, (10, 5, 2), 2));

        cart.set_quantity(id, 7);
        assert_eq!(cart.items()[0].quantity, 7);
        assert_eq!(cart.count(), 7);
    }

    #[test]
    fn test_total_treats_missing_price_as_zero() {
        let mut cart = Cart::default();
        let mut priced = line(1, (10, 5, 2), 3);
        priced.estimated_unit_price = Some(Decimal::new(250, 2)); // 2.50
        cart.add(priced);
        cart.add(line(2, (1, 1, 1), 4)); // no price

        assert_eq!(cart.total(), Decimal::new(750, 2));
    }

    #[tokio::test]
    async fn test_store_persists_on_every_mutation() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage.clone()).await;

        let id = store.add(line(1, (10, 5, 2), 2)).await;
        assert!(storage.contains(keys::CART));

        // A fresh store sees the persisted line.
        let reopened = CartStore::open(storage.clone()).await;
        assert_eq!(reopened.cart().count(), 2);

        store.set_quantity(id, 5).await;
        let reopened = CartStore::open(storage.clone()).await;
        assert_eq!(reopened.cart().count(), 5);
    }

    #[tokio::test]
    async fn test_clear_removes_snapshot() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage.clone()).await;
        store.add(line(1, (10, 5, 2), 2)).await;

        store.clear().await;
        assert!(store.cart().is_empty());
        assert!(!storage.contains(keys::CART));
    }

    #[tokio::test]
    async fn test_corrupted_snapshot_hydrates_empty() {
        let storage = MemoryStorage::new();
        storage.save(keys::CART, "not json".to_owned()).await;

        let store = CartStore::open(storage).await;
        assert!(store.cart().is_empty());
    }

    #[tokio::test]
    async fn test_revision_bumps_on_mutation() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage).await;
        let before = store.revision();

        let id = store.add(line(1, (10, 5, 2), 1)).await;
        store.set_quantity(id, 3).await;

        assert_eq!(store.revision(), before + 2);
    }
}
