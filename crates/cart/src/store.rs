//! The cart store.
//!
//! `CartStore` owns the line items and the collaborators that observe them.
//! It is a cheap `Arc` handle: clones share one cart. Mutations are
//! synchronous and hold the item lock only for the duration of the change
//! plus the storage write; the lock is never held across an `.await`.
//!
//! # Reconciliation
//!
//! [`CartStore::refresh_cart`] snapshots the items, releases the lock, awaits
//! the pricing service, and then replaces the whole collection with what the
//! service returned. Mutations that land while the request is in flight are
//! overwritten. Two overlapping refreshes each apply on completion, so the one
//! that finishes last wins.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use strand_core::{Product, ProductId, VariantOption};
use tracing::instrument;

use crate::Selection;
use crate::analytics::{CartEvent, Tracker, TrackingEvent, TracingTracker};
use crate::error::Result;
use crate::identity::selection_key;
use crate::line_item::CartLineItem;
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::pricing::{missing_variant_types, resolve_price};
use crate::reconcile::{PricingService, ReconcileError, ReconcileLine};
use crate::storage::{CartStorage, MemoryStorage, StorageError, decode_items, encode_items};

const DEFAULT_RECONCILE_TIMEOUT: Duration = Duration::from_secs(5);

/// Parameters for [`CartStore::add_to_cart`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddToCart {
    pub quantity: u32,
    pub selection: Selection,
    /// Reject the add unless every declared variant type has a selection.
    pub require_full_selection: bool,
}

impl Default for AddToCart {
    fn default() -> Self {
        Self {
            quantity: 1,
            selection: Selection::new(),
            require_full_selection: false,
        }
    }
}

impl AddToCart {
    /// One unit, no selection, partial selections allowed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    #[must_use]
    pub fn select(mut self, variant_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.selection.insert(variant_type.into(), value.into());
        self
    }

    #[must_use]
    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    #[must_use]
    pub const fn require_full_selection(mut self) -> Self {
        self.require_full_selection = true;
        self
    }
}

/// Builder for [`CartStore`].
pub struct CartStoreBuilder<P> {
    pricing: P,
    storage: Arc<dyn CartStorage>,
    notifier: Arc<dyn Notifier>,
    tracker: Arc<dyn Tracker>,
    reconcile_timeout: Duration,
}

impl<P> CartStoreBuilder<P> {
    #[must_use]
    pub fn storage(mut self, storage: impl CartStorage + 'static) -> Self {
        self.storage = Arc::new(storage);
        self
    }

    #[must_use]
    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    #[must_use]
    pub fn tracker(mut self, tracker: impl Tracker + 'static) -> Self {
        self.tracker = Arc::new(tracker);
        self
    }

    #[must_use]
    pub const fn reconcile_timeout(mut self, timeout: Duration) -> Self {
        self.reconcile_timeout = timeout;
        self
    }

    /// Rehydrate the cart from storage and build the store.
    ///
    /// Missing, unreadable or malformed stored data yields an empty cart.
    #[must_use]
    pub fn open(self) -> CartStore<P> {
        let items = load_items(self.storage.as_ref());
        tracing::debug!(lines = items.len(), "Cart rehydrated");

        CartStore {
            inner: Arc::new(CartStoreInner {
                items: Mutex::new(items),
                storage: self.storage,
                notifier: self.notifier,
                tracker: self.tracker,
                pricing: self.pricing,
                reconcile_timeout: self.reconcile_timeout,
            }),
        }
    }
}

/// Client-side shopping cart.
pub struct CartStore<P> {
    inner: Arc<CartStoreInner<P>>,
}

struct CartStoreInner<P> {
    items: Mutex<Vec<CartLineItem>>,
    storage: Arc<dyn CartStorage>,
    notifier: Arc<dyn Notifier>,
    tracker: Arc<dyn Tracker>,
    pricing: P,
    reconcile_timeout: Duration,
}

impl<P> Clone for CartStore<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> CartStore<P> {
    /// Start building a store around a pricing service.
    ///
    /// Defaults: in-memory storage, tracing notifier and tracker, 5 second
    /// reconciliation timeout.
    #[must_use]
    pub fn builder(pricing: P) -> CartStoreBuilder<P> {
        CartStoreBuilder {
            pricing,
            storage: Arc::new(MemoryStorage::new()),
            notifier: Arc::new(TracingNotifier),
            tracker: Arc::new(TracingTracker),
            reconcile_timeout: DEFAULT_RECONCILE_TIMEOUT,
        }
    }

    /// Add a configured product to the cart.
    ///
    /// Returns `false` without touching the cart when the quantity is zero or
    /// when a full selection is required and some variant type is missing.
    /// Adding a configuration that is already in the cart only increases its
    /// quantity; its stored price and options are kept.
    #[instrument(skip(self, product, request), fields(product_id = %product.id, quantity = request.quantity))]
    pub fn add_to_cart(&self, product: &Product, request: AddToCart) -> bool {
        if request.quantity == 0 {
            self.inner.notifier.notify(&Notification::validation(
                "Invalid quantity",
                "Quantity must be at least 1",
            ));
            return false;
        }

        if request.require_full_selection && product.has_variants() {
            let missing = missing_variant_types(&product.variants, &request.selection);
            if !missing.is_empty() {
                tracing::debug!(missing = ?missing, "Add rejected: incomplete selection");
                self.inner.notifier.notify(&Notification::validation(
                    "Please select options",
                    format!("Choose {} before adding to cart", missing.join(", ")),
                ));
                return false;
            }
        }

        let key = selection_key(product.id, &request.selection);
        let unit_price = resolve_price(product.price, &product.variants, &request.selection);

        {
            let mut items = self.lock();
            if let Some(existing) = items.iter_mut().find(|item| item.key() == key) {
                existing.quantity = existing.quantity.saturating_add(request.quantity);
                tracing::debug!(%key, quantity = existing.quantity, "Incremented existing line");
            } else {
                items.push(CartLineItem {
                    product: product.snapshot(unit_price),
                    variants: chosen_options(product, &request.selection),
                    selection: request
                        .selection
                        .iter()
                        .map(|(t, v)| (t.clone(), v.clone()))
                        .collect(),
                    quantity: request.quantity,
                    added_at: Utc::now(),
                });
                tracing::debug!(%key, %unit_price, "Added new line");
            }
            self.persist(&items);
        }

        self.inner.notifier.notify(&Notification::success(
            "Added to cart",
            format!("{} x {}", request.quantity, product.name),
        ));
        self.inner.tracker.track(&TrackingEvent {
            event: CartEvent::AddToCart,
            entity_id: Some(product.id.to_string()),
            value: Some(unit_price * Decimal::from(request.quantity)),
            metadata: serde_json::to_value(&request.selection).ok(),
        });

        true
    }

    /// Remove the line matching `(product_id, selection)`, if there is one.
    #[instrument(skip(self, selection))]
    pub fn remove_from_cart(&self, product_id: ProductId, selection: &Selection) {
        let key = selection_key(product_id, selection);
        let mut items = self.lock();
        let before = items.len();
        items.retain(|item| item.key() != key);
        if items.len() != before {
            tracing::debug!(%key, "Removed line");
            self.persist(&items);
        }
    }

    /// Overwrite the quantity of a line; `quantity < 1` removes it.
    #[instrument(skip(self, selection))]
    pub fn update_quantity(&self, product_id: ProductId, quantity: i64, selection: &Selection) {
        if quantity < 1 {
            self.remove_from_cart(product_id, selection);
        } else {
            let key = selection_key(product_id, selection);
            let new_quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
            let mut items = self.lock();
            if let Some(item) = items.iter_mut().find(|item| item.key() == key) {
                item.quantity = new_quantity;
                self.persist(&items);
            }
        }

        self.inner.tracker.track(&TrackingEvent {
            event: CartEvent::UpdateCartQuantity,
            entity_id: Some(product_id.to_string()),
            value: None,
            metadata: Some(serde_json::json!({
                "quantity": quantity,
                "selection": selection,
            })),
        });
    }

    /// Empty the cart.
    #[instrument(skip(self))]
    pub fn clear_cart(&self) {
        {
            let mut items = self.lock();
            items.clear();
            self.persist(&items);
        }
        self.inner
            .tracker
            .track(&TrackingEvent::bare(CartEvent::ClearCart));
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.lock().iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of stored unit price times quantity across all lines.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.lock().iter().map(CartLineItem::line_total).sum()
    }

    /// Snapshot of the current lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        self.lock().clone()
    }

    /// The line matching `(product_id, selection)`.
    #[must_use]
    pub fn get(&self, product_id: ProductId, selection: &Selection) -> Option<CartLineItem> {
        let key = selection_key(product_id, selection);
        self.lock().iter().find(|item| item.key() == key).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CartLineItem>> {
        self.inner
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Write the current cart to storage.
    ///
    /// Mutations also persist, but only log failures.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the cart cannot be encoded or written.
    pub fn flush(&self) -> Result<()> {
        let items = self.lock();
        self.write(&items)?;
        Ok(())
    }

    fn write(&self, items: &[CartLineItem]) -> std::result::Result<(), StorageError> {
        let document = encode_items(items)?;
        self.inner.storage.save(&document)
    }

    fn persist(&self, items: &[CartLineItem]) {
        if let Err(e) = self.write(items) {
            tracing::error!("Failed to persist cart: {e}");
        }
    }
}

impl<P: PricingService> CartStore<P> {
    /// Replace the cart with the pricing service's canonical view.
    ///
    /// Does nothing for an empty cart. On error or timeout the local cart is
    /// left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Reconcile` if the service fails or does not answer
    /// within the configured timeout.
    #[instrument(skip(self))]
    pub async fn refresh_cart(&self) -> Result<()> {
        let request: Vec<ReconcileLine> = {
            let items = self.lock();
            if items.is_empty() {
                return Ok(());
            }
            items.iter().map(ReconcileLine::from).collect()
        };

        let timeout = self.inner.reconcile_timeout;
        let response =
            tokio::time::timeout(timeout, self.inner.pricing.reconcile(&request)).await;
        let lines = match response {
            Ok(Ok(lines)) => lines,
            Ok(Err(e)) => {
                tracing::warn!("Cart reconciliation failed: {e}");
                return Err(e.into());
            }
            Err(_) => {
                tracing::warn!(?timeout, "Cart reconciliation timed out");
                return Err(ReconcileError::Timeout(timeout).into());
            }
        };

        let reconciled = normalize(lines.into_iter().map(CartLineItem::from).collect());
        tracing::info!(
            sent = request.len(),
            received = reconciled.len(),
            "Cart reconciled"
        );

        let mut items = self.lock();
        *items = reconciled;
        self.persist(&items);
        Ok(())
    }
}

/// Declared options matching `selection`, keyed by variant type.
fn chosen_options(product: &Product, selection: &Selection) -> BTreeMap<String, VariantOption> {
    product
        .variants
        .iter()
        .filter_map(|variant| {
            let value = selection.get(&variant.variant_type)?;
            let option = variant.option(value)?;
            Some((variant.variant_type.clone(), option.clone()))
        })
        .collect()
}

/// Drop empty lines and merge lines that share an identity key.
///
/// The first line for a key keeps its snapshot; later duplicates only add
/// their quantity. Lines without a recorded selection take it from their
/// option snapshots.
fn normalize(items: Vec<CartLineItem>) -> Vec<CartLineItem> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<CartLineItem> = Vec::with_capacity(items.len());

    for mut item in items.into_iter().filter(|item| item.quantity > 0) {
        if item.selection.is_empty() && !item.variants.is_empty() {
            item.selection = CartLineItem::selection_from_variants(&item.variants);
        }
        let key = item.key();
        if let Some(existing) = positions.get(&key).and_then(|&i| merged.get_mut(i)) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            positions.insert(key, merged.len());
            merged.push(item);
        }
    }
    merged
}

fn load_items(storage: &dyn CartStorage) -> Vec<CartLineItem> {
    let document = match storage.load() {
        Ok(Some(document)) => document,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!("Failed to read stored cart, starting empty: {e}");
            return Vec::new();
        }
    };

    match decode_items(&document) {
        Ok(items) => normalize(items),
        Err(e) => {
            tracing::warn!("Stored cart is malformed, starting empty: {e}");
            Vec::new()
        }
    }
}
