//! Strand cart engine.
//!
//! A client-held shopping cart with variant-aware pricing:
//!
//! - [`pricing`] - Pure unit-price resolution from a base price and variant modifiers
//! - [`identity`] - Order-independent identity key per (product, selection)
//! - [`store`] - The [`CartStore`] and its mutations, totals and reconciliation
//! - [`reconcile`] - Wire types and the [`PricingService`] collaborator
//! - [`storage`] - Durable local persistence of the cart
//! - [`notify`] / [`analytics`] - User notifications and tracking events
//! - [`config`] - Environment-driven configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use strand_cart::{AddToCart, CartStore, FileStorage, OfflinePricingService};
//! # fn product() -> strand_core::Product { unimplemented!() }
//!
//! let cart = CartStore::builder(OfflinePricingService)
//!     .storage(FileStorage::new(".strand/cart.json"))
//!     .open();
//!
//! cart.add_to_cart(&product(), AddToCart::new().quantity(2).select("Color", "Blonde"));
//! println!("{} items, {}", cart.total_items(), cart.total_price());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod config;
pub mod error;
pub mod identity;
pub mod line_item;
pub mod notify;
pub mod pricing;
pub mod reconcile;
pub mod storage;
pub mod store;

/// Chosen option value per variant type, as entered by the shopper.
pub type Selection = std::collections::HashMap<String, String>;

pub use analytics::{CartEvent, Tracker, TrackingEvent, TracingTracker};
pub use config::{CartConfig, ConfigError};
pub use error::{CartError, Result};
pub use identity::{cart_item_key, selection_key};
pub use line_item::CartLineItem;
pub use notify::{Notification, NotificationKind, Notifier, TracingNotifier};
pub use pricing::resolve_price;
pub use reconcile::{
    HttpPricingService, OfflinePricingService, PricingService, ReconcileError, ReconcileLine,
    ReconcileVariant, ReconciledLine, ReconciledVariant,
};
pub use storage::{CartStorage, FileStorage, MemoryStorage, StorageError};
pub use store::{AddToCart, CartStore, CartStoreBuilder};
