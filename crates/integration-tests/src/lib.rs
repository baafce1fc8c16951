//! Integration tests for Strand.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p strand-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_store` - Store behavior end to end with scripted collaborators
//! - `http_pricing` - The HTTP pricing client against a `wiremock` server
//!
//! This library holds the shared fixtures: recording notifier and tracker,
//! scripted pricing services and a small product catalog.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rust_decimal::Decimal;
use strand_cart::{
    Notification, Notifier, PricingService, ReconcileError, ReconcileLine, ReconciledLine,
    ReconciledVariant, Tracker, TrackingEvent,
};
use strand_core::{Product, ProductId, Variant, VariantOption, VariantOptionId};
use tokio::sync::Notify;

/// Notifier that keeps every notification.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
    }
}

/// Tracker that keeps every event.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracker {
    seen: Arc<Mutex<Vec<TrackingEvent>>>,
}

impl RecordingTracker {
    #[must_use]
    pub fn events(&self) -> Vec<TrackingEvent> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Tracker for RecordingTracker {
    fn track(&self, event: &TrackingEvent) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// One scripted pricing service reply.
#[derive(Debug)]
pub enum Reply {
    /// Answer with `lines` after `delay`.
    Lines {
        delay: Duration,
        lines: Vec<ReconciledLine>,
    },
    /// Fail immediately.
    Fail(ReconcileError),
}

/// Pricing service that answers calls in order from a script.
///
/// Calls beyond the end of the script fail with `Unavailable`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPricing {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<Vec<ReconcileLine>>>>,
}

impl ScriptedPricing {
    #[must_use]
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            requests: Arc::default(),
        }
    }

    /// Answer once, immediately.
    #[must_use]
    pub fn answering(lines: Vec<ReconciledLine>) -> Self {
        Self::new([Reply::Lines {
            delay: Duration::ZERO,
            lines,
        }])
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<Vec<ReconcileLine>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PricingService for ScriptedPricing {
    async fn reconcile(
        &self,
        lines: &[ReconcileLine],
    ) -> Result<Vec<ReconciledLine>, ReconcileError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(lines.to_vec());
        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match reply {
            Some(Reply::Lines { delay, lines }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(lines)
            }
            Some(Reply::Fail(e)) => Err(e),
            None => Err(ReconcileError::Unavailable("script exhausted".to_string())),
        }
    }
}

/// Pricing service that holds its reply until released.
///
/// `started` is signalled once the request has been received; the reply is
/// sent after `release` is notified.
#[derive(Debug, Clone, Default)]
pub struct GatedPricing {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
    lines: Vec<ReconciledLine>,
}

impl GatedPricing {
    #[must_use]
    pub fn new(lines: Vec<ReconciledLine>) -> Self {
        Self {
            started: Arc::default(),
            release: Arc::default(),
            lines,
        }
    }
}

impl PricingService for GatedPricing {
    async fn reconcile(
        &self,
        _lines: &[ReconcileLine],
    ) -> Result<Vec<ReconciledLine>, ReconcileError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(self.lines.clone())
    }
}

fn option(id: i32, value: &str, modifier: &str) -> VariantOption {
    VariantOption {
        id: VariantOptionId::new(id),
        value: value.to_string(),
        price_modifier: Some(modifier.to_string()),
    }
}

/// Clip-in extension at 100.00 with Length and Color variants.
///
/// | type   | option (id)  | modifier |
/// |--------|--------------|----------|
/// | Length | 16" (11)     | 0        |
/// | Length | 20" (12)     | 15.00    |
/// | Color  | Black (21)   | 0        |
/// | Color  | Blonde (22)  | 20.00    |
#[must_use]
pub fn extension() -> Product {
    Product {
        id: ProductId::new(1),
        name: "Clip-in Extension".to_string(),
        slug: "clip-in-extension".to_string(),
        image: Some("https://cdn.example.com/extension.jpg".to_string()),
        price: Decimal::new(10000, 2),
        variants: vec![
            Variant {
                variant_type: "Length".to_string(),
                options: vec![option(11, "16\"", "0"), option(12, "20\"", "15.00")],
            },
            Variant {
                variant_type: "Color".to_string(),
                options: vec![option(21, "Black", "0"), option(22, "Blonde", "20.00")],
            },
        ],
    }
}

/// A product without variants.
#[must_use]
pub fn simple_product(id: i32, name: &str, price: Decimal) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        slug: name.to_lowercase().replace(' ', "-"),
        image: None,
        price,
        variants: Vec::new(),
    }
}

/// A reconciled line for `product` priced at `price`.
#[must_use]
pub fn reconciled(
    product: &Product,
    price: Decimal,
    quantity: u32,
    options: &[(&str, &str)],
) -> ReconciledLine {
    let variants = options
        .iter()
        .filter_map(|(variant_type, value)| {
            let option = product.variant(variant_type)?.option(value)?;
            Some(ReconciledVariant {
                variant_type: (*variant_type).to_string(),
                option: option.clone(),
            })
        })
        .collect();

    ReconciledLine {
        product: product.snapshot(price),
        quantity,
        variants,
    }
}
