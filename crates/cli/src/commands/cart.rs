//! Cart commands backed by the file store.
//!
//! # Environment Variables
//!
//! - `STRAND_CART_PATH` - Cart file location
//! - `STRAND_PRICING_URL` - Pricing service for `refresh`; `refresh` fails when unset
//! - `STRAND_PRICING_TOKEN` - Bearer token for the pricing service

use std::io::Write;

use rust_decimal::Decimal;
use strand_cart::{
    AddToCart, CartConfig, CartLineItem, CartStore, FileStorage, HttpPricingService,
    OfflinePricingService, PricingService, ReconcileError, ReconcileLine, ReconciledLine,
};
use strand_core::{CurrencyCode, Price, ProductId};
use thiserror::Error;

use super::catalog::{Catalog, CatalogError};

/// Errors that can occur running a cart command.
#[derive(Debug, Error)]
pub enum CartCommandError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The store refused the add (see the logged notification).
    #[error("{0} was not added to the cart")]
    Rejected(String),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Pricing service chosen from configuration.
pub enum Pricing {
    Http(HttpPricingService),
    Offline(OfflinePricingService),
}

impl Pricing {
    /// HTTP when a pricing URL is configured, offline otherwise.
    pub fn from_config(config: &CartConfig) -> Result<Self, ReconcileError> {
        match &config.pricing_url {
            Some(url) => Ok(Self::Http(HttpPricingService::new(
                url,
                config.pricing_token.as_ref(),
                config.reconcile_timeout,
            )?)),
            None => Ok(Self::Offline(OfflinePricingService)),
        }
    }
}

impl PricingService for Pricing {
    async fn reconcile(
        &self,
        lines: &[ReconcileLine],
    ) -> Result<Vec<ReconciledLine>, ReconcileError> {
        match self {
            Self::Http(service) => service.reconcile(lines).await,
            Self::Offline(service) => service.reconcile(lines).await,
        }
    }
}

/// Open the persisted cart described by `config`.
pub fn open(config: &CartConfig) -> Result<CartStore<Pricing>, ReconcileError> {
    let pricing = Pricing::from_config(config)?;
    if let Pricing::Http(service) = &pricing {
        tracing::debug!(endpoint = %service.endpoint(), "Using HTTP pricing service");
    }

    Ok(CartStore::builder(pricing)
        .storage(FileStorage::new(&config.storage_path))
        .reconcile_timeout(config.reconcile_timeout)
        .open())
}

/// Add a catalog product to the cart.
pub fn add<P>(
    cart: &CartStore<P>,
    catalog: &Catalog,
    product_id: ProductId,
    request: AddToCart,
) -> Result<(), CartCommandError> {
    let product = catalog.product(product_id)?;
    if !cart.add_to_cart(product, request) {
        return Err(CartCommandError::Rejected(product.name.clone()));
    }
    Ok(())
}

/// Print every line followed by the totals.
pub fn show<P>(cart: &CartStore<P>, currency: CurrencyCode) -> Result<(), CartCommandError> {
    let mut out = std::io::stdout().lock();
    for line in render(&cart.items(), cart.total_items(), cart.total_price(), currency) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn render(
    items: &[CartLineItem],
    total_items: u64,
    total_price: Decimal,
    currency: CurrencyCode,
) -> Vec<String> {
    if items.is_empty() {
        return vec!["Cart is empty".to_string()];
    }

    let mut lines: Vec<String> = items
        .iter()
        .map(|item| {
            let options = item
                .variants
                .iter()
                .map(|(variant_type, option)| format!("{variant_type}: {}", option.value))
                .collect::<Vec<_>>()
                .join(", ");
            let name = if options.is_empty() {
                item.product.name.clone()
            } else {
                format!("{} ({options})", item.product.name)
            };
            format!(
                "{} x {name} @ {} = {}",
                item.quantity,
                Price::new(item.product.price, currency).display(),
                Price::new(item.line_total(), currency).display()
            )
        })
        .collect();

    lines.push(format!(
        "Total: {total_items} items, {} {}",
        Price::new(total_price, currency).display(),
        currency.code()
    ));
    lines
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use strand_cart::MemoryStorage;

    use super::*;
    use crate::commands::catalog::tests::CATALOG;

    fn cart() -> CartStore<OfflinePricingService> {
        CartStore::builder(OfflinePricingService)
            .storage(MemoryStorage::new())
            .open()
    }

    #[test]
    fn test_add_unknown_product() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let err = add(&cart(), &catalog, ProductId::new(42), AddToCart::new()).unwrap_err();
        assert!(matches!(err, CartCommandError::Catalog(CatalogError::UnknownProduct(_))));
    }

    #[test]
    fn test_add_rejected_by_selection_guard() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let cart = cart();
        let request = AddToCart::new()
            .select("Color", "Blonde")
            .require_full_selection();

        let err = add(&cart, &catalog, ProductId::new(1), request).unwrap_err();

        assert!(matches!(err, CartCommandError::Rejected(ref name) if name == "Clip-in Extension"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_render() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let cart = cart();
        add(
            &cart,
            &catalog,
            ProductId::new(1),
            AddToCart::new()
                .quantity(2)
                .select("Length", "20\"")
                .select("Color", "Blonde"),
        )
        .unwrap();
        add(&cart, &catalog, ProductId::new(2), AddToCart::new()).unwrap();

        let lines = render(
            &cart.items(),
            cart.total_items(),
            cart.total_price(),
            CurrencyCode::USD,
        );

        assert_eq!(
            lines,
            vec![
                "2 x Clip-in Extension (Color: Blonde, Length: 20\") @ $135.00 = $270.00".to_string(),
                "1 x Silk Scrunchie @ $12.00 = $12.00".to_string(),
                "Total: 3 items, $282.00 USD".to_string(),
            ]
        );
    }

    #[test]
    fn test_render_total_names_currency() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let cart = cart();
        add(&cart, &catalog, ProductId::new(2), AddToCart::new().quantity(2)).unwrap();

        let lines = render(&cart.items(), 2, cart.total_price(), CurrencyCode::CAD);

        assert_eq!(lines.last().unwrap(), "Total: 2 items, $24.00 CAD");
    }

    #[test]
    fn test_render_empty() {
        let lines = render(&[], 0, Decimal::ZERO, CurrencyCode::USD);
        assert_eq!(lines, vec!["Cart is empty".to_string()]);
    }

    #[test]
    fn test_offline_pricing_without_url() {
        let pricing = Pricing::from_config(&CartConfig::default()).unwrap();
        assert!(matches!(pricing, Pricing::Offline(_)));
    }
}
