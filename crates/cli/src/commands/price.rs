//! Price lookup command.

use std::io::Write;

use strand_cart::{Selection, pricing};
use strand_core::{CurrencyCode, Price, ProductId};

use super::catalog::{Catalog, CatalogError};

/// Errors that can occur pricing a configuration.
#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Print the resolved unit price of `product_id` under `selection`.
pub fn run(
    catalog: &Catalog,
    product_id: ProductId,
    selection: &Selection,
    currency: CurrencyCode,
) -> Result<(), PriceError> {
    let product = catalog.product(product_id)?;
    let line = describe(product, selection, currency);
    writeln!(std::io::stdout().lock(), "{line}")?;
    Ok(())
}

fn describe(product: &strand_core::Product, selection: &Selection, currency: CurrencyCode) -> String {
    let unit_price = pricing::resolve_price(product.price, &product.variants, selection);
    let missing = pricing::missing_variant_types(&product.variants, selection);

    let mut line = format!(
        "{}: {}",
        product.name,
        Price::new(unit_price, currency).display()
    );
    if !missing.is_empty() {
        line.push_str(&format!(" (not selected: {})", missing.join(", ")));
    }
    line
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::catalog::tests::CATALOG;

    fn select(pairs: &[(&str, &str)]) -> Selection {
        pairs
            .iter()
            .map(|(t, v)| ((*t).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_describe_full_selection() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let product = catalog.product(ProductId::new(1)).unwrap();
        let line = describe(
            product,
            &select(&[("Length", "20\""), ("Color", "Blonde")]),
            CurrencyCode::USD,
        );
        assert_eq!(line, "Clip-in Extension: $135.00");
    }

    #[test]
    fn test_describe_lists_missing_types() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let product = catalog.product(ProductId::new(1)).unwrap();
        let line = describe(product, &select(&[("Color", "Blonde")]), CurrencyCode::EUR);
        assert_eq!(line, "Clip-in Extension: €120.00 (not selected: Length)");
    }
}
