//! Cart line items.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strand_core::{ProductSnapshot, VariantOption};

use crate::Selection;
use crate::identity::cart_item_key;

/// One product configuration in the cart.
///
/// `selection` is the shopper's choice as entered and defines the line's
/// identity. `variants` holds the declared options it resolved to, so it may
/// cover fewer types than `selection` does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub product: ProductSnapshot,
    /// Chosen option per variant type. Empty for products without variants.
    #[serde(default)]
    pub variants: BTreeMap<String, VariantOption>,
    /// Chosen value per variant type.
    #[serde(default)]
    pub selection: BTreeMap<String, String>,
    /// Always at least 1 while the item is in a cart.
    pub quantity: u32,
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
}

impl CartLineItem {
    /// Identity key of this item (see [`crate::identity`]).
    #[must_use]
    pub fn key(&self) -> String {
        cart_item_key(
            self.product.id,
            self.selection
                .iter()
                .map(|(variant_type, value)| (variant_type.as_str(), value.as_str())),
        )
    }

    /// The chosen values as a [`Selection`].
    #[must_use]
    pub fn selection(&self) -> Selection {
        self.selection
            .iter()
            .map(|(variant_type, value)| (variant_type.clone(), value.clone()))
            .collect()
    }

    /// Selection implied by the option snapshots.
    ///
    /// Used for lines whose selection was not recorded, such as lines returned
    /// by reconciliation.
    #[must_use]
    pub fn selection_from_variants(
        variants: &BTreeMap<String, VariantOption>,
    ) -> BTreeMap<String, String> {
        variants
            .iter()
            .map(|(variant_type, option)| (variant_type.clone(), option.value.clone()))
            .collect()
    }

    /// Stored unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use strand_core::{ProductId, VariantOptionId};

    use super::*;
    use crate::identity::selection_key;

    fn item() -> CartLineItem {
        let mut variants = BTreeMap::new();
        variants.insert(
            "Length".to_string(),
            VariantOption {
                id: VariantOptionId::new(12),
                value: "20\"".to_string(),
                price_modifier: Some("15.00".to_string()),
            },
        );
        CartLineItem {
            product: ProductSnapshot {
                id: ProductId::new(1),
                name: "Clip-in Extension".to_string(),
                image: None,
                price: Decimal::new(11500, 2),
                slug: "clip-in-extension".to_string(),
            },
            selection: CartLineItem::selection_from_variants(&variants),
            variants,
            quantity: 3,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_key_matches_selection_key() {
        let item = item();
        assert_eq!(item.key(), selection_key(item.product.id, &item.selection()));
    }

    #[test]
    fn test_line_total() {
        assert_eq!(item().line_total(), Decimal::new(34500, 2));
    }

    #[test]
    fn test_deserialize_without_timestamp_or_variants() {
        let json = serde_json::json!({
            "product": {
                "id": 2,
                "name": "Silk Scrunchie",
                "price": "12.00",
                "slug": "silk-scrunchie"
            },
            "quantity": 1
        });
        let item: CartLineItem = serde_json::from_value(json).unwrap();
        assert!(item.variants.is_empty());
        assert!(item.selection.is_empty());
        assert_eq!(item.key(), "2");
    }

    #[test]
    fn test_key_follows_selection_not_snapshots() {
        let mut item = item();
        item.selection
            .insert("Texture".to_string(), "Wavy".to_string());
        assert_eq!(item.key(), "1|Length=20%22;Texture=Wavy");
        assert_eq!(item.variants.len(), 1);
    }
}
