//! Product catalog schema as seen by the cart.
//!
//! Products are owned by the catalog; the cart only reads them. A line item
//! keeps a [`ProductSnapshot`] instead of a live reference, so cart contents can
//! go stale between reconciliations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, VariantOptionId};

/// A catalog product with its declared variant axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Base price before any variant modifiers.
    pub price: Decimal,
    /// Declared variant axes, in display order.
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl Product {
    /// Whether the product declares any variant axis.
    #[must_use]
    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    /// Look up a declared variant axis by its type name.
    #[must_use]
    pub fn variant(&self, variant_type: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.variant_type == variant_type)
    }

    /// Denormalized copy of this product carrying `price` as its unit price.
    #[must_use]
    pub fn snapshot(&self, price: Decimal) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id,
            name: self.name.clone(),
            image: self.image.clone(),
            price,
            slug: self.slug.clone(),
        }
    }
}

/// A named axis of customization (e.g. "Length").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(rename = "type")]
    pub variant_type: String,
    #[serde(default)]
    pub options: Vec<VariantOption>,
}

impl Variant {
    /// Find the option whose display value equals `value`.
    #[must_use]
    pub fn option(&self, value: &str) -> Option<&VariantOption> {
        self.options.iter().find(|o| o.value == value)
    }
}

/// One selectable value on a variant axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOption {
    /// Backend identifier sent during reconciliation.
    pub id: VariantOptionId,
    pub value: String,
    /// Signed decimal amount as text, e.g. `"15.00"` or `"-2.50"`.
    #[serde(default)]
    pub price_modifier: Option<String>,
}

/// Product data frozen into a line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Unit price with variant modifiers already applied.
    pub price: Decimal,
    pub slug: String,
}
