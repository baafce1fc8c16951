//! Cart item identity keys.
//!
//! A key is `"{product_id}"` for a product without a selection, and
//! `"{product_id}|{type}={value};{type}={value}..."` otherwise, with pairs
//! sorted by type name and every type and value percent-encoded.
//!
//! Percent-encoding leaves only `A-Z a-z 0-9 - _ . ~` and `%XX` escapes, so the
//! delimiters `|`, `=` and `;` never appear inside an encoded component. Product
//! IDs render as plain integers and never contain `|` either. Two inputs
//! therefore share a key exactly when they share a product ID and the same set
//! of (type, value) pairs.

use strand_core::ProductId;

use crate::Selection;

const ID_DELIMITER: char = '|';
const PAIR_DELIMITER: char = ';';
const VALUE_DELIMITER: char = '=';

/// Build the identity key from (type, value) pairs in any order.
#[must_use]
pub fn cart_item_key<'a, I>(product_id: ProductId, pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut pairs: Vec<(&str, &str)> = pairs.into_iter().collect();
    let mut key = product_id.to_string();
    if pairs.is_empty() {
        return key;
    }

    pairs.sort_unstable();

    key.push(ID_DELIMITER);
    for (i, (variant_type, value)) in pairs.into_iter().enumerate() {
        if i > 0 {
            key.push(PAIR_DELIMITER);
        }
        key.push_str(&urlencoding::encode(variant_type));
        key.push(VALUE_DELIMITER);
        key.push_str(&urlencoding::encode(value));
    }
    key
}

/// Identity key for a selection map.
#[must_use]
pub fn selection_key(product_id: ProductId, selection: &Selection) -> String {
    cart_item_key(
        product_id,
        selection.iter().map(|(t, v)| (t.as_str(), v.as_str())),
    )
}
