//! Variant price resolution.
//!
//! All functions here are pure: the store calls them on every add, and the CLI
//! calls them while a shopper is still choosing options.

use std::str::FromStr;

use rust_decimal::Decimal;
use strand_core::Variant;

use crate::Selection;

/// Resolve the unit price for a selection.
///
/// Returns `base_price` plus the modifier of the selected option for every
/// declared variant type present in `selection`. Each declared type is visited
/// once, in declaration order; selection keys that are not declared, and
/// values that match no option, contribute nothing.
///
/// # Example
///
/// ```
/// use rust_decimal::Decimal;
/// use strand_cart::{Selection, pricing::resolve_price};
///
/// let selection = Selection::new();
/// assert_eq!(resolve_price(Decimal::new(100, 0), &[], &selection), Decimal::new(100, 0));
/// ```
#[must_use]
pub fn resolve_price(base_price: Decimal, variants: &[Variant], selection: &Selection) -> Decimal {
    if variants.is_empty() || selection.is_empty() {
        return base_price;
    }

    variants
        .iter()
        .filter_map(|variant| {
            let chosen = selection.get(&variant.variant_type)?;
            variant.option(chosen)
        })
        .map(|option| option.price_modifier.as_deref().map_or(Decimal::ZERO, parse_modifier))
        .fold(base_price, |total, modifier| total + modifier)
}

/// Parse a price modifier, treating anything unparsable as zero.
///
/// Accepts surrounding whitespace and an explicit leading `+`.
#[must_use]
pub fn parse_modifier(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    Decimal::from_str(unsigned).unwrap_or(Decimal::ZERO)
}

/// Declared variant types without a valid choice in `selection`, in
/// declaration order.
///
/// A type counts as chosen only when its value names one of that variant's
/// declared options.
#[must_use]
pub fn missing_variant_types(variants: &[Variant], selection: &Selection) -> Vec<String> {
    variants
        .iter()
        .filter(|v| {
            selection
                .get(&v.variant_type)
                .and_then(|value| v.option(value))
                .is_none()
        })
        .map(|v| v.variant_type.clone())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use strand_core::{VariantOption, VariantOptionId};

    use super::*;

    fn option(id: i32, value: &str, modifier: Option<&str>) -> VariantOption {
        VariantOption {
            id: VariantOptionId::new(id),
            value: value.to_string(),
            price_modifier: modifier.map(String::from),
        }
    }

    fn schema() -> Vec<Variant> {
        vec![
            Variant {
                variant_type: "Length".to_string(),
                options: vec![
                    option(11, "16\"", Some("0")),
                    option(12, "20\"", Some("15.00")),
                ],
            },
            Variant {
                variant_type: "Color".to_string(),
                options: vec![
                    option(21, "Black", Some("+0")),
                    option(22, "Blonde", Some("20.00")),
                ],
            },
        ]
    }

    fn base() -> Decimal {
        Decimal::new(10000, 2)
    }

    #[test]
    fn test_no_variants_returns_base() {
        let selection = Selection::from([("Color".to_string(), "Blonde".to_string())]);
        assert_eq!(resolve_price(base(), &[], &selection), base());
    }

    #[test]
    fn test_empty_selection_returns_base() {
        assert_eq!(resolve_price(base(), &schema(), &Selection::new()), base());
    }

    #[test]
    fn test_full_selection_sums_modifiers() {
        let selection = Selection::from([
            ("Color".to_string(), "Blonde".to_string()),
            ("Length".to_string(), "20\"".to_string()),
        ]);
        assert_eq!(
            resolve_price(base(), &schema(), &selection),
            Decimal::new(13500, 2)
        );
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut color_first = Selection::new();
        color_first.insert("Color".to_string(), "Blonde".to_string());
        color_first.insert("Length".to_string(), "20\"".to_string());

        let mut length_first = Selection::new();
        length_first.insert("Length".to_string(), "20\"".to_string());
        length_first.insert("Color".to_string(), "Blonde".to_string());

        assert_eq!(
            resolve_price(base(), &schema(), &color_first),
            resolve_price(base(), &schema(), &length_first)
        );
    }

    #[test]
    fn test_partial_selection_is_priced() {
        let selection = Selection::from([("Length".to_string(), "20\"".to_string())]);
        assert_eq!(
            resolve_price(base(), &schema(), &selection),
            Decimal::new(11500, 2)
        );
    }

    #[test]
    fn test_unknown_type_and_value_are_ignored() {
        let selection = Selection::from([
            ("Texture".to_string(), "Wavy".to_string()),
            ("Color".to_string(), "Purple".to_string()),
        ]);
        assert_eq!(resolve_price(base(), &schema(), &selection), base());
    }

    #[test]
    fn test_missing_or_garbage_modifier_counts_as_zero() {
        let variants = vec![Variant {
            variant_type: "Finish".to_string(),
            options: vec![option(1, "Matte", None), option(2, "Gloss", Some("n/a"))],
        }];
        for value in ["Matte", "Gloss"] {
            let selection = Selection::from([("Finish".to_string(), value.to_string())]);
            assert_eq!(resolve_price(base(), &variants, &selection), base());
        }
    }

    #[test]
    fn test_negative_modifier() {
        let variants = vec![Variant {
            variant_type: "Grade".to_string(),
            options: vec![option(1, "Outlet", Some(" -12.50 "))],
        }];
        let selection = Selection::from([("Grade".to_string(), "Outlet".to_string())]);
        assert_eq!(
            resolve_price(base(), &variants, &selection),
            Decimal::new(8750, 2)
        );
    }

    #[test]
    fn test_parse_modifier() {
        assert_eq!(parse_modifier("+15.00"), Decimal::new(1500, 2));
        assert_eq!(parse_modifier("-3"), Decimal::new(-3, 0));
        assert_eq!(parse_modifier(""), Decimal::ZERO);
        assert_eq!(parse_modifier("abc"), Decimal::ZERO);
    }

    #[test]
    fn test_missing_variant_types_in_declaration_order() {
        let selection = Selection::from([("Color".to_string(), "Black".to_string())]);
        assert_eq!(missing_variant_types(&schema(), &selection), vec!["Length"]);
        assert_eq!(
            missing_variant_types(&schema(), &Selection::new()),
            vec!["Length", "Color"]
        );
    }

    #[test]
    fn test_unmatched_value_counts_as_missing() {
        let selection = Selection::from([
            ("Color".to_string(), "Purple".to_string()),
            ("Length".to_string(), "20\"".to_string()),
        ]);
        assert_eq!(missing_variant_types(&schema(), &selection), vec!["Color"]);
    }
}
