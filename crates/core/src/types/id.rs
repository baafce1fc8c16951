//! Newtype IDs for type-safe catalog references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally passing a variant option ID where a product ID is expected.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>`, `Into<i32>` and `FromStr` implementations
///
/// The `Display` form is the plain decimal value, so it only ever contains
/// ASCII digits and an optional leading `-`.
///
/// # Example
///
/// ```rust
/// # use strand_core::define_id;
/// define_id!(ProductId);
/// define_id!(VariantOptionId);
///
/// let product_id = ProductId::new(1);
/// let option_id = VariantOptionId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: ProductId = option_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(VariantOptionId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_is_decimal() {
        assert_eq!(ProductId::new(42).to_string(), "42");
        assert_eq!(ProductId::new(-7).to_string(), "-7");
    }

    #[test]
    fn test_id_from_str() {
        let id: ProductId = " 17 ".parse().unwrap();
        assert_eq!(id, ProductId::new(17));
        assert!("abc".parse::<ProductId>().is_err());
    }

    #[test]
    fn test_id_serde_transparent() {
        let json = serde_json::to_string(&VariantOptionId::new(9)).unwrap();
        assert_eq!(json, "9");
        let back: VariantOptionId = serde_json::from_str("9").unwrap();
        assert_eq!(back.as_i32(), 9);
    }
}
