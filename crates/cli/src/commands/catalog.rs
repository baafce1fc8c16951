//! Product catalog loaded from a JSON file.
//!
//! The file holds an array of products:
//!
//! ```json
//! [
//!   {
//!     "id": 1,
//!     "name": "Clip-in Extension",
//!     "slug": "clip-in-extension",
//!     "price": "100.00",
//!     "variants": [
//!       { "type": "Length", "options": [{ "id": 11, "value": "16\"", "price_modifier": "0" }] }
//!     ]
//!   }
//! ]
//! ```

use std::path::{Path, PathBuf};

use strand_core::{Product, ProductId};
use thiserror::Error;

/// Errors that can occur loading or querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read.
    #[error("Failed to read catalog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Catalog file is not a valid product array.
    #[error("Invalid catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// No product with the requested id.
    #[error("Unknown product: {0}")]
    UnknownProduct(ProductId),
}

/// Read-only product lookup.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Load the catalog from `path`.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&raw)?;
        tracing::debug!(products = catalog.products.len(), path = %path.display(), "Catalog loaded");
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        Ok(Self {
            products: serde_json::from_str(raw)?,
        })
    }

    pub fn product(&self, id: ProductId) -> Result<&Product, CatalogError> {
        self.products
            .iter()
            .find(|product| product.id == id)
            .ok_or(CatalogError::UnknownProduct(id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const CATALOG: &str = r#"[
        {
            "id": 1,
            "name": "Clip-in Extension",
            "slug": "clip-in-extension",
            "price": "100.00",
            "variants": [
                {
                    "type": "Length",
                    "options": [
                        { "id": 11, "value": "16\"", "price_modifier": "0" },
                        { "id": 12, "value": "20\"", "price_modifier": "15.00" }
                    ]
                },
                {
                    "type": "Color",
                    "options": [
                        { "id": 21, "value": "Black", "price_modifier": "0" },
                        { "id": 22, "value": "Blonde", "price_modifier": "20.00" }
                    ]
                }
            ]
        },
        { "id": 2, "name": "Silk Scrunchie", "slug": "silk-scrunchie", "price": "12.00" }
    ]"#;

    #[test]
    fn test_lookup() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.product(ProductId::new(2)).unwrap().name, "Silk Scrunchie");
        assert!(matches!(
            catalog.product(ProductId::new(9)),
            Err(CatalogError::UnknownProduct(id)) if id == ProductId::new(9)
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            Catalog::from_json(r#"{"id": 1}"#),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Catalog::load(Path::new("/nonexistent/strand/catalog.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/strand/catalog.json"));
    }
}
