//! Durable local storage for cart contents.
//!
//! The cart is stored as a single JSON document:
//!
//! ```json
//! { "version": 1, "saved_at": "2026-10-14T09:30:00Z", "items": [ ... ] }
//! ```
//!
//! Storage backends only move opaque strings; encoding lives in
//! [`encode_items`] and [`decode_items`].

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::line_item::CartLineItem;

/// Current stored cart format.
pub const STORAGE_VERSION: u32 = 1;

/// Errors that can occur reading or writing stored carts.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Document was written by an incompatible version.
    #[error("Unsupported cart format version {0}")]
    UnsupportedVersion(u32),
}

/// Key-value persistence for the serialized cart.
pub trait CartStorage: Send + Sync {
    /// Read the stored document, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replace the stored document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn save(&self, document: &str) -> Result<(), StorageError>;
}

#[derive(Serialize)]
struct StoredCartRef<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    items: &'a [CartLineItem],
}

#[derive(Deserialize)]
struct StoredCart {
    version: u32,
    items: Vec<CartLineItem>,
}

/// Encode line items as a stored cart document.
///
/// # Errors
///
/// Returns `StorageError::Serialize` if encoding fails.
pub fn encode_items(items: &[CartLineItem]) -> Result<String, StorageError> {
    let stored = StoredCartRef {
        version: STORAGE_VERSION,
        saved_at: Utc::now(),
        items,
    };
    Ok(serde_json::to_string(&stored)?)
}

/// Decode a stored cart document.
///
/// # Errors
///
/// Returns `StorageError` if the document is malformed or has an unknown version.
pub fn decode_items(document: &str) -> Result<Vec<CartLineItem>, StorageError> {
    let stored: StoredCart = serde_json::from_str(document)?;
    if stored.version != STORAGE_VERSION {
        return Err(StorageError::UnsupportedVersion(stored.version));
    }
    Ok(stored.items)
}

/// Cart storage backed by a JSON file.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so a crash mid-write never leaves a truncated cart behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CartStorage for FileStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(document) => Ok(Some(document)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, document: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        let mut file = std::fs::File::create(&temp)?;
        file.write_all(document.as_bytes())?;
        file.sync_all()?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

/// In-memory cart storage.
///
/// Clones share the same slot, so a test can keep one handle and inspect what
/// the store wrote through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with `document`.
    #[must_use]
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(document.into()))),
        }
    }

    /// Current stored document.
    #[must_use]
    pub fn document(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.document())
    }

    fn save(&self, document: &str) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(document.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;
    use strand_core::{ProductId, ProductSnapshot};

    use super::*;

    fn scrunchie(quantity: u32) -> CartLineItem {
        CartLineItem {
            product: ProductSnapshot {
                id: ProductId::new(2),
                name: "Silk Scrunchie".to_string(),
                image: Some("https://cdn.example.com/scrunchie.jpg".to_string()),
                price: Decimal::new(1200, 2),
                slug: "silk-scrunchie".to_string(),
            },
            variants: BTreeMap::new(),
            selection: BTreeMap::new(),
            quantity,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_encode_decode_items() {
        let items = vec![scrunchie(2)];
        let document = encode_items(&items).unwrap();
        assert!(document.contains("\"version\":1"));
        assert_eq!(decode_items(&document).unwrap(), items);
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let err = decode_items(r#"{"version": 99, "items": []}"#).unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedVersion(99)));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_items("not json").unwrap_err(),
            StorageError::Serialize(_)
        ));
        assert!(decode_items(r#"{"version": 1, "items": [{"quantity": "x"}]}"#).is_err());
    }

    #[test]
    fn test_file_storage_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("cart.json"));
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_file_storage_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("cart.json"));

        storage.save("first").unwrap();
        storage.save("second").unwrap();

        assert_eq!(storage.load().unwrap().as_deref(), Some("second"));
        assert!(!storage.temp_path().exists());
    }

    #[test]
    fn test_memory_storage_clones_share_slot() {
        let storage = MemoryStorage::new();
        let observer = storage.clone();
        storage.save("doc").unwrap();
        assert_eq!(observer.document().as_deref(), Some("doc"));
    }
}
