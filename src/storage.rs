//! Key-value store contract used for draft persistence.
//!
//! SYSTEM CONTEXT
//! ==============
//! The browser's `localStorage` is synchronous, string-keyed, and can refuse
//! writes once the origin's quota is spent. [`Storage`] captures exactly that
//! surface so the lifecycle can be exercised against [`MemoryStorage`] in
//! tests and against `web::LocalStorage` in the browser.
//!
//! TRADE-OFFS
//! ==========
//! Methods take `&self`: browser storage handles are shared references with
//! interior state, and every binding closure holds the same store.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

/// Failure reported by [`Storage::set`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The store cannot be reached at all.
    #[error("storage is unavailable")]
    Unavailable,
    /// Writing `key` would exceed the store's capacity.
    #[error("storage quota exceeded while writing {key}")]
    QuotaExceeded { key: String },
    /// Any other backend rejection.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Synchronous string key-value store.
pub trait Storage {
    /// Whether the store can be used. Must not panic; a store blocked by
    /// browser policy reports `false`.
    fn available(&self) -> bool;

    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Write `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::QuotaExceeded`] when the store is full and
    /// [`StorageError::Unavailable`] when it cannot be reached.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing a missing key is a no-op.
    fn remove(&self, key: &str);

    /// Whether anything is stored under `key`.
    fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

impl<S: Storage + ?Sized> Storage for Rc<S> {
    fn available(&self) -> bool {
        (**self).available()
    }

    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key);
    }

    fn exists(&self, key: &str) -> bool {
        (**self).exists(key)
    }
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

#[derive(Debug)]
struct MemoryInner {
    entries: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
    available: bool,
}

/// In-memory [`Storage`] with an optional byte quota.
///
/// Clones share the same entries, mirroring how every tab script sees the
/// same `localStorage`. Quota accounting sums key and value byte lengths.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    inner: Rc<RefCell<MemoryInner>>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// An empty, unlimited, available store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(MemoryInner {
                entries: BTreeMap::new(),
                quota_bytes: None,
                available: true,
            })),
        }
    }

    /// An empty store that rejects writes past `quota_bytes`.
    #[must_use]
    pub fn with_quota(quota_bytes: usize) -> Self {
        let store = Self::new();
        store.inner.borrow_mut().quota_bytes = Some(quota_bytes);
        store
    }

    /// A store that reports itself unreachable.
    #[must_use]
    pub fn unavailable() -> Self {
        let store = Self::new();
        store.inner.borrow_mut().available = false;
        store
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Stored keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().entries.keys().cloned().collect()
    }

    /// Bytes currently charged against the quota.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.inner
            .borrow()
            .entries
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Storage for MemoryStorage {
    fn available(&self) -> bool {
        self.inner.borrow().available
    }

    fn get(&self, key: &str) -> Option<String> {
        let inner = self.inner.borrow();
        if !inner.available {
            return None;
        }
        inner.entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.borrow_mut();
        if !inner.available {
            return Err(StorageError::Unavailable);
        }
        if let Some(quota) = inner.quota_bytes {
            // The entry being overwritten no longer counts.
            let used: usize = inner
                .entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded { key: key.to_owned() });
            }
        }
        inner.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) {
        let mut inner = self.inner.borrow_mut();
        if inner.available {
            inner.entries.remove(key);
        }
    }
}
