//! Blob store trait and implementations.
//!
//! Blobs are JSON documents addressed by a [`BlobKey`]: the owner package
//! name (e.g. `@youwol/os-core`) and a data name (e.g. `favorites`).
//!
//! # Ergonomic Access
//!
//! Use [`ScopedBlobStore`] to pre-bind the owner package. It also provides
//! typed [`get_json`](ScopedBlobStore::get_json) /
//! [`put_json`](ScopedBlobStore::put_json) convenience methods.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::trace;

use crate::error::{StorageError, StorageResult};

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Address of one blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobKey {
    /// Owner package name.
    pub package: String,
    /// Data name within the package.
    pub data_name: String,
}

impl BlobKey {
    /// Build and validate a key.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if either part is empty or
    /// contains a null byte.
    pub fn new(package: impl Into<String>, data_name: impl Into<String>) -> StorageResult<Self> {
        let key = Self {
            package: package.into(),
            data_name: data_name.into(),
        };
        validate_part("package", &key.package)?;
        validate_part("data name", &key.data_name)?;
        Ok(key)
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.data_name)
    }
}

fn validate_part(what: &str, value: &str) -> StorageResult<()> {
    if value.is_empty() {
        return Err(StorageError::InvalidKey(format!("{what} must not be empty")));
    }
    if value.contains('\0') {
        return Err(StorageError::InvalidKey(format!(
            "{what} must not contain null bytes"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Remote blob store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch a blob. Returns `None` if nothing was ever stored.
    async fn get(&self, key: &BlobKey) -> StorageResult<Option<Value>>;

    /// Store a blob, replacing any previous value.
    async fn put(&self, key: &BlobKey, value: Value) -> StorageResult<()>;

    /// Delete a blob. Returns `true` if it existed.
    async fn delete(&self, key: &BlobKey) -> StorageResult<bool>;

    /// List the data names stored for a package.
    async fn list(&self, package: &str) -> StorageResult<Vec<String>>;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// In-memory blob store for tests and offline sessions.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    data: RwLock<BTreeMap<BlobKey, Value>>,
}

impl MemoryBlobStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with blobs.
    #[must_use]
    pub fn with_blobs(blobs: impl IntoIterator<Item = (BlobKey, Value)>) -> Self {
        Self {
            data: RwLock::new(blobs.into_iter().collect()),
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &BlobKey) -> StorageResult<Option<Value>> {
        trace!(%key, "memory blob get");
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn put(&self, key: &BlobKey, value: Value) -> StorageResult<()> {
        trace!(%key, "memory blob put");
        self.data.write().await.insert(key.clone(), value);
        Ok(())
    }

    async fn delete(&self, key: &BlobKey) -> StorageResult<bool> {
        Ok(self.data.write().await.remove(key).is_some())
    }

    async fn list(&self, package: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .data
            .read()
            .await
            .keys()
            .filter(|k| k.package == package)
            .map(|k| k.data_name.clone())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Scoped access
// ---------------------------------------------------------------------------

/// A blob store bound to one owner package.
#[derive(Clone)]
pub struct ScopedBlobStore {
    store: Arc<dyn BlobStore>,
    package: String,
}

impl ScopedBlobStore {
    /// Bind `store` to `package`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if the package name is invalid.
    pub fn new(store: Arc<dyn BlobStore>, package: impl Into<String>) -> StorageResult<Self> {
        let package = package.into();
        validate_part("package", &package)?;
        Ok(Self { store, package })
    }

    /// The owner package.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// The underlying store.
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    fn key(&self, data_name: &str) -> StorageResult<BlobKey> {
        BlobKey::new(self.package.clone(), data_name)
    }

    /// Fetch a raw blob.
    ///
    /// # Errors
    ///
    /// Propagates key validation and backend errors.
    pub async fn get(&self, data_name: &str) -> StorageResult<Option<Value>> {
        self.store.get(&self.key(data_name)?).await
    }

    /// Store a raw blob.
    ///
    /// # Errors
    ///
    /// Propagates key validation and backend errors.
    pub async fn put(&self, data_name: &str, value: Value) -> StorageResult<()> {
        self.store.put(&self.key(data_name)?, value).await
    }

    /// Delete a blob.
    ///
    /// # Errors
    ///
    /// Propagates key validation and backend errors.
    pub async fn delete(&self, data_name: &str) -> StorageResult<bool> {
        self.store.delete(&self.key(data_name)?).await
    }

    /// Fetch and deserialize a blob.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if the stored document does
    /// not match `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, data_name: &str) -> StorageResult<Option<T>> {
        match self.get(data_name).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StorageError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// Serialize and store a blob.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if `value` cannot be
    /// serialized.
    pub async fn put_json<T: Serialize + Sync>(&self, data_name: &str, value: &T) -> StorageResult<()> {
        let value =
            serde_json::to_value(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.put(data_name, value).await
    }
}

impl fmt::Debug for ScopedBlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedBlobStore")
            .field("package", &self.package)
            .finish_non_exhaustive()
    }
}
