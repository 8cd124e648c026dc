//! Mock collaborators for testing.
//!
//! Every mock uses `std::sync::Mutex` or atomics internally so builders
//! work without a tokio runtime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use canopy_core::ApplicationInfo;
use canopy_favorites::{EntityResolver, FolderEntity, ItemEntity, ResolveError};
use canopy_platform::{
    FrameHandle, FrameHost, MetadataSource, PlatformError, PlatformResult, Target, WindowLauncher,
};
use canopy_shell::PackageResources;
use canopy_storage::{BlobKey, BlobStore, MemoryBlobStore, StorageError, StorageResult};

use crate::fixtures::{test_folder, test_item};

// ---------------------------------------------------------------------------
// Explorer
// ---------------------------------------------------------------------------

/// In-memory explorer.
///
/// Unknown ids resolve to [`ResolveError::NotFound`]; ids registered with
/// [`with_failure`](Self::with_failure) fail with the given error.
#[derive(Debug, Default)]
pub struct MockEntityResolver {
    folders: Mutex<HashMap<String, FolderEntity>>,
    items: Mutex<HashMap<String, ItemEntity>>,
    failures: Mutex<HashMap<String, ResolveError>>,
    calls: AtomicUsize,
}

impl MockEntityResolver {
    /// Create an empty explorer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a folder named `name`.
    #[must_use]
    pub fn with_folder(self, folder_id: &str, name: &str) -> Self {
        self.put_folder(test_folder(folder_id, name));
        self
    }

    /// Add an item for asset `asset_id` named `name`.
    #[must_use]
    pub fn with_item(self, asset_id: &str, name: &str) -> Self {
        self.put_item(test_item(asset_id, name));
        self
    }

    /// Make lookups of `id` fail.
    #[must_use]
    pub fn with_failure(self, id: &str, error: ResolveError) -> Self {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_owned(), error);
        self
    }

    /// Insert or replace a folder.
    pub fn put_folder(&self, folder: FolderEntity) {
        self.folders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(folder.folder_id.clone(), folder);
    }

    /// Insert or replace an item.
    pub fn put_item(&self, item: ItemEntity) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(item.asset_id.clone(), item);
    }

    /// Number of lookups served.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, id: &str) -> Result<(), ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
        {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EntityResolver for MockEntityResolver {
    async fn folder(&self, folder_id: &str) -> Result<FolderEntity, ResolveError> {
        self.check(folder_id)?;
        self.folders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(folder_id)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(folder_id.to_owned()))
    }

    async fn item(&self, asset_id: &str) -> Result<ItemEntity, ResolveError> {
        self.check(asset_id)?;
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(asset_id)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(asset_id.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Application metadata
// ---------------------------------------------------------------------------

/// In-memory package metadata, served both as a [`MetadataSource`] and as
/// the metadata resource of [`PackageResources`].
#[derive(Debug, Default)]
pub struct MockMetadataSource {
    apps: Mutex<HashMap<String, ApplicationInfo>>,
    lookups: AtomicUsize,
    unreachable: AtomicBool,
}

impl MockMetadataSource {
    /// Create a source with no packages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish metadata for `info.cdn_package`.
    #[must_use]
    pub fn with_app(self, info: ApplicationInfo) -> Self {
        self.apps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(info.cdn_package.clone(), info);
        self
    }

    /// Make every resource request fail with a transport error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of lookups served.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn lookup(&self, cdn_package: &str) -> Option<ApplicationInfo> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.apps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(cdn_package)
            .cloned()
    }
}

#[async_trait]
impl MetadataSource for MockMetadataSource {
    async fn application_info(&self, cdn_package: &str, _version: &str) -> Option<ApplicationInfo> {
        if self.unreachable.load(Ordering::SeqCst) {
            return None;
        }
        self.lookup(cdn_package)
    }
}

#[async_trait]
impl PackageResources for MockMetadataSource {
    async fn resource(
        &self,
        cdn_package: &str,
        _version: &str,
        _path: &str,
    ) -> StorageResult<Option<Value>> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StorageError::Transport {
                status: Some(503),
                message: "cdn unreachable".to_owned(),
            });
        }
        self.lookup(cdn_package)
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Windows and frames
// ---------------------------------------------------------------------------

/// Records every page opened.
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    opened: Mutex<Vec<(String, Target)>>,
    failing: AtomicBool,
}

impl RecordingLauncher {
    /// Create a launcher that accepts every page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make later opens fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Pages opened so far, in order.
    #[must_use]
    pub fn opened(&self) -> Vec<(String, Target)> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl WindowLauncher for RecordingLauncher {
    fn open(&self, url: &str, target: Target) -> PlatformResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PlatformError::Launch {
                url: url.to_owned(),
                message: "popup blocked".to_owned(),
            });
        }
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((url.to_owned(), target));
        Ok(())
    }
}

/// Records every frame released.
#[derive(Debug, Default)]
pub struct RecordingFrameHost {
    released: Mutex<Vec<FrameHandle>>,
}

impl RecordingFrameHost {
    /// Create a frame host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames released so far, in order.
    #[must_use]
    pub fn released(&self) -> Vec<FrameHandle> {
        self.released
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FrameHost for RecordingFrameHost {
    fn release(&self, frame: &FrameHandle) -> PlatformResult<()> {
        self.released
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Blob store
// ---------------------------------------------------------------------------

/// An in-memory blob store whose reads and writes can be made to fail.
#[derive(Debug, Default)]
pub struct FlakyBlobStore {
    inner: MemoryBlobStore,
    fail_gets: AtomicBool,
    fail_puts: AtomicBool,
    gets: AtomicUsize,
    puts: AtomicUsize,
}

impl FlakyBlobStore {
    /// Create an empty, healthy store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make reads fail with a transport error.
    pub fn set_fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    /// Make writes fail with a transport error.
    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Number of reads attempted.
    #[must_use]
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of writes attempted.
    #[must_use]
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Store a document directly, bypassing failure injection.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if the key is invalid.
    pub async fn seed(&self, package: &str, data_name: &str, value: Value) -> StorageResult<()> {
        self.inner.put(&BlobKey::new(package, data_name)?, value).await
    }

    /// Read a document directly, bypassing failure injection.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if the key is invalid.
    pub async fn stored(&self, package: &str, data_name: &str) -> StorageResult<Option<Value>> {
        self.inner.get(&BlobKey::new(package, data_name)?).await
    }

    fn unavailable(operation: &str) -> StorageError {
        StorageError::Transport {
            status: Some(503),
            message: format!("{operation}: service unavailable"),
        }
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn get(&self, key: &BlobKey) -> StorageResult<Option<Value>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(Self::unavailable("get"));
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &BlobKey, value: Value) -> StorageResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(Self::unavailable("put"));
        }
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &BlobKey) -> StorageResult<bool> {
        self.inner.delete(key).await
    }

    async fn list(&self, package: &str) -> StorageResult<Vec<String>> {
        self.inner.list(package).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolver_failures_and_calls() {
        let resolver = MockEntityResolver::new()
            .with_folder("f1", "Docs")
            .with_failure("f2", ResolveError::Transport {
                status: Some(500),
                message: "boom".into(),
            });

        assert_eq!(resolver.folder("f1").await.unwrap().name, "Docs");
        assert!(matches!(
            resolver.folder("f2").await,
            Err(ResolveError::Transport { .. })
        ));
        assert_eq!(
            resolver.item("ghost").await,
            Err(ResolveError::NotFound("ghost".into()))
        );
        assert_eq!(resolver.calls(), 3);
    }

    #[tokio::test]
    async fn test_flaky_store_injects_failures() {
        let store = FlakyBlobStore::new();
        let key = BlobKey::new("pkg", "doc").unwrap();

        store.put(&key, Value::from(1)).await.unwrap();
        store.set_fail_gets(true);
        assert_eq!(store.get(&key).await.unwrap_err().status(), Some(503));
        assert_eq!(store.stored("pkg", "doc").await.unwrap(), Some(Value::from(1)));
        assert_eq!((store.gets(), store.puts()), (1, 1));
    }

    #[test]
    fn test_launcher_records_and_fails() {
        let launcher = RecordingLauncher::new();
        launcher.open("/a", Target::NewTab).unwrap();
        launcher.set_failing(true);
        assert!(launcher.open("/b", Target::NewTab).is_err());
        assert_eq!(launcher.opened(), vec![("/a".to_owned(), Target::NewTab)]);
    }
}
