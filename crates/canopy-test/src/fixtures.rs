//! Test fixtures for common types.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use canopy_core::{ApplicationInfo, AssetLightDescription, OpenWithParametrization};
use canopy_favorites::{FolderEntity, ItemEntity};
use canopy_installer::{Contributions, GeneratorRef, Manifest, generator_fn};

/// Create a folder in the test drive.
#[must_use]
pub fn test_folder(folder_id: &str, name: &str) -> FolderEntity {
    FolderEntity {
        folder_id: folder_id.to_owned(),
        parent_folder_id: "root".to_owned(),
        group_id: "private".to_owned(),
        drive_id: "drive".to_owned(),
        name: name.to_owned(),
    }
}

/// Create an item for asset `asset_id` in the test drive.
#[must_use]
pub fn test_item(asset_id: &str, name: &str) -> ItemEntity {
    ItemEntity {
        item_id: format!("item-{asset_id}"),
        asset_id: asset_id.to_owned(),
        raw_id: format!("raw-{asset_id}"),
        folder_id: "root".to_owned(),
        group_id: "private".to_owned(),
        drive_id: "drive".to_owned(),
        name: name.to_owned(),
        kind: "data".to_owned(),
        borrowed: false,
    }
}

/// Encode a group path the way group ids are persisted.
#[must_use]
pub fn test_group_id(path: &str) -> String {
    STANDARD.encode(path)
}

/// Create an asset description of the given kind.
#[must_use]
pub fn test_asset(kind: &str) -> AssetLightDescription {
    AssetLightDescription {
        kind: kind.to_owned(),
        name: "Notes".to_owned(),
        asset_id: "asset-1".to_owned(),
        raw_id: "raw-1".to_owned(),
    }
}

/// A declaration opening assets of `kind`, passing the raw id as `id`.
#[must_use]
pub fn opens_kind(kind: &str) -> OpenWithParametrization {
    OpenWithParametrization {
        name: None,
        match_rule: BTreeMap::from([("kind".to_owned(), kind.to_owned())]),
        parameters: BTreeMap::from([("id".to_owned(), "rawId".to_owned())]),
    }
}

/// Metadata for an application opening assets of `kind`.
#[must_use]
pub fn test_app_info(cdn_package: &str, display_name: &str, kind: &str) -> ApplicationInfo {
    ApplicationInfo::new(cdn_package, display_name).with_parametrization(opens_kind(kind))
}

/// A generator contributing `manifest`, the same object on every run.
#[must_use]
pub fn manifest_generator(name: &str, manifest: Manifest) -> GeneratorRef {
    let manifest = Arc::new(manifest);
    generator_fn(name.to_owned(), move |installer| {
        let manifest = Arc::clone(&manifest);
        async move { Ok(installer.with(Contributions::new().manifest(manifest))) }
    })
}

/// Like [`manifest_generator`], counting its runs in `calls`.
#[must_use]
pub fn counting_generator(name: &str, calls: Arc<AtomicUsize>, manifest: Manifest) -> GeneratorRef {
    let manifest = Arc::new(manifest);
    generator_fn(name.to_owned(), move |installer| {
        calls.fetch_add(1, Ordering::SeqCst);
        let manifest = Arc::clone(&manifest);
        async move { Ok(installer.with(Contributions::new().manifest(manifest))) }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_favorites::decode_group;
    use canopy_installer::Installer;

    #[test]
    fn test_group_id_decodes() {
        let group = decode_group(&test_group_id("/youwol-users")).unwrap();
        assert_eq!(group.name(), "/youwol-users");
    }

    #[tokio::test]
    async fn test_counting_generator() {
        let calls = Arc::new(AtomicUsize::new(0));
        let generator = counting_generator("g", Arc::clone(&calls), Manifest::new("m"));
        let installer = generator.generate(Installer::new()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(installer.resolved_manifests().len(), 1);
    }
}
