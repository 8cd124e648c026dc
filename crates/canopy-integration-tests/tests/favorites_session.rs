//! Integration tests for favorites across sessions.

use std::sync::Arc;

use serde_json::json;

use canopy_favorites::{FavoriteKind, FavoritesError};
use canopy_installer::ScriptSource;
use canopy_shell::ShellError;
use canopy_test::{FlakyBlobStore, MockEntityResolver, TestShell, test_group_id};

fn explorer() -> MockEntityResolver {
    MockEntityResolver::new()
        .with_folder("folder-1", "Docs")
        .with_folder("shared-1", "Shared")
        .with_item("asset-1", "Notes")
        .with_item("asset-2", "Slides")
        .with_item("shared-1", "Shared item")
        .with_item("app-1", "Stories")
}

fn shell_on(store: Arc<FlakyBlobStore>) -> TestShell {
    TestShell::builder()
        .store(store)
        .explorer(explorer())
        .build()
        .unwrap()
}

async fn ids(shell: &TestShell, kind: FavoriteKind) -> Vec<String> {
    shell
        .env
        .favorites()
        .get(kind)
        .await
        .unwrap()
        .iter()
        .map(|e| e.id().to_owned())
        .collect()
}

#[tokio::test]
async fn test_toggle_twice_restores_membership() {
    let store = Arc::new(FlakyBlobStore::new());
    store
        .seed(
            "@youwol/os-core",
            "favorites",
            json!({ "favoriteItems": [{ "id": "asset-1" }] }),
        )
        .await
        .unwrap();
    let shell = shell_on(store);
    let favorites = shell.env.favorites();

    assert!(favorites.toggle_favorite_item("asset-2").await.unwrap());
    assert_eq!(ids(&shell, FavoriteKind::Items).await, vec!["asset-1", "asset-2"]);
    assert!(!favorites.toggle_favorite_item("asset-2").await.unwrap());
    assert_eq!(ids(&shell, FavoriteKind::Items).await, vec!["asset-1"]);

    assert!(!favorites.toggle_favorite_item("asset-1").await.unwrap());
    assert!(favorites.toggle_favorite_item("asset-1").await.unwrap());
    assert_eq!(ids(&shell, FavoriteKind::Items).await, vec!["asset-1"]);
}

#[tokio::test]
async fn test_remove_only_touches_holding_collections() {
    let store = Arc::new(FlakyBlobStore::new());
    store
        .seed(
            "@youwol/os-core",
            "favorites",
            json!({
                "favoriteFolders": [{ "id": "folder-1" }, { "id": "shared-1" }],
                "favoriteItems": [{ "id": "asset-1" }],
            }),
        )
        .await
        .unwrap();
    let shell = shell_on(store.clone());

    let removed = shell.env.favorites().remove("shared-1").await.unwrap();

    assert_eq!(removed, vec![FavoriteKind::Folders]);
    assert_eq!(ids(&shell, FavoriteKind::Folders).await, vec!["folder-1"]);
    assert_eq!(ids(&shell, FavoriteKind::Items).await, vec!["asset-1"]);

    let stored = store.stored("@youwol/os-core", "favorites").await.unwrap().unwrap();
    assert_eq!(stored["favoriteFolders"], json!([{ "id": "folder-1" }]));
    assert_eq!(stored["favoriteItems"], json!([{ "id": "asset-1" }]));
}

#[tokio::test]
async fn test_favorites_survive_a_new_session() {
    let store = Arc::new(FlakyBlobStore::new());
    let group = test_group_id("/youwol-users");

    let first = shell_on(store.clone());
    first.env.favorites().toggle_favorite_folder("folder-1").await.unwrap();
    first.env.favorites().toggle_favorite_group(&group).await.unwrap();
    first.env.favorites().toggle_favorite_application("app-1").await.unwrap();

    let second = shell_on(store);
    assert_eq!(ids(&second, FavoriteKind::Folders).await, vec!["folder-1"]);
    assert_eq!(ids(&second, FavoriteKind::Groups).await, vec![group]);
    assert_eq!(ids(&second, FavoriteKind::Applications).await, vec!["app-1"]);
    assert!(ids(&second, FavoriteKind::Items).await.is_empty());
}

#[tokio::test]
async fn test_unresolvable_entries_are_dropped_and_reported() {
    let store = Arc::new(FlakyBlobStore::new());
    store
        .seed(
            "@youwol/os-core",
            "favorites",
            json!({ "favoriteItems": [{ "id": "asset-1" }, { "id": "deleted" }] }),
        )
        .await
        .unwrap();
    let shell = shell_on(store);
    let mut errors = shell.env.subscribe_errors();

    assert_eq!(ids(&shell, FavoriteKind::Items).await, vec!["asset-1"]);
    assert!(errors.try_recv().is_some());
}

#[tokio::test]
async fn test_default_favorites_are_offered_once() {
    let store = Arc::new(FlakyBlobStore::new());
    let script = ScriptSource::declarative(
        r#"
        [[manifests]]
        id = "defaults"
        [manifests.favorites]
        items = ["asset-1"]
        applications = ["app-1"]
        "#,
    );

    let first = shell_on(store.clone());
    first.env.installer().set_installer_script(&script).await.unwrap();
    let added = first.env.apply_default_favorites().await.unwrap();
    assert_eq!(
        added,
        vec![
            (FavoriteKind::Items, "asset-1".to_owned()),
            (FavoriteKind::Applications, "app-1".to_owned()),
        ]
    );

    first.env.favorites().toggle_favorite_item("asset-1").await.unwrap();

    let second = shell_on(store);
    assert!(second.env.apply_default_favorites().await.unwrap().is_empty());
    assert!(ids(&second, FavoriteKind::Items).await.is_empty());
    assert_eq!(ids(&second, FavoriteKind::Applications).await, vec!["app-1"]);
}

#[tokio::test]
async fn test_failed_save_reports_and_keeps_collection() {
    let store = Arc::new(FlakyBlobStore::new());
    let shell = shell_on(store.clone());
    let mut errors = shell.env.subscribe_errors();

    store.set_fail_puts(true);
    let err = shell
        .env
        .favorites()
        .toggle_favorite_item("asset-1")
        .await
        .unwrap_err();

    assert!(matches!(err, FavoritesError::Save(_)));
    assert_eq!(ids(&shell, FavoriteKind::Items).await, vec!["asset-1"]);
    let event = errors.try_recv().unwrap();
    let failure = event.as_transport_error().unwrap();
    assert_eq!(failure.status, Some(503));
    assert!(store.stored("@youwol/os-core", "favorites").await.unwrap().is_none());
}

#[tokio::test]
async fn test_unreachable_store_fails_fetch() {
    let store = Arc::new(FlakyBlobStore::new());
    store.set_fail_gets(true);
    let shell = shell_on(store.clone());

    let err = shell.env.favorites().get(FavoriteKind::Items).await.unwrap_err();
    assert!(matches!(err, FavoritesError::Fetch(_)));

    let err = shell.env.apply_default_favorites().await.unwrap_err();
    assert!(matches!(err, ShellError::Storage(_)));

    store.set_fail_gets(false);
    assert!(shell.env.favorites().get(FavoriteKind::Items).await.unwrap().is_empty());
}
