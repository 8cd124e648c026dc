//! Opening assets with the applications the session's manifest declares.

use tracing::{debug, info};

use canopy_core::AssetLightDescription;
use canopy_installer::{OpeningApp, default_opening_app, opening_apps};
use canopy_platform::{CreateInstance, Launch, PlatformHandle};

use crate::environment::Environment;
use crate::error::ShellResult;

impl Environment {
    /// The first application able to open `asset`.
    ///
    /// # Errors
    ///
    /// Returns the manifest resolution error.
    pub async fn default_opening_app(
        &self,
        asset: &AssetLightDescription,
    ) -> ShellResult<Option<OpeningApp>> {
        let apps = self.installer().applications_info().await?;
        Ok(default_opening_app(&apps, asset))
    }

    /// Every application able to open `asset`, with the declaration that
    /// matched.
    ///
    /// # Errors
    ///
    /// Returns the manifest resolution error.
    pub async fn opening_apps(&self, asset: &AssetLightDescription) -> ShellResult<Vec<OpeningApp>> {
        let apps = self.installer().applications_info().await?;
        Ok(opening_apps(&apps, asset))
    }

    /// Open `asset` with its default application, focused.
    ///
    /// Returns `None` when no application can open it.
    ///
    /// # Errors
    ///
    /// Returns the manifest resolution error or the platform's launch error.
    pub async fn try_open_with_default(
        &self,
        asset: &AssetLightDescription,
    ) -> ShellResult<Option<Launch>> {
        let Some(app) = self.default_opening_app(asset).await? else {
            debug!(asset_id = %asset.asset_id, kind = %asset.kind, "no application opens asset");
            return Ok(None);
        };

        let request = CreateInstance::new(app.app_info.cdn_package.as_str())
            .with_version(self.config().applications.default_version.as_str())
            .with_parameters(app.parameters_for(asset))
            .with_focus(true);
        let platform: &dyn PlatformHandle = self.platform().as_ref();
        let launch = platform.create_instance(request).await?;
        info!(
            asset_id = %asset.asset_id,
            cdn_package = %app.app_info.cdn_package,
            url = launch.url(),
            "asset opened"
        );
        Ok(Some(launch))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use canopy_config::Config;
    use canopy_favorites::{EntityResolver, FolderEntity, ItemEntity, ResolveError};
    use canopy_installer::ScriptSource;
    use canopy_platform::{PlatformResult, Target, WindowLauncher};
    use canopy_storage::StorageResult;
    use serde_json::{Value, json};

    use super::*;
    use crate::requests::PackageResources;

    struct Cdn;

    #[async_trait]
    impl PackageResources for Cdn {
        async fn resource(&self, cdn_package: &str, _: &str, _: &str) -> StorageResult<Option<Value>> {
            let info = match cdn_package {
                "@youwol/stories" => json!({
                    "cdnPackage": cdn_package,
                    "displayName": "Stories",
                    "execution": {
                        "parametrized": [
                            { "match": { "kind": "story" }, "parameters": { "id": "rawId" } }
                        ]
                    }
                }),
                "@youwol/text" => json!({
                    "cdnPackage": cdn_package,
                    "displayName": "Text",
                    "execution": { "parametrized": [ { "parameters": { "asset": "assetId" } } ] }
                }),
                _ => return Ok(None),
            };
            Ok(Some(info))
        }
    }

    struct Explorer;

    #[async_trait]
    impl EntityResolver for Explorer {
        async fn folder(&self, id: &str) -> Result<FolderEntity, ResolveError> {
            Err(ResolveError::NotFound(id.to_owned()))
        }

        async fn item(&self, id: &str) -> Result<ItemEntity, ResolveError> {
            Err(ResolveError::NotFound(id.to_owned()))
        }
    }

    struct NoWindows;

    impl WindowLauncher for NoWindows {
        fn open(&self, _: &str, _: Target) -> PlatformResult<()> {
            Ok(())
        }
    }

    async fn environment(applications: &str) -> Arc<Environment> {
        let env = Environment::builder(Config::default())
            .package_resources(Arc::new(Cdn))
            .entity_resolver(Arc::new(Explorer))
            .window_launcher(Arc::new(NoWindows))
            .build()
            .unwrap();
        let script = format!("[[manifests]]\nid = \"apps\"\napplications = {applications}\n");
        env.installer()
            .set_installer_script(&ScriptSource::declarative(script))
            .await
            .unwrap();
        env
    }

    fn asset(kind: &str) -> AssetLightDescription {
        AssetLightDescription {
            kind: kind.into(),
            name: "Notes".into(),
            asset_id: "asset-1".into(),
            raw_id: "raw-1".into(),
        }
    }

    #[tokio::test]
    async fn test_opening_apps_in_manifest_order() {
        let env = environment(r#"["@youwol/stories", "@youwol/text", "@youwol/ghost"]"#).await;

        let names: Vec<_> = env
            .opening_apps(&asset("story"))
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.app_info.display_name)
            .collect();
        assert_eq!(names, vec!["Stories", "Text"]);

        let default = env.default_opening_app(&asset("data")).await.unwrap().unwrap();
        assert_eq!(default.app_info.display_name, "Text");
    }

    #[tokio::test]
    async fn test_try_open_with_default_creates_focused_instance() {
        let env = environment(r#"["@youwol/stories"]"#).await;

        let launch = env.try_open_with_default(&asset("story")).await.unwrap().unwrap();
        let app = launch.running_app().unwrap();

        assert_eq!(app.cdn_package(), "@youwol/stories");
        assert_eq!(app.version(), "latest");
        assert_eq!(
            app.parameters(),
            &BTreeMap::from([("id".to_owned(), "raw-1".to_owned())])
        );
        assert_eq!(env.platform().focused_id(), Some(app.instance_id()));
    }

    #[tokio::test]
    async fn test_nothing_opens_unknown_kind() {
        let env = environment(r#"["@youwol/stories"]"#).await;
        assert!(env.try_open_with_default(&asset("data")).await.unwrap().is_none());
        assert!(env.platform().running_applications().is_empty());
    }
}
