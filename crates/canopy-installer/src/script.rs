//! Persisted installer scripts.
//!
//! A user's installer is stored as a [`ScriptSource`]. The executable part
//! (`js_src`) is a declarative TOML [`InstallerDocument`]: library paths to
//! install plus inline manifests. `ts_src` is the author's copy, kept
//! verbatim for editors.
//!
//! ```toml
//! from_libraries = ["@youwol/installers-youwol.youwolDev"]
//!
//! [[manifests]]
//! id = "my-apps"
//! applications = ["@youwol/stories"]
//!
//! [manifests.favorites]
//! items = ["aXRlbS0x"]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{InstallerError, InstallerResult};
use crate::installer::{Contributions, Installer};
use crate::manifest::{ApplicationData, DefaultFavorites, Manifest};

/// Source text of an installer or preferences script.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptSource {
    /// Author's source.
    #[serde(default)]
    pub ts_src: String,
    /// Executable source.
    #[serde(default)]
    pub js_src: String,
}

impl ScriptSource {
    /// Create a script whose two sources are identical.
    #[must_use]
    pub fn declarative(src: impl Into<String>) -> Self {
        let src = src.into();
        Self {
            ts_src: src.clone(),
            js_src: src,
        }
    }

    /// The built-in installer: install the given default libraries.
    #[must_use]
    pub fn default_installer(libraries: &[String]) -> Self {
        let libraries = toml::Value::Array(
            libraries
                .iter()
                .cloned()
                .map(toml::Value::String)
                .collect(),
        );
        Self::declarative(format!("from_libraries = {libraries}\n"))
    }

    /// Whether there is nothing to execute.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.js_src.trim().is_empty()
    }
}

/// An inline manifest of an installer document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ManifestDocument {
    /// Manifest id.
    pub id: String,
    /// Declared application packages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applications: Vec<String>,
    /// Data attached to application packages.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub applications_data: BTreeMap<String, ApplicationData>,
    /// Default favorites.
    #[serde(default)]
    pub favorites: DefaultFavorites,
}

impl From<ManifestDocument> for Manifest {
    fn from(doc: ManifestDocument) -> Self {
        let mut manifest = Manifest::new(doc.id)
            .with_applications(doc.applications)
            .with_favorites(doc.favorites);
        manifest.applications_data = doc.applications_data;
        manifest
    }
}

/// Declarative installer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InstallerDocument {
    /// Library paths, `"<package>.<export.path>"`.
    #[serde(default)]
    pub from_libraries: Vec<String>,
    /// Inline manifests.
    #[serde(default)]
    pub manifests: Vec<ManifestDocument>,
}

impl InstallerDocument {
    /// Parse a document.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Script`] if the source is not a valid
    /// document.
    pub fn parse(src: &str) -> InstallerResult<Self> {
        toml::from_str(src).map_err(|e| InstallerError::Script(e.to_string()))
    }

    /// Parse the executable part of a script.
    ///
    /// # Errors
    ///
    /// See [`parse`](Self::parse).
    pub fn from_script(script: &ScriptSource) -> InstallerResult<Self> {
        Self::parse(&script.js_src)
    }

    /// Extend `installer` with this document's contributions.
    #[must_use]
    pub fn apply(&self, installer: &Installer) -> Installer {
        let contributions = self.manifests.iter().cloned().fold(
            Contributions::new().libraries(self.from_libraries.iter().cloned()),
            |acc, doc| acc.manifest(Manifest::from(doc)),
        );
        installer.with(contributions)
    }

    /// Render back to source text.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Script`] if application data holds values
    /// TOML cannot represent (e.g. `null`).
    pub fn to_source(&self) -> InstallerResult<String> {
        toml::to_string(self).map_err(|e| InstallerError::Script(e.to_string()))
    }
}

/// Build an installer from a script.
///
/// # Errors
///
/// Returns [`InstallerError::Script`] if the script cannot be parsed.
pub fn installer_from_script(script: &ScriptSource) -> InstallerResult<Installer> {
    Ok(InstallerDocument::from_script(script)?.apply(&Installer::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_installer_round_trips_libraries() {
        let script = ScriptSource::default_installer(&["@youwol/installers-youwol.youwolDev".into()]);
        assert!(!script.is_blank());

        let doc = InstallerDocument::from_script(&script).unwrap();
        assert_eq!(doc.from_libraries, vec!["@youwol/installers-youwol.youwolDev"]);
        assert!(doc.manifests.is_empty());
    }

    #[test]
    fn test_parse_inline_manifests() {
        let doc = InstallerDocument::parse(
            r#"
            from_libraries = ["lib.entry"]

            [[manifests]]
            id = "mine"
            applications = ["@youwol/stories"]

            [manifests.favorites]
            items = ["i1"]

            [manifests.applications_data."@youwol/stories"]
            openWith = [{ kind = "story" }]
        "#,
        )
        .unwrap();

        let installer = doc.apply(&Installer::new());
        assert_eq!(installer.library_manifests(), ["lib.entry".to_string()]);
        let manifest = &installer.resolved_manifests()[0];
        assert_eq!(manifest.applications, vec!["@youwol/stories"]);
        assert_eq!(manifest.favorites.items, vec!["i1"]);
        assert_eq!(
            manifest.applications_data["@youwol/stories"]["openWith"][0]["kind"],
            "story"
        );
    }

    #[test]
    fn test_document_to_source_parses_back() {
        let doc = InstallerDocument {
            from_libraries: vec!["lib.entry".into()],
            manifests: vec![ManifestDocument {
                id: "mine".into(),
                applications: vec!["p1".into()],
                ..ManifestDocument::default()
            }],
        };
        let src = doc.to_source().unwrap();
        assert_eq!(InstallerDocument::parse(&src).unwrap(), doc);
    }

    #[test]
    fn test_invalid_script() {
        let err = InstallerDocument::parse("from_libraries = 3").unwrap_err();
        assert!(matches!(err, InstallerError::Script(_)));
    }

    #[test]
    fn test_blank_script() {
        assert!(ScriptSource::default().is_blank());
        assert!(ScriptSource::declarative("  \n").is_blank());
    }

    #[test]
    fn test_script_source_serializes_camel_case() {
        let json = serde_json::to_value(ScriptSource::declarative("x")).unwrap();
        assert_eq!(json["tsSrc"], "x");
        assert_eq!(json["jsSrc"], "x");
    }
}
