//! Domain types shared across the shell.
//!
//! Field names serialize in camelCase to match the metadata documents
//! published alongside applications.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// An opaque, serializable view description.
///
/// Widgets are produced by plugins and consumed by the renderer; the shell
/// core only stores and forwards them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Widget(pub Value);

impl Widget {
    /// A plain `div` showing `text`.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self(json!({ "tag": "div", "innerText": text.into() }))
    }

    /// Wrap an arbitrary view description.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Whether the widget carries no view.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_null()
    }
}

/// Minimal description of an asset, used to pick applications able to
/// open it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetLightDescription {
    /// Asset kind (e.g. `"package"`, `"story"`).
    pub kind: String,
    /// Display name.
    pub name: String,
    /// Asset identifier.
    pub asset_id: String,
    /// Identifier of the underlying raw resource.
    pub raw_id: String,
}

impl AssetLightDescription {
    /// Look up a field by its serialized name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "kind" => Some(&self.kind),
            "name" => Some(&self.name),
            "assetId" => Some(&self.asset_id),
            "rawId" => Some(&self.raw_id),
            _ => None,
        }
    }
}

/// How an application declares the assets it opens.
///
/// `match_rule` lists field equalities an asset must satisfy; `parameters`
/// maps each instance parameter name to the asset field supplying it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OpenWithParametrization {
    /// Optional label shown in "open with" menus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Field equalities, all of which must hold.
    #[serde(rename = "match", default)]
    pub match_rule: BTreeMap<String, String>,
    /// Instance parameter name to asset field.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

/// Execution section of an application's metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppExecutionInfo {
    /// Whether the application can run without parameters.
    #[serde(default)]
    pub standalone: bool,
    /// Asset-opening declarations.
    #[serde(default)]
    pub parametrized: Vec<OpenWithParametrization>,
}

/// Optional graphics of an application.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationGraphics {
    /// Background view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Widget>,
    /// Icon used for files opened by the application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_icon: Option<Widget>,
    /// Application icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_icon: Option<Widget>,
}

/// Metadata published by an application package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInfo {
    /// Package the application is served from.
    pub cdn_package: String,
    /// Human-readable name.
    pub display_name: String,
    /// Optional graphics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graphics: Option<ApplicationGraphics>,
    /// Execution details.
    #[serde(default)]
    pub execution: AppExecutionInfo,
}

impl ApplicationInfo {
    /// Create metadata with no graphics and no parametrization.
    #[must_use]
    pub fn new(cdn_package: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            cdn_package: cdn_package.into(),
            display_name: display_name.into(),
            graphics: None,
            execution: AppExecutionInfo::default(),
        }
    }

    /// Add an asset-opening declaration.
    #[must_use]
    pub fn with_parametrization(mut self, parametrization: OpenWithParametrization) -> Self {
        self.execution.parametrized.push(parametrization);
        self
    }
}
