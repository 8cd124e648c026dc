//! Matching assets to the applications able to open them.

use std::collections::BTreeMap;

use canopy_core::{ApplicationInfo, AssetLightDescription, OpenWithParametrization};
use tracing::debug;

/// An application together with the declaration that matched.
#[derive(Debug, Clone, PartialEq)]
pub struct OpeningApp {
    /// Application metadata.
    pub app_info: ApplicationInfo,
    /// The declaration.
    pub parametrization: OpenWithParametrization,
}

impl OpeningApp {
    /// Instance parameters for opening `asset`.
    #[must_use]
    pub fn parameters_for(&self, asset: &AssetLightDescription) -> BTreeMap<String, String> {
        evaluate_parameters(asset, &self.parametrization)
    }
}

/// Whether every field equality of the declaration holds for `asset`.
///
/// A declaration without equalities matches every asset.
#[must_use]
pub fn evaluate_match(asset: &AssetLightDescription, parametrization: &OpenWithParametrization) -> bool {
    parametrization
        .match_rule
        .iter()
        .all(|(field, expected)| asset.field(field) == Some(expected.as_str()))
}

/// Instance parameters taken from `asset` fields.
///
/// Parameters naming an unknown field are left out.
#[must_use]
pub fn evaluate_parameters(
    asset: &AssetLightDescription,
    parametrization: &OpenWithParametrization,
) -> BTreeMap<String, String> {
    parametrization
        .parameters
        .iter()
        .filter_map(|(name, field)| match asset.field(field) {
            Some(value) => Some((name.clone(), value.to_owned())),
            None => {
                debug!(parameter = %name, field = %field, "unknown asset field in parametrization");
                None
            },
        })
        .collect()
}

/// Every (application, declaration) pair, in application order.
#[must_use]
pub fn flat_parametrizations(apps: &[ApplicationInfo]) -> Vec<OpeningApp> {
    apps.iter()
        .flat_map(|app| {
            app.execution
                .parametrized
                .iter()
                .map(move |parametrization| OpeningApp {
                    app_info: app.clone(),
                    parametrization: parametrization.clone(),
                })
        })
        .collect()
}

/// The first pair whose declaration matches `asset`.
#[must_use]
pub fn default_opening_app(
    apps: &[ApplicationInfo],
    asset: &AssetLightDescription,
) -> Option<OpeningApp> {
    flat_parametrizations(apps)
        .into_iter()
        .find(|candidate| evaluate_match(asset, &candidate.parametrization))
}

/// Every pair whose declaration matches `asset`.
#[must_use]
pub fn opening_apps(apps: &[ApplicationInfo], asset: &AssetLightDescription) -> Vec<OpeningApp> {
    flat_parametrizations(apps)
        .into_iter()
        .filter(|candidate| evaluate_match(asset, &candidate.parametrization))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story() -> AssetLightDescription {
        AssetLightDescription {
            kind: "story".into(),
            name: "Notes".into(),
            asset_id: "asset-1".into(),
            raw_id: "raw-1".into(),
        }
    }

    fn rule(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn opens(kind: &str) -> OpenWithParametrization {
        OpenWithParametrization {
            name: None,
            match_rule: rule(&[("kind", kind)]),
            parameters: rule(&[("id", "rawId")]),
        }
    }

    #[test]
    fn test_match_all_equalities() {
        let mut p = opens("story");
        assert!(evaluate_match(&story(), &p));

        p.match_rule.insert("name".into(), "Other".into());
        assert!(!evaluate_match(&story(), &p));

        assert!(evaluate_match(&story(), &OpenWithParametrization::default()));
    }

    #[test]
    fn test_parameters_from_fields() {
        let mut p = opens("story");
        p.parameters.insert("missing".into(), "nope".into());
        let params = evaluate_parameters(&story(), &p);
        assert_eq!(params, rule(&[("id", "raw-1")]));
    }

    #[test]
    fn test_default_and_all_opening_apps() {
        let apps = vec![
            ApplicationInfo::new("@youwol/flux", "Flux").with_parametrization(opens("flux-project")),
            ApplicationInfo::new("@youwol/stories", "Stories").with_parametrization(opens("story")),
            ApplicationInfo::new("@youwol/text", "Text")
                .with_parametrization(OpenWithParametrization::default()),
        ];

        assert_eq!(flat_parametrizations(&apps).len(), 3);

        let default = default_opening_app(&apps, &story()).unwrap();
        assert_eq!(default.app_info.cdn_package, "@youwol/stories");
        assert_eq!(default.parameters_for(&story()), rule(&[("id", "raw-1")]));

        let all: Vec<String> = opening_apps(&apps, &story())
            .into_iter()
            .map(|a| a.app_info.cdn_package)
            .collect();
        assert_eq!(all, vec!["@youwol/stories", "@youwol/text"]);
    }

    #[test]
    fn test_no_opening_app() {
        assert!(default_opening_app(&[], &story()).is_none());
    }
}
