//! Application URL scheme.
//!
//! Applications are served under `<prefix>/<package>/<version>`. An
//! embedded instance carries its id as the `instance-id` query parameter,
//! followed by its own parameters:
//!
//! ```text
//! /applications/@youwol/stories/latest?instance-id=<uuid>&id=story-1
//! ```

use std::collections::BTreeMap;

use canopy_core::InstanceId;
use url::form_urlencoded;

/// Prefix applications are served under.
pub const DEFAULT_URL_PREFIX: &str = "/applications";

/// Version used when a request names none.
pub const DEFAULT_VERSION: &str = "latest";

/// Query parameter carrying the instance id.
pub const INSTANCE_ID_PARAM: &str = "instance-id";

/// Builds application URLs under a fixed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlScheme {
    prefix: String,
}

impl UrlScheme {
    /// A scheme rooted at `prefix`. Trailing slashes are dropped.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_owned(),
        }
    }

    /// The prefix, without trailing slash.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn base(&self, package: &str, version: &str) -> String {
        format!("{}/{package}/{version}", self.prefix)
    }

    /// URL of an application opened outside the registry.
    ///
    /// The query string is omitted when there are no parameters.
    #[must_use]
    pub fn app_url(
        &self,
        package: &str,
        version: &str,
        parameters: &BTreeMap<String, String>,
    ) -> String {
        let base = self.base(package, version);
        if parameters.is_empty() {
            return base;
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(parameters)
            .finish();
        format!("{base}?{query}")
    }

    /// URL of an embedded instance.
    #[must_use]
    pub fn instance_url(
        &self,
        package: &str,
        version: &str,
        instance_id: InstanceId,
        parameters: &BTreeMap<String, String>,
    ) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair(INSTANCE_ID_PARAM, &instance_id.to_string())
            .extend_pairs(parameters)
            .finish();
        format!("{}?{query}", self.base(package, version))
    }
}

impl Default for UrlScheme {
    fn default() -> Self {
        Self::new(DEFAULT_URL_PREFIX)
    }
}

/// [`UrlScheme::app_url`] under the default prefix.
#[must_use]
pub fn app_url(package: &str, version: &str, parameters: &BTreeMap<String, String>) -> String {
    UrlScheme::default().app_url(package, version, parameters)
}

/// The instance id carried by a location (full URL, path with query, or
/// bare `?query`).
///
/// Returns `None` when the parameter is absent or not a valid id.
#[must_use]
pub fn instance_id_from_location(location: &str) -> Option<InstanceId> {
    let (_, query) = location.split_once('?')?;
    let query = query.split_once('#').map_or(query, |(q, _)| q);
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == INSTANCE_ID_PARAM)
        .and_then(|(_, value)| InstanceId::parse(&value).ok())
}
