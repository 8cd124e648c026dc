//! Identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Globally unique identifier of a running application instance.
///
/// Generated once when the instance is created and carried in the
/// instance URL as the `instance-id` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    /// Create a new random instance ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an instance ID from a UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an instance ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInstanceId`] if `value` is not a UUID.
    pub fn parse(value: &str) -> CoreResult<Self> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|e| CoreError::InvalidInstanceId {
                value: value.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InstanceId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
