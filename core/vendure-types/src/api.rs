//! The API surfaces a schema can be built for.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two GraphQL endpoints. Each is built from its own merged
/// document; nothing is shared between the two builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiType {
    Admin,
    Shop,
}

impl ApiType {
    /// Both surfaces, admin first.
    pub const ALL: [ApiType; 2] = [ApiType::Admin, ApiType::Shop];

    /// Returns the lowercase name used in config files and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Shop => "shop",
        }
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "shop" => Ok(Self::Shop),
            other => Err(crate::Error::InvalidApiType(other.to_string())),
        }
    }
}
