use core::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationErrorKind;

/// Sharing policy of an object name
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// A fresh instance on every resolution
    #[default]
    Prototype,
    /// One instance for the lifetime of the container
    Singleton,
    /// One instance per logical session, persisted across requests
    Session,
}

impl Scope {
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Scope::Prototype => "prototype",
            Scope::Singleton => "singleton",
            Scope::Session => "session",
        }
    }

    /// Whether instances are kept in the instance registry after the first build
    #[inline]
    #[must_use]
    pub const fn is_cached(&self) -> bool {
        !matches!(self, Scope::Prototype)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scope {
    type Err = ConfigurationErrorKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "prototype" => Ok(Scope::Prototype),
            "singleton" => Ok(Scope::Singleton),
            "session" => Ok(Scope::Session),
            _ => Err(ConfigurationErrorKind::InvalidScope { value: value.to_owned() }),
        }
    }
}
