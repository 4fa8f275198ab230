use serde::Deserialize;
use std::collections::BTreeMap;

use crate::{errors::ConfigurationErrorKind, settings::Settings};

pub const DEFAULT_INTERNAL_NAMESPACE: &str = "Objectcore.";

/// Object management settings, read from [`ObjectSettings::PATH`] of the settings tree.
///
/// ## Fields
/// - `include_types`:
///   Per-package include expressions. A type is kept when its name matches any of them;
///   a package whose list filters out every type is dropped.
///   Packages without an entry are kept unfiltered.
/// - `register_error_types`:
///   Type names ending in `Exception` or `Error` that are registered anyway.
/// - `internal_namespace`:
///   Type-name prefix of framework-internal objects. Their shutdown hooks run last.
/// - `exclude_types_from_constructor_autowiring`:
///   Expressions of type names whose constructor arguments are never autowired.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectSettings {
    pub include_types: BTreeMap<String, Vec<String>>,
    pub register_error_types: Vec<String>,
    pub internal_namespace: String,
    pub exclude_types_from_constructor_autowiring: Vec<String>,
}

impl ObjectSettings {
    pub const PATH: &'static str = "objectcore.object";

    /// # Errors
    /// Returns [`ConfigurationErrorKind::InvalidSettings`] if the section has an unexpected shape
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigurationErrorKind> {
        settings.section(Self::PATH)
    }

    #[inline]
    #[must_use]
    pub fn is_internal_type(&self, type_name: &str) -> bool {
        !self.internal_namespace.is_empty() && type_name.starts_with(&self.internal_namespace)
    }
}

impl Default for ObjectSettings {
    fn default() -> Self {
        Self {
            include_types: BTreeMap::new(),
            register_error_types: Vec::new(),
            internal_namespace: DEFAULT_INTERNAL_NAMESPACE.to_owned(),
            exclude_types_from_constructor_autowiring: Vec::new(),
        }
    }
}
