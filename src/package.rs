use regex::Regex;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, error, warn};

use crate::{
    config::ObjectSettings,
    configuration::raw::{parse_declarations, RawDeclarations},
    errors::ConfigurationErrorKind,
    reflection::TypeDescriptor,
};

/// A module contributing types and object declarations
#[derive(Clone, Debug)]
pub struct Package {
    key: String,
    types: Vec<Arc<TypeDescriptor>>,
    declarations: RawDeclarations,
}

impl Package {
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            types: Vec::new(),
            declarations: RawDeclarations::new(),
        }
    }

    #[must_use]
    pub fn with_type(mut self, descriptor: impl Into<Arc<TypeDescriptor>>) -> Self {
        self.types.push(descriptor.into());
        self
    }

    #[must_use]
    pub fn with_declarations(mut self, declarations: RawDeclarations) -> Self {
        self.declarations.extend(declarations);
        self
    }

    /// Adds the declarations of a YAML document
    ///
    /// # Errors
    /// Returns [`ConfigurationErrorKind::UnparsableDeclarations`] if the document can't be parsed
    pub fn with_declarations_yaml(self, source: &str) -> Result<Self, ConfigurationErrorKind> {
        let declarations = parse_declarations(&self.key, source)?;
        Ok(self.with_declarations(declarations))
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    #[must_use]
    pub fn types(&self) -> &[Arc<TypeDescriptor>] {
        &self.types
    }

    #[inline]
    #[must_use]
    pub const fn declarations(&self) -> &RawDeclarations {
        &self.declarations
    }
}

/// Type names that conventionally name an error
#[inline]
#[must_use]
pub(crate) fn is_error_type_name(type_name: &str) -> bool {
    type_name.ends_with("Exception") || type_name.ends_with("Error")
}

/// Candidate type names per package key.
///
/// Error types are left out unless whitelisted, then the include filters of the settings are applied.
///
/// # Errors
/// Returns [`ConfigurationErrorKind::InvalidFilter`] if an include expression isn't a valid regex
pub fn list_candidate_types(
    packages: &[Package],
    settings: &ObjectSettings,
) -> Result<BTreeMap<String, Vec<String>>, ConfigurationErrorKind> {
    let mut candidates = BTreeMap::new();
    for package in packages {
        let type_names = package
            .types()
            .iter()
            .map(|descriptor| descriptor.name())
            .filter(|name| {
                let excluded = is_error_type_name(name)
                    && !settings.register_error_types.iter().any(|allowed| allowed == name);
                if excluded {
                    debug!(package = package.key(), type_name = name, "Error type skipped");
                }
                !excluded
            })
            .map(ToOwned::to_owned)
            .collect::<Vec<_>>();
        candidates
            .entry(package.key().to_owned())
            .or_insert_with(Vec::new)
            .extend(type_names);
    }

    apply_include_filters(candidates, &settings.include_types)
}

fn apply_include_filters(
    mut candidates: BTreeMap<String, Vec<String>>,
    filters: &BTreeMap<String, Vec<String>>,
) -> Result<BTreeMap<String, Vec<String>>, ConfigurationErrorKind> {
    for (package_key, expressions) in filters {
        let Some(type_names) = candidates.get_mut(package_key) else {
            warn!(package = %package_key, "Include filter for a package that isn't loaded");
            continue;
        };

        let expressions = expressions
            .iter()
            .map(|expression| {
                Regex::new(expression).map_err(|source| {
                    let err = ConfigurationErrorKind::InvalidFilter {
                        setting: format!("includeTypes.{package_key}"),
                        expression: expression.clone(),
                        source,
                    };
                    error!("{}", err);
                    err
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        type_names.retain(|name| expressions.iter().any(|expression| expression.is_match(name)));
        if type_names.is_empty() {
            debug!(package = %package_key, "No type matched the include filter, package dropped");
            candidates.remove(package_key);
        }
    }
    Ok(candidates)
}
