use std::collections::BTreeMap;
use tracing::{debug, error};

use crate::{configuration::ObjectConfiguration, errors::ConfigurationErrorKind, scope::Scope};

/// The registered object configurations, one per object name.
///
/// Until [`Registry::finalize`] is called a registration replaces an existing one.
/// Afterwards the scope of a registered name can't change anymore.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    configurations: BTreeMap<String, ObjectConfiguration>,
    lowercase_names: BTreeMap<String, String>,
    finalized: bool,
}

impl Registry {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            configurations: BTreeMap::new(),
            lowercase_names: BTreeMap::new(),
            finalized: false,
        }
    }

    /// # Errors
    /// Returns [`ConfigurationErrorKind::DuplicateConfiguration`] if the registry is finalized
    /// and the name is already registered with a different scope
    pub fn register(&mut self, configuration: ObjectConfiguration) -> Result<(), ConfigurationErrorKind> {
        let name = configuration.object_name();

        if let Some(registered) = self.configurations.get(name) {
            if self.finalized && registered.scope() != configuration.scope() {
                let err = ConfigurationErrorKind::DuplicateConfiguration {
                    name: name.to_owned(),
                    registered: registered.scope(),
                    requested: configuration.scope(),
                };
                error!("{}", err);
                return Err(err);
            }
            debug!(object = name, "Registration replaced");
        }

        self.lowercase_names.insert(name.to_lowercase(), name.to_owned());
        self.configurations.insert(name.to_owned(), configuration);
        Ok(())
    }

    #[inline]
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    #[inline]
    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }

    #[inline]
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&ObjectConfiguration> {
        self.configurations.get(name)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.configurations.contains_key(name)
    }

    /// Registered spelling of a name, matched case-insensitively
    #[must_use]
    pub fn case_sensitive_name(&self, name: &str) -> Option<&str> {
        self.lowercase_names.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Object name whose configuration instantiates `type_name`.
    /// An object named after the type wins over aliases of it.
    #[must_use]
    pub fn object_name_by_type_name(&self, type_name: &str) -> Option<&str> {
        if let Some((name, _)) = self
            .configurations
            .get_key_value(type_name)
            .filter(|(_, configuration)| configuration.type_name() == type_name)
        {
            return Some(name.as_str());
        }
        self.configurations
            .values()
            .find(|configuration| configuration.type_name() == type_name)
            .map(ObjectConfiguration::object_name)
    }

    pub fn names_by_scope(&self, scope: Scope) -> impl Iterator<Item = &str> + '_ {
        self.configurations
            .values()
            .filter(move |configuration| configuration.scope() == scope)
            .map(ObjectConfiguration::object_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectConfiguration> + '_ {
        self.configurations.values()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }
}

impl FromIterator<ObjectConfiguration> for Registry {
    /// Later configurations of the same name replace earlier ones
    fn from_iter<I: IntoIterator<Item = ObjectConfiguration>>(configurations: I) -> Self {
        let mut registry = Self::new();
        for configuration in configurations {
            let name = configuration.object_name().to_owned();
            registry.lowercase_names.insert(name.to_lowercase(), name.clone());
            registry.configurations.insert(name, configuration);
        }
        registry
    }
}
