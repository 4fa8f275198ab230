pub(crate) mod builder;
pub mod raw;

use serde_json::Value;
use std::collections::BTreeMap;

use crate::scope::Scope;

pub use builder::ConfigurationBuilder;

pub const DEFAULT_INITIALIZATION_METHOD: &str = "initializeObject";
pub const DEFAULT_SHUTDOWN_METHOD: &str = "shutdownObject";

/// Where an injected argument or property value comes from
#[derive(Clone, Debug, PartialEq)]
pub enum InjectionSource {
    /// A literal value, passed as is
    Literal(Value),
    /// A dotted path into the global settings tree
    Setting(String),
    Object(ObjectReference),
}

impl InjectionSource {
    #[inline]
    #[must_use]
    pub fn object(name: impl Into<String>) -> Self {
        Self::Object(ObjectReference::Named(name.into()))
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> InjectionKind {
        match self {
            InjectionSource::Literal(_) => InjectionKind::Literal,
            InjectionSource::Setting(_) => InjectionKind::Setting,
            InjectionSource::Object(_) => InjectionKind::Object,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InjectionKind {
    Literal,
    Setting,
    Object,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ObjectReference {
    /// Another registered object name
    Named(String),
    /// A nested declaration, built on the fly and never cached
    Inline(Box<ObjectConfiguration>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyInjection {
    pub source: InjectionSource,
    pub autowiring: bool,
    /// Object properties only. A lazy property pointing at a not yet built singleton or
    /// session object receives a dependency proxy.
    pub lazy: bool,
}

impl PropertyInjection {
    #[inline]
    #[must_use]
    pub const fn new(source: InjectionSource) -> Self {
        Self {
            source,
            autowiring: true,
            lazy: true,
        }
    }

    #[inline]
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::new(InjectionSource::Literal(value.into()))
    }

    #[inline]
    #[must_use]
    pub fn setting(path: impl Into<String>) -> Self {
        Self::new(InjectionSource::Setting(path.into()))
    }

    #[inline]
    #[must_use]
    pub fn object(name: impl Into<String>) -> Self {
        Self::new(InjectionSource::object(name))
    }

    #[inline]
    #[must_use]
    pub const fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_autowiring(mut self, autowiring: bool) -> Self {
        self.autowiring = autowiring;
        self
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> InjectionKind {
        self.source.kind()
    }
}

/// Constructor arguments, keyed by their zero-based position
pub type ArgumentSources = BTreeMap<usize, InjectionSource>;

#[derive(Clone, Debug, PartialEq)]
pub enum Construction {
    Direct {
        arguments: ArgumentSources,
    },
    Factory {
        object_name: String,
        method_name: String,
        arguments: ArgumentSources,
    },
}

impl Default for Construction {
    fn default() -> Self {
        Self::Direct {
            arguments: ArgumentSources::new(),
        }
    }
}

/// Static description of one manageable object name
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectConfiguration {
    object_name: String,
    type_name: String,
    package_key: Option<String>,
    scope: Scope,
    construction: Construction,
    properties: Vec<(String, PropertyInjection)>,
    initialization_method: String,
    shutdown_method: String,
    autowiring: bool,
    source_hint: String,
}

impl ObjectConfiguration {
    #[must_use]
    pub fn new(object_name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            type_name: type_name.into(),
            package_key: None,
            scope: Scope::default(),
            construction: Construction::default(),
            properties: Vec::new(),
            initialization_method: DEFAULT_INITIALIZATION_METHOD.to_owned(),
            shutdown_method: DEFAULT_SHUTDOWN_METHOD.to_owned(),
            autowiring: true,
            source_hint: String::from("manually registered"),
        }
    }

    #[inline]
    #[must_use]
    pub const fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_package_key(mut self, package_key: impl Into<String>) -> Self {
        self.package_key = Some(package_key.into());
        self
    }

    /// Switches to factory construction, keeping already configured arguments
    #[must_use]
    pub fn with_factory(mut self, object_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        let arguments = core::mem::take(self.arguments_mut());
        self.construction = Construction::Factory {
            object_name: object_name.into(),
            method_name: method_name.into(),
            arguments,
        };
        self
    }

    #[inline]
    #[must_use]
    pub fn with_argument(mut self, position: usize, source: InjectionSource) -> Self {
        self.set_argument(position, source);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, injection: PropertyInjection) -> Self {
        self.set_property(name, injection);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_initialization_method(mut self, method: impl Into<String>) -> Self {
        self.initialization_method = method.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_shutdown_method(mut self, method: impl Into<String>) -> Self {
        self.shutdown_method = method.into();
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_autowiring(mut self, autowiring: bool) -> Self {
        self.autowiring = autowiring;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_source_hint(mut self, source_hint: impl Into<String>) -> Self {
        self.source_hint = source_hint.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// Empty for factory-built objects whose type isn't declared
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[inline]
    #[must_use]
    pub fn package_key(&self) -> Option<&str> {
        self.package_key.as_deref()
    }

    #[inline]
    #[must_use]
    pub const fn scope(&self) -> Scope {
        self.scope
    }

    #[inline]
    #[must_use]
    pub const fn construction(&self) -> &Construction {
        &self.construction
    }

    #[inline]
    #[must_use]
    pub const fn is_created_by_factory(&self) -> bool {
        matches!(self.construction, Construction::Factory { .. })
    }

    /// Constructor or factory method arguments
    #[must_use]
    pub const fn arguments(&self) -> &ArgumentSources {
        match &self.construction {
            Construction::Direct { arguments } | Construction::Factory { arguments, .. } => arguments,
        }
    }

    #[inline]
    #[must_use]
    pub fn properties(&self) -> &[(String, PropertyInjection)] {
        &self.properties
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyInjection> {
        self.properties
            .iter()
            .find_map(|(property, injection)| (property == name).then_some(injection))
    }

    #[inline]
    #[must_use]
    pub fn initialization_method(&self) -> &str {
        &self.initialization_method
    }

    #[inline]
    #[must_use]
    pub fn shutdown_method(&self) -> &str {
        &self.shutdown_method
    }

    #[inline]
    #[must_use]
    pub const fn autowiring(&self) -> bool {
        self.autowiring
    }

    #[inline]
    #[must_use]
    pub fn source_hint(&self) -> &str {
        &self.source_hint
    }

    pub(crate) fn set_type_name(&mut self, type_name: impl Into<String>) {
        self.type_name = type_name.into();
    }

    pub(crate) fn set_package_key(&mut self, package_key: impl Into<String>) {
        self.package_key = Some(package_key.into());
    }

    pub(crate) fn set_scope(&mut self, scope: Scope) {
        self.scope = scope;
    }

    pub(crate) fn set_autowiring(&mut self, autowiring: bool) {
        self.autowiring = autowiring;
    }

    pub(crate) fn set_source_hint(&mut self, source_hint: impl Into<String>) {
        self.source_hint = source_hint.into();
    }

    pub(crate) fn set_initialization_method(&mut self, method: impl Into<String>) {
        self.initialization_method = method.into();
    }

    pub(crate) fn set_shutdown_method(&mut self, method: impl Into<String>) {
        self.shutdown_method = method.into();
    }

    pub(crate) fn set_construction(&mut self, construction: Construction) {
        self.construction = construction;
    }

    pub(crate) fn set_argument(&mut self, position: usize, source: InjectionSource) {
        self.arguments_mut().insert(position, source);
    }

    /// Replaces an existing injection of the same property in place, keeping the order
    pub(crate) fn set_property(&mut self, name: impl Into<String>, injection: PropertyInjection) {
        let name = name.into();
        match self.properties.iter_mut().find(|(property, _)| *property == name) {
            Some((_, existing)) => *existing = injection,
            None => self.properties.push((name, injection)),
        }
    }

    pub(crate) fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|(property, _)| property == name)
    }

    fn arguments_mut(&mut self) -> &mut ArgumentSources {
        match &mut self.construction {
            Construction::Direct { arguments } | Construction::Factory { arguments, .. } => arguments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Construction, InjectionKind, InjectionSource, ObjectConfiguration, PropertyInjection,
        DEFAULT_INITIALIZATION_METHOD, DEFAULT_SHUTDOWN_METHOD,
    };
    use crate::scope::Scope;

    #[test]
    fn test_defaults() {
        let configuration = ObjectConfiguration::new("Acme.Shop.Cart", "Acme.Shop.Cart");

        assert_eq!(configuration.scope(), Scope::Prototype);
        assert_eq!(configuration.initialization_method(), DEFAULT_INITIALIZATION_METHOD);
        assert_eq!(configuration.shutdown_method(), DEFAULT_SHUTDOWN_METHOD);
        assert!(configuration.autowiring());
        assert!(configuration.arguments().is_empty());
        assert!(!configuration.is_created_by_factory());
    }

    #[test]
    fn test_factory_keeps_arguments() {
        let configuration = ObjectConfiguration::new("Acme.Shop.Cache", "")
            .with_argument(0, InjectionSource::Literal("carts".into()))
            .with_factory("Acme.Shop.CacheFactory", "create");

        match configuration.construction() {
            Construction::Factory {
                object_name,
                method_name,
                arguments,
            } => {
                assert_eq!(object_name, "Acme.Shop.CacheFactory");
                assert_eq!(method_name, "create");
                assert_eq!(arguments.len(), 1);
            }
            Construction::Direct { .. } => panic!("expected factory construction"),
        }
    }

    #[test]
    fn test_property_order() {
        let configuration = ObjectConfiguration::new("Acme.Shop.Cart", "Acme.Shop.Cart")
            .with_property("logger", PropertyInjection::object("Acme.Log.Logger"))
            .with_property("limit", PropertyInjection::literal(10))
            .with_property("logger", PropertyInjection::setting("acme.logger").with_lazy(false));

        let names = configuration
            .properties()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["logger", "limit"]);
        assert_eq!(configuration.property("logger").unwrap().kind(), InjectionKind::Setting);
        assert!(configuration.property("missing").is_none());
    }
}
