use core::{any::type_name, fmt, marker::PhantomData};
use std::{collections::BTreeMap, sync::Arc};

use crate::{
    errors::{InjectErrorKind, InstantiateErrorKind},
    inject::{Arguments, FromInjected},
    instantiator::{
        boxed_constructor, boxed_factory_method, boxed_injector, boxed_lifecycle_method, BoxedConstructor,
        BoxedFactoryMethod, BoxedInjector, BoxedLifecycleMethod,
    },
    scope::Scope,
};

/// Constructor parameter shape, used for argument autowiring
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    /// Type (or interface) name of an object parameter, `None` for literals
    pub type_name: Option<String>,
    pub optional: bool,
}

/// Injection declared on a property itself
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyInject {
    Object { object_name: String, lazy: bool },
    /// Path relative to the owning package's settings, or absolute when `package` is set
    Setting { package: Option<String>, path: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyMetadata {
    pub transient: bool,
    pub inject: Option<PropertyInject>,
}

/// How an injection method receives its value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectionMethodKind {
    /// `inject`-prefixed method, preferred
    Inject,
    /// `set`-prefixed setter
    Setter,
}

#[derive(Clone)]
pub(crate) struct InjectionMethod {
    pub(crate) target_type: Option<String>,
    pub(crate) autowiring: bool,
    pub(crate) call: BoxedInjector,
}

/// Reflection metadata of one type or interface.
///
/// Replaces name-based method discovery: every method a container may call is registered
/// explicitly as a closure, together with the shapes configuration inference needs.
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    rust_type: Option<&'static str>,
    is_interface: bool,
    is_entity: bool,
    scope: Option<Scope>,
    autowiring: Option<bool>,
    interfaces: Vec<String>,
    constructor: Option<BoxedConstructor>,
    parameters: Vec<Parameter>,
    properties: BTreeMap<String, PropertyMetadata>,
    injectors: BTreeMap<String, InjectionMethod>,
    setters: BTreeMap<String, InjectionMethod>,
    lifecycle_methods: BTreeMap<String, BoxedLifecycleMethod>,
    factory_methods: BTreeMap<String, BoxedFactoryMethod>,
}

impl TypeDescriptor {
    #[inline]
    #[must_use]
    pub fn builder<T: Send + Sync + 'static>(name: impl Into<String>) -> TypeDescriptorBuilder<T> {
        TypeDescriptorBuilder {
            descriptor: Self::empty(name.into(), Some(type_name::<T>())),
            _marker: PhantomData,
        }
    }

    /// Interface descriptor: no constructor, no methods
    #[must_use]
    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            is_interface: true,
            ..Self::empty(name.into(), None)
        }
    }

    /// Interface descriptor with an annotated scope
    #[must_use]
    pub fn interface_with_scope(name: impl Into<String>, scope: Scope) -> Self {
        Self {
            scope: Some(scope),
            ..Self::interface(name)
        }
    }

    fn empty(name: String, rust_type: Option<&'static str>) -> Self {
        Self {
            name,
            rust_type,
            is_interface: false,
            is_entity: false,
            scope: None,
            autowiring: None,
            interfaces: Vec::new(),
            constructor: None,
            parameters: Vec::new(),
            properties: BTreeMap::new(),
            injectors: BTreeMap::new(),
            setters: BTreeMap::new(),
            lifecycle_methods: BTreeMap::new(),
            factory_methods: BTreeMap::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub const fn rust_type(&self) -> Option<&'static str> {
        self.rust_type
    }

    #[inline]
    #[must_use]
    pub const fn is_interface(&self) -> bool {
        self.is_interface
    }

    /// Entities are owned by a persistence store
    #[inline]
    #[must_use]
    pub const fn is_entity(&self) -> bool {
        self.is_entity
    }

    /// Annotated scope
    #[inline]
    #[must_use]
    pub const fn scope(&self) -> Option<Scope> {
        self.scope
    }

    /// Annotated autowiring mode
    #[inline]
    #[must_use]
    pub const fn autowiring(&self) -> Option<bool> {
        self.autowiring
    }

    #[inline]
    #[must_use]
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    #[inline]
    #[must_use]
    pub const fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    #[inline]
    #[must_use]
    pub const fn properties(&self) -> &BTreeMap<String, PropertyMetadata> {
        &self.properties
    }

    #[must_use]
    pub fn is_property_transient(&self, property: &str) -> bool {
        self.properties.get(property).is_some_and(|metadata| metadata.transient)
    }

    /// Kind of the preferred injection method of `property`
    #[must_use]
    pub fn injection_method(&self, property: &str) -> Option<InjectionMethodKind> {
        if self.injectors.contains_key(property) {
            Some(InjectionMethodKind::Inject)
        } else if self.setters.contains_key(property) {
            Some(InjectionMethodKind::Setter)
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub fn has_lifecycle_method(&self, method: &str) -> bool {
        self.lifecycle_methods.contains_key(method)
    }

    #[inline]
    #[must_use]
    pub fn has_factory_method(&self, method: &str) -> bool {
        self.factory_methods.contains_key(method)
    }

    #[inline]
    pub(crate) fn constructor(&self) -> Option<&BoxedConstructor> {
        self.constructor.as_ref()
    }

    /// `inject`-prefixed method first, then the setter
    pub(crate) fn injector_for(&self, property: &str) -> Option<&BoxedInjector> {
        self.injectors
            .get(property)
            .or_else(|| self.setters.get(property))
            .map(|method| &method.call)
    }

    pub(crate) fn injectors(&self) -> impl Iterator<Item = (&str, &InjectionMethod)> + '_ {
        self.injectors.iter().map(|(property, method)| (property.as_str(), method))
    }

    #[inline]
    pub(crate) fn lifecycle_method(&self, method: &str) -> Option<&BoxedLifecycleMethod> {
        self.lifecycle_methods.get(method)
    }

    #[inline]
    pub(crate) fn factory_method(&self, method: &str) -> Option<&BoxedFactoryMethod> {
        self.factory_methods.get(method)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("rust_type", &self.rust_type)
            .field("is_interface", &self.is_interface)
            .field("scope", &self.scope)
            .field("interfaces", &self.interfaces)
            .field("parameters", &self.parameters)
            .field("properties", &self.properties)
            .field("injectors", &self.injectors.keys().collect::<Vec<_>>())
            .field("setters", &self.setters.keys().collect::<Vec<_>>())
            .field("lifecycle_methods", &self.lifecycle_methods.keys().collect::<Vec<_>>())
            .field("factory_methods", &self.factory_methods.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Typed builder of a [`TypeDescriptor`]
///
/// # Example
/// ```
/// use objectcore::{Arguments, Inject, Literal, TypeDescriptor, Scope};
/// use parking_lot::Mutex;
///
/// struct Logger;
/// struct Mailer {
///     host: String,
///     logger: Mutex<Option<std::sync::Arc<Logger>>>,
/// }
///
/// let descriptor = TypeDescriptor::builder::<Mailer>("Acme.Mailer")
///     .scope(Scope::Singleton)
///     .parameter("host", None)
///     .constructor(|mut arguments: Arguments| {
///         let Literal(host) = arguments.next::<Literal<String>>()?;
///         Ok(Mailer { host, logger: Mutex::new(None) })
///     })
///     .inject_method("logger", Some("Acme.Logger"), |mailer: &Mailer, Inject(logger): Inject<Logger>| {
///         *mailer.logger.lock() = Some(logger);
///         Ok(())
///     })
///     .build();
///
/// assert!(descriptor.has_constructor());
/// ```
pub struct TypeDescriptorBuilder<T> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> TypeDescriptorBuilder<T> {
    #[must_use]
    pub const fn scope(mut self, scope: Scope) -> Self {
        self.descriptor.scope = Some(scope);
        self
    }

    #[must_use]
    pub const fn autowiring(mut self, enabled: bool) -> Self {
        self.descriptor.autowiring = Some(enabled);
        self
    }

    #[must_use]
    pub const fn entity(mut self) -> Self {
        self.descriptor.is_entity = true;
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.descriptor.interfaces.push(interface.into());
        self
    }

    #[must_use]
    pub fn constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn(Arguments) -> Result<T, InstantiateErrorKind> + Send + Sync + 'static,
    {
        self.descriptor.constructor = Some(boxed_constructor(constructor));
        self
    }

    #[must_use]
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(|_| Ok(T::default()))
    }

    /// Declares the next constructor parameter
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, type_name: Option<&str>) -> Self {
        self.descriptor.parameters.push(Parameter {
            name: name.into(),
            type_name: type_name.map(ToOwned::to_owned),
            optional: false,
        });
        self
    }

    /// Declares the next constructor parameter as optional
    #[must_use]
    pub fn optional_parameter(mut self, name: impl Into<String>, type_name: Option<&str>) -> Self {
        self.descriptor.parameters.push(Parameter {
            name: name.into(),
            type_name: type_name.map(ToOwned::to_owned),
            optional: true,
        });
        self
    }

    #[must_use]
    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.descriptor.properties.entry(name.into()).or_default();
        self
    }

    /// Declares a property that is never serialized
    #[must_use]
    pub fn transient(mut self, name: impl Into<String>) -> Self {
        self.descriptor.properties.entry(name.into()).or_default().transient = true;
        self
    }

    /// Declares a property receiving the object `object_name`
    #[must_use]
    pub fn inject_property(mut self, name: impl Into<String>, object_name: impl Into<String>, lazy: bool) -> Self {
        self.descriptor.properties.entry(name.into()).or_default().inject = Some(PropertyInject::Object {
            object_name: object_name.into(),
            lazy,
        });
        self
    }

    /// Declares a property receiving a settings value
    #[must_use]
    pub fn inject_setting(mut self, name: impl Into<String>, package: Option<&str>, path: impl Into<String>) -> Self {
        self.descriptor.properties.entry(name.into()).or_default().inject = Some(PropertyInject::Setting {
            package: package.map(ToOwned::to_owned),
            path: path.into(),
        });
        self
    }

    /// Registers the `inject`-prefixed method of `property`.
    /// With a `target_type` the property is autowired to that object name.
    #[must_use]
    pub fn inject_method<V, F>(mut self, property: impl Into<String>, target_type: Option<&str>, method: F) -> Self
    where
        V: FromInjected,
        F: Fn(&T, V) -> Result<(), InjectErrorKind> + Send + Sync + 'static,
    {
        self.descriptor.injectors.insert(
            property.into(),
            InjectionMethod {
                target_type: target_type.map(ToOwned::to_owned),
                autowiring: true,
                call: boxed_injector(method),
            },
        );
        self
    }

    /// Registers an `inject`-prefixed method that's excluded from autowiring
    #[must_use]
    pub fn inject_method_without_autowiring<V, F>(mut self, property: impl Into<String>, method: F) -> Self
    where
        V: FromInjected,
        F: Fn(&T, V) -> Result<(), InjectErrorKind> + Send + Sync + 'static,
    {
        self.descriptor.injectors.insert(
            property.into(),
            InjectionMethod {
                target_type: None,
                autowiring: false,
                call: boxed_injector(method),
            },
        );
        self
    }

    /// Registers the `set`-prefixed setter of `property`
    #[must_use]
    pub fn setter<V, F>(mut self, property: impl Into<String>, method: F) -> Self
    where
        V: FromInjected,
        F: Fn(&T, V) -> Result<(), InjectErrorKind> + Send + Sync + 'static,
    {
        self.descriptor.setters.insert(
            property.into(),
            InjectionMethod {
                target_type: None,
                autowiring: false,
                call: boxed_injector(method),
            },
        );
        self
    }

    /// Registers a method without arguments, callable as initialization or shutdown hook
    #[must_use]
    pub fn lifecycle_method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&T) -> Result<(), InstantiateErrorKind> + Send + Sync + 'static,
    {
        self.descriptor
            .lifecycle_methods
            .insert(name.into(), boxed_lifecycle_method(method));
        self
    }

    #[must_use]
    pub fn factory_method<R, F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        R: Send + Sync + 'static,
        F: Fn(&T, Arguments) -> Result<R, InstantiateErrorKind> + Send + Sync + 'static,
    {
        self.descriptor
            .factory_methods
            .insert(name.into(), boxed_factory_method(method));
        self
    }

    #[inline]
    #[must_use]
    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }
}

/// Reflection metadata of every known type, by type name
#[derive(Clone, Debug, Default)]
pub struct ReflectionService {
    types: BTreeMap<String, Arc<TypeDescriptor>>,
}

impl ReflectionService {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { types: BTreeMap::new() }
    }

    /// Replaces a previously registered descriptor of the same name
    pub fn register(&mut self, descriptor: impl Into<Arc<TypeDescriptor>>) {
        let descriptor = descriptor.into();
        self.types.insert(descriptor.name().to_owned(), descriptor);
    }

    #[inline]
    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&Arc<TypeDescriptor>> {
        self.types.get(type_name)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    #[must_use]
    pub fn is_interface(&self, type_name: &str) -> bool {
        self.types.get(type_name).is_some_and(|descriptor| descriptor.is_interface())
    }

    #[must_use]
    pub fn is_entity(&self, type_name: &str) -> bool {
        self.types.get(type_name).is_some_and(|descriptor| descriptor.is_entity())
    }

    #[must_use]
    pub fn is_property_transient(&self, type_name: &str, property: &str) -> bool {
        self.types
            .get(type_name)
            .is_some_and(|descriptor| descriptor.is_property_transient(property))
    }

    #[must_use]
    pub fn implementations_of(&self, interface: &str) -> Vec<&str> {
        self.types
            .values()
            .filter(|descriptor| descriptor.interfaces().iter().any(|name| name == interface))
            .map(|descriptor| descriptor.name())
            .collect()
    }

    /// The only implementation of `interface`, if there's exactly one
    #[must_use]
    pub fn default_implementation(&self, interface: &str) -> Option<&str> {
        match self.implementations_of(interface).as_slice() {
            [implementation] => Some(*implementation),
            _ => None,
        }
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.types.keys().map(String::as_str)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<Arc<TypeDescriptor>> for ReflectionService {
    fn from_iter<I: IntoIterator<Item = Arc<TypeDescriptor>>>(descriptors: I) -> Self {
        let mut service = Self::new();
        for descriptor in descriptors {
            service.register(descriptor);
        }
        service
    }
}

#[cfg(test)]
mod tests {
    use super::{InjectionMethodKind, PropertyInject, ReflectionService, TypeDescriptor};
    use crate::{
        inject::{Arguments, InjectedValue, Literal},
        scope::Scope,
    };

    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Default)]
    struct FileLogger {
        path: Mutex<String>,
    }

    fn file_logger() -> TypeDescriptor {
        TypeDescriptor::builder::<FileLogger>("Acme.Log.FileLogger")
            .scope(Scope::Singleton)
            .implements("Acme.Log.LoggerInterface")
            .default_constructor()
            .transient("handle")
            .inject_setting("path", None, "log.path")
            .setter("path", |logger: &FileLogger, Literal(path): Literal<String>| {
                *logger.path.lock() = path;
                Ok(())
            })
            .lifecycle_method("shutdownObject", |_: &FileLogger| Ok(()))
            .build()
    }

    #[test]
    fn test_descriptor() {
        let descriptor = file_logger();

        assert_eq!(descriptor.name(), "Acme.Log.FileLogger");
        assert_eq!(descriptor.scope(), Some(Scope::Singleton));
        assert!(descriptor.has_constructor());
        assert!(descriptor.is_property_transient("handle"));
        assert!(!descriptor.is_property_transient("path"));
        assert_eq!(descriptor.injection_method("path"), Some(InjectionMethodKind::Setter));
        assert_eq!(descriptor.injection_method("handle"), None);
        assert!(descriptor.has_lifecycle_method("shutdownObject"));
        assert!(!descriptor.has_lifecycle_method("initializeObject"));
        assert!(matches!(
            descriptor.properties()["path"].inject,
            Some(PropertyInject::Setting { ref path, .. }) if path == "log.path"
        ));

        let instance = (descriptor.constructor().unwrap())(Arguments::default()).unwrap();
        (descriptor.injector_for("path").unwrap())(&instance, InjectedValue::Literal(json!("/var/log/acme")))
            .unwrap();
        assert_eq!(*instance.downcast::<FileLogger>().unwrap().path.lock(), "/var/log/acme");
    }

    #[test]
    fn test_default_implementation() {
        let mut reflection = [
            Arc::new(TypeDescriptor::interface("Acme.Log.LoggerInterface")),
            Arc::new(file_logger()),
        ]
        .into_iter()
        .collect::<ReflectionService>();

        assert!(reflection.is_interface("Acme.Log.LoggerInterface"));
        assert_eq!(
            reflection.default_implementation("Acme.Log.LoggerInterface"),
            Some("Acme.Log.FileLogger")
        );

        reflection.register(
            TypeDescriptor::builder::<FileLogger>("Acme.Log.NullLogger")
                .implements("Acme.Log.LoggerInterface")
                .build(),
        );
        assert_eq!(reflection.implementations_of("Acme.Log.LoggerInterface").len(), 2);
        assert_eq!(reflection.default_implementation("Acme.Log.LoggerInterface"), None);
        assert!(reflection.is_property_transient("Acme.Log.FileLogger", "handle"));
        assert!(!reflection.is_property_transient("Acme.Log.Unknown", "handle"));
    }
}
