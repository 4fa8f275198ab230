use core::any::type_name;
use parking_lot::Mutex;
use serde_json::Value;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, error, info_span};

use crate::{
    cache::Cache,
    config::ObjectSettings,
    configuration::{ArgumentSources, Construction, InjectionSource, ObjectConfiguration, ObjectReference},
    errors::{ConfigurationErrorKind, ResolveErrorKind, ShutdownError},
    inject::{Arguments, InjectedValue},
    instantiator::Instance,
    proxy::{DependencyProxy, LazyDependency, Slot},
    reflection::{ReflectionService, TypeDescriptor},
    registry::Registry,
    scope::Scope,
    settings::Settings,
    shutdown::{ShutdownHook, ShutdownHooks},
};

/// Objects being built within one resolution, in build order, and the names cached by it
#[derive(Debug, Default)]
pub(crate) struct BuildStack {
    entries: Vec<String>,
    cached: Vec<String>,
}

impl BuildStack {
    #[inline]
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self {
            entries: Vec::new(),
            cached: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn record_cached(&mut self, name: &str) {
        self.cached.push(name.to_owned());
    }

    /// Number of names cached so far, to pass to [`BuildStack::cached_since`]
    #[inline]
    #[must_use]
    pub(crate) fn cached_mark(&self) -> usize {
        self.cached.len()
    }

    /// Takes the names cached after `mark`
    pub(crate) fn cached_since(&mut self, mark: usize) -> Vec<String> {
        self.cached.split_off(mark.min(self.cached.len()))
    }

    /// # Errors
    /// Returns [`ResolveErrorKind::CircularDependency`] if `type_name` is already being built
    pub(crate) fn enter(&mut self, type_name: &str) -> Result<(), ResolveErrorKind> {
        if self.entries.iter().any(|entry| entry == type_name) {
            let mut chain = self.entries.clone();
            chain.push(type_name.to_owned());
            let err = ResolveErrorKind::CircularDependency {
                type_name: type_name.to_owned(),
                chain,
            };
            error!("{}", err);
            return Err(err);
        }
        self.entries.push(type_name.to_owned());
        Ok(())
    }

    #[inline]
    pub(crate) fn leave(&mut self) {
        self.entries.pop();
    }
}

/// The runtime container: resolves object names to instances.
///
/// Clones share the same instances, proxies and shutdown hooks.
/// Remaining shutdown hooks run when the last clone is dropped.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// # Errors
    /// Returns [`ConfigurationErrorKind::InvalidSettings`] if the object settings have an unexpected shape
    pub fn new(
        mut registry: Registry,
        reflection: ReflectionService,
        settings: Settings,
    ) -> Result<Self, ConfigurationErrorKind> {
        let object_settings = ObjectSettings::from_settings(&settings)?;
        registry.finalize();
        Ok(Self::from_parts(
            registry,
            reflection,
            settings,
            object_settings,
            Cache::new(),
            ShutdownHooks::new(),
        ))
    }

    pub(crate) fn from_parts(
        registry: Registry,
        reflection: ReflectionService,
        settings: Settings,
        object_settings: ObjectSettings,
        cache: Cache,
        hooks: ShutdownHooks,
    ) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                registry,
                reflection,
                settings,
                object_settings,
                cache: Mutex::new(cache),
                proxies: Mutex::new(BTreeMap::new()),
                hooks: Mutex::new(hooks),
            }),
        }
    }

    /// Resolves `name`, building it if needed
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::UnknownObject`] if `name` is neither registered nor a known type
    /// - Returns [`ResolveErrorKind::CircularDependency`] if construction requires the type being constructed
    /// - Returns [`ResolveErrorKind`] if a dependency can't be resolved or user code fails
    pub fn resolve(&self, name: &str) -> Result<Instance, ResolveErrorKind> {
        self.resolve_with(name, Vec::new())
    }

    /// Resolves `name` passing constructor arguments, which override the configured ones by position.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::InvalidUse`] if arguments are passed for a cached scope
    /// - Returns [`ResolveErrorKind`] as [`Container::resolve`] does
    pub fn resolve_with(&self, name: &str, arguments: Vec<InjectedValue>) -> Result<Instance, ResolveErrorKind> {
        let span = info_span!("resolve", object = name);
        let _guard = span.enter();

        self.resolve_in(name, arguments, &mut BuildStack::new())
    }

    /// # Errors
    /// - Returns [`ResolveErrorKind::IncorrectType`] if the instance isn't a `T`
    /// - Returns [`ResolveErrorKind`] as [`Container::resolve`] does
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, ResolveErrorKind> {
        self.get_with(name, Vec::new())
    }

    /// # Errors
    /// - Returns [`ResolveErrorKind::IncorrectType`] if the instance isn't a `T`
    /// - Returns [`ResolveErrorKind`] as [`Container::resolve_with`] does
    pub fn get_with<T: Send + Sync + 'static>(
        &self,
        name: &str,
        arguments: Vec<InjectedValue>,
    ) -> Result<Arc<T>, ResolveErrorKind> {
        self.resolve_with(name, arguments)?.downcast::<T>().map_err(|_| {
            let err = ResolveErrorKind::IncorrectType {
                name: name.to_owned(),
                expected: type_name::<T>(),
            };
            error!("{}", err);
            err
        })
    }

    fn resolve_in(
        &self,
        name: &str,
        arguments: Vec<InjectedValue>,
        stack: &mut BuildStack,
    ) -> Result<Instance, ResolveErrorKind> {
        let cached = self.inner.cache.lock().get(name);
        if let Some(instance) = cached {
            if !arguments.is_empty() {
                let err = ResolveErrorKind::InvalidUse {
                    name: name.to_owned(),
                    scope: self
                        .inner
                        .registry
                        .lookup(name)
                        .map_or(Scope::Singleton, ObjectConfiguration::scope),
                };
                error!("{}", err);
                return Err(err);
            }
            debug!(object = name, "Found in cache");
            return Ok(instance);
        }
        debug!(object = name, "Not found in cache");

        let unregistered;
        let configuration = match self.inner.registry.lookup(name) {
            Some(configuration) => configuration,
            None if self
                .inner
                .reflection
                .get(name)
                .is_some_and(|descriptor| !descriptor.is_interface()) =>
            {
                debug!(object = name, "Unregistered type built as prototype");
                unregistered = ObjectConfiguration::new(name, name);
                &unregistered
            }
            None => {
                let err = ResolveErrorKind::UnknownObject { name: name.to_owned() };
                error!("{}", err);
                return Err(err);
            }
        };

        if !arguments.is_empty() && configuration.scope() != Scope::Prototype {
            let err = ResolveErrorKind::InvalidUse {
                name: name.to_owned(),
                scope: configuration.scope(),
            };
            error!("{}", err);
            return Err(err);
        }

        self.build(configuration, arguments, stack)
    }

    fn build(
        &self,
        configuration: &ObjectConfiguration,
        arguments: Vec<InjectedValue>,
        stack: &mut BuildStack,
    ) -> Result<Instance, ResolveErrorKind> {
        match configuration.construction() {
            Construction::Factory {
                object_name,
                method_name,
                arguments: sources,
            } => {
                // Unnamed inline objects can't be referenced, so they never close a cycle
                let named = !display_name(configuration).is_empty();
                if named {
                    stack.enter(display_name(configuration))?;
                }
                let result = self.build_by_factory(configuration, object_name, method_name, sources, arguments, stack);
                if named {
                    stack.leave();
                }
                result
            }
            Construction::Direct { arguments: sources } => self.build_directly(configuration, sources, arguments, stack),
        }
    }

    fn build_by_factory(
        &self,
        configuration: &ObjectConfiguration,
        factory_name: &str,
        method_name: &str,
        sources: &ArgumentSources,
        arguments: Vec<InjectedValue>,
        stack: &mut BuildStack,
    ) -> Result<Instance, ResolveErrorKind> {
        let name = display_name(configuration);
        let factory = self.resolve_in(factory_name, Vec::new(), stack)?;
        let factory_type = self.type_name_by_object_name(factory_name).unwrap_or(factory_name);

        let Some(method) = self
            .inner
            .reflection
            .get(factory_type)
            .and_then(|descriptor| descriptor.factory_method(method_name))
        else {
            let err = ResolveErrorKind::UnknownMethod {
                type_name: factory_type.to_owned(),
                method: method_name.to_owned(),
            };
            error!("{}", err);
            return Err(err);
        };

        let arguments = self.arguments(sources, arguments, stack)?;
        let instance = method(&factory, Arguments::new(arguments)).map_err(|source| {
            let err = ResolveErrorKind::Instantiate {
                name: name.to_owned(),
                source,
            };
            error!("{}", err);
            err
        })?;

        if configuration.scope().is_cached() {
            self.inner.cache.lock().insert(name, instance.clone());
            stack.record_cached(name);
            debug!(object = name, "Cached");
        }
        Ok(instance)
    }

    fn build_directly(
        &self,
        configuration: &ObjectConfiguration,
        sources: &ArgumentSources,
        arguments: Vec<InjectedValue>,
        stack: &mut BuildStack,
    ) -> Result<Instance, ResolveErrorKind> {
        let type_name = configuration.type_name();
        let Some(descriptor) = self
            .inner
            .reflection
            .get(type_name)
            .filter(|descriptor| descriptor.has_constructor())
        else {
            let err = ResolveErrorKind::NoConstructor {
                type_name: type_name.to_owned(),
            };
            error!("{}", err);
            return Err(err);
        };

        stack.enter(type_name)?;
        let result = self.construct(configuration, descriptor, sources, arguments, stack);
        stack.leave();
        result
    }

    fn construct(
        &self,
        configuration: &ObjectConfiguration,
        descriptor: &TypeDescriptor,
        sources: &ArgumentSources,
        arguments: Vec<InjectedValue>,
        stack: &mut BuildStack,
    ) -> Result<Instance, ResolveErrorKind> {
        let name = display_name(configuration);
        let Some(constructor) = descriptor.constructor() else {
            return Err(ResolveErrorKind::NoConstructor {
                type_name: descriptor.name().to_owned(),
            });
        };

        let arguments = self.arguments(sources, arguments, stack)?;
        let instance = constructor(Arguments::new(arguments)).map_err(|source| {
            let err = ResolveErrorKind::Instantiate {
                name: name.to_owned(),
                source,
            };
            error!("{}", err);
            err
        })?;

        let cached = configuration.scope().is_cached();
        let mark = stack.cached_mark();
        if cached {
            self.inner.cache.lock().insert(name, instance.clone());
            stack.record_cached(name);
            debug!(object = name, "Cached");
        }

        let initialized = self
            .inject_properties(configuration, descriptor, &instance, stack)
            .and_then(|()| self.initialize(configuration, descriptor, &instance));
        if let Err(err) = initialized {
            // Objects cached while wiring this one may hold it
            self.evict(stack.cached_since(mark));
            return Err(err);
        }

        if cached && descriptor.has_lifecycle_method(configuration.shutdown_method()) {
            self.register_shutdown_hook(instance.clone(), descriptor.name(), configuration.shutdown_method())?;
        }
        Ok(instance)
    }

    fn evict(&self, names: Vec<String>) {
        for name in names {
            let Some(instance) = self.inner.cache.lock().remove(&name) else {
                continue;
            };
            self.inner.hooks.lock().remove_instance(&instance);
            debug!(object = %name, "Removed from cache");
        }
    }

    fn arguments(
        &self,
        sources: &ArgumentSources,
        arguments: Vec<InjectedValue>,
        stack: &mut BuildStack,
    ) -> Result<Vec<InjectedValue>, ResolveErrorKind> {
        let len = sources
            .keys()
            .next_back()
            .map_or(0, |last| last + 1)
            .max(arguments.len());
        let mut given = arguments.into_iter();

        (0..len)
            .map(|position| match (given.next(), sources.get(&position)) {
                (Some(value), _) => Ok(value),
                (None, Some(source)) => self.value_of(source, stack),
                (None, None) => Ok(InjectedValue::Literal(Value::Null)),
            })
            .collect()
    }

    fn value_of(&self, source: &InjectionSource, stack: &mut BuildStack) -> Result<InjectedValue, ResolveErrorKind> {
        Ok(match source {
            InjectionSource::Literal(value) => InjectedValue::Literal(value.clone()),
            InjectionSource::Setting(path) => InjectedValue::Literal(
                self.inner
                    .settings
                    .value_by_dotted_path(path)
                    .cloned()
                    .unwrap_or(Value::Null),
            ),
            InjectionSource::Object(ObjectReference::Named(name)) => {
                InjectedValue::Object(self.resolve_in(name, Vec::new(), stack)?)
            }
            InjectionSource::Object(ObjectReference::Inline(configuration)) => {
                InjectedValue::Object(self.build(configuration, Vec::new(), stack)?)
            }
        })
    }

    fn inject_properties(
        &self,
        configuration: &ObjectConfiguration,
        descriptor: &TypeDescriptor,
        instance: &Instance,
        stack: &mut BuildStack,
    ) -> Result<(), ResolveErrorKind> {
        let name = display_name(configuration);

        for (property, injection) in configuration.properties() {
            if !injection.autowiring {
                continue;
            }
            let Some(injector) = descriptor.injector_for(property) else {
                let err = ResolveErrorKind::NoInjectionMethod {
                    name: name.to_owned(),
                    property: property.clone(),
                };
                error!("{}", err);
                return Err(err);
            };

            let value = match &injection.source {
                InjectionSource::Object(ObjectReference::Named(target)) if injection.lazy && self.is_unbuilt(target) => {
                    self.request_lazy(target, Slot::new(name, property.as_str()))?.into()
                }
                source => self.value_of(source, stack)?,
            };
            injector(instance, value).map_err(|source| {
                let err = ResolveErrorKind::Inject {
                    name: name.to_owned(),
                    property: property.clone(),
                    source,
                };
                error!("{}", err);
                err
            })?;
            debug!(object = name, property = %property, "Property injected");
        }
        Ok(())
    }

    fn initialize(
        &self,
        configuration: &ObjectConfiguration,
        descriptor: &TypeDescriptor,
        instance: &Instance,
    ) -> Result<(), ResolveErrorKind> {
        let Some(method) = descriptor.lifecycle_method(configuration.initialization_method()) else {
            return Ok(());
        };
        method(instance).map_err(|source| {
            let err = ResolveErrorKind::Instantiate {
                name: display_name(configuration).to_owned(),
                source,
            };
            error!("{}", err);
            err
        })?;
        debug!(object = display_name(configuration), "Initialized");
        Ok(())
    }

    /// Whether `name` has a cached scope but isn't built yet
    fn is_unbuilt(&self, name: &str) -> bool {
        self.inner
            .registry
            .lookup(name)
            .is_some_and(|configuration| configuration.scope().is_cached())
            && !self.inner.cache.lock().contains(name)
    }

    /// The built instance of `hash`, or the shared proxy of it with `slot` registered on it.
    /// Dependency hashes are object names.
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::UnknownObject`] if `hash` isn't registered
    pub fn request_lazy(&self, hash: &str, slot: Slot) -> Result<LazyDependency, ResolveErrorKind> {
        if let Some(instance) = self.instance(hash) {
            return Ok(LazyDependency::Resolved(instance));
        }
        if !self.inner.registry.contains(hash) {
            let err = ResolveErrorKind::UnknownObject { name: hash.to_owned() };
            error!("{}", err);
            return Err(err);
        }

        let proxy = self
            .inner
            .proxies
            .lock()
            .entry(hash.to_owned())
            .or_insert_with(|| self.proxy_of(hash))
            .clone();
        proxy.add_slot(slot);
        Ok(LazyDependency::Pending(proxy))
    }

    /// An existing proxy of `hash`, with `slot` registered on it
    #[must_use]
    pub fn lazy_dependency_by_hash(&self, hash: &str, slot: Slot) -> Option<DependencyProxy> {
        let proxy = self.inner.proxies.lock().get(hash).cloned()?;
        proxy.add_slot(slot);
        Some(proxy)
    }

    fn proxy_of(&self, name: &str) -> DependencyProxy {
        debug!(object = name, "Proxy created");
        let container = Arc::downgrade(&self.inner);
        let target_type = self.type_name_by_object_name(name).unwrap_or(name).to_owned();
        let name = name.to_owned();

        DependencyProxy::new(name.clone(), target_type, move || {
            let inner = container
                .upgrade()
                .ok_or_else(|| ResolveErrorKind::ContainerDropped { name: name.clone() })?;
            Container { inner }.resolve(&name)
        })
    }

    /// Installs a built instance of a cached scope
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::WrongScope`] if `name` is a prototype
    /// - Returns [`ResolveErrorKind::UnknownObject`] if `name` is neither registered nor a known type
    pub fn set_instance(&self, name: &str, instance: Instance) -> Result<(), ResolveErrorKind> {
        let scope = match self.inner.registry.lookup(name) {
            Some(configuration) => configuration.scope(),
            None if self.inner.reflection.contains(name) => Scope::Prototype,
            None => {
                let err = ResolveErrorKind::UnknownObject { name: name.to_owned() };
                error!("{}", err);
                return Err(err);
            }
        };
        if !scope.is_cached() {
            let err = ResolveErrorKind::WrongScope {
                name: name.to_owned(),
                scope,
                operation: "set an instance",
            };
            error!("{}", err);
            return Err(err);
        }

        self.inner.cache.lock().insert(name, instance);
        debug!(object = name, "Instance set");
        Ok(())
    }

    #[must_use]
    pub fn has_instance(&self, name: &str) -> bool {
        self.inner.cache.lock().contains(name)
    }

    /// The cached instance of `name`, without building it
    #[must_use]
    pub fn instance(&self, name: &str) -> Option<Instance> {
        self.inner.cache.lock().get(name)
    }

    /// Removes the cached instance of `name` together with its shutdown hooks
    pub fn forget_instance(&self, name: &str) -> Option<Instance> {
        let instance = self.inner.cache.lock().remove(name)?;
        self.inner.hooks.lock().remove_instance(&instance);
        debug!(object = name, "Instance forgotten");
        Some(instance)
    }

    /// Cached instances of session scope, by object name
    #[must_use]
    pub fn session_instances(&self) -> Vec<(String, Instance)> {
        self.inner
            .cache
            .lock()
            .iter()
            .filter(|(name, _)| {
                self.inner
                    .registry
                    .lookup(name)
                    .is_some_and(|configuration| configuration.scope() == Scope::Session)
            })
            .map(|(name, instance)| (name.to_owned(), instance.clone()))
            .collect()
    }

    #[inline]
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.registry.contains(name)
    }

    /// # Errors
    /// Returns [`ResolveErrorKind::UnknownObject`] if `name` isn't registered
    pub fn scope(&self, name: &str) -> Result<Scope, ResolveErrorKind> {
        self.inner
            .registry
            .lookup(name)
            .map(ObjectConfiguration::scope)
            .ok_or_else(|| ResolveErrorKind::UnknownObject { name: name.to_owned() })
    }

    /// Registered spelling of a case-insensitive `name`
    #[inline]
    #[must_use]
    pub fn case_sensitive_object_name(&self, name: &str) -> Option<&str> {
        self.inner.registry.case_sensitive_name(name)
    }

    #[inline]
    #[must_use]
    pub fn object_name_by_type_name(&self, type_name: &str) -> Option<&str> {
        self.inner.registry.object_name_by_type_name(type_name)
    }

    /// Implementation type of `name`. Unregistered known types map to themselves.
    #[must_use]
    pub fn type_name_by_object_name<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        match self.inner.registry.lookup(name) {
            Some(configuration) => Some(configuration.type_name()),
            None => self.inner.reflection.contains(name).then_some(name),
        }
    }

    #[must_use]
    pub fn package_key(&self, name: &str) -> Option<&str> {
        self.inner.registry.lookup(name).and_then(ObjectConfiguration::package_key)
    }

    #[inline]
    #[must_use]
    pub fn settings_by_path(&self, path: &str) -> Option<&Value> {
        self.inner.settings.value_by_dotted_path(path)
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    #[inline]
    #[must_use]
    pub fn reflection(&self) -> &ReflectionService {
        &self.inner.reflection
    }

    /// Registers `method` of `instance` to be called on shutdown.
    /// Hooks of types in the internal namespace are called after all others.
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::UnknownMethod`] if `type_name` has no lifecycle method `method`
    pub fn register_shutdown_hook(
        &self,
        instance: Instance,
        type_name: &str,
        method: &str,
    ) -> Result<(), ResolveErrorKind> {
        let Some(call) = self
            .inner
            .reflection
            .get(type_name)
            .and_then(|descriptor| descriptor.lifecycle_method(method))
            .cloned()
        else {
            let err = ResolveErrorKind::UnknownMethod {
                type_name: type_name.to_owned(),
                method: method.to_owned(),
            };
            error!("{}", err);
            return Err(err);
        };

        let internal = self.inner.object_settings.is_internal_type(type_name);
        self.inner.hooks.lock().register(
            ShutdownHook {
                instance,
                type_name: type_name.to_owned(),
                method: method.to_owned(),
                call,
            },
            internal,
        );
        Ok(())
    }

    /// Calls every registered shutdown hook once
    ///
    /// # Errors
    /// Returns [`ShutdownError`] with every failed hook, after all hooks were called
    pub fn shutdown(&self) -> Result<(), ShutdownError> {
        let hooks = self.inner.hooks.lock().take();
        let result = hooks.run();
        debug!("Container shut down");
        result
    }
}

fn display_name(configuration: &ObjectConfiguration) -> &str {
    if configuration.object_name().is_empty() {
        configuration.type_name()
    } else {
        configuration.object_name()
    }
}

pub(crate) struct ContainerInner {
    registry: Registry,
    reflection: ReflectionService,
    settings: Settings,
    object_settings: ObjectSettings,
    cache: Mutex<Cache>,
    proxies: Mutex<BTreeMap<String, DependencyProxy>>,
    hooks: Mutex<ShutdownHooks>,
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        let hooks = self.hooks.get_mut().take();
        if hooks.is_empty() {
            return;
        }
        if let Err(err) = hooks.run() {
            error!("{}", err);
        }
        debug!("Container shut down on drop");
    }
}
