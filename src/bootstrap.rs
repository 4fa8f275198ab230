use serde_json::Value;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, error, info_span};

use crate::{
    cache::Cache,
    config::ObjectSettings,
    configuration::{ConfigurationBuilder, InjectionSource, ObjectConfiguration, ObjectReference},
    container::Container,
    errors::{BootstrapErrorKind, ConfigurationErrorKind, ResolveErrorKind, ShutdownError},
    inject::{Arguments, InjectedValue},
    instantiator::Instance,
    package::{list_candidate_types, Package},
    reflection::{ReflectionService, TypeDescriptor},
    registry::Registry,
    scope::Scope,
    settings::Settings,
    shutdown::{ShutdownHook, ShutdownHooks},
};

struct Initialized {
    registry: Registry,
    reflection: ReflectionService,
}

/// Restricted container of the startup phase.
///
/// Builds the object configurations from the loaded packages and serves singletons that only
/// need setter injection. [`BootstrapContainer::into_container`] hands everything built so far
/// to the runtime [`Container`].
pub struct BootstrapContainer {
    settings: Settings,
    object_settings: ObjectSettings,
    state: Option<Initialized>,
    cache: Cache,
    hooks: ShutdownHooks,
    build_stack: Vec<String>,
    /// Singletons cached by the resolution in progress
    cached: Vec<String>,
}

impl BootstrapContainer {
    /// # Errors
    /// Returns [`ConfigurationErrorKind::InvalidSettings`] if the object settings have an unexpected shape
    pub fn new(settings: Settings) -> Result<Self, ConfigurationErrorKind> {
        Ok(Self {
            object_settings: ObjectSettings::from_settings(&settings)?,
            settings,
            state: None,
            cache: Cache::new(),
            hooks: ShutdownHooks::new(),
            build_stack: Vec::new(),
            cached: Vec::new(),
        })
    }

    /// Discovers the candidate types of `packages`, merges their declarations over the reflection
    /// defaults and registers the result.
    ///
    /// # Errors
    /// Returns [`BootstrapErrorKind::Configuration`] if a filter, declaration or registration is invalid
    pub fn initialize(&mut self, packages: &[Package]) -> Result<(), BootstrapErrorKind> {
        let span = info_span!("bootstrap_initialize", packages = packages.len());
        let _guard = span.enter();

        let candidates = list_candidate_types(packages, &self.object_settings)?;
        let reflection = packages
            .iter()
            .flat_map(|package| package.types().iter().cloned())
            .collect::<ReflectionService>();
        let declarations = packages
            .iter()
            .map(|package| (package.key().to_owned(), package.declarations().clone()))
            .collect::<BTreeMap<_, _>>();

        let configurations =
            ConfigurationBuilder::new(&reflection, &self.object_settings)?.build(&candidates, &declarations)?;

        let mut registry = Registry::new();
        for configuration in configurations.into_values() {
            registry.register(configuration)?;
        }
        registry.finalize();
        debug!(objects = registry.len(), types = reflection.len(), "Initialized");

        self.state = Some(Initialized { registry, reflection });
        Ok(())
    }

    #[inline]
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Resolves a singleton, building it with setter injection only
    ///
    /// # Errors
    /// - Returns [`BootstrapErrorKind::NotInitialized`] before [`BootstrapContainer::initialize`]
    /// - Returns [`BootstrapErrorKind::UnsupportedOperation`] if `name` needs constructor arguments or a factory
    /// - Returns [`BootstrapErrorKind::WrongScope`] if `name` isn't a singleton
    /// - Returns [`BootstrapErrorKind::TooComplex`] if a property holds an inline object declaration
    /// - Returns [`BootstrapErrorKind::NoInjectionMethod`] if a property has neither injection method nor setter
    pub fn resolve(&mut self, name: &str) -> Result<Instance, BootstrapErrorKind> {
        let span = info_span!("bootstrap_resolve", object = name);
        let _guard = span.enter();

        if let Some(instance) = self.cache.get(name) {
            debug!("Found in cache");
            return Ok(instance);
        }
        debug!("Not found in cache");

        let (configuration, descriptor) = self.lookup(name)?;

        let mark = self.cached.len();
        self.build_stack.push(name.to_owned());
        let result = self.build(&configuration, &descriptor);
        self.build_stack.pop();

        if result.is_err() {
            // Objects cached while wiring this one may hold it
            let cached = self.cached.split_off(mark);
            self.evict(cached);
        } else if self.build_stack.is_empty() {
            self.cached.clear();
        }
        result
    }

    fn evict(&mut self, names: Vec<String>) {
        for name in names {
            let Some(instance) = self.cache.remove(&name) else {
                continue;
            };
            self.hooks.remove_instance(&instance);
            debug!(object = %name, "Removed from cache");
        }
    }

    fn lookup(&self, name: &str) -> Result<(ObjectConfiguration, Arc<TypeDescriptor>), BootstrapErrorKind> {
        let Some(Initialized { registry, reflection }) = &self.state else {
            let err = BootstrapErrorKind::NotInitialized;
            error!("{}", err);
            return Err(err);
        };
        let Some(configuration) = registry.lookup(name) else {
            let err = BootstrapErrorKind::UnknownObject { name: name.to_owned() };
            error!("{}", err);
            return Err(err);
        };

        if !configuration.arguments().is_empty() || configuration.is_created_by_factory() {
            let err = BootstrapErrorKind::UnsupportedOperation {
                name: name.to_owned(),
                source_hint: configuration.source_hint().to_owned(),
                build_stack: self.build_stack.clone(),
            };
            error!("{}", err);
            return Err(err);
        }
        if configuration.scope() != Scope::Singleton {
            let err = BootstrapErrorKind::WrongScope {
                name: name.to_owned(),
                scope: configuration.scope(),
            };
            error!("{}", err);
            return Err(err);
        }

        let Some(descriptor) = reflection
            .get(configuration.type_name())
            .filter(|descriptor| descriptor.has_constructor())
        else {
            let err = BootstrapErrorKind::Resolve(ResolveErrorKind::NoConstructor {
                type_name: configuration.type_name().to_owned(),
            });
            error!("{}", err);
            return Err(err);
        };

        Ok((configuration.clone(), descriptor.clone()))
    }

    fn build(
        &mut self,
        configuration: &ObjectConfiguration,
        descriptor: &TypeDescriptor,
    ) -> Result<Instance, BootstrapErrorKind> {
        let name = configuration.object_name();
        let Some(constructor) = descriptor.constructor() else {
            return Err(BootstrapErrorKind::Resolve(ResolveErrorKind::NoConstructor {
                type_name: descriptor.name().to_owned(),
            }));
        };

        let instance = constructor(Arguments::default()).map_err(|source| {
            let err = BootstrapErrorKind::Instantiate {
                name: name.to_owned(),
                source,
            };
            error!("{}", err);
            err
        })?;
        self.cache.insert(name, instance.clone());
        self.cached.push(name.to_owned());
        debug!("Cached");

        for (property, injection) in configuration.properties() {
            if !injection.autowiring {
                continue;
            }
            let value = match &injection.source {
                InjectionSource::Literal(value) => InjectedValue::Literal(value.clone()),
                InjectionSource::Setting(path) => InjectedValue::Literal(
                    self.settings
                        .value_by_dotted_path(path)
                        .cloned()
                        .unwrap_or(Value::Null),
                ),
                InjectionSource::Object(ObjectReference::Named(target)) => InjectedValue::Object(self.resolve(target)?),
                InjectionSource::Object(ObjectReference::Inline(_)) => {
                    let err = BootstrapErrorKind::TooComplex {
                        name: name.to_owned(),
                        property: property.clone(),
                        source_hint: configuration.source_hint().to_owned(),
                    };
                    error!("{}", err);
                    return Err(err);
                }
            };

            let Some(injector) = descriptor.injector_for(property) else {
                let err = BootstrapErrorKind::NoInjectionMethod {
                    name: name.to_owned(),
                    property: property.clone(),
                    source_hint: configuration.source_hint().to_owned(),
                };
                error!("{}", err);
                return Err(err);
            };
            injector(&instance, value).map_err(|source| {
                let err = BootstrapErrorKind::Inject {
                    name: name.to_owned(),
                    property: property.clone(),
                    source,
                };
                error!("{}", err);
                err
            })?;
            debug!(property = %property, "Property injected");
        }

        if let Some(method) = descriptor.lifecycle_method(configuration.initialization_method()) {
            method(&instance).map_err(|source| {
                let err = BootstrapErrorKind::Instantiate {
                    name: name.to_owned(),
                    source,
                };
                error!("{}", err);
                err
            })?;
            debug!("Initialized");
        }
        if let Some(call) = descriptor.lifecycle_method(configuration.shutdown_method()) {
            self.hooks.register(
                ShutdownHook {
                    instance: instance.clone(),
                    type_name: descriptor.name().to_owned(),
                    method: configuration.shutdown_method().to_owned(),
                    call: call.clone(),
                },
                self.object_settings.is_internal_type(descriptor.name()),
            );
        }

        Ok(instance)
    }

    /// Installs a built singleton, also before initialization
    ///
    /// # Errors
    /// Returns [`BootstrapErrorKind::WrongScope`] if `name` is registered with a scope other than singleton
    pub fn set_instance(&mut self, name: &str, instance: Instance) -> Result<(), BootstrapErrorKind> {
        if let Some(configuration) = self
            .state
            .as_ref()
            .and_then(|Initialized { registry, .. }| registry.lookup(name))
            .filter(|configuration| configuration.scope() != Scope::Singleton)
        {
            let err = BootstrapErrorKind::WrongScope {
                name: name.to_owned(),
                scope: configuration.scope(),
            };
            error!("{}", err);
            return Err(err);
        }

        self.cache.insert(name, instance);
        debug!(object = name, "Instance set");
        Ok(())
    }

    /// Implementation types of every registered object
    ///
    /// # Errors
    /// Returns [`BootstrapErrorKind::NotInitialized`] before [`BootstrapContainer::initialize`]
    pub fn registered_type_names(&self) -> Result<Vec<&str>, BootstrapErrorKind> {
        let registry = self.registry()?;
        let mut type_names = registry
            .iter()
            .map(ObjectConfiguration::type_name)
            .filter(|type_name| !type_name.is_empty())
            .collect::<Vec<_>>();
        type_names.sort_unstable();
        type_names.dedup();
        Ok(type_names)
    }

    /// Implementation types of the objects registered with `scope`
    ///
    /// # Errors
    /// Returns [`BootstrapErrorKind::NotInitialized`] before [`BootstrapContainer::initialize`]
    pub fn type_names_by_scope(&self, scope: Scope) -> Result<Vec<&str>, BootstrapErrorKind> {
        let registry = self.registry()?;
        Ok(registry
            .iter()
            .filter(|configuration| configuration.scope() == scope && !configuration.type_name().is_empty())
            .map(ObjectConfiguration::type_name)
            .collect())
    }

    /// Object names currently being built, outermost first
    #[inline]
    #[must_use]
    pub fn build_stack(&self) -> &[String] {
        &self.build_stack
    }

    #[inline]
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    fn registry(&self) -> Result<&Registry, BootstrapErrorKind> {
        self.state.as_ref().map(|state| &state.registry).ok_or_else(|| {
            let err = BootstrapErrorKind::NotInitialized;
            error!("{}", err);
            err
        })
    }

    /// Calls the shutdown hooks of every singleton built so far
    ///
    /// # Errors
    /// Returns [`ShutdownError`] with every failed hook, after all hooks were called
    pub fn shutdown(&mut self) -> Result<(), ShutdownError> {
        self.hooks.take().run()
    }

    /// Hands the configurations, built singletons and shutdown hooks to a runtime container
    ///
    /// # Errors
    /// Returns [`BootstrapErrorKind::NotInitialized`] before [`BootstrapContainer::initialize`]
    pub fn into_container(self) -> Result<Container, BootstrapErrorKind> {
        let Some(Initialized { registry, reflection }) = self.state else {
            let err = BootstrapErrorKind::NotInitialized;
            error!("{}", err);
            return Err(err);
        };
        debug!(instances = self.cache.iter().count(), hooks = self.hooks.len(), "Handed over");

        Ok(Container::from_parts(
            registry,
            reflection,
            self.settings,
            self.object_settings,
            self.cache,
            self.hooks,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::BootstrapContainer;
    use crate::{
        errors::{BootstrapErrorKind, InstantiateErrorKind},
        inject::{Inject, Literal},
        instantiator::Instance,
        package::Package,
        reflection::TypeDescriptor,
        scope::Scope,
        settings::Settings,
    };

    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::{
        atomic::{AtomicBool, AtomicU8, Ordering},
        Arc,
    };
    use tracing_test::traced_test;

    #[derive(Default)]
    struct Clock {
        zone: Mutex<String>,
    }

    #[derive(Default)]
    struct Logger {
        clock: Mutex<Option<Arc<Clock>>>,
        open: AtomicBool,
    }

    struct Mailer {
        logger: Arc<Logger>,
    }

    #[derive(Default)]
    struct Report;

    fn package() -> Package {
        Package::new("Acme.Core")
            .with_type(
                TypeDescriptor::builder::<Clock>("Acme.Core.Clock")
                    .scope(Scope::Singleton)
                    .default_constructor()
                    .inject_setting("zone", None, "clock.zone")
                    .setter("zone", |clock: &Clock, Literal(zone): Literal<String>| {
                        *clock.zone.lock() = zone;
                        Ok(())
                    })
                    .build(),
            )
            .with_type(
                TypeDescriptor::builder::<Logger>("Acme.Core.Logger")
                    .scope(Scope::Singleton)
                    .default_constructor()
                    .inject_method("clock", Some("Acme.Core.Clock"), |logger: &Logger, Inject(clock): Inject<Clock>| {
                        *logger.clock.lock() = Some(clock);
                        Ok(())
                    })
                    .lifecycle_method("initializeObject", |logger: &Logger| {
                        logger.open.store(true, Ordering::SeqCst);
                        Ok(())
                    })
                    .lifecycle_method("shutdownObject", |logger: &Logger| {
                        logger.open.store(false, Ordering::SeqCst);
                        Ok(())
                    })
                    .build(),
            )
            .with_type(
                TypeDescriptor::builder::<Mailer>("Acme.Core.Mailer")
                    .scope(Scope::Singleton)
                    .parameter("logger", Some("Acme.Core.Logger"))
                    .constructor(|mut arguments| {
                        let Inject(logger) = arguments.next::<Inject<Logger>>()?;
                        Ok(Mailer { logger })
                    })
                    .build(),
            )
            .with_type(
                TypeDescriptor::builder::<Report>("Acme.Core.Report")
                    .default_constructor()
                    .setter("clock", |_: &Report, Inject(_): Inject<Clock>| Ok(()))
                    .build(),
            )
            .with_type(
                TypeDescriptor::builder::<Report>("Acme.Core.Audit")
                    .scope(Scope::Singleton)
                    .default_constructor()
                    .build(),
            )
            .with_type(TypeDescriptor::builder::<Report>("Acme.Core.ParserError").build())
            .with_declarations_yaml(
                "
Acme.Core.Report:
  scope: singleton
  properties:
    clock:
      object:
        name: Acme.Core.Clock
Acme.Core.Audit:
  properties:
    level:
      value: 3
",
            )
            .unwrap()
    }

    fn bootstrap() -> BootstrapContainer {
        let mut bootstrap = BootstrapContainer::new(Settings::new(json!({
            "Acme": { "Core": { "clock": { "zone": "UTC" } } }
        })))
        .unwrap();
        bootstrap.initialize(&[package()]).unwrap();
        bootstrap
    }

    #[test]
    fn test_not_initialized() {
        let mut bootstrap = BootstrapContainer::new(Settings::default()).unwrap();

        assert!(matches!(
            bootstrap.resolve("Acme.Core.Clock"),
            Err(BootstrapErrorKind::NotInitialized)
        ));
        assert!(bootstrap.registered_type_names().is_err());

        let clock: Instance = Arc::new(Clock::default());
        bootstrap.set_instance("Acme.Core.Clock", clock.clone()).unwrap();
        assert!(Arc::ptr_eq(&bootstrap.resolve("Acme.Core.Clock").unwrap(), &clock));
    }

    #[test]
    #[traced_test]
    fn test_setter_injection() {
        let mut bootstrap = bootstrap();

        let logger = bootstrap.resolve("Acme.Core.Logger").unwrap().downcast::<Logger>().unwrap();
        let clock = bootstrap.resolve("Acme.Core.Clock").unwrap().downcast::<Clock>().unwrap();

        assert!(Arc::ptr_eq(logger.clock.lock().as_ref().unwrap(), &clock));
        assert_eq!(*clock.zone.lock(), "UTC");
        assert!(logger.open.load(Ordering::SeqCst));
        assert!(bootstrap.build_stack().is_empty());
        assert!(logs_contain("Property injected"));

        bootstrap.shutdown().unwrap();
        assert!(!logger.open.load(Ordering::SeqCst));
    }

    #[test]
    fn test_restrictions() {
        let mut bootstrap = bootstrap();

        match bootstrap.resolve("Acme.Core.Mailer") {
            Err(BootstrapErrorKind::UnsupportedOperation { name, source_hint, .. }) => {
                assert_eq!(name, "Acme.Core.Mailer");
                assert_eq!(source_hint, "automatically registered type");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            bootstrap.resolve("Acme.Core.Report"),
            Err(BootstrapErrorKind::TooComplex { property, .. }) if property == "clock"
        ));
        assert!(!bootstrap.cache.contains("Acme.Core.Report"));
        assert!(matches!(
            bootstrap.resolve("Acme.Core.Audit"),
            Err(BootstrapErrorKind::NoInjectionMethod { property, .. }) if property == "level"
        ));
        assert!(matches!(
            bootstrap.resolve("Acme.Core.Missing"),
            Err(BootstrapErrorKind::UnknownObject { .. })
        ));
        assert!(!bootstrap.registered_type_names().unwrap().contains(&"Acme.Core.ParserError"));
    }

    #[test]
    #[traced_test]
    fn test_failed_initialization_evicts_peers() {
        #[derive(Default)]
        struct Link {
            peer: Mutex<Option<Arc<Link>>>,
        }

        let attempts = Arc::new(AtomicU8::new(0));
        let closed = Arc::new(AtomicU8::new(0));
        let link = |name: &str, peer: &'static str| {
            TypeDescriptor::builder::<Link>(name)
                .scope(Scope::Singleton)
                .default_constructor()
                .inject_method("peer", Some(peer), |link: &Link, Inject(peer): Inject<Link>| {
                    *link.peer.lock() = Some(peer);
                    Ok(())
                })
        };
        let mut bootstrap = BootstrapContainer::new(Settings::default()).unwrap();
        bootstrap
            .initialize(&[Package::new("Acme.Core")
                .with_type(
                    link("Acme.Core.Session", "Acme.Core.Journal")
                        .lifecycle_method("initializeObject", {
                            let attempts = attempts.clone();
                            move |_: &Link| {
                                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                                    return Err(InstantiateErrorKind::msg("not ready"));
                                }
                                Ok(())
                            }
                        })
                        .build(),
                )
                .with_type(
                    link("Acme.Core.Journal", "Acme.Core.Session")
                        .lifecycle_method("shutdownObject", {
                            let closed = closed.clone();
                            move |_: &Link| {
                                closed.fetch_add(1, Ordering::SeqCst);
                                Ok(())
                            }
                        })
                        .build(),
                )])
            .unwrap();

        assert!(matches!(
            bootstrap.resolve("Acme.Core.Session"),
            Err(BootstrapErrorKind::Instantiate { name, .. }) if name == "Acme.Core.Session"
        ));
        assert!(!bootstrap.cache.contains("Acme.Core.Session"));
        assert!(!bootstrap.cache.contains("Acme.Core.Journal"));
        assert!(bootstrap.hooks.is_empty());
        assert!(logs_contain("Removed from cache"));

        let session = bootstrap.resolve("Acme.Core.Session").unwrap().downcast::<Link>().unwrap();
        let journal = bootstrap.resolve("Acme.Core.Journal").unwrap().downcast::<Link>().unwrap();
        assert!(Arc::ptr_eq(session.peer.lock().as_ref().unwrap(), &journal));
        assert!(Arc::ptr_eq(journal.peer.lock().as_ref().unwrap(), &session));
        assert!(bootstrap.cached.is_empty());

        bootstrap.shutdown().unwrap();
        assert_eq!(closed.load(Ordering::SeqCst), 1);

        session.peer.lock().take();
        journal.peer.lock().take();
    }

    #[test]
    fn test_wrong_scope() {
        let mut bootstrap = BootstrapContainer::new(Settings::default()).unwrap();
        bootstrap
            .initialize(&[Package::new("Acme.Core").with_type(
                TypeDescriptor::builder::<Report>("Acme.Core.Report")
                    .default_constructor()
                    .build(),
            )])
            .unwrap();

        assert!(matches!(
            bootstrap.resolve("Acme.Core.Report"),
            Err(BootstrapErrorKind::WrongScope { scope: Scope::Prototype, .. })
        ));
        assert!(matches!(
            bootstrap.set_instance("Acme.Core.Report", Arc::new(Report)),
            Err(BootstrapErrorKind::WrongScope { .. })
        ));
        assert_eq!(
            bootstrap.type_names_by_scope(Scope::Prototype).unwrap(),
            ["Acme.Core.Report"]
        );
    }

    #[test]
    fn test_into_container() {
        let mut bootstrap = bootstrap();
        let logger = bootstrap.resolve("Acme.Core.Logger").unwrap();
        assert!(bootstrap.resolve("Acme.Core.Mailer").is_err());

        let container = bootstrap.into_container().unwrap();
        let mailer = container.get::<Mailer>("Acme.Core.Mailer").unwrap();

        assert!(Arc::ptr_eq(&(mailer.logger.clone() as Instance), &logger));
        container.shutdown().unwrap();
        assert!(!mailer.logger.open.load(Ordering::SeqCst));
    }
}
