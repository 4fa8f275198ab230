use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error, warn};

use super::{
    raw::{RawDeclarations, RawInjection, RawObjectConfiguration, RawObjectReference},
    Construction, InjectionSource, ObjectConfiguration, ObjectReference, PropertyInjection,
};
use crate::{
    config::ObjectSettings,
    errors::ConfigurationErrorKind,
    reflection::{PropertyInject, ReflectionService, TypeDescriptor},
    scope::Scope,
};

pub const DEFAULT_FACTORY_METHOD: &str = "create";

const AUTOMATIC_SOURCE_HINT: &str = "automatically registered type";

/// Merges discovered types, reflection metadata and raw declarations into object configurations
pub struct ConfigurationBuilder<'a> {
    reflection: &'a ReflectionService,
    autowiring_exclusions: Vec<Regex>,
}

impl<'a> ConfigurationBuilder<'a> {
    /// # Errors
    /// Returns [`ConfigurationErrorKind::InvalidFilter`] if an autowiring exclusion isn't a valid regex
    pub fn new(reflection: &'a ReflectionService, settings: &ObjectSettings) -> Result<Self, ConfigurationErrorKind> {
        let autowiring_exclusions = settings
            .exclude_types_from_constructor_autowiring
            .iter()
            .map(|expression| {
                Regex::new(expression).map_err(|source| ConfigurationErrorKind::InvalidFilter {
                    setting: String::from("excludeTypesFromConstructorAutowiring"),
                    expression: expression.clone(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            reflection,
            autowiring_exclusions,
        })
    }

    /// Builds one configuration per candidate type and declared object, then autowires
    /// constructor arguments and properties.
    ///
    /// # Errors
    /// Returns [`ConfigurationErrorKind`] if a declaration is invalid or a required singleton
    /// constructor argument can't be autowired
    pub fn build(
        &self,
        candidates: &BTreeMap<String, Vec<String>>,
        declarations: &BTreeMap<String, RawDeclarations>,
    ) -> Result<BTreeMap<String, ObjectConfiguration>, ConfigurationErrorKind> {
        let mut configurations = BTreeMap::new();
        let mut interface_names = BTreeSet::new();

        for (package_key, type_names) in candidates {
            for type_name in type_names {
                let Some(descriptor) = self.reflection.get(type_name) else {
                    warn!(type_name = %type_name, "Candidate type without reflection data skipped");
                    continue;
                };
                if descriptor.is_entity() {
                    debug!(type_name = %type_name, "Entity skipped");
                    continue;
                }

                let implementation = if descriptor.is_interface() {
                    let declared = declarations
                        .get(package_key)
                        .is_some_and(|declarations| declarations.contains_key(type_name));
                    let implementation = self.reflection.default_implementation(type_name);
                    if !declared && implementation.is_none() {
                        debug!(interface = %type_name, "Interface without default implementation skipped");
                        continue;
                    }
                    if descriptor.scope().is_some() {
                        return Err(invalid(
                            type_name,
                            AUTOMATIC_SOURCE_HINT,
                            "scope annotations in interfaces don't have any effect",
                        ));
                    }
                    interface_names.insert(type_name.clone());
                    implementation.unwrap_or_default().to_owned()
                } else {
                    type_name.clone()
                };

                let mut configuration = ObjectConfiguration::new(type_name.clone(), implementation)
                    .with_package_key(package_key.clone())
                    .with_source_hint(AUTOMATIC_SOURCE_HINT);
                apply_annotations(&mut configuration, descriptor);
                configurations.insert(type_name.clone(), configuration);
            }
        }

        for (package_key, raw_configurations) in declarations {
            for (object_name, raw) in raw_configurations {
                let configuration = self.merge_declaration(
                    package_key,
                    object_name,
                    raw,
                    configurations.remove(object_name),
                )?;
                configurations.insert(object_name.clone(), configuration);
            }
        }

        for interface_name in &interface_names {
            let Some(implementation) = configurations
                .get(interface_name)
                .filter(|configuration| configuration.scope() == Scope::Prototype)
                .and_then(|configuration| configurations.get(configuration.type_name()))
                .map(ObjectConfiguration::scope)
            else {
                continue;
            };
            if let Some(configuration) = configurations.get_mut(interface_name) {
                configuration.set_scope(implementation);
            }
        }

        self.autowire_arguments(&mut configurations)?;
        self.autowire_properties(&mut configurations);

        Ok(configurations)
    }

    fn merge_declaration(
        &self,
        package_key: &str,
        object_name: &str,
        raw: &RawObjectConfiguration,
        existing: Option<ObjectConfiguration>,
    ) -> Result<ObjectConfiguration, ConfigurationErrorKind> {
        if existing.is_none() && !self.reflection.contains(object_name) {
            let err = ConfigurationErrorKind::UnknownObject {
                name: object_name.to_owned(),
                package_key: package_key.to_owned(),
            };
            error!("{}", err);
            return Err(err);
        }

        let source_hint = format!("configuration of package {package_key}, definition for object \"{object_name}\"");
        let mut configuration = existing.unwrap_or_else(|| {
            ObjectConfiguration::new(object_name, raw.class_name.as_deref().unwrap_or(object_name).trim())
        });
        configuration.set_source_hint(source_hint.clone());
        self.parse_into(&mut configuration, raw, &source_hint)?;

        // Annotations of the implementation type win over the declaration
        if let Some(descriptor) = self.reflection.get(configuration.type_name()) {
            apply_annotations(&mut configuration, descriptor);
        }

        if object_name != configuration.type_name() && !self.reflection.is_interface(object_name) {
            let err = ConfigurationErrorKind::DifferingClassName {
                name: object_name.to_owned(),
                type_name: configuration.type_name().to_owned(),
                package_key: package_key.to_owned(),
            };
            error!("{}", err);
            return Err(err);
        }
        if configuration.type_name().is_empty() && !configuration.is_created_by_factory() {
            let err = ConfigurationErrorKind::MissingClassName {
                name: object_name.to_owned(),
                package_key: package_key.to_owned(),
            };
            error!("{}", err);
            return Err(err);
        }
        if configuration.package_key().is_none() {
            configuration.set_package_key(package_key);
        }

        debug!(object = object_name, package = package_key, "Declaration merged");
        Ok(configuration)
    }

    fn parse_into(
        &self,
        configuration: &mut ObjectConfiguration,
        raw: &RawObjectConfiguration,
        source_hint: &str,
    ) -> Result<(), ConfigurationErrorKind> {
        let object_name = configuration.object_name().to_owned();

        if let Some(scope) = &raw.scope {
            configuration.set_scope(scope.parse()?);
        }
        if let Some(class_name) = &raw.class_name {
            configuration.set_type_name(class_name.trim());
        }
        match (&raw.factory_object_name, &raw.factory_method_name) {
            (Some(factory_object_name), method_name) => {
                let arguments = configuration.arguments().clone();
                configuration.set_construction(Construction::Factory {
                    object_name: factory_object_name.trim().to_owned(),
                    method_name: method_name.as_deref().unwrap_or(DEFAULT_FACTORY_METHOD).trim().to_owned(),
                    arguments,
                });
            }
            (None, Some(_)) => {
                return Err(invalid(
                    &object_name,
                    source_hint,
                    "\"factoryMethodName\" requires a \"factoryObjectName\"",
                ));
            }
            (None, None) => {}
        }

        for (key, injection) in &raw.arguments {
            let position = self.argument_position(configuration.type_name(), &object_name, key, source_hint)?;
            let context = format!("{source_hint}, argument \"{key}\"");
            let source = self.parse_injection(&object_name, key, injection, None, &context)?;
            configuration.set_argument(position, source);
        }

        for (property, injection) in &raw.properties {
            let declared_type = self.declared_property_type(configuration.type_name(), property);
            let context = format!("{source_hint}, property \"{property}\"");
            let source = self.parse_injection(&object_name, property, injection, declared_type, &context)?;
            let mut property_injection = PropertyInjection::new(source);
            if let Some(lazy) = injection.lazy {
                property_injection = property_injection.with_lazy(lazy);
            }
            configuration.set_property(property.clone(), property_injection);
        }

        if let Some(method) = &raw.lifecycle_initialization_method_name {
            configuration.set_initialization_method(method.trim());
        }
        if let Some(method) = &raw.lifecycle_shutdown_method_name {
            configuration.set_shutdown_method(method.trim());
        }
        if let Some(autowiring) = raw.autowiring {
            configuration.set_autowiring(autowiring);
        }
        Ok(())
    }

    /// Positions are one-based in declarations. Names are looked up in the constructor parameters.
    fn argument_position(
        &self,
        type_name: &str,
        object_name: &str,
        key: &str,
        source_hint: &str,
    ) -> Result<usize, ConfigurationErrorKind> {
        if let Ok(position) = key.parse::<usize>() {
            return position
                .checked_sub(1)
                .ok_or_else(|| invalid(object_name, source_hint, "argument positions start at 1"));
        }
        self.reflection
            .get(type_name)
            .and_then(|descriptor| descriptor.parameters().iter().position(|parameter| parameter.name == key))
            .ok_or_else(|| {
                invalid(
                    object_name,
                    source_hint,
                    &format!("\"{key}\" is neither an argument position nor a constructor parameter"),
                )
            })
    }

    /// Object name a property is typed with, used by inline declarations without a name
    fn declared_property_type(&self, type_name: &str, property: &str) -> Option<String> {
        let descriptor = self.reflection.get(type_name)?;
        if let Some(PropertyInject::Object { object_name, .. }) =
            descriptor.properties().get(property).and_then(|metadata| metadata.inject.as_ref())
        {
            return Some(object_name.clone());
        }
        descriptor
            .injectors()
            .find_map(|(name, method)| (name == property).then(|| method.target_type.clone()).flatten())
    }

    fn parse_injection(
        &self,
        object_name: &str,
        key: &str,
        injection: &RawInjection,
        declared_type: Option<String>,
        source_hint: &str,
    ) -> Result<InjectionSource, ConfigurationErrorKind> {
        match (&injection.value, &injection.object, &injection.setting) {
            (Some(value), None, None) => Ok(InjectionSource::Literal(value.clone())),
            (None, None, Some(path)) => Ok(InjectionSource::Setting(path.clone())),
            (None, Some(RawObjectReference::Name(name)), None) => Ok(InjectionSource::object(name.trim())),
            (None, Some(RawObjectReference::Inline(inline)), None) => {
                let name = match (&inline.name, &inline.factory_object_name, declared_type) {
                    (Some(name), _, _) => name.trim().to_owned(),
                    (None, Some(_), _) => String::new(),
                    (None, None, Some(declared_type)) => declared_type,
                    (None, None, None) => {
                        return Err(invalid(
                            object_name,
                            source_hint,
                            "the inline object declaration contains neither an object name nor a factory object name",
                        ));
                    }
                };
                let raw = RawObjectConfiguration {
                    class_name: inline.class_name.clone(),
                    factory_object_name: inline.factory_object_name.clone(),
                    factory_method_name: inline.factory_method_name.clone(),
                    arguments: inline.arguments.clone(),
                    properties: inline.properties.clone(),
                    ..RawObjectConfiguration::default()
                };
                let type_name = inline
                    .class_name
                    .as_deref()
                    .map_or_else(|| if inline.factory_object_name.is_some() { "" } else { name.as_str() }, str::trim)
                    .to_owned();
                let mut nested = ObjectConfiguration::new(name, type_name).with_source_hint(source_hint);
                self.parse_into(&mut nested, &raw, source_hint)?;
                Ok(InjectionSource::Object(ObjectReference::Inline(Box::new(nested))))
            }
            _ => Err(invalid(
                object_name,
                source_hint,
                &format!("expecting exactly one of \"value\", \"object\" or \"setting\" for \"{key}\""),
            )),
        }
    }

    fn autowire_arguments(
        &self,
        configurations: &mut BTreeMap<String, ObjectConfiguration>,
    ) -> Result<(), ConfigurationErrorKind> {
        let mut autowired = Vec::new();

        for (object_name, configuration) in configurations.iter() {
            if configuration.type_name().is_empty() || configuration.is_created_by_factory() {
                continue;
            }
            let Some(descriptor) = self.reflection.get(configuration.type_name()) else {
                continue;
            };
            if !descriptor.has_constructor() {
                continue;
            }
            let enabled = configuration.autowiring()
                && !self
                    .autowiring_exclusions
                    .iter()
                    .any(|expression| expression.is_match(configuration.type_name()));

            for (position, parameter) in descriptor.parameters().iter().enumerate() {
                if configuration.arguments().contains_key(&position) {
                    continue;
                }

                let mut hint = String::new();
                let source = match parameter.type_name.as_deref() {
                    _ if parameter.optional => Some(InjectionSource::Literal(Value::Null)),
                    Some(type_name) if configurations.contains_key(type_name) => Some(if enabled {
                        InjectionSource::object(type_name)
                    } else {
                        InjectionSource::Literal(Value::Null)
                    }),
                    Some(type_name) if self.reflection.is_interface(type_name) => {
                        hint = format!(
                            "No default implementation for the required interface {type_name} was configured, \
                            therefore no specific class name could be used for this dependency. "
                        );
                        None
                    }
                    _ => None,
                };

                match source {
                    Some(source) => autowired.push((object_name.clone(), position, source)),
                    None if configuration.scope() == Scope::Singleton => {
                        let err = ConfigurationErrorKind::UnresolvedConstructorArgument {
                            type_name: configuration.type_name().to_owned(),
                            parameter: parameter.name.clone(),
                            hint,
                        };
                        error!("{}", err);
                        return Err(err);
                    }
                    None => {
                        debug!(object = %object_name, parameter = %parameter.name, "Constructor argument left unresolved");
                    }
                }
            }
        }

        for (object_name, position, source) in autowired {
            if let Some(configuration) = configurations.get_mut(&object_name) {
                configuration.set_argument(position, source);
            }
        }
        Ok(())
    }

    fn autowire_properties(&self, configurations: &mut BTreeMap<String, ObjectConfiguration>) {
        for configuration in configurations.values_mut() {
            if configuration.type_name().is_empty() || !configuration.autowiring() {
                continue;
            }
            let Some(descriptor) = self.reflection.get(configuration.type_name()) else {
                continue;
            };
            let package_key = configuration.package_key().map(ToOwned::to_owned);

            for (property, method) in descriptor.injectors() {
                if !method.autowiring {
                    continue;
                }
                if property == "settings" {
                    if let Some(package_key) = &package_key {
                        configuration.set_property(property, PropertyInjection::setting(package_key.clone()));
                    }
                    continue;
                }
                if configuration.has_property(property) {
                    continue;
                }
                match &method.target_type {
                    Some(target_type) => configuration.set_property(property, PropertyInjection::object(target_type)),
                    None => debug!(
                        type_name = configuration.type_name(),
                        property, "Injection method without target type isn't autowired"
                    ),
                }
            }

            for (property, metadata) in descriptor.properties() {
                if configuration.has_property(property) {
                    continue;
                }
                match &metadata.inject {
                    Some(PropertyInject::Object { object_name, lazy }) => configuration.set_property(
                        property.clone(),
                        PropertyInjection::object(object_name.clone()).with_lazy(*lazy),
                    ),
                    Some(PropertyInject::Setting { package, path }) => {
                        let package = package.as_ref().or(package_key.as_ref()).map_or("", String::as_str);
                        let path = format!("{package}.{path}");
                        configuration.set_property(
                            property.clone(),
                            PropertyInjection::setting(path.trim_matches('.')),
                        );
                    }
                    None => {}
                }
            }
        }
    }
}

fn apply_annotations(configuration: &mut ObjectConfiguration, descriptor: &TypeDescriptor) {
    if let Some(scope) = descriptor.scope() {
        configuration.set_scope(scope);
    }
    if let Some(autowiring) = descriptor.autowiring() {
        configuration.set_autowiring(autowiring);
    }
}

fn invalid(name: &str, source_hint: &str, reason: &str) -> ConfigurationErrorKind {
    let err = ConfigurationErrorKind::InvalidDeclaration {
        name: name.to_owned(),
        source_hint: source_hint.to_owned(),
        reason: reason.to_owned(),
    };
    error!("{}", err);
    err
}

#[cfg(test)]
mod tests {
    use super::ConfigurationBuilder;
    use crate::{
        config::ObjectSettings,
        configuration::{
            raw::{parse_declarations, RawDeclarations},
            Construction, InjectionSource, ObjectConfiguration, ObjectReference,
        },
        errors::ConfigurationErrorKind,
        inject::{Inject, InjectedValue, Literal},
        reflection::{ReflectionService, TypeDescriptor},
        scope::Scope,
    };

    use serde_json::json;
    use std::{collections::BTreeMap, sync::Arc};
    use tracing_test::traced_test;

    struct Unit;

    fn reflection() -> ReflectionService {
        [
            TypeDescriptor::interface("Acme.Log.LoggerInterface"),
            TypeDescriptor::builder::<Unit>("Acme.Log.FileLogger")
                .scope(Scope::Singleton)
                .implements("Acme.Log.LoggerInterface")
                .constructor(|_| Ok(Unit))
                .build(),
            TypeDescriptor::interface("Acme.Mail.TransportInterface"),
            TypeDescriptor::builder::<Unit>("Acme.Mail.Mailer")
                .scope(Scope::Singleton)
                .parameter("logger", Some("Acme.Log.LoggerInterface"))
                .optional_parameter("retries", None)
                .constructor(|_| Ok(Unit))
                .inject_method("transport", Some("Acme.Mail.SmtpTransport"), |_: &Unit, _: InjectedValue| Ok(()))
                .inject_method("settings", None, |_: &Unit, Literal(_): Literal<serde_json::Value>| Ok(()))
                .inject_method_without_autowiring("clock", |_: &Unit, _: Inject<Unit>| Ok(()))
                .inject_property("cache", "Acme.Cache.Frontend", false)
                .inject_setting("sender", None, "mail.sender")
                .build(),
            TypeDescriptor::builder::<Unit>("Acme.Mail.SmtpTransport")
                .implements("Acme.Mail.TransportInterface")
                .constructor(|_| Ok(Unit))
                .build(),
            TypeDescriptor::builder::<Unit>("Acme.Mail.SendmailTransport")
                .implements("Acme.Mail.TransportInterface")
                .constructor(|_| Ok(Unit))
                .build(),
            TypeDescriptor::builder::<Unit>("Acme.Mail.Message").entity().build(),
        ]
        .into_iter()
        .map(Arc::new)
        .collect()
    }

    fn candidates(names: &[&str]) -> BTreeMap<String, Vec<String>> {
        BTreeMap::from([(
            "Acme.Mail".to_owned(),
            names.iter().map(|name| (*name).to_owned()).collect(),
        )])
    }

    fn declarations(source: &str) -> BTreeMap<String, RawDeclarations> {
        BTreeMap::from([("Acme.Mail".to_owned(), parse_declarations("Acme.Mail", source).unwrap())])
    }

    fn build(
        names: &[&str],
        source: &str,
    ) -> Result<BTreeMap<String, ObjectConfiguration>, ConfigurationErrorKind> {
        let reflection = reflection();
        ConfigurationBuilder::new(&reflection, &ObjectSettings::default())
            .unwrap()
            .build(&candidates(names), &declarations(source))
    }

    const ALL: &[&str] = &[
        "Acme.Log.LoggerInterface",
        "Acme.Log.FileLogger",
        "Acme.Mail.TransportInterface",
        "Acme.Mail.Mailer",
        "Acme.Mail.SmtpTransport",
        "Acme.Mail.SendmailTransport",
        "Acme.Mail.Message",
    ];

    #[test]
    #[traced_test]
    fn test_automatic_registration() {
        let configurations = build(ALL, "").unwrap();

        let logger = &configurations["Acme.Log.LoggerInterface"];
        assert_eq!(logger.type_name(), "Acme.Log.FileLogger");
        assert_eq!(logger.scope(), Scope::Singleton);
        assert_eq!(logger.package_key(), Some("Acme.Mail"));
        assert!(!configurations.contains_key("Acme.Mail.TransportInterface"));
        assert!(logs_contain("Interface without default implementation skipped"));
        assert!(!configurations.contains_key("Acme.Mail.Message"));

        let mailer = &configurations["Acme.Mail.Mailer"];
        assert_eq!(mailer.scope(), Scope::Singleton);
        assert_eq!(
            mailer.arguments()[&0],
            InjectionSource::object("Acme.Log.LoggerInterface")
        );
        assert_eq!(mailer.arguments()[&1], InjectionSource::Literal(json!(null)));
    }

    #[test]
    fn test_property_autowiring() {
        let configurations = build(ALL, "").unwrap();
        let mailer = &configurations["Acme.Mail.Mailer"];

        assert_eq!(
            mailer.property("transport").unwrap().source,
            InjectionSource::object("Acme.Mail.SmtpTransport")
        );
        assert_eq!(
            mailer.property("settings").unwrap().source,
            InjectionSource::Setting("Acme.Mail".to_owned())
        );
        assert!(mailer.property("clock").is_none());

        let cache = mailer.property("cache").unwrap();
        assert_eq!(cache.source, InjectionSource::object("Acme.Cache.Frontend"));
        assert!(!cache.lazy);
        assert_eq!(
            mailer.property("sender").unwrap().source,
            InjectionSource::Setting("Acme.Mail.mail.sender".to_owned())
        );
    }

    #[test]
    fn test_declarations_merge() {
        let configurations = build(
            ALL,
            "
Acme.Mail.TransportInterface:
  className: Acme.Mail.SendmailTransport
  scope: singleton
Acme.Mail.Mailer:
  arguments:
    retries:
      value: 3
  properties:
    transport:
      object: Acme.Mail.TransportInterface
    cache:
      object:
        factoryObjectName: Acme.Cache.Manager
        factoryMethodName: frontend
        arguments:
          1:
            value: mail
",
        )
        .unwrap();

        let transport = &configurations["Acme.Mail.TransportInterface"];
        assert_eq!(transport.type_name(), "Acme.Mail.SendmailTransport");
        assert_eq!(transport.scope(), Scope::Singleton);

        let mailer = &configurations["Acme.Mail.Mailer"];
        assert_eq!(mailer.arguments()[&1], InjectionSource::Literal(json!(3)));
        assert_eq!(
            mailer.property("transport").unwrap().source,
            InjectionSource::object("Acme.Mail.TransportInterface")
        );
        assert!(mailer.source_hint().contains("Acme.Mail"));

        let InjectionSource::Object(ObjectReference::Inline(cache)) = &mailer.property("cache").unwrap().source else {
            panic!("expected an inline declaration");
        };
        assert!(matches!(
            cache.construction(),
            Construction::Factory { object_name, method_name, arguments }
                if object_name == "Acme.Cache.Manager" && method_name == "frontend" && arguments.len() == 1
        ));
    }

    #[test]
    fn test_annotated_scope_wins() {
        let configurations = build(
            ALL,
            "
Acme.Mail.Mailer:
  scope: prototype
Acme.Mail.TransportInterface:
  className: Acme.Mail.SmtpTransport
  scope: session
",
        )
        .unwrap();

        assert_eq!(configurations["Acme.Mail.Mailer"].scope(), Scope::Singleton);
        assert_eq!(
            configurations["Acme.Mail.TransportInterface"].scope(),
            Scope::Session
        );
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            build(ALL, "Acme.Mail.Unknown: { scope: singleton }"),
            Err(ConfigurationErrorKind::UnknownObject { .. })
        ));
        assert!(matches!(
            build(ALL, "Acme.Mail.Mailer: { className: Acme.Mail.SmtpTransport }"),
            Err(ConfigurationErrorKind::DifferingClassName { .. })
        ));
        assert!(matches!(
            build(ALL, "Acme.Mail.TransportInterface: { scope: singleton }"),
            Err(ConfigurationErrorKind::MissingClassName { .. })
        ));
        assert!(matches!(
            build(ALL, "Acme.Mail.Mailer: { scope: forever }"),
            Err(ConfigurationErrorKind::InvalidScope { .. })
        ));
        assert!(matches!(
            build(ALL, "Acme.Mail.Mailer: { properties: { transport: { value: 1, setting: a.b } } }"),
            Err(ConfigurationErrorKind::InvalidDeclaration { .. })
        ));
        assert!(matches!(
            build(ALL, "Acme.Mail.Mailer: { arguments: { 0: { value: 1 } } }"),
            Err(ConfigurationErrorKind::InvalidDeclaration { .. })
        ));
    }

    #[test]
    fn test_unresolved_singleton_argument() {
        match build(&["Acme.Mail.Mailer"], "") {
            Err(ConfigurationErrorKind::UnresolvedConstructorArgument { parameter, hint, .. }) => {
                assert_eq!(parameter, "logger");
                assert!(hint.starts_with("No default implementation"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_autowiring_exclusion() {
        let reflection = reflection();
        let settings = ObjectSettings {
            exclude_types_from_constructor_autowiring: vec!["^Acme\\.Mail\\.".to_owned()],
            ..ObjectSettings::default()
        };
        let configurations = ConfigurationBuilder::new(&reflection, &settings)
            .unwrap()
            .build(&candidates(ALL), &BTreeMap::new())
            .unwrap();

        assert_eq!(
            configurations["Acme.Mail.Mailer"].arguments()[&0],
            InjectionSource::Literal(json!(null))
        );
    }
}
