use crate::scope::Scope;

#[derive(thiserror::Error, Debug)]
pub enum ConfigurationErrorKind {
    #[error(
        "Object \"{name}\" is already registered with scope {registered}, \
        it can't be registered again with scope {requested}"
    )]
    DuplicateConfiguration {
        name: String,
        registered: Scope,
        requested: Scope,
    },
    #[error("Invalid scope \"{value}\"")]
    InvalidScope { value: String },
    #[error("Invalid configuration of object \"{name}\" ({source_hint}): {reason}")]
    InvalidDeclaration {
        name: String,
        source_hint: String,
        reason: String,
    },
    #[error("Tried to configure unknown object \"{name}\" in package \"{package_key}\"")]
    UnknownObject { name: String, package_key: String },
    #[error(
        "Tried to set a differing class name \"{type_name}\" for object \"{name}\" in package \"{package_key}\". \
        Setting the class name is only allowed for interfaces"
    )]
    DifferingClassName {
        name: String,
        type_name: String,
        package_key: String,
    },
    #[error("The configuration of object \"{name}\" in package \"{package_key}\" lacks a class name")]
    MissingClassName { name: String, package_key: String },
    #[error(
        "Could not autowire required constructor argument \"{parameter}\" for singleton \"{type_name}\". {hint}\
        Check the type of that argument and the object declarations"
    )]
    UnresolvedConstructorArgument {
        type_name: String,
        parameter: String,
        hint: String,
    },
    #[error("Invalid filter expression \"{expression}\" in setting \"{setting}\": {source}")]
    InvalidFilter {
        setting: String,
        expression: String,
        source: regex::Error,
    },
    #[error("Invalid settings at \"{path}\": {source}")]
    InvalidSettings { path: String, source: serde_json::Error },
    #[error("Settings couldn't be parsed: {0}")]
    UnparsableSettings(#[source] serde_yaml::Error),
    #[error("Object declarations of package \"{package_key}\" couldn't be parsed: {source}")]
    UnparsableDeclarations {
        package_key: String,
        source: serde_yaml::Error,
    },
}
