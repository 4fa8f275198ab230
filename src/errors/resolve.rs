use super::{InjectErrorKind, InstantiateErrorKind};
use crate::scope::Scope;

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("Object \"{name}\" is not registered and is not a known type")]
    UnknownObject { name: String },
    #[error("Can't {operation} for object \"{name}\" of scope {scope}")]
    WrongScope {
        name: String,
        scope: Scope,
        operation: &'static str,
    },
    #[error(
        "Constructor arguments were passed for object \"{name}\" of scope {scope}, \
        but they are only allowed on construction of prototype objects"
    )]
    InvalidUse { name: String, scope: Scope },
    #[error(
        "Circular dependency detected while trying to instantiate \"{type_name}\". Build stack: {}",
        .chain.join(" -> ")
    )]
    CircularDependency { type_name: String, chain: Vec<String> },
    #[error("Incorrect instance type of object \"{name}\". Expected: {expected}")]
    IncorrectType { name: String, expected: &'static str },
    #[error("Type \"{type_name}\" has no constructor")]
    NoConstructor { type_name: String },
    #[error("Method \"{method}\" doesn't exist on type \"{type_name}\"")]
    UnknownMethod { type_name: String, method: String },
    #[error("Could not inject property \"{property}\" into \"{name}\" because no injection method exists")]
    NoInjectionMethod { name: String, property: String },
    #[error("The container was dropped before lazy dependency \"{name}\" was activated")]
    ContainerDropped { name: String },
    #[error("Failed to instantiate \"{name}\": {source}")]
    Instantiate {
        name: String,
        source: InstantiateErrorKind,
    },
    #[error("Failed to inject \"{property}\" into \"{name}\": {source}")]
    Inject {
        name: String,
        property: String,
        source: InjectErrorKind,
    },
}
