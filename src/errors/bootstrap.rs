use super::{ConfigurationErrorKind, InjectErrorKind, InstantiateErrorKind, ResolveErrorKind};
use crate::scope::Scope;

#[derive(thiserror::Error, Debug)]
pub enum BootstrapErrorKind {
    #[error("The bootstrap container isn't initialized")]
    NotInitialized,
    #[error("Cannot build object \"{name}\" because it is unknown to the bootstrap container")]
    UnknownObject { name: String },
    #[error(
        "Cannot build object \"{name}\" because constructor injection is not available in the bootstrap container. \
        Use setter injection instead. Configuration source: {source_hint}. Build stack: {}",
        .build_stack.join(", ")
    )]
    UnsupportedOperation {
        name: String,
        source_hint: String,
        build_stack: Vec<String>,
    },
    #[error("Cannot build object \"{name}\" of scope {scope}, the bootstrap container only supports singletons")]
    WrongScope { name: String, scope: Scope },
    #[error(
        "The definition of \"{name}::{property}\" is too complex for the bootstrap container, \
        only plain object names can be used. Configuration source: {source_hint}"
    )]
    TooComplex {
        name: String,
        property: String,
        source_hint: String,
    },
    #[error(
        "Could not inject configured property \"{property}\" into \"{name}\" because no injection method exists. \
        Configuration source: {source_hint}"
    )]
    NoInjectionMethod {
        name: String,
        property: String,
        source_hint: String,
    },
    #[error("Failed to inject \"{property}\" into \"{name}\": {source}")]
    Inject {
        name: String,
        property: String,
        source: InjectErrorKind,
    },
    #[error("Failed to build \"{name}\": {source}")]
    Instantiate {
        name: String,
        source: InstantiateErrorKind,
    },
    #[error(transparent)]
    Configuration(#[from] ConfigurationErrorKind),
    #[error(transparent)]
    Resolve(#[from] ResolveErrorKind),
}
