pub(crate) mod bootstrap;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod configuration;
pub(crate) mod container;
pub(crate) mod errors;
pub(crate) mod inject;
pub(crate) mod instantiator;
pub(crate) mod object;
pub(crate) mod package;
pub(crate) mod persistence;
pub(crate) mod proxy;
pub(crate) mod reflection;
pub(crate) mod registry;
pub(crate) mod scope;
pub(crate) mod serializer;
pub(crate) mod settings;
pub(crate) mod shutdown;

pub use bootstrap::BootstrapContainer;
pub use config::{ObjectSettings, DEFAULT_INTERNAL_NAMESPACE};
pub use configuration::{
    raw, ArgumentSources, ConfigurationBuilder, Construction, InjectionKind, InjectionSource, ObjectConfiguration,
    ObjectReference, PropertyInjection, DEFAULT_INITIALIZATION_METHOD, DEFAULT_SHUTDOWN_METHOD,
};
pub use container::Container;
pub use errors::{
    BootstrapErrorKind, ConfigurationErrorKind, DeserializeErrorKind, HookFailure, InjectErrorKind, InstantiateErrorKind,
    ResolveErrorKind, ShutdownError,
};
pub use inject::{Arguments, FromInjected, Inject, InjectOptional, InjectedValue, Literal};
pub use instantiator::Instance;
pub use object::{ArrayKey, Object, ObjectRef, ObjectSet, Scalar, Value};
pub use package::{list_candidate_types, Package};
pub use persistence::{NoPersistence, PersistenceStore};
pub use proxy::{DependencyProxy, Lazy, LazyDependency, ProxyBuilder, Slot};
pub use reflection::{
    InjectionMethodKind, Parameter, PropertyInject, PropertyMetadata, ReflectionService, TypeDescriptor,
    TypeDescriptorBuilder,
};
pub use registry::Registry;
pub use scope::Scope;
pub use serializer::{ObjectSerializer, ObjectToken, SerializedGraph, SerializedObject, TypedValue};
pub use settings::Settings;
