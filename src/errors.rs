mod bootstrap;
mod configuration;
mod inject;
mod instantiate;
mod resolve;
mod serializer;
mod shutdown;

pub use bootstrap::BootstrapErrorKind;
pub use configuration::ConfigurationErrorKind;
pub use inject::InjectErrorKind;
pub use instantiate::InstantiateErrorKind;
pub use resolve::ResolveErrorKind;
pub use serializer::DeserializeErrorKind;
pub use shutdown::{HookFailure, ShutdownError};
