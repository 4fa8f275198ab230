use super::InstantiateErrorKind;

#[derive(thiserror::Error, Debug)]
#[error("{type_name}::{method}: {error}")]
pub struct HookFailure {
    pub type_name: String,
    pub method: String,
    pub error: InstantiateErrorKind,
}

/// Every shutdown hook that failed during one shutdown, in call order
#[derive(thiserror::Error, Debug)]
#[error(
    "{} shutdown hook(s) failed: {}",
    .failures.len(),
    .failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
)]
pub struct ShutdownError {
    pub failures: Vec<HookFailure>,
}
