use super::InjectErrorKind;

/// Failure raised by user code: constructors, factory methods and lifecycle methods
#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    #[error(transparent)]
    Inject(#[from] InjectErrorKind),
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}

impl InstantiateErrorKind {
    #[inline]
    #[must_use]
    pub fn msg<M>(message: M) -> Self
    where
        M: core::fmt::Display + core::fmt::Debug + Send + Sync + 'static,
    {
        Self::Custom(anyhow::Error::msg(message))
    }
}
