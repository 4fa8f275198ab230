use core::any::{type_name, Any};
use std::sync::Arc;
use tracing::debug;

use crate::{
    errors::{InjectErrorKind, InstantiateErrorKind},
    inject::{Arguments, FromInjected, InjectedValue},
};

/// A live, type-erased instance managed by a container
pub type Instance = Arc<dyn Any + Send + Sync>;

pub(crate) type BoxedConstructor = Arc<dyn Fn(Arguments) -> Result<Instance, InstantiateErrorKind> + Send + Sync>;
pub(crate) type BoxedInjector = Arc<dyn Fn(&Instance, InjectedValue) -> Result<(), InjectErrorKind> + Send + Sync>;
pub(crate) type BoxedLifecycleMethod = Arc<dyn Fn(&Instance) -> Result<(), InstantiateErrorKind> + Send + Sync>;
pub(crate) type BoxedFactoryMethod =
    Arc<dyn Fn(&Instance, Arguments) -> Result<Instance, InstantiateErrorKind> + Send + Sync>;

#[inline]
fn downcast_target<T: 'static>(instance: &Instance) -> Result<&T, InjectErrorKind> {
    (**instance).downcast_ref::<T>().ok_or(InjectErrorKind::IncorrectType {
        expected: type_name::<T>(),
    })
}

#[must_use]
pub(crate) fn boxed_constructor<T, F>(constructor: F) -> BoxedConstructor
where
    T: Send + Sync + 'static,
    F: Fn(Arguments) -> Result<T, InstantiateErrorKind> + Send + Sync + 'static,
{
    Arc::new(move |arguments: Arguments| {
        let instance = constructor(arguments)?;
        debug!(type_name = type_name::<T>(), "Constructed");
        Ok(Arc::new(instance) as Instance)
    })
}

#[must_use]
pub(crate) fn boxed_injector<T, V, F>(injector: F) -> BoxedInjector
where
    T: Send + Sync + 'static,
    V: FromInjected,
    F: Fn(&T, V) -> Result<(), InjectErrorKind> + Send + Sync + 'static,
{
    Arc::new(move |instance: &Instance, value: InjectedValue| {
        injector(downcast_target::<T>(instance)?, V::from_injected(value)?)
    })
}

#[must_use]
pub(crate) fn boxed_lifecycle_method<T, F>(method: F) -> BoxedLifecycleMethod
where
    T: Send + Sync + 'static,
    F: Fn(&T) -> Result<(), InstantiateErrorKind> + Send + Sync + 'static,
{
    Arc::new(move |instance: &Instance| method(downcast_target::<T>(instance)?))
}

#[must_use]
pub(crate) fn boxed_factory_method<T, R, F>(method: F) -> BoxedFactoryMethod
where
    T: Send + Sync + 'static,
    R: Send + Sync + 'static,
    F: Fn(&T, Arguments) -> Result<R, InstantiateErrorKind> + Send + Sync + 'static,
{
    Arc::new(move |factory: &Instance, arguments: Arguments| {
        let product = method(downcast_target::<T>(factory)?, arguments)?;
        debug!(type_name = type_name::<R>(), "Built by factory");
        Ok(Arc::new(product) as Instance)
    })
}
