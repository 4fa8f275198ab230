use core::{any::type_name, fmt, marker::PhantomData};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error};

use crate::{
    errors::{InjectErrorKind, ResolveErrorKind},
    inject::{FromInjected, InjectedValue},
    instantiator::Instance,
};

pub type ProxyBuilder = Arc<dyn Fn() -> Result<Instance, ResolveErrorKind> + Send + Sync>;

/// A property of an owning object that holds a dependency proxy
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Slot {
    pub owner: String,
    pub property: String,
}

impl Slot {
    #[inline]
    #[must_use]
    pub fn new(owner: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            property: property.into(),
        }
    }
}

/// Placeholder of a not yet built dependency.
///
/// Clones share one cell: the builder runs at most once successfully, and every holder of
/// the proxy observes the same instance after activation. A failed build leaves the proxy
/// inactive, so the next activation retries it.
#[derive(Clone)]
pub struct DependencyProxy {
    inner: Arc<ProxyInner>,
}

struct ProxyInner {
    hash: String,
    target_type: String,
    builder: ProxyBuilder,
    cell: OnceCell<Instance>,
    slots: Mutex<Vec<Slot>>,
}

impl DependencyProxy {
    #[must_use]
    pub fn new<F>(hash: impl Into<String>, target_type: impl Into<String>, builder: F) -> Self
    where
        F: Fn() -> Result<Instance, ResolveErrorKind> + Send + Sync + 'static,
    {
        Self::with_cell(hash.into(), target_type.into(), Arc::new(builder), OnceCell::new())
    }

    /// Proxy of an already built instance
    #[must_use]
    pub(crate) fn resolved(hash: impl Into<String>, target_type: impl Into<String>, instance: Instance) -> Self {
        let hash = hash.into();
        let name = hash.clone();
        Self::with_cell(
            hash,
            target_type.into(),
            Arc::new(move || -> Result<Instance, ResolveErrorKind> {
                Err(ResolveErrorKind::ContainerDropped { name: name.clone() })
            }),
            OnceCell::with_value(instance),
        )
    }

    fn with_cell(hash: String, target_type: String, builder: ProxyBuilder, cell: OnceCell<Instance>) -> Self {
        Self {
            inner: Arc::new(ProxyInner {
                hash,
                target_type,
                builder,
                cell,
                slots: Mutex::new(Vec::new()),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.inner.hash
    }

    #[inline]
    #[must_use]
    pub fn target_type(&self) -> &str {
        &self.inner.target_type
    }

    /// Registers another property holding this proxy. Registering a slot twice has no effect.
    pub fn add_slot(&self, slot: Slot) {
        let mut slots = self.inner.slots.lock();
        if !slots.contains(&slot) {
            debug!(hash = self.hash(), owner = %slot.owner, property = %slot.property, "Slot added");
            slots.push(slot);
        }
    }

    #[must_use]
    pub fn slots(&self) -> Vec<Slot> {
        self.inner.slots.lock().clone()
    }

    #[inline]
    #[must_use]
    pub fn is_activated(&self) -> bool {
        self.inner.cell.get().is_some()
    }

    /// The built instance, without activating
    #[inline]
    #[must_use]
    pub fn instance(&self) -> Option<Instance> {
        self.inner.cell.get().cloned()
    }

    /// Builds the dependency on first call, returns the built instance afterwards.
    /// Concurrent activations wait for the one running the builder.
    ///
    /// # Errors
    /// Returns [`InjectErrorKind::Activation`] if the builder failed
    pub fn activate(&self) -> Result<Instance, InjectErrorKind> {
        self.inner
            .cell
            .get_or_try_init(|| {
                debug!(hash = self.hash(), "Activating lazy dependency");
                (self.inner.builder)()
            })
            .cloned()
            .map_err(|source| {
                let err = InjectErrorKind::Activation {
                    hash: self.inner.hash.clone(),
                    source: Box::new(source),
                };
                error!("{}", err);
                err
            })
    }

    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for DependencyProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyProxy")
            .field("hash", &self.inner.hash)
            .field("target_type", &self.inner.target_type)
            .field("activated", &self.is_activated())
            .field("slots", &self.inner.slots.lock().len())
            .finish()
    }
}

/// Result of requesting a lazy dependency
#[derive(Clone, Debug)]
pub enum LazyDependency {
    /// The dependency was already built
    Resolved(Instance),
    Pending(DependencyProxy),
}

impl From<LazyDependency> for InjectedValue {
    fn from(dependency: LazyDependency) -> Self {
        match dependency {
            LazyDependency::Resolved(instance) => InjectedValue::Object(instance),
            LazyDependency::Pending(proxy) => InjectedValue::Lazy(proxy),
        }
    }
}

/// A dependency that is built on first access.
///
/// Objects that may take part in a dependency cycle store `Lazy<T>` instead of `Arc<T>`.
/// All holders of the same dependency share one proxy.
pub struct Lazy<T> {
    proxy: DependencyProxy,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Lazy<T> {
    #[inline]
    #[must_use]
    pub const fn new(proxy: DependencyProxy) -> Self {
        Self {
            proxy,
            _marker: PhantomData,
        }
    }

    /// Activates the dependency if needed
    ///
    /// # Errors
    /// - Returns [`InjectErrorKind::Activation`] if the dependency couldn't be built
    /// - Returns [`InjectErrorKind::IncorrectType`] if the built instance isn't a `T`
    pub fn get(&self) -> Result<Arc<T>, InjectErrorKind> {
        self.proxy
            .activate()?
            .downcast::<T>()
            .map_err(|_| InjectErrorKind::IncorrectType {
                expected: type_name::<T>(),
            })
    }

    #[inline]
    #[must_use]
    pub fn is_activated(&self) -> bool {
        self.proxy.is_activated()
    }

    #[inline]
    #[must_use]
    pub const fn proxy(&self) -> &DependencyProxy {
        &self.proxy
    }
}

impl<T> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Self {
            proxy: self.proxy.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Lazy").field(&self.proxy).finish()
    }
}

impl<T: Send + Sync + 'static> FromInjected for Lazy<T> {
    fn from_injected(value: InjectedValue) -> Result<Self, InjectErrorKind> {
        match value {
            InjectedValue::Lazy(proxy) => Ok(Self::new(proxy)),
            InjectedValue::Object(instance) if instance.is::<T>() => Ok(Self::new(DependencyProxy::resolved(
                type_name::<T>(),
                type_name::<T>(),
                instance,
            ))),
            InjectedValue::Object(_) => Err(InjectErrorKind::IncorrectType {
                expected: type_name::<T>(),
            }),
            InjectedValue::Literal(_) => Err(InjectErrorKind::ExpectedObject),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DependencyProxy, Lazy, Slot};
    use crate::{
        errors::{InjectErrorKind, InstantiateErrorKind, ResolveErrorKind},
        inject::{FromInjected as _, InjectedValue},
        instantiator::Instance,
    };

    use std::sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    };
    use tracing_test::traced_test;

    struct Database;

    #[test]
    #[traced_test]
    fn test_activate_once_for_all_slots() {
        let calls = Arc::new(AtomicU8::new(0));
        let proxy = DependencyProxy::new("Acme.Database", "Acme.Database", {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(Database) as Instance)
            }
        });
        proxy.add_slot(Slot::new("Acme.Shop.Cart", "database"));
        proxy.add_slot(Slot::new("Acme.Shop.Order", "database"));
        proxy.add_slot(Slot::new("Acme.Shop.Order", "database"));

        let cart_database = Lazy::<Database>::from_injected(InjectedValue::Lazy(proxy.clone())).unwrap();
        let order_database = Lazy::<Database>::from_injected(InjectedValue::Lazy(proxy.clone())).unwrap();
        assert!(!order_database.is_activated());

        let first = cart_database.get().unwrap();
        let second = order_database.get().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(order_database.is_activated());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(proxy.slots().len(), 2);
        assert!(logs_contain("Activating lazy dependency"));
    }

    #[test]
    #[traced_test]
    fn test_retry_after_failure() {
        let calls = Arc::new(AtomicU8::new(0));
        let proxy = DependencyProxy::new("Acme.Database", "Acme.Database", {
            let calls = calls.clone();
            move || {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Err(ResolveErrorKind::Instantiate {
                        name: "Acme.Database".to_owned(),
                        source: InstantiateErrorKind::msg("connection refused"),
                    });
                }
                Ok(Arc::new(Database) as Instance)
            }
        });
        let database = Lazy::<Database>::new(proxy.clone());

        assert!(matches!(database.get(), Err(InjectErrorKind::Activation { .. })));
        assert!(!proxy.is_activated());

        database.get().unwrap();
        database.get().unwrap();
        assert!(proxy.is_activated());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_from_built_instance() {
        let instance: Instance = Arc::new(Database);

        let database = Lazy::<Database>::from_injected(InjectedValue::Object(instance.clone())).unwrap();
        assert!(database.is_activated());
        assert!(Arc::ptr_eq(&(database.get().unwrap() as Instance), &instance));

        assert!(matches!(
            Lazy::<String>::from_injected(InjectedValue::Object(instance)),
            Err(InjectErrorKind::IncorrectType { .. })
        ));
    }
}
