use core::mem;
use std::sync::Arc;
use tracing::{debug, error};

use crate::{
    errors::{HookFailure, ShutdownError},
    instantiator::{BoxedLifecycleMethod, Instance},
};

#[derive(Clone)]
pub(crate) struct ShutdownHook {
    pub(crate) instance: Instance,
    pub(crate) type_name: String,
    pub(crate) method: String,
    pub(crate) call: BoxedLifecycleMethod,
}

impl ShutdownHook {
    #[inline]
    fn is_same(&self, instance: &Instance, method: &str) -> bool {
        Arc::ptr_eq(&self.instance, instance) && self.method == method
    }
}

/// Shutdown hooks in registration order.
/// Hooks of internal objects run after every application hook.
#[derive(Clone, Default)]
pub(crate) struct ShutdownHooks {
    application: Vec<ShutdownHook>,
    internal: Vec<ShutdownHook>,
}

impl ShutdownHooks {
    #[inline]
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self {
            application: Vec::new(),
            internal: Vec::new(),
        }
    }

    /// Registering the same method of the same instance twice has no effect
    pub(crate) fn register(&mut self, hook: ShutdownHook, internal: bool) {
        if self
            .application
            .iter()
            .chain(&self.internal)
            .any(|registered| registered.is_same(&hook.instance, &hook.method))
        {
            return;
        }
        debug!(type_name = %hook.type_name, method = %hook.method, internal, "Shutdown hook registered");
        if internal {
            self.internal.push(hook);
        } else {
            self.application.push(hook);
        }
    }

    /// Hooks of a removed instance
    pub(crate) fn remove_instance(&mut self, instance: &Instance) {
        self.application.retain(|hook| !Arc::ptr_eq(&hook.instance, instance));
        self.internal.retain(|hook| !Arc::ptr_eq(&hook.instance, instance));
    }

    #[inline]
    #[must_use]
    pub(crate) fn take(&mut self) -> Self {
        mem::take(self)
    }

    #[inline]
    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.application.is_empty() && self.internal.is_empty()
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.application.len() + self.internal.len()
    }

    /// Calls every hook, application bucket first. A failing hook doesn't stop the remaining ones.
    ///
    /// # Errors
    /// Returns [`ShutdownError`] with every failure if any hook failed
    pub(crate) fn run(self) -> Result<(), ShutdownError> {
        let mut failures = Vec::new();
        for hook in self.application.into_iter().chain(self.internal) {
            match (hook.call)(&hook.instance) {
                Ok(()) => debug!(type_name = %hook.type_name, method = %hook.method, "Shutdown hook called"),
                Err(err) => {
                    error!(type_name = %hook.type_name, method = %hook.method, "Shutdown hook failed: {}", err);
                    failures.push(HookFailure {
                        type_name: hook.type_name,
                        method: hook.method,
                        error: err,
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ShutdownError { failures })
        }
    }
}
