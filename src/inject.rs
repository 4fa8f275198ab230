use core::any::type_name;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{collections::VecDeque, sync::Arc};

use crate::{errors::InjectErrorKind, instantiator::Instance, proxy::DependencyProxy};

/// A value handed to a constructor, factory method or injection method
#[derive(Clone, Debug)]
pub enum InjectedValue {
    Literal(Value),
    Object(Instance),
    /// A not yet built dependency, see [`crate::Lazy`]
    Lazy(DependencyProxy),
}

/// Conversion of an [`InjectedValue`] into the type a method expects
pub trait FromInjected: Sized {
    /// # Errors
    /// Returns [`InjectErrorKind`] if the value has an unexpected kind or type
    fn from_injected(value: InjectedValue) -> Result<Self, InjectErrorKind>;
}

impl FromInjected for InjectedValue {
    #[inline]
    fn from_injected(value: InjectedValue) -> Result<Self, InjectErrorKind> {
        Ok(value)
    }
}

/// An object dependency. A lazy dependency is activated on extraction.
pub struct Inject<Dep>(pub Arc<Dep>);

impl<Dep: Send + Sync + 'static> FromInjected for Inject<Dep> {
    fn from_injected(value: InjectedValue) -> Result<Self, InjectErrorKind> {
        let instance = match value {
            InjectedValue::Object(instance) => instance,
            InjectedValue::Lazy(proxy) => proxy.activate()?,
            InjectedValue::Literal(_) => return Err(InjectErrorKind::ExpectedObject),
        };
        instance
            .downcast::<Dep>()
            .map(Self)
            .map_err(|_| InjectErrorKind::IncorrectType {
                expected: type_name::<Dep>(),
            })
    }
}

/// An optional object dependency: `null` literals become `None`
pub struct InjectOptional<Dep>(pub Option<Arc<Dep>>);

impl<Dep: Send + Sync + 'static> FromInjected for InjectOptional<Dep> {
    fn from_injected(value: InjectedValue) -> Result<Self, InjectErrorKind> {
        match value {
            InjectedValue::Literal(Value::Null) => Ok(Self(None)),
            value => Inject::from_injected(value).map(|Inject(dependency)| Self(Some(dependency))),
        }
    }
}

/// A literal value, deserialized from its JSON form
pub struct Literal<V>(pub V);

impl<V: DeserializeOwned> FromInjected for Literal<V> {
    fn from_injected(value: InjectedValue) -> Result<Self, InjectErrorKind> {
        let InjectedValue::Literal(value) = value else {
            return Err(InjectErrorKind::ExpectedLiteral);
        };
        serde_json::from_value(value)
            .map(Self)
            .map_err(|source| InjectErrorKind::InvalidLiteral {
                expected: type_name::<V>(),
                source,
            })
    }
}

/// Positional arguments of a constructor or factory method
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    values: VecDeque<InjectedValue>,
    position: usize,
}

impl Arguments {
    #[inline]
    #[must_use]
    pub fn new(values: Vec<InjectedValue>) -> Self {
        Self {
            values: values.into(),
            position: 0,
        }
    }

    /// Takes the next argument
    ///
    /// # Errors
    /// - Returns [`InjectErrorKind::MissingArgument`] if all arguments are taken
    /// - Returns [`InjectErrorKind`] if the argument can't be converted
    pub fn next<V: FromInjected>(&mut self) -> Result<V, InjectErrorKind> {
        let position = self.position;
        let value = self
            .values
            .pop_front()
            .ok_or(InjectErrorKind::MissingArgument { position })?;
        self.position += 1;
        V::from_injected(value)
    }

    /// Takes the next argument, `None` if all arguments are taken
    ///
    /// # Errors
    /// Returns [`InjectErrorKind`] if the argument can't be converted
    pub fn next_optional<V: FromInjected>(&mut self) -> Result<Option<V>, InjectErrorKind> {
        if self.values.is_empty() {
            return Ok(None);
        }
        self.next().map(Some)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<InjectedValue>> for Arguments {
    fn from(values: Vec<InjectedValue>) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::{Arguments, Inject, InjectOptional, InjectedValue, Literal};
    use crate::{errors::InjectErrorKind, instantiator::Instance};

    use serde_json::json;
    use std::sync::Arc;

    struct Mailer(u16);

    #[test]
    fn test_extract_arguments() {
        let mailer: Instance = Arc::new(Mailer(25));
        let mut arguments = Arguments::new(vec![
            InjectedValue::Object(mailer.clone()),
            InjectedValue::Literal(json!(["a", "b"])),
            InjectedValue::Literal(json!(null)),
        ]);

        let Inject(extracted) = arguments.next::<Inject<Mailer>>().unwrap();
        assert_eq!(extracted.0, 25);
        let Literal(names) = arguments.next::<Literal<Vec<String>>>().unwrap();
        assert_eq!(names, ["a", "b"]);
        let InjectOptional(optional) = arguments.next::<InjectOptional<Mailer>>().unwrap();
        assert!(optional.is_none());

        assert!(arguments.next_optional::<Literal<u8>>().unwrap().is_none());
        assert!(matches!(
            arguments.next::<Literal<u8>>(),
            Err(InjectErrorKind::MissingArgument { position: 3 })
        ));
    }

    #[test]
    fn test_mismatches() {
        let mailer: Instance = Arc::new(Mailer(25));

        assert!(matches!(
            Arguments::new(vec![InjectedValue::Object(mailer.clone())]).next::<Inject<String>>(),
            Err(InjectErrorKind::IncorrectType { .. })
        ));
        assert!(matches!(
            Arguments::new(vec![InjectedValue::Object(mailer)]).next::<Literal<u8>>(),
            Err(InjectErrorKind::ExpectedLiteral)
        ));
        assert!(matches!(
            Arguments::new(vec![InjectedValue::Literal(json!(1))]).next::<Inject<Mailer>>(),
            Err(InjectErrorKind::ExpectedObject)
        ));
        assert!(matches!(
            Arguments::new(vec![InjectedValue::Literal(json!("x"))]).next::<Literal<u8>>(),
            Err(InjectErrorKind::InvalidLiteral { .. })
        ));
    }
}
