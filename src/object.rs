use core::fmt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::proxy::DependencyProxy;

pub type ObjectRef = Arc<Object>;

/// A live object whose state is a list of named properties.
///
/// Identity is the identity of its [`ObjectRef`]. Properties are assigned directly, without
/// constructors or setters, so graphs with cycles can be built and rebuilt.
pub struct Object {
    type_name: String,
    properties: RwLock<Vec<(String, Value)>>,
}

impl Object {
    #[inline]
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: RwLock::new(Vec::new()),
        }
    }

    #[inline]
    #[must_use]
    pub fn shared(type_name: impl Into<String>) -> ObjectRef {
        Arc::new(Self::new(type_name))
    }

    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn get(&self, property: &str) -> Option<Value> {
        self.properties
            .read()
            .iter()
            .find_map(|(name, value)| (name == property).then(|| value.clone()))
    }

    /// Assigns `property`, keeping its position if it's already set
    pub fn set(&self, property: impl Into<String>, value: impl Into<Value>) {
        let property = property.into();
        let value = value.into();
        let mut properties = self.properties.write();
        match properties.iter_mut().find(|(name, _)| *name == property) {
            Some((_, existing)) => *existing = value,
            None => properties.push((property, value)),
        }
    }

    pub fn remove(&self, property: &str) -> Option<Value> {
        let mut properties = self.properties.write();
        let position = properties.iter().position(|(name, _)| name == property)?;
        Some(properties.remove(position).1)
    }

    /// Snapshot of every property in assignment order
    #[must_use]
    pub fn properties(&self) -> Vec<(String, Value)> {
        self.properties.read().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.read().is_empty()
    }

    /// Drops every property, which also breaks reference cycles through this object
    pub fn clear(&self) {
        self.properties.write().clear();
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let properties = self.properties.read();
        f.debug_struct("Object")
            .field("type_name", &self.type_name)
            .field("properties", &properties.iter().map(|(name, _)| name).collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArrayKey {
    Int(i64),
    String(String),
}

impl From<i64> for ArrayKey {
    fn from(key: i64) -> Self {
        Self::Int(key)
    }
}

impl From<&str> for ArrayKey {
    fn from(key: &str) -> Self {
        Self::String(key.to_owned())
    }
}

/// Unordered collection of objects, unique by identity. Iteration follows insertion order.
#[derive(Clone, Default)]
pub struct ObjectSet {
    members: Vec<ObjectRef>,
}

impl ObjectSet {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { members: Vec::new() }
    }

    /// Returns `false` if `object` is already a member
    pub fn insert(&mut self, object: ObjectRef) -> bool {
        if self.contains(&object) {
            return false;
        }
        self.members.push(object);
        true
    }

    #[must_use]
    pub fn contains(&self, object: &ObjectRef) -> bool {
        self.members.iter().any(|member| Arc::ptr_eq(member, object))
    }

    pub fn remove(&mut self, object: &ObjectRef) -> bool {
        let len = self.members.len();
        self.members.retain(|member| !Arc::ptr_eq(member, object));
        len != self.members.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectRef> + '_ {
        self.members.iter()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl FromIterator<ObjectRef> for ObjectSet {
    fn from_iter<I: IntoIterator<Item = ObjectRef>>(objects: I) -> Self {
        let mut set = Self::new();
        for object in objects {
            set.insert(object);
        }
        set
    }
}

impl PartialEq for ObjectSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|member| other.contains(member))
    }
}

impl fmt::Debug for ObjectSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.members.iter()).finish()
    }
}

/// A property value
#[derive(Clone, Debug)]
pub enum Value {
    Scalar(Scalar),
    /// Ordered key/value pairs
    Array(Vec<(ArrayKey, Value)>),
    Object(ObjectRef),
    ObjectSet(ObjectSet),
    /// Wiring to a not yet built dependency
    Lazy(DependencyProxy),
}

impl Value {
    #[inline]
    #[must_use]
    pub const fn null() -> Self {
        Self::Scalar(Scalar::Null)
    }

    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_object_set(&self) -> Option<&ObjectSet> {
        match self {
            Value::ObjectSet(set) => Some(set),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[(ArrayKey, Value)]> {
        match self {
            Value::Array(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Objects compare by identity, everything else by value
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Scalar(left), Value::Scalar(right)) => left == right,
            (Value::Array(left), Value::Array(right)) => left == right,
            (Value::Object(left), Value::Object(right)) => Arc::ptr_eq(left, right),
            (Value::ObjectSet(left), Value::ObjectSet(right)) => left == right,
            (Value::Lazy(left), Value::Lazy(right)) => left.ptr_eq(right),
            _ => false,
        }
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Scalar(Scalar::Bool(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Int(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Scalar(Scalar::Float(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Scalar(Scalar::String(value.to_owned()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Scalar(Scalar::String(value))
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Self::Object(object)
    }
}

impl From<ObjectSet> for Value {
    fn from(set: ObjectSet) -> Self {
        Self::ObjectSet(set)
    }
}

impl From<DependencyProxy> for Value {
    fn from(proxy: DependencyProxy) -> Self {
        Self::Lazy(proxy)
    }
}
