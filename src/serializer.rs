use core::fmt;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tracing::{debug, error, info_span, warn};

use crate::{
    container::Container,
    errors::DeserializeErrorKind,
    object::{ArrayKey, Object, ObjectRef, ObjectSet, Scalar, Value},
    persistence::PersistenceStore,
    reflection::ReflectionService,
    registry::Registry,
    scope::Scope,
};

/// Handle of an object within one serialized graph
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectToken(u32);

impl ObjectToken {
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum TypedValue {
    Simple(Scalar),
    Array(Vec<(ArrayKey, TypedValue)>),
    ObjectRef(ObjectToken),
    ObjectSetRef(Vec<ObjectToken>),
    /// An object owned by the persistence store
    PersistedRef { type_name: String, identifier: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedObject {
    pub type_name: String,
    pub properties: BTreeMap<String, TypedValue>,
}

/// Flat form of an object graph: every object once, references by token
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializedGraph {
    pub roots: Vec<ObjectToken>,
    pub objects: BTreeMap<ObjectToken, SerializedObject>,
}

impl SerializedGraph {
    #[inline]
    #[must_use]
    pub fn root(&self) -> Option<ObjectToken> {
        self.roots.first().copied()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Flattens object graphs and rebuilds them, keeping shared references and cycles.
///
/// Objects known to the persistence store are written as references to it. Objects of
/// singleton-scoped types and properties holding a dependency proxy are left out.
pub struct ObjectSerializer<'a> {
    registry: &'a Registry,
    reflection: &'a ReflectionService,
    persistence: &'a dyn PersistenceStore,
}

impl<'a> ObjectSerializer<'a> {
    #[inline]
    #[must_use]
    pub const fn new(
        registry: &'a Registry,
        reflection: &'a ReflectionService,
        persistence: &'a dyn PersistenceStore,
    ) -> Self {
        Self {
            registry,
            reflection,
            persistence,
        }
    }

    #[inline]
    #[must_use]
    pub fn for_container(container: &'a Container, persistence: &'a dyn PersistenceStore) -> Self {
        Self::new(container.registry(), container.reflection(), persistence)
    }

    #[must_use]
    pub fn serialize(&self, root: &ObjectRef) -> SerializedGraph {
        self.serialize_all(core::slice::from_ref(root))
    }

    /// Serializes several roots sharing one token table
    #[must_use]
    pub fn serialize_all(&self, roots: &[ObjectRef]) -> SerializedGraph {
        let span = info_span!("serialize", roots = roots.len());
        let _guard = span.enter();

        let mut pass = SerializePass {
            serializer: self,
            visited: Vec::new(),
            index: HashMap::new(),
            pending: Vec::new(),
            graph: SerializedGraph::default(),
        };
        for root in roots {
            let token = pass.visit(root);
            pass.graph.roots.push(token);
        }
        while let Some((token, object)) = pass.pending.pop() {
            pass.write(token, &object);
        }

        debug!(objects = pass.graph.len(), "Serialized");
        pass.graph
    }

    /// Rebuilds the objects of `graph` without calling constructors.
    /// Objects of unknown types are skipped, persisted objects missing in the store leave their property unset.
    ///
    /// # Errors
    /// - Returns [`DeserializeErrorKind::MissingObject`] if a token isn't part of the graph
    /// - Returns [`DeserializeErrorKind::UnknownType`] if a referenced object has an unknown type
    pub fn deserialize(&self, graph: &SerializedGraph) -> Result<BTreeMap<ObjectToken, ObjectRef>, DeserializeErrorKind> {
        let span = info_span!("deserialize", objects = graph.len());
        let _guard = span.enter();

        let mut objects = BTreeMap::new();
        for (token, serialized) in &graph.objects {
            if self.reflection.contains(&serialized.type_name) {
                objects.insert(*token, Object::shared(serialized.type_name.as_str()));
            } else {
                warn!(token = %token, type_name = %serialized.type_name, "Object of unknown type skipped");
            }
        }

        let rebuild = RebuildPass {
            serializer: self,
            graph,
            objects: &objects,
        };
        for (token, serialized) in &graph.objects {
            let Some(object) = objects.get(token) else {
                continue;
            };
            for (property, typed) in &serialized.properties {
                if let Some(value) = rebuild.value_of(typed)? {
                    object.set(property.as_str(), value);
                }
            }
        }

        debug!(objects = objects.len(), "Deserialized");
        Ok(objects)
    }

    fn is_singleton(&self, type_name: &str) -> bool {
        self.registry
            .object_name_by_type_name(type_name)
            .and_then(|name| self.registry.lookup(name))
            .is_some_and(|configuration| configuration.scope() == Scope::Singleton)
    }
}

struct SerializePass<'s, 'a> {
    serializer: &'s ObjectSerializer<'a>,
    /// Token index to object, keeping the indexed addresses alive
    visited: Vec<ObjectRef>,
    index: HashMap<*const Object, ObjectToken>,
    pending: Vec<(ObjectToken, ObjectRef)>,
    graph: SerializedGraph,
}

impl SerializePass<'_, '_> {
    #[inline]
    fn token_of(&self, object: &ObjectRef) -> Option<ObjectToken> {
        self.index.get(&Arc::as_ptr(object)).copied()
    }

    /// Token of `object`, scheduling it for writing on first visit
    fn visit(&mut self, object: &ObjectRef) -> ObjectToken {
        if let Some(token) = self.token_of(object) {
            return token;
        }
        let token = ObjectToken(u32::try_from(self.visited.len()).unwrap_or(u32::MAX));
        self.visited.push(object.clone());
        self.index.insert(Arc::as_ptr(object), token);
        self.pending.push((token, object.clone()));
        token
    }

    fn write(&mut self, token: ObjectToken, object: &ObjectRef) {
        let type_name = object.type_name();
        let mut properties = BTreeMap::new();

        for (property, value) in object.properties() {
            if self.serializer.reflection.is_property_transient(type_name, &property) {
                debug!(type_name, property = %property, "Transient property skipped");
                continue;
            }
            match self.typed_value(&value) {
                Some(typed) => {
                    properties.insert(property, typed);
                }
                None => debug!(type_name, property = %property, "Property skipped"),
            }
        }

        self.graph.objects.insert(
            token,
            SerializedObject {
                type_name: type_name.to_owned(),
                properties,
            },
        );
    }

    fn typed_value(&mut self, value: &Value) -> Option<TypedValue> {
        match value {
            Value::Lazy(_) => None,
            Value::Scalar(scalar) => Some(TypedValue::Simple(scalar.clone())),
            Value::Array(entries) => Some(TypedValue::Array(
                entries
                    .iter()
                    .filter_map(|(key, value)| self.typed_value(value).map(|typed| (key.clone(), typed)))
                    .collect(),
            )),
            Value::ObjectSet(set) => Some(TypedValue::ObjectSetRef(
                set.iter().map(|member| self.visit(member)).collect(),
            )),
            Value::Object(object) => self.object_value(object),
        }
    }

    fn object_value(&mut self, object: &ObjectRef) -> Option<TypedValue> {
        if let Some(token) = self.token_of(object) {
            return Some(TypedValue::ObjectRef(token));
        }

        let persistence = self.serializer.persistence;
        if !persistence.is_new_object(object) {
            if let Some(identifier) = persistence.identifier_for_object(object) {
                return Some(TypedValue::PersistedRef {
                    type_name: object.type_name().to_owned(),
                    identifier,
                });
            }
        }
        if self.serializer.is_singleton(object.type_name()) {
            return None;
        }

        Some(TypedValue::ObjectRef(self.visit(object)))
    }
}

struct RebuildPass<'r, 'a> {
    serializer: &'r ObjectSerializer<'a>,
    graph: &'r SerializedGraph,
    objects: &'r BTreeMap<ObjectToken, ObjectRef>,
}

impl RebuildPass<'_, '_> {
    fn object(&self, token: ObjectToken) -> Result<ObjectRef, DeserializeErrorKind> {
        if let Some(object) = self.objects.get(&token) {
            return Ok(object.clone());
        }
        let err = match self.graph.objects.get(&token) {
            Some(serialized) => DeserializeErrorKind::UnknownType {
                token,
                type_name: serialized.type_name.clone(),
            },
            None => DeserializeErrorKind::MissingObject { token },
        };
        error!("{}", err);
        Err(err)
    }

    /// `None` leaves the property unset
    fn value_of(&self, typed: &TypedValue) -> Result<Option<Value>, DeserializeErrorKind> {
        let value = match typed {
            TypedValue::Simple(scalar) => Value::Scalar(scalar.clone()),
            TypedValue::Array(entries) => Value::Array(
                entries
                    .iter()
                    .map(|(key, typed)| Ok((key.clone(), self.value_of(typed)?.unwrap_or_else(Value::null))))
                    .collect::<Result<_, DeserializeErrorKind>>()?,
            ),
            TypedValue::ObjectRef(token) => Value::Object(self.object(*token)?),
            TypedValue::ObjectSetRef(tokens) => Value::ObjectSet(
                tokens
                    .iter()
                    .map(|token| self.object(*token))
                    .collect::<Result<ObjectSet, _>>()?,
            ),
            TypedValue::PersistedRef { type_name, identifier } => {
                match self.serializer.persistence.fetch_by_identifier(type_name, identifier) {
                    Some(object) => Value::Object(object),
                    None => {
                        warn!(type_name = %type_name, identifier = %identifier, "Persisted object not found");
                        return Ok(None);
                    }
                }
            }
        };
        Ok(Some(value))
    }
}
