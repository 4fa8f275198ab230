use crate::object::ObjectRef;

/// External store owning persisted objects
pub trait PersistenceStore: Send + Sync {
    fn fetch_by_identifier(&self, type_name: &str, identifier: &str) -> Option<ObjectRef>;

    /// Whether `object` isn't known to the store yet
    fn is_new_object(&self, object: &ObjectRef) -> bool;

    fn identifier_for_object(&self, object: &ObjectRef) -> Option<String>;
}

/// Store without persisted objects: every object is new
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPersistence;

impl PersistenceStore for NoPersistence {
    #[inline]
    fn fetch_by_identifier(&self, _type_name: &str, _identifier: &str) -> Option<ObjectRef> {
        None
    }

    #[inline]
    fn is_new_object(&self, _object: &ObjectRef) -> bool {
        true
    }

    #[inline]
    fn identifier_for_object(&self, _object: &ObjectRef) -> Option<String> {
        None
    }
}
