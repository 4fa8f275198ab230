use crate::serializer::ObjectToken;

#[derive(thiserror::Error, Debug)]
pub enum DeserializeErrorKind {
    #[error("Object {token} is referenced, but missing in the serialized graph")]
    MissingObject { token: ObjectToken },
    #[error("Object {token} is referenced, but its type \"{type_name}\" isn't known")]
    UnknownType { token: ObjectToken, type_name: String },
}
