use super::ResolveErrorKind;

#[derive(thiserror::Error, Debug)]
pub enum InjectErrorKind {
    #[error("Expected an object, found a literal value")]
    ExpectedObject,
    #[error("Expected a literal value, found an object")]
    ExpectedLiteral,
    #[error("Incorrect injected type. Expected: {expected}")]
    IncorrectType { expected: &'static str },
    #[error("Literal value can't be converted to {expected}: {source}")]
    InvalidLiteral {
        expected: &'static str,
        source: serde_json::Error,
    },
    #[error("Missing argument at position {position}")]
    MissingArgument { position: usize },
    #[error("Lazy dependency \"{hash}\" couldn't be activated: {source}")]
    Activation {
        hash: String,
        source: Box<ResolveErrorKind>,
    },
}
