use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::ConfigurationErrorKind;

/// Global settings tree.
///
/// Values are addressed by path segments (`["objectcore", "object"]`) or by a dotted path
/// (`"objectcore.object"`). Numeric segments index into sequences.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Settings {
    tree: Value,
}

impl Settings {
    #[inline]
    #[must_use]
    pub const fn new(tree: Value) -> Self {
        Self { tree }
    }

    /// Parses settings from a YAML document. An empty document gives empty settings.
    ///
    /// # Errors
    /// Returns [`ConfigurationErrorKind::UnparsableSettings`] if the document isn't valid YAML
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigurationErrorKind> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(source)
            .map(Self::new)
            .map_err(ConfigurationErrorKind::UnparsableSettings)
    }

    /// # Errors
    /// Returns [`ConfigurationErrorKind::InvalidSettings`] if the document isn't valid JSON
    pub fn from_json_str(source: &str) -> Result<Self, ConfigurationErrorKind> {
        serde_json::from_str(source)
            .map(Self::new)
            .map_err(|source| ConfigurationErrorKind::InvalidSettings {
                path: String::new(),
                source,
            })
    }

    #[inline]
    #[must_use]
    pub const fn tree(&self) -> &Value {
        &self.tree
    }

    #[must_use]
    pub fn value_by_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        path.iter().try_fold(&self.tree, |node, segment| {
            let segment = segment.as_ref();
            match node {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
                _ => None,
            }
        })
    }

    /// An empty path addresses the whole tree
    #[must_use]
    pub fn value_by_dotted_path(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(&self.tree);
        }
        self.value_by_path(&path.split('.').collect::<Vec<_>>())
    }

    /// Deserializes the section at `path`, falling back to `T::default()` when it's absent.
    ///
    /// # Errors
    /// Returns [`ConfigurationErrorKind::InvalidSettings`] if the section has an unexpected shape
    pub fn section<T: DeserializeOwned + Default>(&self, path: &str) -> Result<T, ConfigurationErrorKind> {
        match self.value_by_dotted_path(path) {
            None | Some(Value::Null) => Ok(T::default()),
            Some(value) => T::deserialize(value).map_err(|source| ConfigurationErrorKind::InvalidSettings {
                path: path.to_owned(),
                source,
            }),
        }
    }
}

impl From<Value> for Settings {
    fn from(tree: Value) -> Self {
        Self::new(tree)
    }
}
