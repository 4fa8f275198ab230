//! Object declarations as written by packages, before they are merged into
//! [`super::ObjectConfiguration`]s.
//!
//! ```yaml
//! Acme.Shop.Cart:
//!   scope: session
//!   properties:
//!     logger:
//!       object: Acme.Log.Logger
//!     limit:
//!       value: 10
//!     currency:
//!       setting: acme.shop.currency
//! Acme.Shop.Cache:
//!   factoryObjectName: Acme.Cache.Factory
//!   factoryMethodName: create
//!   arguments:
//!     1:
//!       value: carts
//! ```

use core::fmt;
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer,
};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::ConfigurationErrorKind;

/// Declarations of one package, keyed by object name
pub type RawDeclarations = BTreeMap<String, RawObjectConfiguration>;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RawObjectConfiguration {
    pub scope: Option<String>,
    pub class_name: Option<String>,
    pub factory_object_name: Option<String>,
    pub factory_method_name: Option<String>,
    /// Keyed by one-based position or by constructor parameter name
    #[serde(deserialize_with = "argument_keys")]
    pub arguments: BTreeMap<String, RawInjection>,
    pub properties: BTreeMap<String, RawInjection>,
    pub lifecycle_initialization_method_name: Option<String>,
    pub lifecycle_shutdown_method_name: Option<String>,
    pub autowiring: Option<bool>,
}

/// Exactly one of `value`, `object` and `setting` must be set
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawInjection {
    #[serde(deserialize_with = "present")]
    pub value: Option<Value>,
    pub object: Option<RawObjectReference>,
    pub setting: Option<String>,
    pub lazy: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawObjectReference {
    Name(String),
    Inline(RawInlineObject),
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RawInlineObject {
    pub name: Option<String>,
    pub class_name: Option<String>,
    pub factory_object_name: Option<String>,
    pub factory_method_name: Option<String>,
    #[serde(deserialize_with = "argument_keys")]
    pub arguments: BTreeMap<String, RawInjection>,
    pub properties: BTreeMap<String, RawInjection>,
}

/// Argument key written either as a position or as a parameter name
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct ArgumentKey(String);

impl<'de> Deserialize<'de> for ArgumentKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = ArgumentKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an argument position or a parameter name")
            }

            fn visit_u64<E: de::Error>(self, position: u64) -> Result<Self::Value, E> {
                Ok(ArgumentKey(position.to_string()))
            }

            fn visit_i64<E: de::Error>(self, position: i64) -> Result<Self::Value, E> {
                Ok(ArgumentKey(position.to_string()))
            }

            fn visit_str<E: de::Error>(self, name: &str) -> Result<Self::Value, E> {
                Ok(ArgumentKey(name.to_owned()))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

fn argument_keys<'de, D>(deserializer: D) -> Result<BTreeMap<String, RawInjection>, D::Error>
where
    D: Deserializer<'de>,
{
    let arguments = BTreeMap::<ArgumentKey, RawInjection>::deserialize(deserializer)?;
    Ok(arguments.into_iter().map(|(ArgumentKey(key), injection)| (key, injection)).collect())
}

/// Keeps an explicit `null` apart from a missing key
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Parses the YAML object declarations of a package. An empty document declares nothing.
///
/// # Errors
/// Returns [`ConfigurationErrorKind::UnparsableDeclarations`] if the document isn't valid YAML
/// or doesn't have the declaration shape
pub fn parse_declarations(package_key: &str, source: &str) -> Result<RawDeclarations, ConfigurationErrorKind> {
    if source.trim().is_empty() {
        return Ok(RawDeclarations::new());
    }
    serde_yaml::from_str(source).map_err(|source| ConfigurationErrorKind::UnparsableDeclarations {
        package_key: package_key.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_declarations, RawInjection, RawObjectReference};

    use serde_json::{json, Value};

    #[test]
    fn test_parse() {
        let declarations = parse_declarations(
            "Acme.Shop",
            "
Acme.Shop.Cart:
  scope: session
  lifecycleInitializationMethodName: warmUp
  properties:
    logger:
      object: Acme.Log.Logger
      lazy: false
    limit:
      value: 10
    note:
      value: ~
    currency:
      setting: acme.shop.currency
Acme.Shop.Cache:
  factoryObjectName: Acme.Cache.Factory
  factoryMethodName: create
  arguments:
    1:
      value: carts
    2:
      object:
        className: Acme.Cache.Backend
",
        )
        .unwrap();

        let cart = &declarations["Acme.Shop.Cart"];
        assert_eq!(cart.scope.as_deref(), Some("session"));
        assert_eq!(cart.lifecycle_initialization_method_name.as_deref(), Some("warmUp"));
        assert_eq!(
            cart.properties["logger"],
            RawInjection {
                object: Some(RawObjectReference::Name("Acme.Log.Logger".to_owned())),
                lazy: Some(false),
                ..RawInjection::default()
            }
        );
        assert_eq!(cart.properties["limit"].value, Some(json!(10)));
        assert_eq!(cart.properties["note"].value, Some(Value::Null));
        assert_eq!(cart.properties["currency"].setting.as_deref(), Some("acme.shop.currency"));

        let cache = &declarations["Acme.Shop.Cache"];
        assert_eq!(cache.factory_method_name.as_deref(), Some("create"));
        assert_eq!(cache.arguments["1"].value, Some(json!("carts")));
        match &cache.arguments["2"].object {
            Some(RawObjectReference::Inline(inline)) => {
                assert_eq!(inline.class_name.as_deref(), Some("Acme.Cache.Backend"));
            }
            other => panic!("unexpected reference: {other:?}"),
        }
    }

    #[test]
    fn test_inline_positions() {
        let declarations = parse_declarations(
            "Acme.Mail",
            "
Acme.Mail.Mailer:
  properties:
    cache:
      object:
        factoryObjectName: Acme.Cache.Manager
        factoryMethodName: frontend
        arguments:
          1:
            value: mail
          name:
            value: outgoing
",
        )
        .unwrap();

        let Some(RawObjectReference::Inline(inline)) = &declarations["Acme.Mail.Mailer"].properties["cache"].object else {
            panic!("expected an inline declaration");
        };
        assert_eq!(inline.arguments["1"].value, Some(json!("mail")));
        assert_eq!(inline.arguments["name"].value, Some(json!("outgoing")));
    }

    #[test]
    fn test_unknown_keys() {
        assert!(parse_declarations("Acme.Shop", "Acme.Shop.Cart: { scopes: singleton }").is_err());
        assert!(parse_declarations("Acme.Shop", "Acme.Shop.Cart: { properties: { a: { values: 1 } } }").is_err());
        assert!(parse_declarations("Acme.Shop", "").unwrap().is_empty());
    }
}
