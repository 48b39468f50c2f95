//! Command handlers for the `optin` binary.
//!
//! Each handler takes already-resolved inputs and returns the text to print,
//! so the binary stays a thin layer over argument parsing, config loading,
//! and key resolution.

pub mod config;
pub mod error;

pub use config::{CliConfig, KeyConfig};
pub use error::{CliError, CliResult};

use optin_sign::{AttributeMap, AttributeValue, SecretKey, TokenCodec, UserProperties};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Parse a `--attr` value: `null`, booleans and JSON numbers keep their
/// type, anything else is a string.
pub fn parse_attr_value(key: &str, raw: &str) -> CliResult<AttributeValue> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Null | Value::Bool(_) | Value::Number(_))) => {
            Ok(AttributeValue::from_json(key, value)?)
        }
        _ => Ok(AttributeValue::from(raw)),
    }
}

/// Build the attribute map: the `--json` object first, then each
/// `key=value` pair in order. A repeated key overwrites in place.
pub fn build_attributes(json: Option<&str>, pairs: &[String]) -> CliResult<AttributeMap> {
    let mut attributes = match json {
        Some(text) => AttributeMap::from_json_str(text)?,
        None => AttributeMap::new(),
    };
    for pair in pairs {
        let (key, raw) = pair.split_once('=').ok_or_else(|| {
            CliError::InvalidArgument(format!("expected key=value, got '{}'", pair))
        })?;
        if key.is_empty() {
            return Err(CliError::InvalidArgument(format!(
                "attribute name is empty in '{}'",
                pair
            )));
        }
        let value = parse_attr_value(key, raw)?;
        attributes.insert(key, value);
    }
    Ok(attributes)
}

pub fn run_sign(codec: &TokenCodec, attributes: &AttributeMap, key: &SecretKey) -> CliResult<String> {
    let token = codec.sign(attributes, key)?;
    info!(attributes = attributes.len(), "token signed");
    Ok(token)
}

pub fn run_verify(codec: &TokenCodec, token: &str, key: &SecretKey) -> bool {
    let valid = codec.verify(token, key);
    if valid {
        info!("token verified");
    } else {
        warn!("token rejected");
    }
    valid
}

/// Verify `token` and return its attributes as compact JSON.
pub fn run_decode(codec: &TokenCodec, token: &str, key: &SecretKey) -> CliResult<String> {
    let attributes = codec.open(token, key)?;
    debug!(attributes = attributes.len(), "token opened");
    Ok(attributes.to_json()?)
}

/// Resolve the user id the way the opt-in provider does.
pub fn run_user_id(properties: Option<&str>, fallback: Option<&str>) -> CliResult<String> {
    let properties = properties.map(UserProperties::from);
    optin_sign::resolve_user_id(properties.as_ref(), fallback)?.ok_or_else(|| {
        CliError::InvalidArgument(
            "`userId` is required either as --fallback or in the signed properties".into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SecretKey {
        SecretKey::try_from("secret").unwrap()
    }

    #[test]
    fn test_parse_attr_value_types() {
        assert_eq!(parse_attr_value("k", "null").unwrap(), AttributeValue::Null);
        assert_eq!(parse_attr_value("k", "true").unwrap(), AttributeValue::Bool(true));
        assert_eq!(parse_attr_value("k", "30").unwrap(), AttributeValue::from(30));
        assert_eq!(parse_attr_value("k", "30.0").unwrap(), AttributeValue::from(30));
        assert_eq!(parse_attr_value("k", "John").unwrap(), AttributeValue::from("John"));
        assert_eq!(parse_attr_value("k", "").unwrap(), AttributeValue::from(""));
        // Quoted JSON strings and arrays are kept verbatim as text.
        assert_eq!(parse_attr_value("k", "\"x\"").unwrap(), AttributeValue::from("\"x\""));
        assert_eq!(parse_attr_value("k", "[1]").unwrap(), AttributeValue::from("[1]"));
    }

    #[test]
    fn test_build_attributes_order() {
        let attrs = build_attributes(
            Some(r#"{"userId":"u-1","plan":"free"}"#),
            &["plan=pro".to_string(), "age=30".to_string()],
        )
        .unwrap();
        assert_eq!(
            attrs.to_json().unwrap(),
            r#"{"userId":"u-1","plan":"pro","age":30}"#
        );
    }

    #[test]
    fn test_build_attributes_value_with_equals() {
        let attrs = build_attributes(None, &["q=a=b".to_string()]).unwrap();
        assert_eq!(attrs.get("q").and_then(|v| v.as_str()), Some("a=b"));
    }

    #[test]
    fn test_build_attributes_rejects_bad_pairs() {
        assert!(matches!(
            build_attributes(None, &["novalue".to_string()]),
            Err(CliError::InvalidArgument(_))
        ));
        assert!(matches!(
            build_attributes(None, &["=x".to_string()]),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_build_attributes_rejects_nested_json() {
        let err = build_attributes(Some(r#"{"tags":[1,2]}"#), &[]).unwrap_err();
        assert!(matches!(err, CliError::Sign(_)));
    }

    #[test]
    fn test_sign_verify_decode() {
        let codec = TokenCodec::new();
        let attrs = build_attributes(None, &["name=John".to_string(), "age=30".to_string()])
            .unwrap();
        let token = run_sign(&codec, &attrs, &key()).unwrap();
        assert_eq!(
            token,
            "eyJuYW1lIjoiSm9obiIsImFnZSI6MzB9.Zak66LPO7zqfFB0fMggBe3Jl94gzYjUlcOWxBo4S54c="
        );
        assert!(run_verify(&codec, &token, &key()));
        assert_eq!(
            run_decode(&codec, &token, &key()).unwrap(),
            r#"{"name":"John","age":30}"#
        );
    }

    #[test]
    fn test_decode_rejects_wrong_key() {
        let codec = TokenCodec::new();
        let token = run_sign(&codec, &AttributeMap::new(), &key()).unwrap();
        let wrong = SecretKey::try_from("wrongkey").unwrap();
        assert!(!run_verify(&codec, &token, &wrong));
        assert!(run_decode(&codec, &token, &wrong).is_err());
    }

    #[test]
    fn test_user_id() {
        let codec = TokenCodec::new();
        let attrs = AttributeMap::new().with("userId", "u-42");
        let token = run_sign(&codec, &attrs, &key()).unwrap();

        assert_eq!(run_user_id(Some(&token), Some("fb")).unwrap(), "u-42");
        assert_eq!(run_user_id(None, Some("fb")).unwrap(), "fb");
        assert!(matches!(
            run_user_id(None, None),
            Err(CliError::InvalidArgument(_))
        ));
        assert!(run_user_id(Some("not signed"), Some("fb")).is_err());
        assert_eq!(run_user_id(Some(""), Some("fb")).unwrap(), "fb");
        assert!(matches!(
            run_user_id(Some(""), None),
            Err(CliError::InvalidArgument(_))
        ));
    }
}
