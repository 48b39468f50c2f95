//! User properties handed to the opt-in provider.
//!
//! Callers pass either a plain attribute map or a token that an upstream
//! identity service already signed. Only a signed value can carry the user
//! id; a plain map relies on the explicit id supplied next to it.
//!
//! Extracting the id here does not check the tag. The backend verifies the
//! signature when the properties reach it.

use crate::attributes::AttributeMap;
use crate::error::{SignError, SignResult};
use crate::token::{self, SEPARATOR};

/// Attribute carrying the user id inside signed properties.
pub const USER_ID_ATTRIBUTE: &str = "userId";

#[derive(Debug, Clone, PartialEq)]
pub enum UserProperties {
    /// A `<payload>.<tag>` token produced by `sign`.
    Signed(String),
    /// Unsigned attributes.
    Plain(AttributeMap),
}

impl UserProperties {
    /// The user id embedded in signed properties.
    ///
    /// Plain properties and an empty string yield `Ok(None)`. Signed
    /// properties must split into exactly two parts, decode to a flat JSON
    /// object, and carry a truthy `userId`; numeric and boolean ids are
    /// returned in their string form. The payload may be unpadded or use the
    /// URL-safe alphabet.
    pub fn user_id(&self) -> SignResult<Option<String>> {
        let Self::Signed(signed) = self else {
            return Ok(None);
        };
        // An empty string counts as no properties at all.
        if signed.is_empty() {
            return Ok(None);
        }

        let parts: Vec<&str> = signed.split(SEPARATOR).collect();
        if parts.len() != 2 {
            return Err(SignError::MalformedToken(
                "user properties were given, but not properly signed".into(),
            ));
        }

        let json = token::decode_base64_lenient(parts[0])?;
        let attributes = AttributeMap::from_json_slice(&json).map_err(|e| match e {
            SignError::Serialization(msg) => SignError::MalformedToken(format!(
                "user properties are not base64-encoded JSON ({})",
                msg
            )),
            other => other,
        })?;

        match attributes.get(USER_ID_ATTRIBUTE) {
            Some(id) if id.is_truthy() => Ok(Some(id.to_plain_string())),
            _ => Err(SignError::MissingUserId),
        }
    }

    /// Value sent as the `props` query parameter.
    ///
    /// Signed tokens pass through untouched; plain maps are sent as base64
    /// JSON without a tag.
    pub fn encoded(&self) -> SignResult<String> {
        match self {
            Self::Signed(signed) => Ok(signed.clone()),
            Self::Plain(attributes) => token::encode_payload(attributes),
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Self::Signed(_))
    }
}

impl From<AttributeMap> for UserProperties {
    fn from(attributes: AttributeMap) -> Self {
        Self::Plain(attributes)
    }
}

impl From<String> for UserProperties {
    fn from(signed: String) -> Self {
        Self::Signed(signed)
    }
}

impl From<&str> for UserProperties {
    fn from(signed: &str) -> Self {
        Self::Signed(signed.to_string())
    }
}

/// Resolve the user id: signed properties win over the explicit `fallback`.
///
/// Returns `Ok(None)` when neither source provides an id.
pub fn resolve_user_id(
    properties: Option<&UserProperties>,
    fallback: Option<&str>,
) -> SignResult<Option<String>> {
    let from_properties = match properties {
        Some(props) => props.user_id()?,
        None => None,
    };
    Ok(from_properties.or_else(|| fallback.map(str::to_string)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::TokenCodec;
    use crate::key::SecretKey;

    fn signed(attributes: &AttributeMap) -> UserProperties {
        let key = SecretKey::try_from("secret").unwrap();
        UserProperties::Signed(TokenCodec::new().sign(attributes, &key).unwrap())
    }

    #[test]
    fn test_user_id_from_signed_properties() {
        let props = signed(&AttributeMap::new().with("userId", "u-42").with("plan", "pro"));
        assert_eq!(props.user_id().unwrap().as_deref(), Some("u-42"));
    }

    #[test]
    fn test_numeric_user_id_is_stringified() {
        let props = signed(&AttributeMap::new().with("userId", 1234));
        assert_eq!(props.user_id().unwrap().as_deref(), Some("1234"));
    }

    #[test]
    fn test_plain_properties_have_no_user_id() {
        let props = UserProperties::from(AttributeMap::new().with("userId", "u-1"));
        assert_eq!(props.user_id().unwrap(), None);
        assert!(!props.is_signed());
    }

    #[test]
    fn test_empty_signed_properties_have_no_user_id() {
        let empty = UserProperties::from("");
        assert_eq!(empty.user_id().unwrap(), None);
        assert_eq!(
            resolve_user_id(Some(&empty), Some("explicit")).unwrap().as_deref(),
            Some("explicit")
        );
        assert_eq!(resolve_user_id(Some(&empty), None).unwrap(), None);
    }

    #[test]
    fn test_user_id_from_unpadded_or_url_safe_payload() {
        let unpadded = UserProperties::from("eyJ1c2VySWQiOiJ1LTEifQ.tag");
        assert_eq!(unpadded.user_id().unwrap().as_deref(), Some("u-1"));

        let url_safe = UserProperties::from("eyJ1c2VySWQiOiJ1fn5-In0.tag");
        assert_eq!(url_safe.user_id().unwrap().as_deref(), Some("u~~~"));
    }

    #[test]
    fn test_wrong_number_of_parts() {
        for value in ["no-separator", "a.b.c"] {
            let props = UserProperties::from(value);
            assert!(matches!(
                props.user_id(),
                Err(SignError::MalformedToken(_))
            ));
        }
    }

    #[test]
    fn test_payload_not_base64() {
        let props = UserProperties::from("***.tag");
        assert!(matches!(props.user_id(), Err(SignError::MalformedToken(_))));
    }

    #[test]
    fn test_payload_not_json() {
        // base64("hello")
        let props = UserProperties::from("aGVsbG8=.tag");
        let err = props.user_id().unwrap_err();
        assert!(err.to_string().contains("not base64-encoded JSON"));
    }

    #[test]
    fn test_missing_or_falsy_user_id() {
        let cases = vec![
            AttributeMap::new().with("email", "a@example.com"),
            AttributeMap::new().with("userId", None::<String>),
            AttributeMap::new().with("userId", ""),
            AttributeMap::new().with("userId", 0),
            AttributeMap::new().with("userId", false),
        ];
        for attrs in cases {
            assert_eq!(signed(&attrs).user_id().unwrap_err(), SignError::MissingUserId);
        }
    }

    #[test]
    fn test_user_id_ignores_tag() {
        let props = signed(&AttributeMap::new().with("userId", "u-7"));
        let UserProperties::Signed(token) = props else {
            unreachable!()
        };
        let (payload, _) = token.split_once('.').unwrap();
        let forged = UserProperties::from(format!("{}.forged", payload));
        assert_eq!(forged.user_id().unwrap().as_deref(), Some("u-7"));
    }

    #[test]
    fn test_resolve_prefers_signed_id() {
        let props = signed(&AttributeMap::new().with("userId", "from-token"));
        let id = resolve_user_id(Some(&props), Some("explicit")).unwrap();
        assert_eq!(id.as_deref(), Some("from-token"));
    }

    #[test]
    fn test_resolve_falls_back() {
        let plain = UserProperties::from(AttributeMap::new());
        assert_eq!(
            resolve_user_id(Some(&plain), Some("explicit")).unwrap().as_deref(),
            Some("explicit")
        );
        assert_eq!(resolve_user_id(None, Some("explicit")).unwrap().as_deref(), Some("explicit"));
        assert_eq!(resolve_user_id(None, None).unwrap(), None);
    }

    #[test]
    fn test_resolve_propagates_malformed_signed() {
        let bad = UserProperties::from("garbage");
        assert!(resolve_user_id(Some(&bad), Some("explicit")).is_err());
    }

    #[test]
    fn test_encoded_properties() {
        let plain = UserProperties::from(AttributeMap::new().with("name", "John").with("age", 30));
        assert_eq!(plain.encoded().unwrap(), "eyJuYW1lIjoiSm9obiIsImFnZSI6MzB9");

        let token = "eyJ1c2VySWQiOiJ1LTEifQ==.tag";
        assert_eq!(UserProperties::from(token).encoded().unwrap(), token);
    }
}
