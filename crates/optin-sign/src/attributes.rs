//! Flat, insertion-ordered attribute maps.
//!
//! An `AttributeMap` is the data that gets signed: user identity attributes
//! such as `userId`, `email`, or `plan`. Values are restricted to JSON
//! primitives. The JSON text is produced in insertion order, and the token
//! tag covers that text verbatim, so reordering keys changes the token.

use indexmap::IndexMap;
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::{Number, Value};

use crate::error::{SignError, SignResult};

/// Largest integer a JSON consumer backed by IEEE-754 doubles holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
const MAX_SAFE_INTEGER_U64: u64 = 9_007_199_254_740_991;

/// A single attribute value: string, number, boolean, or null.
///
/// Float numbers serialize in ECMAScript `Number.prototype.toString` form
/// (`1e16` as `10000000000000000`, `1.5e-6` as `0.0000015`), so tokens
/// match those signed by a browser or Node `JSON.stringify`.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Number(Number),
    Bool(bool),
    Null,
}

impl AttributeValue {
    /// Build a number value from a float.
    ///
    /// Integral floats inside the safe-integer range are stored as integers,
    /// so `30.0` encodes as `30` the same way browser JSON encoders emit it.
    pub fn from_f64(value: f64) -> SignResult<Self> {
        if !value.is_finite() {
            return Err(SignError::NonFiniteNumber(value.to_string()));
        }
        if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
            return Ok(Self::Number(Number::from(value as i64)));
        }
        Number::from_f64(value)
            .map(Self::Number)
            .ok_or_else(|| SignError::NonFiniteNumber(value.to_string()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// JavaScript truthiness: `null`, `false`, `0` and `""` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::String(s) => !s.is_empty(),
            Self::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Self::Bool(b) => *b,
            Self::Null => false,
        }
    }

    /// Bare string form: strings unquoted, everything else as its JSON text.
    pub fn to_plain_string(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Number(n) => match n.as_f64() {
                Some(f) if n.is_f64() => format_js_number(f),
                _ => n.to_string(),
            },
            Self::Bool(b) => b.to_string(),
            Self::Null => "null".to_string(),
        }
    }

    /// Convert a JSON value, rejecting arrays and objects. `key` names the
    /// attribute in the error.
    pub fn from_json(key: &str, value: Value) -> SignResult<Self> {
        match value {
            Value::String(s) => Ok(Self::String(s)),
            Value::Bool(b) => Ok(Self::Bool(b)),
            Value::Null => Ok(Self::Null),
            Value::Number(n) => {
                let exact = n
                    .as_i64()
                    .map(i64::unsigned_abs)
                    .or_else(|| n.as_u64())
                    .is_some_and(|m| m <= MAX_SAFE_INTEGER_U64);
                if exact {
                    return Ok(Self::Number(n));
                }
                // Floats and integers past 2^53 read the way a JSON parser
                // backed by doubles reads them.
                match n.as_f64() {
                    Some(f) => Self::from_f64(f),
                    None => Err(SignError::NonFiniteNumber(n.to_string())),
                }
            }
            Value::Array(_) => Err(SignError::UnsupportedValue {
                key: key.to_string(),
                kind: "array",
            }),
            Value::Object(_) => Err(SignError::UnsupportedValue {
                key: key.to_string(),
                kind: "object",
            }),
        }
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Number(n) => match n.as_f64() {
                Some(f) if n.is_f64() => {
                    let literal =
                        RawValue::from_string(format_js_number(f)).map_err(S::Error::custom)?;
                    literal.serialize(serializer)
                }
                _ => n.serialize(serializer),
            },
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Null => serializer.serialize_unit(),
        }
    }
}

/// Render a finite float the way ECMAScript `Number.prototype.toString`
/// does: plain digits for 1e-7 <= |x| < 1e21, exponent form outside.
pub(crate) fn format_js_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value < 0.0 {
        return format!("-{}", format_js_number(-value));
    }

    // `{:e}` yields the shortest round-trip digits, e.g. "1.5e-6".
    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();

    let k = digits.len() as i32;
    let n = exponent + 1;

    if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let sign = if n - 1 < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, (n - 1).abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, (n - 1).abs())
        }
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for AttributeValue {
                fn from(n: $t) -> Self {
                    Self::Number(Number::from(n))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32, u64);

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Insertion-ordered map from attribute names to primitive values.
///
/// Inserting an existing key replaces its value in place; the key keeps its
/// original position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttributeMap {
    entries: IndexMap<String, AttributeValue>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous one for that key.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a float, rejecting NaN and infinities.
    pub fn insert_f64(&mut self, key: impl Into<String>, value: f64) -> SignResult<()> {
        let value = AttributeValue::from_f64(value)?;
        self.entries.insert(key.into(), value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Compact JSON text in insertion order.
    pub fn to_json(&self) -> SignResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a JSON object, keeping its key order.
    pub fn from_json_str(json: &str) -> SignResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// Parse a JSON object from raw bytes, keeping its key order.
    pub fn from_json_slice(json: &[u8]) -> SignResult<Self> {
        let value: Value = serde_json::from_slice(json)?;
        Self::try_from(value)
    }
}

impl TryFrom<Value> for AttributeMap {
    type Error = SignError;

    fn try_from(value: Value) -> SignResult<Self> {
        let Value::Object(object) = value else {
            return Err(SignError::Serialization(
                "attributes must be a JSON object".into(),
            ));
        };
        let mut map = AttributeMap::new();
        for (key, value) in object {
            let value = AttributeValue::from_json(&key, value)?;
            map.entries.insert(key, value);
        }
        Ok(map)
    }
}

impl<K, V> FromIterator<(K, V)> for AttributeMap
where
    K: Into<String>,
    V: Into<AttributeValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AttributeMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
