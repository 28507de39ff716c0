//! Native value model.
//!
//! [`NativeValue`] is what applications read and write. It is a closed tagged
//! union, so the codec classifies values with a plain `match` instead of
//! inspecting types at runtime.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Index;

/// A numeric value. Integers and floats compare numerically.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    /// Unsigned integers above `i64::MAX`.
    UInt(u64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(i) => i as f64,
            Number::UInt(u) => u as f64,
            Number::Float(f) => f,
        }
    }

    /// Decimal string for the wire, or `None` when the value has no
    /// decimal representation (NaN, infinities).
    pub fn to_decimal_string(&self) -> Option<String> {
        match *self {
            Number::Int(i) => Some(i.to_string()),
            Number::UInt(u) => Some(u.to_string()),
            Number::Float(f) if f.is_finite() => Some(f.to_string()),
            Number::Float(_) => None,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (Number::UInt(a), Number::UInt(b)) => a == b,
            (Number::Int(i), Number::UInt(u)) | (Number::UInt(u), Number::Int(i)) => {
                u64::try_from(*i).map_or(false, |i| i == *u)
            }
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::UInt(u) => write!(f, "{}", u),
            Number::Float(v) => write!(f, "{}", v),
        }
    }
}

/// A key-ordered, name-addressable record of native values.
///
/// Decoded `M` attributes and whole decoded items are exposed as records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(BTreeMap<String, NativeValue>);

impl Record {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, name: &str) -> Option<&NativeValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl IntoNative,
    ) -> Option<NativeValue> {
        self.0.insert(name.into(), value.into_native())
    }

    pub fn remove(&mut self, name: &str) -> Option<NativeValue> {
        self.0.remove(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &NativeValue)> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn into_inner(self) -> BTreeMap<String, NativeValue> {
        self.0
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl IntoNative) -> Self {
        self.insert(name, value);
        self
    }
}

impl Index<&str> for Record {
    type Output = NativeValue;

    /// Missing names index to [`NativeValue::Null`].
    fn index(&self, name: &str) -> &NativeValue {
        static NULL: NativeValue = NativeValue::Null;
        self.0.get(name).unwrap_or(&NULL)
    }
}

impl From<BTreeMap<String, NativeValue>> for Record {
    fn from(map: BTreeMap<String, NativeValue>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: IntoNative> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into_native()))
                .collect(),
        )
    }
}

impl IntoIterator for Record {
    type Item = (String, NativeValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, NativeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a NativeValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, NativeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// An application-level value.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<NativeValue>),
    Map(Record),
}

impl NativeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NativeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NativeValue::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[NativeValue]> {
        match self {
            NativeValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            NativeValue::Map(r) => Some(r),
            _ => None,
        }
    }

    /// The value as it would be written into a key condition: numbers in
    /// decimal form, strings verbatim, booleans as `true`/`false`.
    pub(crate) fn scalar_text(&self) -> Option<String> {
        match self {
            NativeValue::Number(n) => n.to_decimal_string(),
            NativeValue::String(s) => Some(s.clone()),
            NativeValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Structural normalization into a [`NativeValue`].
///
/// Implement this for application structs to hand them to the encoder; the
/// usual shape is a [`Record`] of the struct's fields.
///
/// ```
/// use dynamo_wrapper::{IntoNative, NativeValue, Record};
///
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// impl IntoNative for User {
///     fn into_native(self) -> NativeValue {
///         NativeValue::Map(Record::new().with("id", self.id).with("name", self.name))
///     }
/// }
/// ```
pub trait IntoNative {
    fn into_native(self) -> NativeValue;
}

impl IntoNative for NativeValue {
    fn into_native(self) -> NativeValue {
        self
    }
}

impl IntoNative for Record {
    fn into_native(self) -> NativeValue {
        NativeValue::Map(self)
    }
}

impl IntoNative for bool {
    fn into_native(self) -> NativeValue {
        NativeValue::Bool(self)
    }
}

macro_rules! impl_into_native_int {
    ($($ty:ty),*) => {
        $(
            impl IntoNative for $ty {
                fn into_native(self) -> NativeValue {
                    NativeValue::Number(Number::Int(self as i64))
                }
            }
        )*
    };
}

impl_into_native_int!(i8, i16, i32, i64, u8, u16, u32);

impl IntoNative for u64 {
    fn into_native(self) -> NativeValue {
        match i64::try_from(self) {
            Ok(i) => NativeValue::Number(Number::Int(i)),
            Err(_) => NativeValue::Number(Number::UInt(self)),
        }
    }
}

impl IntoNative for f32 {
    fn into_native(self) -> NativeValue {
        NativeValue::Number(Number::Float(self as f64))
    }
}

impl IntoNative for f64 {
    fn into_native(self) -> NativeValue {
        NativeValue::Number(Number::Float(self))
    }
}

impl IntoNative for Number {
    fn into_native(self) -> NativeValue {
        NativeValue::Number(self)
    }
}

impl IntoNative for String {
    fn into_native(self) -> NativeValue {
        NativeValue::String(self)
    }
}

impl IntoNative for &str {
    fn into_native(self) -> NativeValue {
        NativeValue::String(self.to_string())
    }
}

impl<T: IntoNative> IntoNative for Option<T> {
    fn into_native(self) -> NativeValue {
        match self {
            Some(v) => v.into_native(),
            None => NativeValue::Null,
        }
    }
}

impl<T: IntoNative> IntoNative for Vec<T> {
    fn into_native(self) -> NativeValue {
        NativeValue::List(self.into_iter().map(IntoNative::into_native).collect())
    }
}

impl<K: Into<String>, V: IntoNative> IntoNative for BTreeMap<K, V> {
    fn into_native(self) -> NativeValue {
        NativeValue::Map(self.into_iter().collect())
    }
}

impl<K: Into<String>, V: IntoNative> IntoNative for HashMap<K, V> {
    fn into_native(self) -> NativeValue {
        NativeValue::Map(self.into_iter().collect())
    }
}

impl IntoNative for serde_json::Value {
    fn into_native(self) -> NativeValue {
        use serde_json::Value;

        match self {
            Value::Null => NativeValue::Null,
            Value::Bool(b) => NativeValue::Bool(b),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => NativeValue::Number(Number::Int(i)),
                (None, Some(u)) => NativeValue::Number(Number::UInt(u)),
                // Finite for every number serde_json can parse
                (None, None) => {
                    NativeValue::Number(Number::Float(n.as_f64().unwrap_or(f64::NAN)))
                }
            },
            Value::String(s) => NativeValue::String(s),
            Value::Array(items) => items.into_native(),
            Value::Object(map) => NativeValue::Map(map.into_iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_int_and_float_compare_numerically() {
        assert_eq!(Number::Int(30), Number::Float(30.0));
        assert_ne!(Number::Int(30), Number::Float(30.5));
    }

    #[test]
    fn test_non_finite_has_no_decimal_string() {
        assert_eq!(Number::Float(f64::NAN).to_decimal_string(), None);
        assert_eq!(Number::Float(f64::INFINITY).to_decimal_string(), None);
        assert_eq!(Number::Float(1.5).to_decimal_string().as_deref(), Some("1.5"));
        assert_eq!(Number::Int(-7).to_decimal_string().as_deref(), Some("-7"));
    }

    #[test]
    fn test_record_index_missing_is_null() {
        let record = Record::new().with("name", "Alice");
        assert_eq!(record["name"].as_str(), Some("Alice"));
        assert!(record["missing"].is_null());
    }

    #[test]
    fn test_json_value_normalizes_to_record() {
        let value = json!({"id": 7, "tags": ["a"], "ratio": 0.5, "gone": null}).into_native();
        let record = value.as_record().unwrap();

        assert_eq!(record["id"], NativeValue::Number(Number::Int(7)));
        assert_eq!(record["ratio"], NativeValue::Number(Number::Float(0.5)));
        assert_eq!(
            record["tags"],
            NativeValue::List(vec![NativeValue::String("a".into())])
        );
        assert!(record.contains("gone"));
    }

    #[test]
    fn test_option_none_is_null() {
        assert_eq!(None::<String>.into_native(), NativeValue::Null);
        assert_eq!(Some(3u8).into_native(), NativeValue::Number(Number::Int(3)));
    }

    #[test]
    fn test_large_u64_keeps_every_digit() {
        assert_eq!(u64::MAX.into_native(), NativeValue::Number(Number::UInt(u64::MAX)));
        assert_eq!(
            Number::UInt(u64::MAX).to_decimal_string().as_deref(),
            Some("18446744073709551615")
        );
        assert_eq!(7u64.into_native(), NativeValue::Number(Number::Int(7)));
        assert_eq!(Number::UInt(7), Number::Int(7));
        assert_ne!(Number::UInt(u64::MAX), Number::Int(-1));
    }

    #[test]
    fn test_json_u64_keeps_every_digit() {
        let value = serde_json::json!(u64::MAX).into_native();
        assert_eq!(value, NativeValue::Number(Number::UInt(u64::MAX)));
    }
}
