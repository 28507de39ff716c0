//! Attribute codec: native values to DynamoDB attribute values and back.
//!
//! Neither direction fails. Values the encoder cannot classify are omitted
//! from its output, and the decoder maps every tag to some native value.

use std::collections::BTreeMap;

use crate::attribute::{AttributeValue, BoolLiteral, Item};
use crate::value::{NativeValue, Number, Record};

/// How `NS` attributes are decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NumberSetMode {
    /// Each element is decoded from its own payload.
    #[default]
    Independent,
    /// Every element takes the value of the first element of the set.
    /// Matches data read back by older readers.
    FirstElement,
}

/// Options for the decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Return `N` payloads as their raw decimal strings instead of floats.
    /// Avoids precision loss on large integers.
    pub numbers_as_strings: bool,
    pub number_sets: NumberSetMode,
}

impl DecodeOptions {
    pub fn numbers_as_strings() -> Self {
        Self {
            numbers_as_strings: true,
            ..Self::default()
        }
    }

    pub fn with_number_sets(mut self, mode: NumberSetMode) -> Self {
        self.number_sets = mode;
        self
    }
}

/// True for non-empty, ASCII-digit-only strings. Such strings are written as
/// numbers, so `"02139"` is stored as `N`.
pub fn is_digit_only(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

// ============================================================================
// Encode
// ============================================================================

/// Encode a record into an item.
///
/// Attributes named `""` and values that cannot be classified are dropped.
pub fn encode_item(record: &Record) -> Item {
    encode_map(record)
}

fn encode_map(record: &Record) -> BTreeMap<String, AttributeValue> {
    record
        .iter()
        .filter(|(name, _)| !name.is_empty())
        .filter_map(|(name, value)| encode_value(value).map(|v| (name.clone(), v)))
        .collect()
}

/// Encode a single value, or `None` when it cannot be classified.
pub fn encode_value(value: &NativeValue) -> Option<AttributeValue> {
    match value {
        NativeValue::Null => Some(AttributeValue::Null(true)),
        NativeValue::Bool(b) => Some(AttributeValue::Bool(BoolLiteral::Native(*b))),
        NativeValue::Number(n) => n.to_decimal_string().map(AttributeValue::N),
        NativeValue::String(s) => Some(encode_string(s)),
        NativeValue::List(items) => Some(AttributeValue::L(
            items.iter().filter_map(encode_value).collect(),
        )),
        NativeValue::Map(record) => Some(AttributeValue::M(encode_map(record))),
    }
}

fn encode_string(s: &str) -> AttributeValue {
    if is_digit_only(s) {
        AttributeValue::N(s.to_string())
    } else if s.is_empty() {
        // Empty string attributes are rejected by the service
        AttributeValue::Null(true)
    } else {
        AttributeValue::S(s.to_string())
    }
}

/// Key attribute for an id: `N` when its text form is digit-only, else `S`.
pub(crate) fn encode_key_scalar(value: &NativeValue) -> Option<AttributeValue> {
    let text = value.scalar_text()?;
    if is_digit_only(&text) || matches!(value, NativeValue::Number(_)) {
        Some(AttributeValue::N(text))
    } else {
        Some(AttributeValue::S(text))
    }
}

// ============================================================================
// Decode
// ============================================================================

/// Decode an item into a record.
pub fn decode_item(item: &Item, options: DecodeOptions) -> Record {
    item.iter()
        .map(|(name, value)| (name.clone(), decode_value(value, options)))
        .collect::<BTreeMap<_, _>>()
        .into()
}

/// Decode a single attribute value.
pub fn decode_value(value: &AttributeValue, options: DecodeOptions) -> NativeValue {
    match value {
        AttributeValue::N(n) => decode_number(n, options),
        AttributeValue::S(s) => NativeValue::String(s.clone()),
        AttributeValue::Null(_) => NativeValue::Null,
        AttributeValue::Bool(literal) => NativeValue::Bool(literal.is_true()),
        AttributeValue::M(map) => NativeValue::Map(decode_item(map, options)),
        AttributeValue::L(list) => NativeValue::List(
            list.iter().map(|v| decode_value(v, options)).collect(),
        ),
        AttributeValue::Ss(set) => {
            NativeValue::List(set.iter().cloned().map(NativeValue::String).collect())
        }
        AttributeValue::Ns(set) => decode_number_set(set, options),
    }
}

fn decode_number(raw: &str, options: DecodeOptions) -> NativeValue {
    if options.numbers_as_strings {
        return NativeValue::String(raw.to_string());
    }
    match raw.trim().parse::<f64>() {
        Ok(f) => NativeValue::Number(Number::Float(f)),
        Err(_) => NativeValue::Null,
    }
}

fn decode_number_set(set: &[String], options: DecodeOptions) -> NativeValue {
    let elements = match options.number_sets {
        NumberSetMode::Independent => set.iter().map(|n| decode_number(n, options)).collect(),
        NumberSetMode::FirstElement => match set.first() {
            Some(first) => vec![decode_number(first, options); set.len()],
            None => Vec::new(),
        },
    };
    NativeValue::List(elements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> AttributeValue {
        AttributeValue::S(v.to_string())
    }

    fn n(v: &str) -> AttributeValue {
        AttributeValue::N(v.to_string())
    }

    #[test]
    fn test_classification_order() {
        assert_eq!(encode_value(&NativeValue::Null), Some(AttributeValue::Null(true)));
        assert_eq!(
            encode_value(&NativeValue::Bool(false)),
            Some(AttributeValue::Bool(BoolLiteral::Native(false)))
        );
        assert_eq!(encode_value(&NativeValue::Number(Number::Int(42))), Some(n("42")));
        assert_eq!(encode_value(&NativeValue::Number(Number::Float(2.5))), Some(n("2.5")));
        assert_eq!(encode_value(&NativeValue::String("abc".into())), Some(s("abc")));
    }

    #[test]
    fn test_digit_only_string_is_numeric() {
        // Zip codes lose their string type on the wire
        assert_eq!(encode_value(&NativeValue::String("02139".into())), Some(n("02139")));
        assert_eq!(encode_value(&NativeValue::String("12a".into())), Some(s("12a")));
        assert_eq!(encode_value(&NativeValue::String("-12".into())), Some(s("-12")));
        assert_eq!(encode_value(&NativeValue::String("1.5".into())), Some(s("1.5")));
    }

    #[test]
    fn test_empty_string_is_null() {
        assert_eq!(
            encode_value(&NativeValue::String(String::new())),
            Some(AttributeValue::Null(true))
        );
    }

    #[test]
    fn test_non_finite_number_is_dropped() {
        let record = Record::new()
            .with("ok", 1)
            .with("nan", f64::NAN)
            .with("list", vec![f64::INFINITY, 2.0]);

        let item = encode_item(&record);
        assert_eq!(item.len(), 2);
        assert!(!item.contains_key("nan"));
        assert_eq!(item["list"], AttributeValue::L(vec![n("2")]));
    }

    #[test]
    fn test_nested_empty_names_are_dropped() {
        let inner = Record::new().with("", "x").with("kept", "y");
        let item = encode_item(&Record::new().with("outer", inner));

        assert_eq!(
            item["outer"],
            AttributeValue::M(BTreeMap::from([("kept".to_string(), s("y"))]))
        );
    }

    #[test]
    fn test_decode_number_modes() {
        assert_eq!(
            decode_value(&n("12345678901234567890"), DecodeOptions::default()),
            NativeValue::Number(Number::Float(12345678901234567890.0))
        );
        assert_eq!(
            decode_value(&n("12345678901234567890"), DecodeOptions::numbers_as_strings()),
            NativeValue::String("12345678901234567890".into())
        );
        assert_eq!(decode_value(&n("abc"), DecodeOptions::default()), NativeValue::Null);
    }

    #[test]
    fn test_numbers_as_strings_reaches_nested_values() {
        let value = AttributeValue::M(BTreeMap::from([(
            "list".to_string(),
            AttributeValue::L(vec![n("7")]),
        )]));

        let decoded = decode_value(&value, DecodeOptions::numbers_as_strings());
        let record = decoded.as_record().unwrap();
        assert_eq!(
            record["list"],
            NativeValue::List(vec![NativeValue::String("7".into())])
        );
    }

    #[test]
    fn test_string_set_keeps_order() {
        let value = AttributeValue::Ss(vec!["b".into(), "a".into(), "c".into()]);
        assert_eq!(
            decode_value(&value, DecodeOptions::default()),
            NativeValue::List(vec![
                NativeValue::String("b".into()),
                NativeValue::String("a".into()),
                NativeValue::String("c".into()),
            ])
        );
    }

    #[test]
    fn test_number_set_independent_elements() {
        let value = AttributeValue::Ns(vec!["1".into(), "2.5".into(), "3".into()]);
        assert_eq!(
            decode_value(&value, DecodeOptions::default()),
            NativeValue::List(vec![
                NativeValue::Number(Number::Int(1)),
                NativeValue::Number(Number::Float(2.5)),
                NativeValue::Number(Number::Int(3)),
            ])
        );
    }

    #[test]
    fn test_number_set_first_element_legacy_mode() {
        let value = AttributeValue::Ns(vec!["1".into(), "2".into(), "3".into()]);
        let options = DecodeOptions::default().with_number_sets(NumberSetMode::FirstElement);

        assert_eq!(
            decode_value(&value, options),
            NativeValue::List(vec![NativeValue::Number(Number::Int(1)); 3])
        );
        assert_eq!(
            decode_value(&AttributeValue::Ns(vec![]), options),
            NativeValue::List(vec![])
        );
    }

    #[test]
    fn test_key_scalar_typing() {
        assert_eq!(encode_key_scalar(&NativeValue::Number(Number::Int(9))), Some(n("9")));
        assert_eq!(encode_key_scalar(&NativeValue::String("42".into())), Some(n("42")));
        assert_eq!(encode_key_scalar(&NativeValue::String("abc".into())), Some(s("abc")));
        assert_eq!(encode_key_scalar(&NativeValue::Null), None);
    }
}
