//! Wire model for DynamoDB attribute values.
//!
//! [`AttributeValue`] serializes to the documented attribute-value JSON shape
//! (`{"S": "..."}`, `{"N": "30"}`, `{"NULL": true}`, ...) and converts to and
//! from the AWS SDK type.

use std::collections::{BTreeMap, HashMap};

use aws_sdk_dynamodb::types::AttributeValue as SdkAttributeValue;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// One row: attribute name to attribute value.
pub type Item = BTreeMap<String, AttributeValue>;

/// Payload of a `BOOL` attribute.
///
/// Legacy writers stored booleans as string literals, so reads accept either
/// form. Only a native `true` or the exact literal `"true"` is truthy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoolLiteral {
    Native(bool),
    Text(String),
}

impl BoolLiteral {
    pub fn is_true(&self) -> bool {
        match self {
            BoolLiteral::Native(b) => *b,
            BoolLiteral::Text(s) => s == "true",
        }
    }
}

impl From<bool> for BoolLiteral {
    fn from(b: bool) -> Self {
        BoolLiteral::Native(b)
    }
}

/// A DynamoDB attribute value. Exactly one tag per value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    #[serde(rename = "S")]
    S(String),
    #[serde(rename = "N")]
    N(String),
    #[serde(rename = "BOOL")]
    Bool(BoolLiteral),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(rename = "M")]
    M(BTreeMap<String, AttributeValue>),
    #[serde(rename = "L")]
    L(Vec<AttributeValue>),
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    #[serde(rename = "NS")]
    Ns(Vec<String>),
}

impl AttributeValue {
    /// The wire tag of this value.
    pub fn tag(&self) -> &'static str {
        match self {
            AttributeValue::S(_) => "S",
            AttributeValue::N(_) => "N",
            AttributeValue::Bool(_) => "BOOL",
            AttributeValue::Null(_) => "NULL",
            AttributeValue::M(_) => "M",
            AttributeValue::L(_) => "L",
            AttributeValue::Ss(_) => "SS",
            AttributeValue::Ns(_) => "NS",
        }
    }

    /// Convert from the SDK type. Binary and unknown variants have no
    /// counterpart and return `None`; inside `M` and `L` they are skipped.
    pub fn from_sdk(value: SdkAttributeValue) -> Option<Self> {
        match value {
            SdkAttributeValue::S(s) => Some(AttributeValue::S(s)),
            SdkAttributeValue::N(n) => Some(AttributeValue::N(n)),
            SdkAttributeValue::Bool(b) => Some(AttributeValue::Bool(BoolLiteral::Native(b))),
            SdkAttributeValue::Null(b) => Some(AttributeValue::Null(b)),
            SdkAttributeValue::M(map) => Some(AttributeValue::M(item_from_sdk(map))),
            SdkAttributeValue::L(list) => Some(AttributeValue::L(
                list.into_iter().filter_map(AttributeValue::from_sdk).collect(),
            )),
            SdkAttributeValue::Ss(ss) => Some(AttributeValue::Ss(ss)),
            SdkAttributeValue::Ns(ns) => Some(AttributeValue::Ns(ns)),
            _ => None,
        }
    }

    pub fn into_sdk(self) -> SdkAttributeValue {
        match self {
            AttributeValue::S(s) => SdkAttributeValue::S(s),
            AttributeValue::N(n) => SdkAttributeValue::N(n),
            AttributeValue::Bool(b) => SdkAttributeValue::Bool(b.is_true()),
            AttributeValue::Null(b) => SdkAttributeValue::Null(b),
            AttributeValue::M(map) => SdkAttributeValue::M(item_into_sdk(map)),
            AttributeValue::L(list) => {
                SdkAttributeValue::L(list.into_iter().map(AttributeValue::into_sdk).collect())
            }
            AttributeValue::Ss(ss) => SdkAttributeValue::Ss(ss),
            AttributeValue::Ns(ns) => SdkAttributeValue::Ns(ns),
        }
    }
}

impl From<AttributeValue> for SdkAttributeValue {
    fn from(value: AttributeValue) -> Self {
        value.into_sdk()
    }
}

/// Convert an SDK item, dropping attributes with no wire counterpart.
pub fn item_from_sdk(item: HashMap<String, SdkAttributeValue>) -> Item {
    item.into_iter()
        .filter_map(|(name, value)| AttributeValue::from_sdk(value).map(|v| (name, v)))
        .collect()
}

/// Convert an item into the SDK shape. Empty attribute names are dropped.
pub fn item_into_sdk(item: Item) -> HashMap<String, SdkAttributeValue> {
    item.into_iter()
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name, value.into_sdk()))
        .collect()
}

/// Parse an item from its attribute-value JSON form.
///
/// The document must be a JSON object. Attributes whose tag or payload has no
/// wire counterpart (`B`, `BS`, unknown tags) are dropped, nested ones included.
pub fn item_from_json(json: &str) -> Result<Item> {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
    Ok(item_from_json_object(object))
}

fn item_from_json_object(object: serde_json::Map<String, serde_json::Value>) -> Item {
    object
        .into_iter()
        .filter_map(|(name, value)| attribute_from_json(value).map(|v| (name, v)))
        .collect()
}

fn attribute_from_json(value: serde_json::Value) -> Option<AttributeValue> {
    use serde_json::Value;

    let (tag, payload) = match value {
        Value::Object(object) if object.len() == 1 => object.into_iter().next()?,
        _ => return None,
    };
    match (tag.as_str(), payload) {
        ("M", Value::Object(members)) => Some(AttributeValue::M(item_from_json_object(members))),
        ("L", Value::Array(elements)) => Some(AttributeValue::L(
            elements.into_iter().filter_map(attribute_from_json).collect(),
        )),
        (_, payload) => {
            let single = serde_json::Map::from_iter([(tag.clone(), payload)]);
            serde_json::from_value(Value::Object(single)).ok()
        }
    }
}

/// Render an item in its attribute-value JSON form.
pub fn item_to_json(item: &Item) -> Result<String> {
    Ok(serde_json::to_string(item)?)
}
