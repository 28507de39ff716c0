//! A row under construction, together with the names of its key attributes.

use crate::attribute::Item;
use crate::errors::{Error, Result};
use crate::serialization::encode_item;
use crate::value::{IntoNative, NativeValue, Record};

/// Values of one item plus the names of the attributes that form its key.
///
/// # Examples
///
/// ```
/// use dynamo_wrapper::Document;
///
/// let mut doc = Document::new(["id"]);
/// doc.add_value("id", 1);
/// doc.add_value("name", "Alice");
///
/// assert_eq!(doc.put_attributes().len(), 2);
/// assert_eq!(doc.delete_key("users").unwrap().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    keys: Vec<String>,
    values: Record,
}

impl Document {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            values: Record::new(),
        }
    }

    /// Key attribute names used by deletes.
    pub fn set_keys<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
    }

    pub fn add_value(&mut self, name: impl Into<String>, value: impl IntoNative) {
        self.values.insert(name, value);
    }

    /// Replace all values.
    pub fn import(&mut self, values: Record) {
        self.values = values;
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn values(&self) -> &Record {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&NativeValue> {
        self.values.get(name)
    }

    /// The item to write.
    pub fn put_attributes(&self) -> Item {
        encode_item(&self.values)
    }

    /// The encoded key attributes for a delete on `table`.
    ///
    /// Fails before any request is made when no key names are set or a key
    /// attribute has no value.
    pub fn delete_key(&self, table: &str) -> Result<Item> {
        if self.keys.is_empty() {
            return Err(Error::MissingKeyAttributes {
                table: table.to_string(),
                missing: Vec::new(),
            });
        }

        let key_values: Record = self
            .keys
            .iter()
            .filter_map(|k| self.values.get(k).map(|v| (k.clone(), v.clone())))
            .collect();
        let key = encode_item(&key_values);

        // Names or values the encoder drops count as missing too
        let missing: Vec<String> = self
            .keys
            .iter()
            .filter(|k| !key.contains_key(k.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingKeyAttributes {
                table: table.to_string(),
                missing,
            });
        }
        Ok(key)
    }
}

impl From<Record> for Document {
    fn from(values: Record) -> Self {
        Self {
            keys: Vec::new(),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeValue;

    #[test]
    fn test_delete_key_without_keys_fails() {
        let doc = Document::from(Record::new().with("id", 1));
        let err = doc.delete_key("users").unwrap_err();
        assert!(matches!(
            err,
            Error::MissingKeyAttributes { ref missing, .. } if missing.is_empty()
        ));
    }

    #[test]
    fn test_delete_key_reports_missing_attribute() {
        let mut doc = Document::new(["pk", "sk"]);
        doc.add_value("pk", "USER#1");

        match doc.delete_key("users") {
            Err(Error::MissingKeyAttributes { table, missing }) => {
                assert_eq!(table, "users");
                assert_eq!(missing, vec!["sk".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_delete_key_rejects_unencodable_key_value() {
        let mut doc = Document::new(["id"]);
        doc.add_value("id", f64::NAN);

        match doc.delete_key("users") {
            Err(Error::MissingKeyAttributes { missing, .. }) => {
                assert_eq!(missing, vec!["id".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_delete_key_rejects_empty_key_name() {
        let mut doc = Document::new([""]);
        doc.add_value("", "x");

        match doc.delete_key("users") {
            Err(Error::MissingKeyAttributes { missing, .. }) => {
                assert_eq!(missing, vec![String::new()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_delete_key_only_contains_keys() {
        let mut doc = Document::new(["pk"]);
        doc.import(Record::new().with("pk", "USER#1").with("name", "Bob"));

        let key = doc.delete_key("users").unwrap();
        assert_eq!(key.len(), 1);
        assert_eq!(key["pk"], AttributeValue::S("USER#1".into()));
    }

    #[test]
    fn test_set_keys_replaces_previous() {
        let mut doc = Document::new(["a"]);
        doc.set_keys(["b"]);
        assert_eq!(doc.keys(), ["b".to_string()]);
    }
}
