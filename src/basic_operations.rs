//! Basic DynamoDB operations.
//!
//! Each operation encodes its input with the codec, makes one backend call
//! (or drains one stream) and decodes what comes back. Backend errors are
//! returned as they are.

use futures_util::{StreamExt, TryStreamExt};
use tracing::{debug, warn};

use crate::attribute::{AttributeValue, Item};
use crate::backend::{Backend, ComparisonOperator, KeyCondition, QueryRequest};
use crate::document::Document;
use crate::errors::{Error, Result};
use crate::serialization::{
    decode_item, encode_item, encode_key_scalar, encode_value, DecodeOptions,
};
use crate::value::{IntoNative, NativeValue, Record};

/// Build a key condition from native operands.
///
/// Operands the codec cannot classify are left out, which makes the
/// condition fail validation in [`query`].
pub fn condition<I, V>(
    attribute: impl Into<String>,
    operator: ComparisonOperator,
    values: I,
) -> KeyCondition
where
    I: IntoIterator<Item = V>,
    V: IntoNative,
{
    let values = values
        .into_iter()
        .filter_map(|v| encode_value(&v.into_native()))
        .collect();
    KeyCondition::new(attribute, operator, values)
}

/// Get an item by its key. Returns `None` when no item has that key.
pub async fn get_item(
    backend: &dyn Backend,
    table: &str,
    key: &Record,
    consistent_read: bool,
    options: DecodeOptions,
) -> Result<Option<Record>> {
    let key = encode_item(key);
    debug!(table, attributes = key.len(), "get item");

    let item = backend.get_item(table, key, consistent_read).await?;
    Ok(item.map(|item| decode_item(&item, options)))
}

/// Put a record as an item.
pub async fn put_record(backend: &dyn Backend, table: &str, record: &Record) -> Result<()> {
    let item = encode_item(record);
    debug!(table, attributes = item.len(), "put item");
    backend.put_item(table, item).await
}

/// Put the values of a document.
pub async fn put_item(backend: &dyn Backend, table: &str, document: &Document) -> Result<()> {
    put_record(backend, table, document.values()).await
}

/// Delete the item identified by the document's key attributes.
///
/// Fails with [`Error::MissingKeyAttributes`] before any backend call when
/// the document has no key names or lacks a key value.
pub async fn delete_item(backend: &dyn Backend, table: &str, document: &Document) -> Result<()> {
    let key = document.delete_key(table)?;
    debug!(table, "delete item");
    backend.delete_item(table, key).await
}

fn validate_conditions(table: &str, conditions: &[KeyCondition]) -> Result<()> {
    if conditions.is_empty() {
        return Err(Error::Config(format!(
            "query on table '{}' needs at least one key condition",
            table
        )));
    }
    for c in conditions {
        let arity = c.operator.arity();
        if c.values.len() != arity {
            return Err(Error::Config(format!(
                "condition {:?} on '{}' takes {} value(s), got {}",
                c.operator,
                c.attribute,
                arity,
                c.values.len()
            )));
        }
    }
    Ok(())
}

/// All items matching the key conditions, optionally on a secondary index.
///
/// Every match is returned. Use [`get_item_by_index`] when only the first
/// match is wanted.
pub async fn query(
    backend: &dyn Backend,
    table: &str,
    conditions: &[KeyCondition],
    index: Option<&str>,
    options: DecodeOptions,
) -> Result<Vec<Record>> {
    validate_conditions(table, conditions)?;
    debug!(table, index, conditions = conditions.len(), "query");

    let request = QueryRequest {
        table: table.to_string(),
        index: index.map(str::to_string),
        conditions: conditions.to_vec(),
    };
    backend
        .query(request)
        .map_ok(|item| decode_item(&item, options))
        .try_collect()
        .await
}

/// First item of `index` whose attributes equal every value in `keys`.
///
/// Each value is matched as `N` when its text form is digit-only, as `S`
/// otherwise.
pub async fn get_item_by_index(
    backend: &dyn Backend,
    table: &str,
    index: &str,
    keys: &Record,
    options: DecodeOptions,
) -> Result<Option<Record>> {
    let conditions = keys
        .iter()
        .map(|(name, value)| {
            encode_key_scalar(value)
                .map(|v| KeyCondition::eq(name.clone(), v))
                .ok_or_else(|| {
                    Error::Config(format!("index key '{}' must be a string or number", name))
                })
        })
        .collect::<Result<Vec<_>>>()?;
    validate_conditions(table, &conditions)?;
    debug!(table, index, "get item by index");

    let request = QueryRequest {
        table: table.to_string(),
        index: Some(index.to_string()),
        conditions,
    };
    let first = backend.query(request).next().await.transpose()?;
    Ok(first.map(|item| decode_item(&item, options)))
}

/// Every item of the table.
pub async fn scan_table(
    backend: &dyn Backend,
    table: &str,
    options: DecodeOptions,
) -> Result<Vec<Record>> {
    debug!(table, "scan table");
    backend
        .scan(table)
        .map_ok(|item| decode_item(&item, options))
        .try_collect()
        .await
}

/// Items whose `key_name` attribute equals one of `ids`.
///
/// Ids typed `N` when numeric or digit-only, `S` otherwise; ids that are
/// neither strings nor numbers are skipped.
pub async fn batch_get_item(
    backend: &dyn Backend,
    table: &str,
    key_name: &str,
    ids: &[NativeValue],
    consistent_read: bool,
    options: DecodeOptions,
) -> Result<Vec<Record>> {
    let keys: Vec<Item> = ids
        .iter()
        .filter_map(|id| {
            let value = encode_key_scalar(id);
            if value.is_none() {
                warn!(table, key_name, "skipping batch get id that is not a string or number");
            }
            value
        })
        .map(|value: AttributeValue| [(key_name.to_string(), value)].into_iter().collect())
        .collect();

    if keys.is_empty() {
        return Ok(Vec::new());
    }
    debug!(table, keys = keys.len(), "batch get item");

    let items = backend.batch_get_item(table, keys, consistent_read).await?;
    Ok(items.iter().map(|item| decode_item(item, options)).collect())
}
