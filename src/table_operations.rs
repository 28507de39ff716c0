//! Table-level operations: key schema lookup and the full-table sweep.

use futures_util::StreamExt;
use tracing::{debug, info};

use crate::attribute::Item;
use crate::backend::{Backend, KeySchema};
use crate::errors::{Error, Result};

/// Hash key and optional range key of a table.
pub async fn key_schema(backend: &dyn Backend, table: &str) -> Result<KeySchema> {
    backend.describe_key_schema(table).await
}

/// Delete every item of a table.
///
/// Describes the key schema, scans the whole table and issues one delete per
/// scanned item. The delete key reuses the scanned key attributes verbatim.
/// Not atomic: items written during the sweep may or may not be deleted, and
/// a failure leaves the deletes already issued in place.
///
/// Returns the number of deletes issued.
pub async fn empty_table(backend: &dyn Backend, table: &str) -> Result<u64> {
    let schema = backend.describe_key_schema(table).await?;
    info!(
        table,
        hash_key = %schema.hash_key,
        range_key = ?schema.range_key,
        "emptying table"
    );

    let mut items = backend.scan(table);
    let mut deleted = 0u64;

    while let Some(item) = items.next().await {
        let item = item?;
        let key = sweep_key(table, &schema, &item)?;
        backend.delete_item(table, key).await?;
        deleted += 1;
        debug!(table, deleted, "deleted item");
    }

    info!(table, deleted, "table emptied");
    Ok(deleted)
}

/// The key attributes of a scanned item, tags untouched.
fn sweep_key(table: &str, schema: &KeySchema, item: &Item) -> Result<Item> {
    let mut key = Item::new();
    let mut missing = Vec::new();

    for name in schema.attribute_names() {
        match item.get(name) {
            Some(value) => {
                key.insert(name.to_string(), value.clone());
            }
            None => missing.push(name.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(Error::MissingKeyAttributes {
            table: table.to_string(),
            missing,
        });
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeValue;

    fn item(pairs: &[(&str, AttributeValue)]) -> Item {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_sweep_key_keeps_tags() {
        let schema = KeySchema::new("id").with_range_key("at");
        let row = item(&[
            ("id", AttributeValue::S("a".into())),
            ("at", AttributeValue::N("3".into())),
            ("payload", AttributeValue::Null(true)),
        ]);

        let key = sweep_key("t", &schema, &row).unwrap();
        assert_eq!(
            key,
            item(&[
                ("id", AttributeValue::S("a".into())),
                ("at", AttributeValue::N("3".into())),
            ])
        );
    }

    #[test]
    fn test_sweep_key_reports_missing_range_key() {
        let schema = KeySchema::new("id").with_range_key("at");
        let row = item(&[("id", AttributeValue::N("1".into()))]);

        match sweep_key("t", &schema, &row) {
            Err(Error::MissingKeyAttributes { missing, .. }) => {
                assert_eq!(missing, vec!["at".to_string()])
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
