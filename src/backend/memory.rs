//! In-memory backend for tests and local development.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};

use super::{Backend, ComparisonOperator, ItemStream, KeyCondition, KeySchema, QueryRequest};
use crate::attribute::{AttributeValue, Item};
use crate::errors::{Error, Result};

#[derive(Debug, Default)]
struct MemoryTable {
    schema: Option<KeySchema>,
    items: BTreeMap<String, Item>,
    deleted_keys: Vec<Item>,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, MemoryTable>,
    deletes_before_failure: Option<usize>,
}

/// Tables held in memory. Data is lost when the backend is dropped.
///
/// Every successful delete is recorded, so tests can assert on the exact
/// keys a caller sent.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&self, table: impl Into<String>, schema: KeySchema) {
        let mut state = self.lock();
        state.tables.entry(table.into()).or_default().schema = Some(schema);
    }

    /// Store an item directly, bypassing the codec.
    pub fn insert(&self, table: &str, item: Item) -> Result<()> {
        let mut state = self.lock();
        let table_state = table_mut(&mut state, table, "PutItem")?;
        let key = storage_key(table, table_state, &item, "PutItem")?;
        table_state.items.insert(key, item);
        Ok(())
    }

    /// Items of `table`, ordered by primary key.
    pub fn items(&self, table: &str) -> Vec<Item> {
        let state = self.lock();
        state
            .tables
            .get(table)
            .map(|t| t.items.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Keys of every successful delete on `table`, in call order.
    pub fn deleted_keys(&self, table: &str) -> Vec<Item> {
        let state = self.lock();
        state
            .tables
            .get(table)
            .map(|t| t.deleted_keys.clone())
            .unwrap_or_default()
    }

    /// Let `count` more deletes succeed, then fail every delete after them.
    pub fn fail_deletes_after(&self, count: usize) {
        self.lock().deletes_before_failure = Some(count);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn table_mut<'a>(
    state: &'a mut State,
    table: &str,
    operation: &'static str,
) -> Result<&'a mut MemoryTable> {
    state.tables.get_mut(table).ok_or_else(|| not_found(table, operation))
}

fn not_found(table: &str, operation: &'static str) -> Error {
    Error::Backend {
        operation,
        message: format!("table '{}' not found", table),
    }
}

/// Primary-key identity of an item within its table.
fn storage_key(
    table: &str,
    table_state: &MemoryTable,
    item: &Item,
    operation: &'static str,
) -> Result<String> {
    let schema = table_state
        .schema
        .as_ref()
        .ok_or_else(|| Error::InvalidKeySchema {
            table: table.to_string(),
        })?;

    let mut parts = Vec::new();
    for name in schema.attribute_names() {
        match item.get(name) {
            Some(value) => parts.push(value),
            None => {
                return Err(Error::Backend {
                    operation,
                    message: format!("missing key attribute '{}'", name),
                })
            }
        }
    }
    Ok(serde_json::to_string(&parts)?)
}

fn compare(left: &AttributeValue, right: &AttributeValue) -> Option<Ordering> {
    match (left, right) {
        (AttributeValue::N(a), AttributeValue::N(b)) => {
            a.parse::<f64>().ok()?.partial_cmp(&b.parse::<f64>().ok()?)
        }
        (AttributeValue::S(a), AttributeValue::S(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn matches_condition(item: &Item, condition: &KeyCondition) -> bool {
    let Some(value) = item.get(&condition.attribute) else {
        return false;
    };
    let operand = |i: usize| condition.values.get(i);

    match condition.operator {
        ComparisonOperator::Eq => {
            operand(0).and_then(|o| compare(value, o)) == Some(Ordering::Equal)
        }
        ComparisonOperator::Lt => {
            operand(0).and_then(|o| compare(value, o)) == Some(Ordering::Less)
        }
        ComparisonOperator::Le => matches!(
            operand(0).and_then(|o| compare(value, o)),
            Some(Ordering::Less | Ordering::Equal)
        ),
        ComparisonOperator::Gt => {
            operand(0).and_then(|o| compare(value, o)) == Some(Ordering::Greater)
        }
        ComparisonOperator::Ge => matches!(
            operand(0).and_then(|o| compare(value, o)),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        ComparisonOperator::BeginsWith => match (value, operand(0)) {
            (AttributeValue::S(s), Some(AttributeValue::S(prefix))) => {
                s.starts_with(prefix.as_str())
            }
            _ => false,
        },
        ComparisonOperator::Between => {
            let (Some(low), Some(high)) = (operand(0), operand(1)) else {
                return false;
            };
            matches!(compare(value, low), Some(Ordering::Greater | Ordering::Equal))
                && matches!(compare(value, high), Some(Ordering::Less | Ordering::Equal))
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get_item(
        &self,
        table: &str,
        key: Item,
        _consistent_read: bool,
    ) -> Result<Option<Item>> {
        let mut state = self.lock();
        let table_state = table_mut(&mut state, table, "GetItem")?;
        let key = storage_key(table, table_state, &key, "GetItem")?;
        Ok(table_state.items.get(&key).cloned())
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<()> {
        self.insert(table, item)
    }

    async fn delete_item(&self, table: &str, key: Item) -> Result<()> {
        let mut state = self.lock();
        if let Some(remaining) = state.deletes_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(Error::Backend {
                    operation: "DeleteItem",
                    message: "injected delete failure".to_string(),
                });
            }
            *remaining -= 1;
        }

        let table_state = table_mut(&mut state, table, "DeleteItem")?;
        let storage = storage_key(table, table_state, &key, "DeleteItem")?;
        table_state.items.remove(&storage);
        table_state.deleted_keys.push(key);
        Ok(())
    }

    fn query(&self, request: QueryRequest) -> ItemStream {
        let state = self.lock();
        let result: Vec<Result<Item>> = match state.tables.get(&request.table) {
            Some(table_state) => table_state
                .items
                .values()
                .filter(|item| request.conditions.iter().all(|c| matches_condition(item, c)))
                .cloned()
                .map(Ok)
                .collect(),
            None => vec![Err(not_found(&request.table, "Query"))],
        };
        stream::iter(result).boxed()
    }

    fn scan(&self, table: &str) -> ItemStream {
        let state = self.lock();
        let result: Vec<Result<Item>> = match state.tables.get(table) {
            Some(table_state) => table_state.items.values().cloned().map(Ok).collect(),
            None => vec![Err(not_found(table, "Scan"))],
        };
        stream::iter(result).boxed()
    }

    async fn batch_get_item(
        &self,
        table: &str,
        keys: Vec<Item>,
        _consistent_read: bool,
    ) -> Result<Vec<Item>> {
        let mut state = self.lock();
        let table_state = table_mut(&mut state, table, "BatchGetItem")?;

        let mut found = Vec::new();
        for key in keys {
            let storage = storage_key(table, table_state, &key, "BatchGetItem")?;
            if let Some(item) = table_state.items.get(&storage) {
                found.push(item.clone());
            }
        }
        Ok(found)
    }

    async fn describe_key_schema(&self, table: &str) -> Result<KeySchema> {
        let state = self.lock();
        let table_state = state
            .tables
            .get(table)
            .ok_or_else(|| not_found(table, "DescribeTable"))?;
        table_state.schema.clone().ok_or_else(|| Error::InvalidKeySchema {
            table: table.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(pairs: &[(&str, AttributeValue)]) -> Item {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn n(v: &str) -> AttributeValue {
        AttributeValue::N(v.to_string())
    }

    #[test]
    fn test_compare_numbers_numerically() {
        assert_eq!(compare(&n("10"), &n("9")), Some(Ordering::Greater));
        assert_eq!(compare(&n("1.0"), &n("1")), Some(Ordering::Equal));
        assert_eq!(compare(&n("1"), &AttributeValue::S("1".into())), None);
    }

    #[test]
    fn test_matches_between_inclusive() {
        let row = item(&[("sk", n("5"))]);
        let condition = KeyCondition::new("sk", ComparisonOperator::Between, vec![n("5"), n("9")]);
        assert!(matches_condition(&row, &condition));

        let condition = KeyCondition::new("sk", ComparisonOperator::Between, vec![n("6"), n("9")]);
        assert!(!matches_condition(&row, &condition));
    }

    #[test]
    fn test_insert_requires_key_attributes() {
        let backend = MemoryBackend::new();
        backend.create_table("t", KeySchema::new("id"));

        let err = backend.insert("t", item(&[("name", n("1"))])).unwrap_err();
        assert!(matches!(err, Error::Backend { operation: "PutItem", .. }));
    }

    #[test]
    fn test_same_key_overwrites() {
        let backend = MemoryBackend::new();
        backend.create_table("t", KeySchema::new("id"));
        backend.insert("t", item(&[("id", n("1")), ("v", n("1"))])).unwrap();
        backend.insert("t", item(&[("id", n("1")), ("v", n("2"))])).unwrap();

        let items = backend.items("t");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["v"], n("2"));
    }
}
