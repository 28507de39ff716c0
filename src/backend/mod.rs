//! Storage backend seam.
//!
//! [`Backend`] is kept as small and as close to the DynamoDB API as
//! possible, so that the SDK-backed implementation stays thin and everything
//! above it can run against [`MemoryBackend`] in tests.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::attribute::{AttributeValue, Item};
use crate::errors::Result;

mod memory;
mod sdk;

pub use memory::MemoryBackend;
pub use sdk::SdkBackend;

/// Stream of items produced by a scan or query.
pub type ItemStream = BoxStream<'static, Result<Item>>;

/// Primary key of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    pub hash_key: String,
    pub range_key: Option<String>,
}

impl KeySchema {
    pub fn new(hash_key: impl Into<String>) -> Self {
        Self {
            hash_key: hash_key.into(),
            range_key: None,
        }
    }

    pub fn with_range_key(mut self, range_key: impl Into<String>) -> Self {
        self.range_key = Some(range_key.into());
        self
    }

    /// Key attribute names, hash key first.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.hash_key.as_str()).chain(self.range_key.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    BeginsWith,
    Between,
}

impl ComparisonOperator {
    /// Number of operand values the operator takes.
    pub fn arity(&self) -> usize {
        match self {
            ComparisonOperator::Between => 2,
            _ => 1,
        }
    }
}

/// One condition on a key attribute, with already-encoded operands.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCondition {
    pub attribute: String,
    pub operator: ComparisonOperator,
    pub values: Vec<AttributeValue>,
}

impl KeyCondition {
    pub fn new(
        attribute: impl Into<String>,
        operator: ComparisonOperator,
        values: Vec<AttributeValue>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
            values,
        }
    }

    pub fn eq(attribute: impl Into<String>, value: AttributeValue) -> Self {
        Self::new(attribute, ComparisonOperator::Eq, vec![value])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub table: String,
    pub index: Option<String>,
    pub conditions: Vec<KeyCondition>,
}

/// The storage collaborator.
///
/// Pagination, retries, transport and credentials are the backend's concern.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get_item(
        &self,
        table: &str,
        key: Item,
        consistent_read: bool,
    ) -> Result<Option<Item>>;

    async fn put_item(&self, table: &str, item: Item) -> Result<()>;

    async fn delete_item(&self, table: &str, key: Item) -> Result<()>;

    /// Every item matching the request, across pages.
    fn query(&self, request: QueryRequest) -> ItemStream;

    /// Every item of the table, across pages.
    fn scan(&self, table: &str) -> ItemStream;

    /// Items found for `keys`. Keys the service leaves unprocessed are not
    /// retried.
    async fn batch_get_item(
        &self,
        table: &str,
        keys: Vec<Item>,
        consistent_read: bool,
    ) -> Result<Vec<Item>>;

    async fn describe_key_schema(&self, table: &str) -> Result<KeySchema>;
}
