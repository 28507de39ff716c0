//! Blocking DynamoDB client.
//!
//! The main struct is [`DynamoClient`]. Every method blocks the calling
//! thread until the backend answers, so it must not be called from inside an
//! async context; use [`crate::basic_operations`] there instead.

use std::fmt;
use std::sync::Arc;

use aws_sdk_dynamodb::Client;
use once_cell::sync::OnceCell;
use tokio::runtime::Runtime;

use crate::backend::{Backend, KeyCondition, KeySchema, SdkBackend};
use crate::basic_operations;
use crate::config::ClientConfig;
use crate::document::Document;
use crate::errors::{Error, Result};
use crate::serialization::DecodeOptions;
use crate::table_operations;
use crate::value::{NativeValue, Record};

/// Shared Tokio runtime, built on first use.
///
/// One runtime per process, however many clients are created.
static RUNTIME: OnceCell<Arc<Runtime>> = OnceCell::new();

fn shared_runtime() -> Result<Arc<Runtime>> {
    RUNTIME
        .get_or_try_init(|| Runtime::new().map(Arc::new).map_err(Error::Runtime))
        .cloned()
}

/// Synchronous client over a [`Backend`].
///
/// # Examples
///
/// ```no_run
/// use dynamo_wrapper::{ClientConfig, DynamoClient, Record};
///
/// let client = DynamoClient::new(ClientConfig::from_env())?;
/// client.put_record("users", &Record::new().with("id", 1).with("name", "Alice"))?;
///
/// let user = client.get_item("users", &Record::new().with("id", 1))?;
/// # Ok::<(), dynamo_wrapper::Error>(())
/// ```
pub struct DynamoClient {
    backend: Arc<dyn Backend>,
    sdk_client: Option<Client>,
    runtime: Arc<Runtime>,
    consistent_read: bool,
    decode_options: DecodeOptions,
}

impl fmt::Debug for DynamoClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamoClient")
            .field("consistent_read", &self.consistent_read)
            .field("decode_options", &self.decode_options)
            .finish_non_exhaustive()
    }
}

impl DynamoClient {
    /// Create a client backed by the AWS SDK.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let runtime = shared_runtime()?;
        let backend = runtime.block_on(SdkBackend::from_config(&config))?;
        let sdk_client = backend.client().clone();

        Ok(Self {
            backend: Arc::new(backend),
            sdk_client: Some(sdk_client),
            runtime,
            consistent_read: config.consistent_read,
            decode_options: DecodeOptions::default(),
        })
    }

    /// Create an SDK-backed client from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Create a client over any backend, with strongly consistent reads.
    pub fn with_backend(backend: impl Backend + 'static) -> Result<Self> {
        Ok(Self {
            backend: Arc::new(backend),
            sdk_client: None,
            runtime: shared_runtime()?,
            consistent_read: true,
            decode_options: DecodeOptions::default(),
        })
    }

    /// Options used to decode every item this client returns.
    pub fn with_decode_options(mut self, options: DecodeOptions) -> Self {
        self.decode_options = options;
        self
    }

    pub fn with_consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = consistent_read;
        self
    }

    pub fn decode_options(&self) -> DecodeOptions {
        self.decode_options
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// The underlying SDK client, when the client was built from
    /// configuration.
    pub fn sdk_client(&self) -> Option<&Client> {
        self.sdk_client.as_ref()
    }

    /// Get an item by its key attributes.
    pub fn get_item(&self, table: &str, key: &Record) -> Result<Option<Record>> {
        self.runtime.block_on(basic_operations::get_item(
            self.backend(),
            table,
            key,
            self.consistent_read,
            self.decode_options,
        ))
    }

    /// First item of a secondary index matching every attribute in `keys`.
    pub fn get_item_by_index(
        &self,
        table: &str,
        index: &str,
        keys: &Record,
    ) -> Result<Option<Record>> {
        self.runtime.block_on(basic_operations::get_item_by_index(
            self.backend(),
            table,
            index,
            keys,
            self.decode_options,
        ))
    }

    /// All items matching the key conditions.
    ///
    /// For the first match only, see [`DynamoClient::get_item_by_index`].
    pub fn query(
        &self,
        table: &str,
        conditions: &[KeyCondition],
        index: Option<&str>,
    ) -> Result<Vec<Record>> {
        self.runtime.block_on(basic_operations::query(
            self.backend(),
            table,
            conditions,
            index,
            self.decode_options,
        ))
    }

    /// Items whose `key_name` attribute equals one of `ids`.
    pub fn batch_get_item(
        &self,
        table: &str,
        key_name: &str,
        ids: &[NativeValue],
    ) -> Result<Vec<Record>> {
        self.runtime.block_on(basic_operations::batch_get_item(
            self.backend(),
            table,
            key_name,
            ids,
            self.consistent_read,
            self.decode_options,
        ))
    }

    pub fn put_item(&self, table: &str, document: &Document) -> Result<()> {
        self.runtime
            .block_on(basic_operations::put_item(self.backend(), table, document))
    }

    pub fn put_record(&self, table: &str, record: &Record) -> Result<()> {
        self.runtime
            .block_on(basic_operations::put_record(self.backend(), table, record))
    }

    /// Delete the item identified by the document's key attributes.
    pub fn delete_item(&self, table: &str, document: &Document) -> Result<()> {
        self.runtime
            .block_on(basic_operations::delete_item(self.backend(), table, document))
    }

    pub fn scan_table(&self, table: &str) -> Result<Vec<Record>> {
        self.runtime.block_on(basic_operations::scan_table(
            self.backend(),
            table,
            self.decode_options,
        ))
    }

    pub fn key_schema(&self, table: &str) -> Result<KeySchema> {
        self.runtime
            .block_on(table_operations::key_schema(self.backend(), table))
    }

    /// Delete every item of the table. Returns the number of deletes issued.
    pub fn empty_table(&self, table: &str) -> Result<u64> {
        self.runtime
            .block_on(table_operations::empty_table(self.backend(), table))
    }
}
