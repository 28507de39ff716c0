//! # dynamo-wrapper
//!
//! A thin marshalling layer between application values and DynamoDB.
//!
//! This crate provides:
//! - The attribute codec between [`NativeValue`] and [`AttributeValue`]
//! - CRUD passthroughs (get, put, delete, query, scan, batch-get)
//! - A full-table sweep ([`DynamoClient::empty_table`])
//!
//! Transport, credentials, retries and pagination are left to
//! `aws-sdk-dynamodb`.
//!
//! ```
//! use dynamo_wrapper::{decode_item, encode_item, DecodeOptions, Record};
//!
//! let record = Record::new().with("name", "Alice").with("age", 30).with("zip", "02139");
//! let item = encode_item(&record);
//! assert_eq!(item["zip"].tag(), "N");
//!
//! let back = decode_item(&item, DecodeOptions::default());
//! assert_eq!(back["age"].as_f64(), Some(30.0));
//! ```

pub mod attribute;
pub mod backend;
pub mod basic_operations;
mod client;
pub mod config;
mod document;
mod errors;
pub mod logging;
pub mod serialization;
pub mod table_operations;
mod value;

pub use attribute::{AttributeValue, BoolLiteral, Item};
pub use backend::{
    Backend, ComparisonOperator, KeyCondition, KeySchema, MemoryBackend, QueryRequest,
    SdkBackend,
};
pub use basic_operations::condition;
pub use client::DynamoClient;
pub use config::ClientConfig;
pub use document::Document;
pub use errors::{Error, Result};
pub use serialization::{
    decode_item, decode_value, encode_item, encode_value, DecodeOptions, NumberSetMode,
};
pub use value::{IntoNative, NativeValue, Number, Record};
