//! Error types for dynamo-wrapper.
//!
//! SDK errors are carried unmodified, one variant per operation, so callers
//! can inspect the service error themselves.

use aws_sdk_dynamodb::config::http::HttpResponse;
use aws_sdk_dynamodb::error::{BuildError, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::scan::ScanError;

/// Shorthand result type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("DynamoDB GetItem operation failed: {0}")]
    GetItem(#[from] SdkError<GetItemError, HttpResponse>),

    #[error("DynamoDB PutItem operation failed: {0}")]
    PutItem(#[from] SdkError<PutItemError, HttpResponse>),

    #[error("DynamoDB DeleteItem operation failed: {0}")]
    DeleteItem(#[from] SdkError<DeleteItemError, HttpResponse>),

    #[error("DynamoDB Query operation failed: {0}")]
    Query(#[from] SdkError<QueryError, HttpResponse>),

    #[error("DynamoDB Scan operation failed: {0}")]
    Scan(#[from] SdkError<ScanError, HttpResponse>),

    #[error("DynamoDB BatchGetItem operation failed: {0}")]
    BatchGetItem(#[from] SdkError<BatchGetItemError, HttpResponse>),

    #[error("DynamoDB DescribeTable operation failed: {0}")]
    DescribeTable(#[from] SdkError<DescribeTableError, HttpResponse>),

    #[error("DynamoDB request builder error: {0}")]
    Build(#[from] BuildError),

    /// Key attributes needed for a delete were never supplied.
    #[error("required key attributes missing for table '{table}': {}", .missing.join(", "))]
    MissingKeyAttributes { table: String, missing: Vec<String> },

    #[error("table '{table}' has no HASH key in its key schema")]
    InvalidKeySchema { table: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to start tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("invalid attribute-value JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Failure reported by a backend that is not the AWS SDK.
    #[error("{operation} failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
}

impl Error {
    /// Missing keys, bad key schema or bad client configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::MissingKeyAttributes { .. } | Error::InvalidKeySchema { .. } | Error::Config(_)
        )
    }

    /// The table (or another resource) does not exist.
    pub fn is_resource_not_found(&self) -> bool {
        self.service_code() == Some("ResourceNotFoundException")
    }

    /// The request was throttled by the service.
    pub fn is_throttling(&self) -> bool {
        matches!(
            self.service_code(),
            Some("ProvisionedThroughputExceededException")
                | Some("ThrottlingException")
                | Some("RequestLimitExceeded")
        )
    }

    /// Error code of the underlying service error, if any.
    pub fn service_code(&self) -> Option<&str> {
        match self {
            Error::GetItem(e) => e.code(),
            Error::PutItem(e) => e.code(),
            Error::DeleteItem(e) => e.code(),
            Error::Query(e) => e.code(),
            Error::Scan(e) => e.code(),
            Error::BatchGetItem(e) => e.code(),
            Error::DescribeTable(e) => e.code(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_message() {
        let err = Error::MissingKeyAttributes {
            table: "users".into(),
            missing: vec!["id".into(), "sk".into()],
        };
        assert_eq!(
            err.to_string(),
            "required key attributes missing for table 'users': id, sk"
        );
        assert!(err.is_configuration_error());
        assert!(!err.is_throttling());
    }

    #[test]
    fn test_build_error_conversion() {
        let err: Error = BuildError::other("test").into();
        assert!(matches!(err, Error::Build(_)));
        assert!(!err.is_configuration_error());
        assert_eq!(err.service_code(), None);
    }

    #[test]
    fn test_backend_error_display() {
        let err = Error::Backend {
            operation: "DeleteItem",
            message: "injected".into(),
        };
        assert_eq!(err.to_string(), "DeleteItem failed: injected");
    }
}
