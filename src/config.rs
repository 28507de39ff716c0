//! Client configuration.
//!
//! Credential sources, in order of priority:
//! 1. Static credentials (`access_key`, `secret_key`, `session_token`)
//! 2. AWS profile from ~/.aws/credentials
//! 3. Default credential chain (environment, instance profile, etc.)

use serde::Deserialize;

use crate::errors::{Error, Result};

/// Environment variable holding a custom endpoint (localstack, DynamoDB Local).
pub const ENDPOINT_ENV: &str = "DYNAMODB_ENDPOINT_URL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// AWS region. Falls back to the default provider chain, then `us-east-1`.
    pub region: Option<String>,
    /// Custom endpoint URL for local testing.
    pub endpoint_url: Option<String>,
    pub profile: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub session_token: Option<String>,
    /// Strongly consistent reads for get and batch-get.
    pub consistent_read: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            region: None,
            endpoint_url: None,
            profile: None,
            access_key: None,
            secret_key: None,
            session_token: None,
            consistent_read: true,
        }
    }
}

impl ClientConfig {
    /// Read `AWS_REGION` (or `AWS_DEFAULT_REGION`), `AWS_PROFILE` and
    /// [`ENDPOINT_ENV`]. Static keys are left to the SDK's own chain.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ClientConfig = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("failed to parse client config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Self {
            region: non_empty("AWS_REGION").or_else(|| non_empty("AWS_DEFAULT_REGION")),
            endpoint_url: non_empty(ENDPOINT_ENV),
            profile: non_empty("AWS_PROFILE"),
            ..Self::default()
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_static_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self.session_token = session_token;
        self
    }

    pub fn with_consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = consistent_read;
        self
    }

    /// Static keys must come in pairs; a session token needs both.
    pub fn validate(&self) -> Result<()> {
        match (&self.access_key, &self.secret_key) {
            (Some(_), None) => Err(Error::Config(
                "access_key is set but secret_key is missing".to_string(),
            )),
            (None, Some(_)) => Err(Error::Config(
                "secret_key is set but access_key is missing".to_string(),
            )),
            (None, None) if self.session_token.is_some() => Err(Error::Config(
                "session_token requires access_key and secret_key".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert!(config.consistent_read);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let json = r#"{"region": "eu-west-1", "endpoint_url": "http://localhost:8000"}"#;
        let config = ClientConfig::from_json(json).unwrap();
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:8000"));
        assert!(config.consistent_read);
    }

    #[test]
    fn test_from_json_rejects_unknown_fields() {
        let err = ClientConfig::from_json(r#"{"regoin": "eu-west-1"}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_json_validates_credentials() {
        let err = ClientConfig::from_json(r#"{"secret_key": "s"}"#).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_from_lookup_region_fallback() {
        let env = HashMap::from([
            ("AWS_DEFAULT_REGION", "ap-south-1"),
            ("AWS_REGION", ""),
            (ENDPOINT_ENV, "http://localhost:4566"),
        ]);
        let config = ClientConfig::from_lookup(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.region.as_deref(), Some("ap-south-1"));
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert_eq!(config.profile, None);
    }

    #[test]
    fn test_static_credentials_builder() {
        let config = ClientConfig::default().with_static_credentials("AKIA", "secret", None);
        assert!(config.validate().is_ok());
    }
}
