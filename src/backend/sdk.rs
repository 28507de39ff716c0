//! Backend over the AWS SDK DynamoDB client.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::types::{
    AttributeValue as SdkAttributeValue, KeySchemaElement, KeyType, KeysAndAttributes,
    ReturnConsumedCapacity,
};
use aws_sdk_dynamodb::Client;
use futures_util::stream::{self, StreamExt};
use tracing::{debug, warn};

use super::{Backend, ComparisonOperator, ItemStream, KeyCondition, KeySchema, QueryRequest};
use crate::attribute::{item_from_sdk, item_into_sdk, Item};
use crate::config::ClientConfig;
use crate::errors::{Error, Result};

/// [`Backend`] that forwards every call to an `aws_sdk_dynamodb::Client`.
#[derive(Debug, Clone)]
pub struct SdkBackend {
    client: Client,
}

impl SdkBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build the SDK client from configuration.
    pub async fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(build_client(config).await?))
    }

    /// The wrapped SDK client, for calls this crate does not cover.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Backend for SdkBackend {
    async fn get_item(
        &self,
        table: &str,
        key: Item,
        consistent_read: bool,
    ) -> Result<Option<Item>> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(item_into_sdk(key)))
            .consistent_read(consistent_read)
            .send()
            .await?;

        Ok(output.item.map(item_from_sdk))
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<()> {
        let output = self
            .client
            .put_item()
            .table_name(table)
            .set_item(Some(item_into_sdk(item)))
            .return_consumed_capacity(ReturnConsumedCapacity::Total)
            .send()
            .await?;

        if let Some(units) = output.consumed_capacity().and_then(|c| c.capacity_units()) {
            debug!(table, capacity_units = units, "put item");
        }
        Ok(())
    }

    async fn delete_item(&self, table: &str, key: Item) -> Result<()> {
        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(item_into_sdk(key)))
            .send()
            .await?;
        Ok(())
    }

    fn query(&self, request: QueryRequest) -> ItemStream {
        let expression = KeyExpression::render(&request.conditions);

        let pages = self
            .client
            .query()
            .table_name(request.table)
            .set_index_name(request.index)
            .key_condition_expression(expression.expression)
            .set_expression_attribute_names(Some(expression.names))
            .set_expression_attribute_values(Some(expression.values))
            .into_paginator()
            .items()
            .send();

        stream::unfold(pages, |mut pages| async move {
            let next = pages.next().await?;
            Some((next.map(item_from_sdk).map_err(Error::from), pages))
        })
        .boxed()
    }

    fn scan(&self, table: &str) -> ItemStream {
        let pages = self
            .client
            .scan()
            .table_name(table)
            .into_paginator()
            .items()
            .send();

        stream::unfold(pages, |mut pages| async move {
            let next = pages.next().await?;
            Some((next.map(item_from_sdk).map_err(Error::from), pages))
        })
        .boxed()
    }

    async fn batch_get_item(
        &self,
        table: &str,
        keys: Vec<Item>,
        consistent_read: bool,
    ) -> Result<Vec<Item>> {
        let request = KeysAndAttributes::builder()
            .set_keys(Some(keys.into_iter().map(item_into_sdk).collect()))
            .consistent_read(consistent_read)
            .build()?;

        let output = self
            .client
            .batch_get_item()
            .request_items(table, request)
            .send()
            .await?;

        // Unprocessed keys are left to the caller
        if let Some(unprocessed) = output.unprocessed_keys() {
            let count: usize = unprocessed.values().map(|k| k.keys().len()).sum();
            if count > 0 {
                warn!(table, unprocessed = count, "batch get left keys unprocessed");
            }
        }

        let items = output
            .responses
            .and_then(|mut responses| responses.remove(table))
            .unwrap_or_default();
        Ok(items.into_iter().map(item_from_sdk).collect())
    }

    async fn describe_key_schema(&self, table: &str) -> Result<KeySchema> {
        let output = self.client.describe_table().table_name(table).send().await?;
        let elements = output.table().map(|t| t.key_schema()).unwrap_or_default();
        key_schema_from_elements(table, elements)
    }
}

/// Extract hash and range key names from a described key schema.
pub(crate) fn key_schema_from_elements(
    table: &str,
    elements: &[KeySchemaElement],
) -> Result<KeySchema> {
    let mut hash_key = None;
    let mut range_key = None;

    for element in elements {
        match element.key_type() {
            KeyType::Hash => hash_key = Some(element.attribute_name().to_string()),
            KeyType::Range => range_key = Some(element.attribute_name().to_string()),
            _ => {}
        }
    }

    let hash_key = hash_key.ok_or_else(|| Error::InvalidKeySchema {
        table: table.to_string(),
    })?;
    Ok(KeySchema {
        hash_key,
        range_key,
    })
}

/// A key condition expression with its placeholder maps.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct KeyExpression {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, SdkAttributeValue>,
}

impl KeyExpression {
    /// Render conditions as `#n_0 = :v_0_0 and begins_with(#n_1, :v_1_0)`.
    pub fn render(conditions: &[KeyCondition]) -> Self {
        let mut rendered = KeyExpression::default();
        let mut parts = Vec::with_capacity(conditions.len());

        for (i, condition) in conditions.iter().enumerate() {
            let name = format!("#n_{}", i);
            rendered
                .names
                .insert(name.clone(), condition.attribute.clone());

            let operands: Vec<String> = condition
                .values
                .iter()
                .enumerate()
                .map(|(j, value)| {
                    let placeholder = format!(":v_{}_{}", i, j);
                    rendered
                        .values
                        .insert(placeholder.clone(), value.clone().into_sdk());
                    placeholder
                })
                .collect();

            let first = operands.first().map(String::as_str).unwrap_or_default();
            let part = match condition.operator {
                ComparisonOperator::Eq => format!("{} = {}", name, first),
                ComparisonOperator::Lt => format!("{} < {}", name, first),
                ComparisonOperator::Le => format!("{} <= {}", name, first),
                ComparisonOperator::Gt => format!("{} > {}", name, first),
                ComparisonOperator::Ge => format!("{} >= {}", name, first),
                ComparisonOperator::BeginsWith => format!("begins_with({}, {})", name, first),
                ComparisonOperator::Between => {
                    let second = operands.get(1).map(String::as_str).unwrap_or_default();
                    format!("{} BETWEEN {} AND {}", name, first, second)
                }
            };
            parts.push(part);
        }

        rendered.expression = parts.join(" and ");
        rendered
    }
}

/// Build the AWS SDK DynamoDB client with the given configuration.
///
/// Region: explicit, then the default provider chain, then `us-east-1`.
/// Credentials: static keys, then a named profile, then the default chain.
pub async fn build_client(config: &ClientConfig) -> Result<Client> {
    config.validate()?;

    let region_provider = RegionProviderChain::first_try(
        config
            .region
            .clone()
            .map(aws_sdk_dynamodb::config::Region::new),
    )
    .or_default_provider()
    .or_else("us-east-1");

    let mut config_loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);

    if let (Some(ak), Some(sk)) = (&config.access_key, &config.secret_key) {
        let creds = Credentials::new(
            ak,
            sk,
            config.session_token.clone(),
            None,
            "dynamo-wrapper-static",
        );
        config_loader = config_loader.credentials_provider(creds);
    } else if let Some(profile_name) = &config.profile {
        let profile_provider = ProfileFileCredentialsProvider::builder()
            .profile_name(profile_name)
            .build();
        config_loader = config_loader.credentials_provider(profile_provider);
    }

    let sdk_config = config_loader.load().await;

    let mut dynamo_config = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
    if let Some(url) = &config.endpoint_url {
        dynamo_config = dynamo_config.endpoint_url(url);
    }

    Ok(Client::from_conf(dynamo_config.build()))
}
