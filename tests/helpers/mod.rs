//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use dynamo_wrapper::{AttributeValue, DynamoClient, Item, KeySchema, MemoryBackend};

pub const USERS: &str = "users";
pub const EVENTS: &str = "events";

/// Memory backend with a `users` table (hash key `id`) and an `events`
/// table (hash key `pk`, range key `sk`).
pub fn backend() -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend.create_table(USERS, KeySchema::new("id"));
    backend.create_table(EVENTS, KeySchema::new("pk").with_range_key("sk"));
    backend
}

pub fn client(backend: &MemoryBackend) -> DynamoClient {
    DynamoClient::with_backend(backend.clone()).expect("client over memory backend")
}

pub fn item(pairs: &[(&str, AttributeValue)]) -> Item {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn s(v: &str) -> AttributeValue {
    AttributeValue::S(v.to_string())
}

pub fn n(v: &str) -> AttributeValue {
    AttributeValue::N(v.to_string())
}
