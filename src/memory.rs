//! Long-term memory: the remote store boundary and the retrieval policy
//! the orchestrator relies on.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::{MnemoError, Result};
use crate::message::Message;

const DEFAULT_ENDPOINT: &str = "https://api.mem0.ai";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// A persisted fact about one owner. Append-only; never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRecord {
    pub text: String,
    pub owner: String,
}

#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Most relevant prior facts for `owner`, best first, at most `limit`.
    async fn search(&self, query: &str, owner: &str, limit: usize) -> Result<Vec<MemoryRecord>>;

    /// Append a batch of conversation turns for `owner`. Returns the records
    /// the service reports as created.
    async fn add(&self, turns: &[Message], owner: &str) -> Result<Vec<MemoryRecord>>;
}

/// REST adapter for a mem0-style memory service.
#[derive(Clone)]
pub struct Mem0Client {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl Mem0Client {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .map_err(|err| MnemoError::MemoryService(format!("http client error: {err}")))?,
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn from_config(config: &crate::config::AppConfig) -> Result<Self> {
        let client = Self::new(config.mem0_api_key.clone())?;
        Ok(match &config.mem0_endpoint {
            Some(endpoint) => client.with_endpoint(endpoint.clone()),
            None => client,
        })
    }

    async fn post(&self, path: &str, payload: Value) -> Result<Value> {
        let resp = self
            .http
            .post(format!("{}{}", self.endpoint, path))
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Token {}", self.api_key),
            )
            .json(&payload)
            .send()
            .await
            .map_err(|err| MnemoError::MemoryService(format!("request failed: {err}")))?;

        if !resp.status().is_success() {
            return Err(MnemoError::MemoryService(format!(
                "service returned status {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|err| MnemoError::MemoryService(format!("malformed response: {err}")))
    }
}

// The service answers either a bare array or {"results": [...]}; entries
// carry the fact under `memory` (or `text` in older deployments).
fn collect_records(body: &Value, owner: &str) -> Vec<MemoryRecord> {
    let entries = body
        .as_array()
        .or_else(|| body["results"].as_array())
        .cloned()
        .unwrap_or_default();

    entries
        .iter()
        .filter_map(|entry| {
            entry["memory"]
                .as_str()
                .or_else(|| entry["text"].as_str())
                .map(|text| MemoryRecord {
                    text: text.to_string(),
                    owner: owner.to_string(),
                })
        })
        .collect()
}

#[async_trait]
impl MemoryStore for Mem0Client {
    async fn search(&self, query: &str, owner: &str, limit: usize) -> Result<Vec<MemoryRecord>> {
        let body = self
            .post(
                "/v1/memories/search/",
                json!({"query": query, "user_id": owner, "limit": limit}),
            )
            .await?;
        Ok(collect_records(&body, owner))
    }

    async fn add(&self, turns: &[Message], owner: &str) -> Result<Vec<MemoryRecord>> {
        let body = self
            .post(
                "/v1/memories/",
                json!({"messages": turns, "user_id": owner}),
            )
            .await?;
        Ok(collect_records(&body, owner))
    }
}

/// Owner-scoped store ranked by query token overlap. Used by tests and
/// offline demos in place of the remote service.
#[derive(Default)]
pub struct InMemoryMemoryStore {
    records: RwLock<Vec<MemoryRecord>>,
}

impl InMemoryMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_facts<I, S>(owner: &str, facts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            records: RwLock::new(
                facts
                    .into_iter()
                    .map(|text| MemoryRecord {
                        text: text.into(),
                        owner: owner.to_string(),
                    })
                    .collect(),
            ),
        }
    }

    pub async fn records(&self) -> Vec<MemoryRecord> {
        self.records.read().await.clone()
    }
}

fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn search(&self, query: &str, owner: &str, limit: usize) -> Result<Vec<MemoryRecord>> {
        let query_tokens = tokens(query);
        let records = self.records.read().await;

        let mut scored: Vec<(usize, &MemoryRecord)> = records
            .iter()
            .filter(|record| record.owner == owner)
            .map(|record| {
                let overlap = tokens(&record.text)
                    .intersection(&query_tokens)
                    .count();
                (overlap, record)
            })
            .filter(|(overlap, _)| *overlap > 0)
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn add(&self, turns: &[Message], owner: &str) -> Result<Vec<MemoryRecord>> {
        let mut records = self.records.write().await;
        let created: Vec<MemoryRecord> = turns
            .iter()
            .map(|turn| MemoryRecord {
                text: turn.content.clone(),
                owner: owner.to_string(),
            })
            .collect();
        records.extend(created.clone());
        Ok(created)
    }
}

/// Queries with fewer tokens than this carry too little context to search.
pub const MIN_QUERY_TOKENS: usize = 3;

/// How many facts to pull into the system instruction.
pub const RETRIEVAL_LIMIT: usize = 5;

/// Wraps a [`MemoryStore`] with the orchestration policy: a short-query
/// short-circuit on retrieval, and swallow-and-log on every store failure.
/// A memory outage degrades the conversation, it never aborts it.
pub struct MemoryAdapter<S: MemoryStore> {
    store: Arc<S>,
    limit: usize,
    min_query_tokens: usize,
}

impl<S: MemoryStore> MemoryAdapter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            limit: RETRIEVAL_LIMIT,
            min_query_tokens: MIN_QUERY_TOKENS,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_min_query_tokens(mut self, min_query_tokens: usize) -> Self {
        self.min_query_tokens = min_query_tokens;
        self
    }

    pub async fn retrieve(&self, query: &str, owner: &str) -> Vec<String> {
        if query.split_whitespace().count() < self.min_query_tokens {
            return Vec::new();
        }

        match self.store.search(query, owner, self.limit).await {
            Ok(records) => records.into_iter().map(|record| record.text).collect(),
            Err(err) => {
                warn!(%owner, error = %err, "memory retrieval failed, continuing without context");
                Vec::new()
            }
        }
    }

    pub async fn persist(&self, owner: &str, user_text: &str, assistant_text: &str) {
        let turns = [Message::user(user_text), Message::assistant(assistant_text)];
        if let Err(err) = self.store.add(&turns, owner).await {
            warn!(%owner, error = %err, "memory persistence failed, response already produced");
        }
    }
}
