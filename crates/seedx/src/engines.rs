//! 🔌 Engines: the thing on the other end of the wire.
//!
//! 🎭 This module is the casting agency for search engines. Need a real
//! Elasticsearch cluster behind TLS and basic auth? We've got one. Need a
//! pretend cluster that lives in a `Vec` and never pages anyone at 3am? We've
//! got that too. The pipeline does not care which one it gets. It asks four
//! questions (does it exist, please create it, take these documents, how many
//! do you have) and it asks them one at a time.
//!
//! 🦆 The duck is here because every file must have one.

use async_trait::async_trait;
use serde_json::Value;

use crate::app_config::AppConfig;
use crate::errors::SeedError;

pub(crate) mod elasticsearch;
pub(crate) mod in_mem;

pub use elasticsearch::ElasticsearchConfig;

/// 🏗️ What a create-index call actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CreateIndexOutcome {
    /// ✅ We made it. It is ours.
    Created,
    /// 🏁 Somebody beat us to it between "exists?" and "create". Still a win.
    AlreadyExists,
}

/// 📊 The engine's summary of one bulk request. We count failures to log them
/// and to spot total rejection. We do not act on individual items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct BulkResponse {
    pub(crate) items: usize,
    pub(crate) failed: usize,
    pub(crate) first_error: Option<String>,
}

impl BulkResponse {
    /// 💀 Every single item bounced. Nothing landed.
    pub(crate) fn totally_rejected(&self) -> bool {
        self.items > 0 && self.failed == self.items
    }
}

/// 📡 A connected handle to a search engine.
///
/// # Contract
/// - `index_exists` answers yes/no, and errors only when the engine is unreachable.
/// - `create_index` maps "already exists" to [`CreateIndexOutcome::AlreadyExists`], never to an error.
/// - `bulk` takes a fully rendered NDJSON payload. It does not retry.
/// - `count` returns whatever the engine can see right now. Near-real-time is the engine's problem.
#[async_trait]
pub(crate) trait SearchEngine: std::fmt::Debug + Send + Sync {
    async fn index_exists(&self, index: &str) -> Result<bool, SeedError>;
    async fn create_index(&self, index: &str, mapping: &Value)
    -> Result<CreateIndexOutcome, SeedError>;
    async fn bulk(&self, payload: String) -> Result<BulkResponse, SeedError>;
    async fn count(&self, index: &str) -> Result<u64, SeedError>;
}

/// 🎭 The many faces of an engine. Enum dispatch keeps the pipeline
/// blissfully ignorant of whether its documents land in a cluster or in RAM.
#[derive(Debug)]
pub(crate) enum EngineBackend {
    Elasticsearch(elasticsearch::ElasticsearchEngine),
    InMemory(in_mem::InMemoryEngine),
}

impl EngineBackend {
    /// 🚀 Connect to whatever the config points at. Dry runs get the in-memory
    /// engine, everyone else gets a real cluster (pinged before we return).
    pub(crate) async fn from_config(app_config: &AppConfig) -> Result<Self, SeedError> {
        if app_config.dry_run {
            tracing::info!("🧪 Dry run: seeding an in-memory engine, no cluster will be harmed");
            return Ok(EngineBackend::InMemory(in_mem::InMemoryEngine::new()));
        }
        let engine = elasticsearch::ElasticsearchEngine::connect(&app_config.engine).await?;
        Ok(EngineBackend::Elasticsearch(engine))
    }
}

#[async_trait]
impl SearchEngine for EngineBackend {
    async fn index_exists(&self, index: &str) -> Result<bool, SeedError> {
        match self {
            EngineBackend::Elasticsearch(engine) => engine.index_exists(index).await,
            EngineBackend::InMemory(engine) => engine.index_exists(index).await,
        }
    }

    async fn create_index(
        &self,
        index: &str,
        mapping: &Value,
    ) -> Result<CreateIndexOutcome, SeedError> {
        match self {
            EngineBackend::Elasticsearch(engine) => engine.create_index(index, mapping).await,
            EngineBackend::InMemory(engine) => engine.create_index(index, mapping).await,
        }
    }

    async fn bulk(&self, payload: String) -> Result<BulkResponse, SeedError> {
        match self {
            EngineBackend::Elasticsearch(engine) => engine.bulk(payload).await,
            EngineBackend::InMemory(engine) => engine.bulk(payload).await,
        }
    }

    async fn count(&self, index: &str) -> Result<u64, SeedError> {
        match self {
            EngineBackend::Elasticsearch(engine) => engine.count(index).await,
            EngineBackend::InMemory(engine) => engine.count(index).await,
        }
    }
}
