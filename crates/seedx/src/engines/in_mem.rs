//! 🧪 An engine that never forgets, and never leaves RAM.
//!
//! `InMemoryEngine` speaks the same four verbs as the real cluster and even
//! parses the same NDJSON, so dry runs and tests exercise the exact payload a
//! cluster would receive. Clone it and every clone shares the same state,
//! which is how tests peek inside after the pipeline is done with it.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::trace;

use crate::engines::{BulkResponse, CreateIndexOutcome, SearchEngine};
use crate::errors::SeedError;

#[derive(Debug, Default)]
pub(crate) struct InMemoryIndex {
    pub(crate) mapping: Value,
    pub(crate) documents: Vec<Value>,
}

#[derive(Debug, Default)]
pub(crate) struct InMemoryState {
    pub(crate) indices: BTreeMap<String, InMemoryIndex>,
    pub(crate) create_calls: usize,
    pub(crate) bulk_calls: usize,
    /// 👻 A rival process creates the index right after our existence check
    /// says "absent". Lets tests lose the race on purpose.
    pub(crate) rival_creates_first: bool,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryEngine {
    pub(crate) state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 👻 An engine where somebody else always wins the create race.
    #[cfg(test)]
    pub(crate) fn with_rival_creator() -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryState {
                rival_creates_first: true,
                ..InMemoryState::default()
            })),
        }
    }
}

// 📦 one action line + one source line, or a 400 in real life
fn parse_bulk_pairs(payload: &str) -> Result<Vec<(Option<String>, Value)>, SeedError> {
    let mut lines = payload.lines().filter(|line| !line.trim().is_empty());
    let mut pairs = Vec::new();
    while let Some(action_line) = lines.next() {
        let action: Value = serde_json::from_str(action_line).map_err(|e| {
            SeedError::bulk_insert(format!("💀 Malformed bulk action line: {e}"))
        })?;
        let target = action
            .get("index")
            .ok_or_else(|| SeedError::bulk_insert("💀 Only `index` bulk actions are supported"))?
            .get("_index")
            .and_then(Value::as_str)
            .map(str::to_string);
        let source_line = lines
            .next()
            .ok_or_else(|| SeedError::bulk_insert("💀 Bulk action line without a source line"))?;
        let source: Value = serde_json::from_str(source_line).map_err(|e| {
            SeedError::bulk_insert(format!("💀 Malformed bulk source line: {e}"))
        })?;
        pairs.push((target, source));
    }
    Ok(pairs)
}

#[async_trait]
impl SearchEngine for InMemoryEngine {
    async fn index_exists(&self, index: &str) -> Result<bool, SeedError> {
        let state = self.state.lock().await;
        let found = state.indices.get(index);
        if let Some(existing) = found {
            trace!("🧪 '{index}' exists with mapping {}", existing.mapping);
        }
        Ok(found.is_some())
    }

    async fn create_index(
        &self,
        index: &str,
        mapping: &Value,
    ) -> Result<CreateIndexOutcome, SeedError> {
        let mut state = self.state.lock().await;
        state.create_calls += 1;
        if state.rival_creates_first && !state.indices.contains_key(index) {
            state.indices.insert(index.to_string(), InMemoryIndex::default());
        }
        if state.indices.contains_key(index) {
            return Ok(CreateIndexOutcome::AlreadyExists);
        }
        state.indices.insert(
            index.to_string(),
            InMemoryIndex {
                mapping: mapping.clone(),
                documents: Vec::new(),
            },
        );
        Ok(CreateIndexOutcome::Created)
    }

    async fn bulk(&self, payload: String) -> Result<BulkResponse, SeedError> {
        let pairs = parse_bulk_pairs(&payload)?;
        let mut state = self.state.lock().await;
        state.bulk_calls += 1;

        let mut response = BulkResponse::default();
        for (target, source) in pairs {
            response.items += 1;
            let landed = target
                .as_deref()
                .and_then(|name| state.indices.get_mut(name))
                .map(|index| index.documents.push(source))
                .is_some();
            if !landed {
                response.failed += 1;
                response
                    .first_error
                    .get_or_insert_with(|| format!("index_not_found_exception: {target:?}"));
            }
        }
        trace!("🧪 In-memory bulk: {} items, {} failed", response.items, response.failed);
        Ok(response)
    }

    async fn count(&self, index: &str) -> Result<u64, SeedError> {
        let state = self.state.lock().await;
        state
            .indices
            .get(index)
            .map(|found| found.documents.len() as u64)
            .ok_or_else(|| SeedError::verification(format!("💀 no such index '{index}'")))
    }
}
