//! 📦 Bulk Loader: every record, one request, one verdict.
//!
//! The batch goes out as a single NDJSON `_bulk` body: an action line naming
//! the index, then the document, for each record. The engine reports per-item
//! results; we count the failures so the logs can mention them and so a
//! total wipeout is recognised, but we do not chase individual items. On
//! success the loader reports the number of records submitted.

use serde_json::json;
use tracing::{info, warn};

use crate::common::Record;
use crate::engines::SearchEngine;
use crate::errors::SeedError;

/// 📦 An ordered, non-empty list of `(index, record)` pairs. Built from one
/// index name, so every pair targets the same provisioned index.
#[derive(Debug, Clone)]
pub struct BulkBatch {
    index: String,
    records: Vec<Record>,
}

impl BulkBatch {
    pub fn new(index: impl Into<String>, records: Vec<Record>) -> Result<Self, SeedError> {
        let index = index.into();
        if index.trim().is_empty() {
            return Err(SeedError::invalid_input("bulk batch needs a target index"));
        }
        if records.is_empty() {
            return Err(SeedError::invalid_input(format!(
                "bulk batch for '{index}' has no records"
            )));
        }
        Ok(Self { index, records })
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.records.iter().map(|record| (self.index.as_str(), record))
    }

    /// 📡 Two lines per record, newline-terminated, as `_bulk` expects.
    pub fn to_ndjson(&self) -> String {
        let mut body = String::new();
        for (index, record) in self.pairs() {
            body.push_str(&json!({ "index": { "_index": index } }).to_string());
            body.push('\n');
            body.push_str(&record.to_json_line());
            body.push('\n');
        }
        body
    }
}

/// 🚀 Submit the batch in one request. Returns how many records were accepted.
pub(crate) async fn load_batch<E: SearchEngine + ?Sized>(
    engine: &E,
    batch: BulkBatch,
) -> Result<usize, SeedError> {
    let submitted = batch.len();
    let response = engine.bulk(batch.to_ndjson()).await?;

    if response.totally_rejected() {
        return Err(SeedError::bulk_insert(format!(
            "💀 all {} documents bounced off '{}'. First complaint: {}",
            response.items,
            batch.index(),
            response.first_error.as_deref().unwrap_or("none given")
        )));
    }
    if response.failed > 0 {
        // -- not surfaced beyond this line; the count check is the closing word
        warn!(
            "⚠️ {} of {} documents were refused by '{}'. First complaint: {}",
            response.failed,
            response.items,
            batch.index(),
            response.first_error.as_deref().unwrap_or("none given")
        );
    }

    info!("📦 Inserted {submitted} documents into '{}'", batch.index());
    Ok(submitted)
}
