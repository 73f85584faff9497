//! 💀 Errors: the taxonomy of everything that can go wrong between "cargo run"
//! and "200 movies are sitting in the index".
//!
//! Every variant is fatal. Nothing here is retried, nothing is swallowed,
//! nothing is rolled back. The pipeline logs it, propagates it, and the CLI
//! turns it into exit code 1. 🦆

use std::path::PathBuf;

use thiserror::Error;

/// 🏷️ What went wrong while seeding, by stage.
#[derive(Debug, Error)]
pub enum SeedError {
    /// 📡 Could not reach or authenticate to the engine.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// 🚫 The engine refused to create the index with our mapping.
    #[error("index '{index}' rejected the schema: {reason}")]
    SchemaRejected { index: String, reason: String },

    /// 🕳️ The record source produced zero usable records.
    #[error("record source is empty: {0}")]
    EmptySource(String),

    /// 📂 The title list could not be read at all.
    #[error("could not read title list '{}'", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 📦 The bulk request failed in transit or was rejected wholesale.
    #[error("bulk insert failed: {0}")]
    BulkInsert(String),

    /// 🔢 The post-load count query failed, or the exact count check did not hold.
    #[error("verification failed: {0}")]
    Verification(String),

    /// 🙅 Bad input handed to the core: empty names, empty batches, off-schema records.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl SeedError {
    pub fn connectivity(msg: impl Into<String>) -> Self {
        Self::Connectivity(msg.into())
    }

    pub fn schema_rejected(index: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaRejected {
            index: index.into(),
            reason: reason.into(),
        }
    }

    pub fn empty_source(msg: impl Into<String>) -> Self {
        Self::EmptySource(msg.into())
    }

    pub fn bulk_insert(msg: impl Into<String>) -> Self {
        Self::BulkInsert(msg.into())
    }

    pub fn verification(msg: impl Into<String>) -> Self {
        Self::Verification(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// 🔌 True when the failure smells like "the cluster is not there".
    /// The CLI uses this to print a docker hint instead of a stack of sadness.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}
