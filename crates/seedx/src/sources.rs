//! 🚰 Record sources: where the movies come from before they go anywhere.
//!
//! Two dice-driven strategies and one for callers who bring their own records:
//! - 🎲 [`synthetic::SyntheticSource`]: `Pelicula 1..=N`, everything else rolled on dice
//! - 📂 [`title_file::TitleFileSource`]: titles from a file, everything else rolled on dice
//! - 🧪 [`in_mem::InMemorySource`]: a fixed list, behind `run_with_records` and most tests
//!
//! Exactly one runs per seeding. The choice belongs to the config, never to
//! the pipeline. Every strategy owes the pipeline at least one record, or an
//! `EmptySource` error explaining why not. 🦆

use async_trait::async_trait;

use crate::app_config::SeedConfig;
use crate::common::Record;
use crate::errors::SeedError;

pub(crate) mod in_mem;
pub(crate) mod movies;
pub(crate) mod synthetic;
pub(crate) mod title_file;

/// 🚰 A finite, non-empty pile of records.
///
/// # Contract
/// - `records` is called once per run. It hands over ownership of everything it produced.
/// - Zero records is never `Ok`. It is [`SeedError::EmptySource`].
#[async_trait]
pub(crate) trait RecordSource: std::fmt::Debug + Send {
    async fn records(&mut self) -> Result<Vec<Record>, SeedError>;
}

/// 🎭 Enum dispatch over the strategies, same trick as the engines.
#[derive(Debug)]
pub(crate) enum SourceBackend {
    Synthetic(synthetic::SyntheticSource),
    TitleFile(title_file::TitleFileSource),
    InMemory(in_mem::InMemorySource),
}

impl SourceBackend {
    /// 🎯 A title file wins when one is configured; otherwise the dice roll.
    /// The in-memory variant is never picked by config, only built directly.
    pub(crate) fn from_config(seed: &SeedConfig) -> Self {
        match &seed.title_file {
            Some(path) => SourceBackend::TitleFile(title_file::TitleFileSource::new(
                path.clone(),
                seed.geo,
                seed.rng_seed,
            )),
            None => SourceBackend::Synthetic(synthetic::SyntheticSource::new(
                seed.record_count,
                seed.geo,
                seed.rng_seed,
            )),
        }
    }
}

#[async_trait]
impl RecordSource for SourceBackend {
    async fn records(&mut self) -> Result<Vec<Record>, SeedError> {
        match self {
            SourceBackend::Synthetic(source) => source.records().await,
            SourceBackend::TitleFile(source) => source.records().await,
            SourceBackend::InMemory(source) => source.records().await,
        }
    }
}
