//! 🎲 `Pelicula 1` through `Pelicula N`, every other field left to chance.

use async_trait::async_trait;
use tracing::debug;

use crate::common::Record;
use crate::errors::SeedError;
use crate::sources::RecordSource;
use crate::sources::movies::MovieGenerator;

#[derive(Debug)]
pub(crate) struct SyntheticSource {
    count: usize,
    generator: MovieGenerator,
}

impl SyntheticSource {
    pub(crate) fn new(count: usize, geo: bool, rng_seed: Option<u64>) -> Self {
        Self {
            count,
            generator: MovieGenerator::new(rng_seed, geo),
        }
    }
}

#[async_trait]
impl RecordSource for SyntheticSource {
    async fn records(&mut self) -> Result<Vec<Record>, SeedError> {
        if self.count == 0 {
            return Err(SeedError::empty_source(
                "synthetic source was asked for 0 records. Nothing to seed is still nothing.",
            ));
        }
        let titles = (1..=self.count).map(|i| format!("Pelicula {i}"));
        let records = self.generator.records_for(titles)?;
        debug!("🎲 Rolled {} synthetic movies", records.len());
        Ok(records)
    }
}
