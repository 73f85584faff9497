//! 🚂 The pipeline: provision → source → load → verify. In that order. Always.
//!
//! 🎬 *[narrator voice]* "Four stages. One task. No fan-out, no retries, no
//! second chances." Every stage is awaited before the next one starts, and
//! the engine handle is borrowed by one stage at a time.
//!
//! The first error stops the run. It gets logged here with the stage it came
//! from and then handed back up unchanged. Nothing is rolled back: an index
//! created before a failed load stays created, and a half-loaded index stays
//! half-loaded.

use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::app_config::SeedConfig;
use crate::engines::EngineBackend;
use crate::errors::SeedError;
use crate::loader::{BulkBatch, load_batch};
use crate::provisioner::ensure_index;
use crate::report::SeedReport;
use crate::schema::IndexSchema;
use crate::sources::{RecordSource, SourceBackend};
use crate::verifier::Verifier;

/// 🧭 Owns nothing it does not need: borrows the engine, borrows the seed
/// config, owns the schema it derived from that config.
#[derive(Debug)]
pub(crate) struct Seeder<'a> {
    engine: &'a EngineBackend,
    seed: &'a SeedConfig,
    schema: IndexSchema,
    dry_run: bool,
}

// -- log once, at the stage boundary, then let `?` carry it the rest of the way
fn logged<T>(stage: &str, result: Result<T, SeedError>) -> Result<T, SeedError> {
    result.inspect_err(|err| error!("💀 {stage} failed: {err}"))
}

impl<'a> Seeder<'a> {
    pub(crate) fn new(engine: &'a EngineBackend, seed: &'a SeedConfig, dry_run: bool) -> Self {
        let schema = if seed.geo {
            IndexSchema::movies_with_geo()
        } else {
            IndexSchema::movies()
        };
        Self {
            engine,
            seed,
            schema,
            dry_run,
        }
    }

    /// 🚀 Run every stage against `source`. Exactly one source per run.
    pub(crate) async fn run(&self, source: &mut SourceBackend) -> Result<SeedReport, SeedError> {
        let started = Instant::now();
        let index = self.seed.index_name.as_str();
        info!("🚀 Seeding '{index}' ({} fields in the schema)", self.schema.len());

        let provisioned = logged(
            "provisioning",
            ensure_index(self.engine, index, &self.schema).await,
        )?;

        let records = logged("reading records", source.records().await)?;
        logged(
            "schema conformance",
            records.iter().try_for_each(|record| self.schema.check(record)),
        )?;
        info!("🎬 {} records ready for '{index}'", records.len());

        let verifier = Verifier::new(
            Duration::from_millis(self.seed.settle_interval_ms),
            self.seed.count_check,
        );
        let baseline = logged("baseline count", verifier.baseline(self.engine, index).await)?;

        let batch = logged("building the bulk batch", BulkBatch::new(index, records))?;
        let submitted = batch.len();
        let accepted = logged("bulk insert", load_batch(self.engine, batch).await)?;

        let verdict = logged(
            "verification",
            verifier.verify(self.engine, index, baseline, accepted).await,
        )?;

        Ok(SeedReport {
            index: index.to_string(),
            provisioned,
            submitted,
            accepted,
            document_count: verdict.document_count,
            expected_count: verdict.expected,
            dry_run: self.dry_run,
            elapsed: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Record;
    use crate::engines::SearchEngine;
    use crate::engines::in_mem::InMemoryEngine;
    use crate::provisioner::ProvisionOutcome;
    use crate::sources::in_mem::InMemorySource;
    use crate::sources::movies::MovieGenerator;
    use crate::verifier::CountCheck;
    use serde_json::{Map, json};

    fn quick_seed(record_count: usize) -> SeedConfig {
        SeedConfig {
            record_count,
            rng_seed: Some(2022),
            settle_interval_ms: 0,
            ..SeedConfig::default()
        }
    }

    async fn seed_once(
        engine: &InMemoryEngine,
        seed: &SeedConfig,
    ) -> Result<SeedReport, SeedError> {
        let backend = EngineBackend::InMemory(engine.clone());
        let mut source = SourceBackend::from_config(seed);
        Seeder::new(&backend, seed, true).run(&mut source).await
    }

    #[tokio::test]
    async fn the_one_where_two_hundred_movies_land_in_an_empty_cluster() -> Result<(), SeedError> {
        let engine = InMemoryEngine::new();
        let report = seed_once(&engine, &quick_seed(200)).await?;

        assert_eq!(report.provisioned, ProvisionOutcome::Created);
        assert_eq!(report.submitted, 200);
        assert_eq!(report.accepted, 200);
        assert_eq!(report.document_count, 200);
        assert_eq!(
            engine.state.lock().await.indices["peliculas"].mapping,
            IndexSchema::movies().to_mapping_body()
        );
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_second_run_appends_instead_of_recreating() -> Result<(), SeedError> {
        let engine = InMemoryEngine::new();
        let seed = quick_seed(200);
        seed_once(&engine, &seed).await?;
        let second = seed_once(&engine, &seed).await?;

        assert_eq!(second.provisioned, ProvisionOutcome::AlreadyPresent);
        assert_eq!(second.document_count, 400, "no dedup, no replace, just more movies");
        let state = engine.state.lock().await;
        assert_eq!(state.create_calls, 1);
        assert_eq!(state.bulk_calls, 2);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_exact_mode_passes_on_a_rerun_too() -> Result<(), SeedError> {
        let engine = InMemoryEngine::new();
        let seed = SeedConfig {
            count_check: CountCheck::Exact,
            ..quick_seed(25)
        };
        seed_once(&engine, &seed).await?;
        let second = seed_once(&engine, &seed).await?;
        assert_eq!(second.expected_count, Some(50));
        assert_eq!(second.document_count, 50);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_geo_mode_ships_nine_fields_per_movie() -> Result<(), SeedError> {
        let engine = InMemoryEngine::new();
        let seed = SeedConfig {
            geo: true,
            ..quick_seed(30)
        };
        seed_once(&engine, &seed).await?;

        let state = engine.state.lock().await;
        let index = &state.indices["peliculas"];
        assert_eq!(index.mapping, IndexSchema::movies_with_geo().to_mapping_body());
        for document in &index.documents {
            assert_eq!(document.as_object().map(Map::len), Some(9));
            let ubicacion = &document["ubicacion"];
            assert!(ubicacion["lat"].is_f64() && ubicacion["lon"].is_f64());
        }
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_an_empty_source_never_reaches_bulk() -> Result<(), SeedError> {
        let engine = InMemoryEngine::new();
        let result = seed_once(&engine, &quick_seed(0)).await;

        assert!(matches!(result, Err(SeedError::EmptySource(_))));
        let state = engine.state.lock().await;
        assert_eq!(state.bulk_calls, 0);
        // -- provisioning ran first and is not undone
        assert!(state.indices.contains_key("peliculas"));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_stray_field_is_caught_before_the_wire() -> Result<(), SeedError> {
        let engine = InMemoryEngine::new();
        let backend = EngineBackend::InMemory(engine.clone());
        let seed = quick_seed(1);
        let mut fields = Map::new();
        fields.insert("titulo".into(), json!("Amores Perros"));
        fields.insert("presupuesto".into(), json!(2_000_000));
        let mut source = SourceBackend::InMemory(InMemorySource::new(vec![Record::from_map(fields)]));

        let result = Seeder::new(&backend, &seed, true).run(&mut source).await;

        assert!(matches!(result, Err(SeedError::InvalidInput(_))));
        assert_eq!(engine.state.lock().await.bulk_calls, 0);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_k_records_in_means_k_counted() -> Result<(), SeedError> {
        let engine = InMemoryEngine::new();
        let backend = EngineBackend::InMemory(engine.clone());
        let seed = quick_seed(0);
        let records = MovieGenerator::new(Some(9), false)
            .records_for(["Relatos Salvajes", "El Secreto de sus Ojos", "Roma"].map(String::from))?;
        let mut source = SourceBackend::InMemory(InMemorySource::new(records));

        let report = Seeder::new(&backend, &seed, true).run(&mut source).await?;

        assert_eq!(report.accepted, 3);
        assert_eq!(report.document_count, 3);
        assert_eq!(engine.count("peliculas").await?, 3);
        Ok(())
    }
}
