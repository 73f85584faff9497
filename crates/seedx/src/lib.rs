//! 🎬 seedx: plant a movie catalogue in Elasticsearch so the dashboards have
//! something to look at.
//!
//! Make sure the index exists (exactly once, races included), roll a batch
//! of plausible movies or read their titles from a file, ship them in one
//! `_bulk` request, nap, count. 🦆

pub mod app_config;
pub mod common;
pub mod errors;
pub mod report;
pub mod schema;

mod engines;
mod loader;
mod pipeline;
mod provisioner;
mod sources;
mod verifier;

use anyhow::{Context, Result};
use tracing::info;

pub use crate::app_config::{AppConfig, SeedConfig};
pub use crate::common::{GeoPoint, Record};
pub use crate::engines::ElasticsearchConfig;
pub use crate::errors::SeedError;
pub use crate::loader::BulkBatch;
pub use crate::provisioner::ProvisionOutcome;
pub use crate::report::SeedReport;
pub use crate::verifier::CountCheck;

use crate::engines::EngineBackend;
use crate::pipeline::Seeder;
use crate::sources::SourceBackend;
use crate::sources::in_mem::InMemorySource;

/// 🚀 Seed with whatever source the config picks (title file, or dice).
pub async fn run(app_config: AppConfig) -> Result<SeedReport> {
    let source = SourceBackend::from_config(&app_config.seed);
    seed_with(&app_config, source).await
}

/// 🧪 Seed with records you already have. They still have to match the
/// movie schema (geo or not, per `seed.geo`).
pub async fn run_with_records(app_config: AppConfig, records: Vec<Record>) -> Result<SeedReport> {
    let source = SourceBackend::InMemory(InMemorySource::new(records));
    seed_with(&app_config, source).await
}

async fn seed_with(app_config: &AppConfig, mut source: SourceBackend) -> Result<SeedReport> {
    info!("📡 Target: {}", app_config.engine.base_url());
    let engine = EngineBackend::from_config(app_config)
        .await
        .context("💀 Could not get a working connection to the search engine")?;

    let report = Seeder::new(&engine, &app_config.seed, app_config.dry_run)
        .run(&mut source)
        .await
        .with_context(|| format!("💀 Seeding '{}' did not finish", app_config.seed.index_name))?;

    info!(
        "✅ Done: {} submitted, {} counted in '{}'",
        report.submitted, report.document_count, report.index
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dry_run_config() -> AppConfig {
        let mut app_config = AppConfig::default();
        app_config.dry_run = true;
        app_config.seed.settle_interval_ms = 0;
        app_config.seed.rng_seed = Some(1990);
        app_config
    }

    #[tokio::test]
    async fn the_one_where_a_dry_run_goes_all_the_way_through() -> Result<()> {
        let report = run(dry_run_config()).await?;
        assert!(report.dry_run);
        assert_eq!(report.provisioned, ProvisionOutcome::Created);
        assert_eq!(report.accepted, 200);
        assert_eq!(report.document_count, 200);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_handmade_records_must_still_look_like_movies() {
        let not_a_movie = Record::from_document(&serde_json::json!({"titulo": "Solo el título"}));
        let records = not_a_movie.map(|record| vec![record]).unwrap_or_default();

        let result = run_with_records(dry_run_config(), records).await;

        let err = result.err().map(|err| format!("{err:#}")).unwrap_or_default();
        assert!(err.contains("Seeding 'peliculas' did not finish"), "got: {err}");
    }

    #[tokio::test]
    async fn the_one_where_errors_keep_their_type_under_the_context() {
        let result = run_with_records(dry_run_config(), Vec::new()).await;
        let empty_source = result
            .err()
            .and_then(|err| err.downcast_ref::<SeedError>().map(|e| matches!(e, SeedError::EmptySource(_))));
        assert_eq!(empty_source, Some(true));
    }
}
