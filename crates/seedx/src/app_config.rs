//! 🔧 App Configuration: where the knobs live and who gets to turn them.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." -- every developer at 3am 🦆
//!
//! 🏗️ Figment stacks three layers, later ones winning:
//!   1. the old bare env vars the docker-compose setup already exports
//!      (`ES_HOST`, `ES_PORT`, `ELASTIC_USER`, `ELASTIC_PASSWORD`, `CA_CERT_PATH`, `TITLES_FILE`)
//!   2. `SEEDX_*` env vars, nested with `__` (`SEEDX_SEED__RECORD_COUNT=50`)
//!   3. an optional TOML file
//!
//! The CLI then stomps on individual values with its flags. Everything has a
//! default, so an empty environment still seeds 200 movies into `peliculas`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
    value::{Uncased, UncasedStr},
};
use serde::Deserialize;
use tracing::info;

use crate::engines::ElasticsearchConfig;
use crate::verifier::CountCheck;

/// 📦 One struct to rule them all, one struct to find them,
/// one struct to bring them all, and in the Figment bind them.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// 📡 Where the cluster is and how to prove we are allowed in.
    #[serde(default)]
    pub engine: ElasticsearchConfig,
    /// 🎬 What to seed, how much of it, and how picky to be afterwards.
    #[serde(default)]
    pub seed: SeedConfig,
    /// 🧪 Run everything against the in-memory engine. No cluster required.
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    #[serde(default = "default_index_name")]
    pub index_name: String,
    /// 🎲 How many synthetic movies to roll. Ignored when `title_file` is set.
    #[serde(default = "default_record_count")]
    pub record_count: usize,
    /// 📂 One title per line. When set, the file decides how many movies there are.
    #[serde(default)]
    pub title_file: Option<PathBuf>,
    /// 🌍 Add `ciudad` + `ubicacion` to the schema and to every record.
    #[serde(default)]
    pub geo: bool,
    /// 🎲 Fix the dice. Same seed, same catalogue.
    #[serde(default)]
    pub rng_seed: Option<u64>,
    /// ⏳ Nap between the bulk insert and the count, so the refresh can catch up.
    #[serde(default = "default_settle_interval_ms")]
    pub settle_interval_ms: u64,
    #[serde(default)]
    pub count_check: CountCheck,
}

fn default_index_name() -> String {
    "peliculas".to_string()
}

fn default_record_count() -> usize {
    200
}

fn default_settle_interval_ms() -> u64 {
    1_000
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            index_name: default_index_name(),
            record_count: default_record_count(),
            title_file: None,
            geo: false,
            rng_seed: None,
            settle_interval_ms: default_settle_interval_ms(),
            count_check: CountCheck::default(),
        }
    }
}

// 🗺️ bare env var → dotted config path. these names predate us and are not ours to rename.
const LEGACY_ENV_VARS: [(&str, &str); 6] = [
    ("ES_HOST", "engine.host"),
    ("ES_PORT", "engine.port"),
    ("ELASTIC_USER", "engine.username"),
    ("ELASTIC_PASSWORD", "engine.password"),
    ("CA_CERT_PATH", "engine.ca_cert_path"),
    ("TITLES_FILE", "seed.title_file"),
];

fn legacy_env_key(key: &UncasedStr) -> Uncased<'_> {
    LEGACY_ENV_VARS
        .iter()
        .find(|(env_var, _)| key == *env_var)
        .map(|(_, path)| Uncased::from(*path))
        .unwrap_or_else(|| key.into())
}

/// 🚀 Load the config: legacy env, then `SEEDX_*` env, then the TOML file if given.
///
/// 📐 `None` means env vars and defaults only. We do not go hunting for a file
/// nobody asked for.
///
/// 💀 Unparseable values come back as an error that names the file (or
/// admits there wasn't one).
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let legacy_env_var_names: Vec<&str> = LEGACY_ENV_VARS.iter().map(|(env_var, _)| *env_var).collect();
    let config = Figment::new()
        .merge(Env::raw().only(&legacy_env_var_names).map(legacy_env_key))
        .merge(Env::prefixed("SEEDX_").split("__"));

    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables \
             (SEEDX_*, ES_*, ELASTIC_*). The file exists in our hearts, but apparently not on disk.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (SEEDX_*, ES_*, ELASTIC_*). \
                 No file was provided, this one's all on the environment. Classic."
            .to_string(),
    };

    config.extract().context(context_msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn load(jail_file: Option<&str>) -> figment::Result<AppConfig> {
        load_config(jail_file.map(Path::new)).map_err(|e| format!("{e:#}").into())
    }

    #[test]
    fn the_one_where_the_defaults_match_the_compose_file() {
        let app_config = AppConfig::default();
        assert_eq!(app_config.engine.base_url(), "https://es01:9200");
        assert_eq!(app_config.engine.username.as_deref(), Some("elastic"));
        assert_eq!(app_config.seed.index_name, "peliculas");
        assert_eq!(app_config.seed.record_count, 200);
        assert_eq!(app_config.seed.settle_interval_ms, 1_000);
        assert_eq!(app_config.seed.count_check, CountCheck::Informational);
        assert!(!app_config.seed.geo);
        assert!(!app_config.dry_run);
    }

    #[test]
    fn the_one_where_the_old_env_vars_still_get_a_seat_at_the_table() {
        Jail::expect_with(|jail| {
            jail.set_env("ES_HOST", "localhost");
            jail.set_env("ES_PORT", "9201");
            jail.set_env("ELASTIC_USER", "seeder");
            jail.set_env("ELASTIC_PASSWORD", "hunter2");
            jail.set_env("CA_CERT_PATH", "/tmp/ca.crt");
            jail.set_env("TITLES_FILE", "titulos.txt");

            let app_config = load(None)?;
            assert_eq!(app_config.engine.host, "localhost");
            assert_eq!(app_config.engine.port, 9201);
            assert_eq!(app_config.engine.username.as_deref(), Some("seeder"));
            assert_eq!(app_config.engine.password.as_deref(), Some("hunter2"));
            assert_eq!(app_config.engine.ca_cert_path, Some(PathBuf::from("/tmp/ca.crt")));
            assert_eq!(app_config.seed.title_file, Some(PathBuf::from("titulos.txt")));
            Ok(())
        });
    }

    #[test]
    fn the_one_where_prefixed_env_vars_reach_nested_sections() {
        Jail::expect_with(|jail| {
            jail.set_env("SEEDX_DRY_RUN", "true");
            jail.set_env("SEEDX_SEED__RECORD_COUNT", "50");
            jail.set_env("SEEDX_SEED__GEO", "true");
            jail.set_env("SEEDX_SEED__COUNT_CHECK", "exact");
            jail.set_env("SEEDX_ENGINE__URL", "http://localhost:9200");

            let app_config = load(None)?;
            assert!(app_config.dry_run);
            assert_eq!(app_config.seed.record_count, 50);
            assert!(app_config.seed.geo);
            assert_eq!(app_config.seed.count_check, CountCheck::Exact);
            assert_eq!(app_config.engine.base_url(), "http://localhost:9200");
            Ok(())
        });
    }

    #[test]
    fn the_one_where_the_toml_file_has_the_last_word() {
        Jail::expect_with(|jail| {
            jail.set_env("ES_HOST", "env-host");
            jail.set_env("SEEDX_SEED__INDEX_NAME", "from_env");
            jail.set_env("SEEDX_SEED__RNG_SEED", "7");
            jail.create_file(
                "seedx.toml",
                r#"
                [engine]
                host = "file-host"
                api_key = "c2VjcmV0"

                [seed]
                index_name = "from_file"
                settle_interval_ms = 0
                "#,
            )?;

            let app_config = load(Some("seedx.toml"))?;
            assert_eq!(app_config.engine.host, "file-host");
            assert_eq!(app_config.engine.api_key.as_deref(), Some("c2VjcmV0"));
            assert_eq!(app_config.seed.index_name, "from_file");
            assert_eq!(app_config.seed.settle_interval_ms, 0);
            // -- untouched by the file, so the env var survives
            assert_eq!(app_config.seed.rng_seed, Some(7));
            Ok(())
        });
    }

    #[test]
    fn the_one_where_a_bad_value_names_its_crime_scene() {
        Jail::expect_with(|jail| {
            jail.create_file("seedx.toml", "[seed]\nrecord_count = \"lots\"\n")?;
            let err = load_config(Some(Path::new("seedx.toml")))
                .err()
                .ok_or_else(|| "💀 'lots' is not a number, but the config loaded anyway".to_string())?;
            assert!(format!("{err:#}").contains("seedx.toml"));
            Ok(())
        });
    }
}
