//! 🚀 seedx-cli: the front door. Loads config, sets up logging, then lets the
//! library do the heavy lifting. Like a manager. 🦆
//!
//! 🎬 *[narrator voice]* "It all started with an empty index and a demo in
//! ten minutes..."

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use seedx::{AppConfig, CountCheck};

/// 🎬 Plant a movie catalogue in Elasticsearch. Creates the index if it is
/// missing, bulk-loads the movies, then counts them.
#[derive(Debug, Parser)]
#[command(name = "seedx", version, about)]
struct Args {
    /// 📜 TOML config file. Defaults to `seedx.toml` when it exists.
    config: Option<PathBuf>,

    /// 🎯 Target index name.
    #[arg(long)]
    index: Option<String>,

    /// 🎲 Number of synthetic movies (ignored with --titles).
    #[arg(long)]
    count: Option<usize>,

    /// 📂 File with one movie title per line.
    #[arg(long)]
    titles: Option<PathBuf>,

    /// 🌍 Add a city and a geo_point to every movie.
    #[arg(long)]
    geo: bool,

    /// 🎲 Seed for the dice, for reproducible catalogues.
    #[arg(long)]
    rng_seed: Option<u64>,

    /// 🔒 Fail unless the final count is exactly what we loaded on top of what was there.
    #[arg(long)]
    exact: bool,

    /// ⏳ Milliseconds to wait for the refresh before counting.
    #[arg(long)]
    settle_ms: Option<u64>,

    /// 🧪 Run against an in-memory engine. No cluster needed, none touched.
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    /// 🎛️ Flags beat files beat env. Only flags that were actually given count.
    fn apply(self, app_config: &mut AppConfig) {
        let seed = &mut app_config.seed;
        if let Some(index) = self.index {
            seed.index_name = index;
        }
        if let Some(count) = self.count {
            seed.record_count = count;
        }
        if let Some(titles) = self.titles {
            seed.title_file = Some(titles);
        }
        if self.geo {
            seed.geo = true;
        }
        if let Some(rng_seed) = self.rng_seed {
            seed.rng_seed = Some(rng_seed);
        }
        if self.exact {
            seed.count_check = CountCheck::Exact;
        }
        if let Some(settle_ms) = self.settle_ms {
            seed.settle_interval_ms = settle_ms;
        }
        if self.dry_run {
            app_config.dry_run = true;
        }
    }
}

// -- 🕵️ sniff the cause like a truffle pig hunting for connection problems
fn smells_like_connectivity(cause: &(dyn std::error::Error + 'static)) -> bool {
    if cause
        .downcast_ref::<seedx::SeedError>()
        .is_some_and(seedx::SeedError::is_connectivity)
    {
        return true;
    }
    let cause_str = cause.to_string();
    cause_str.contains("error sending request")
        || cause_str.contains("connection refused")
        || cause_str.contains("Connection refused")
        || cause_str.contains("tcp connect error")
        || cause_str.contains("dns error")
}

#[tokio::main]
async fn main() -> Result<()> {
    // 📡 RUST_LOG wins; otherwise `info`, which is chatty enough to follow along
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // 🔒 An explicit path must exist. The default one may politely not.
    let config_file = match &args.config {
        Some(path) => {
            let exists = path.try_exists().with_context(|| {
                format!("💀 Couldn't check whether '{}' exists. Permissions, maybe?", path.display())
            })?;
            if !exists {
                anyhow::bail!(
                    "💀 Configuration file '{}' does not exist. Relative paths are relative to the \
                     current directory, which may not be the one you think it is.",
                    path.display()
                );
            }
            Some(path.clone())
        }
        None => Some(PathBuf::from("seedx.toml")).filter(|path| path.is_file()),
    };

    let mut app_config = seedx::app_config::load_config(config_file.as_deref())
        .context("💀 In seedx-cli, we couldn't load the configuration. Check the file and the SEEDX_*/ES_* env vars.")?;
    args.apply(&mut app_config);

    match seedx::run(app_config).await {
        Ok(report) => {
            println!("{}", report.summary_table());
            Ok(())
        }
        Err(err) => {
            error!("💀 error: {}", err);
            // -- 🧅 peel the onion of sadness, one layer at a time
            let mut the_vibes_are_giving_connection_issues = false;
            for cause in err.chain().skip(1) {
                error!("⚠️  cause: {}", cause);
                the_vibes_are_giving_connection_issues |= smells_like_connectivity(cause);
            }

            if the_vibes_are_giving_connection_issues {
                error!(
                    "🔧 hint: Elasticsearch doesn't look reachable. Check ES_HOST/ES_PORT (or \
                     [engine] in the config), the credentials, and the CA certificate path. \
                     If you're using Docker, `docker ps` shows what's up and \
                     `docker compose up -d` resurrects it. ☕"
                );
            }

            std::process::exit(1);
        }
    }
}
