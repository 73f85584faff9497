//! 🏗️ Index Provisioner: make sure the index exists, exactly once, without
//! locks and without drama.
//!
//! The dance is "exists?" then "create". Two provisioners can both hear
//! "absent" and both try to create. The loser gets `already exists` back from
//! the engine, and that is a success, not an error.
//!
//! ⚠️ An index that already exists is taken as-is. Its mapping is never
//! compared to ours. If someone created `peliculas` with `anio` as a keyword,
//! we will happily keep loading integers into it and the engine will have
//! opinions at bulk time, not here.

use serde::Serialize;
use tracing::{debug, info};

use crate::engines::{CreateIndexOutcome, SearchEngine};
use crate::errors::SeedError;
use crate::schema::IndexSchema;

/// 🏁 How the index came to exist (or was already existing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionOutcome {
    /// ✅ We created it with our schema.
    Created,
    /// 💤 It was already there. Nothing to do. Mapping untouched, unchecked.
    AlreadyPresent,
    /// 🏁 It was absent when we asked, present when we tried. Someone else won the race.
    CreatedConcurrently,
}

impl std::fmt::Display for ProvisionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ProvisionOutcome::Created => "created",
            ProvisionOutcome::AlreadyPresent => "already present",
            ProvisionOutcome::CreatedConcurrently => "created concurrently",
        };
        f.write_str(label)
    }
}

/// 🚀 Ensure `index` exists, creating it with `schema` if it does not.
///
/// Empty names and empty schemas are refused before any request goes out.
/// Unreachable engine → `Connectivity`. Mapping refused → `SchemaRejected`.
pub(crate) async fn ensure_index<E: SearchEngine + ?Sized>(
    engine: &E,
    index: &str,
    schema: &IndexSchema,
) -> Result<ProvisionOutcome, SeedError> {
    if index.trim().is_empty() {
        return Err(SeedError::invalid_input("index name must not be empty"));
    }
    if schema.is_empty() {
        return Err(SeedError::invalid_input(format!(
            "refusing to create '{index}' with an empty schema"
        )));
    }

    if engine.index_exists(index).await? {
        info!("💤 Index '{index}' already exists, leaving it (and its mapping) alone");
        return Ok(ProvisionOutcome::AlreadyPresent);
    }

    debug!("🏗️ Index '{index}' is absent, creating it with {} fields", schema.len());
    let outcome = match engine.create_index(index, &schema.to_mapping_body()).await? {
        CreateIndexOutcome::Created => ProvisionOutcome::Created,
        CreateIndexOutcome::AlreadyExists => ProvisionOutcome::CreatedConcurrently,
    };
    info!("✅ Index '{index}': {outcome}");
    Ok(outcome)
}
