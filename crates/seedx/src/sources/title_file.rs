//! 📂 Titles from a file, one per line, everything else from the dice.
//!
//! Lines are trimmed. Blank lines are skipped. A file that yields zero titles
//! is an `EmptySource` error, raised before anything touches the engine.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::common::Record;
use crate::errors::SeedError;
use crate::sources::RecordSource;
use crate::sources::movies::MovieGenerator;

#[derive(Debug)]
pub(crate) struct TitleFileSource {
    path: PathBuf,
    generator: MovieGenerator,
}

impl TitleFileSource {
    pub(crate) fn new(path: PathBuf, geo: bool, rng_seed: Option<u64>) -> Self {
        Self {
            path,
            generator: MovieGenerator::new(rng_seed, geo),
        }
    }
}

// -- one usable title per non-blank line
pub(crate) fn usable_titles(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl RecordSource for TitleFileSource {
    async fn records(&mut self) -> Result<Vec<Record>, SeedError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SeedError::SourceUnreadable {
                path: self.path.clone(),
                source,
            })?;
        let titles = usable_titles(&contents);
        if titles.is_empty() {
            return Err(SeedError::empty_source(format!(
                "'{}' has no usable titles (every line was blank)",
                self.path.display()
            )));
        }
        info!("📂 Loaded {} titles from {}", titles.len(), self.path.display());
        let records = self.generator.records_for(titles)?;
        debug!("🎲 Dressed up {} titled movies", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn title_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new()
            .expect("💀 the temp dir said 'new phone who dis'");
        file.write_all(contents.as_bytes())
            .expect("💀 could not write the title fixture");
        file
    }

    #[test]
    fn the_one_where_blank_lines_and_whitespace_are_ignored() {
        let titles = usable_titles("  Nueve Reinas \n\n\t\nAmores Perros\r\n   \n");
        assert_eq!(titles, vec!["Nueve Reinas", "Amores Perros"]);
    }

    #[tokio::test]
    async fn the_one_where_each_title_becomes_one_movie() -> Result<(), SeedError> {
        let file = title_file("El Laberinto del Fauno\n\nRoma\nCoco\n");
        let mut source = TitleFileSource::new(file.path().to_path_buf(), true, Some(11));
        let records = source.records().await?;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].get("titulo"), Some(&json!("El Laberinto del Fauno")));
        assert_eq!(records[2].get("titulo"), Some(&json!("Coco")));
        assert!(records.iter().all(|r| r.get("ubicacion").is_some()));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_file_of_only_blank_lines_is_empty() {
        let file = title_file("\n   \n\t\n");
        let mut source = TitleFileSource::new(file.path().to_path_buf(), false, None);
        assert!(matches!(source.records().await, Err(SeedError::EmptySource(_))));
    }

    #[tokio::test]
    async fn the_one_where_the_file_is_not_there_at_all() {
        let mut source =
            TitleFileSource::new(PathBuf::from("/definitely/not/here/titulos.txt"), false, None);
        assert!(matches!(
            source.records().await,
            Err(SeedError::SourceUnreadable { .. })
        ));
    }
}
