//! 🧪 A source that hands back exactly what it was given. No dice allowed.

use async_trait::async_trait;

use crate::common::Record;
use crate::errors::SeedError;
use crate::sources::RecordSource;

#[derive(Debug, Default)]
pub(crate) struct InMemorySource {
    records: Vec<Record>,
}

impl InMemorySource {
    pub(crate) fn new(records: Vec<Record>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl RecordSource for InMemorySource {
    /// 📦 Ownership moves out. A second call finds the cupboard bare.
    async fn records(&mut self) -> Result<Vec<Record>, SeedError> {
        if self.records.is_empty() {
            return Err(SeedError::empty_source("in-memory source holds no records"));
        }
        Ok(std::mem::take(&mut self.records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    #[tokio::test]
    async fn the_one_where_records_are_handed_over_exactly_once() -> Result<(), SeedError> {
        let mut fields = Map::new();
        fields.insert("titulo".into(), json!("Relatos Salvajes"));
        let mut source = InMemorySource::new(vec![Record::from_map(fields)]);

        assert_eq!(source.records().await?.len(), 1);
        assert!(matches!(source.records().await, Err(SeedError::EmptySource(_))));
        Ok(())
    }
}
