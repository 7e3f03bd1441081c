//! Deterministic in-memory catalog fixture for tests and offline batch runs
//! (spec.md §6 `InMemoryCatalogGateway`): a fixed, known answer set so
//! pipeline tests don't depend on network access.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::catalog::CatalogGateway;
use crate::error::EngineError;
use crate::model::CatalogEntry;

#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogGateway {
    entries: Vec<CatalogEntry>,
}

impl InMemoryCatalogGateway {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        InMemoryCatalogGateway { entries }
    }

    fn by_id(&self) -> HashMap<u64, &CatalogEntry> {
        self.entries.iter().map(|e| (e.fdc_id, e)).collect()
    }
}

#[async_trait]
impl CatalogGateway for InMemoryCatalogGateway {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogEntry>, EngineError> {
        let query = query.trim().to_lowercase();
        let tokens: Vec<&str> = query.split_whitespace().collect();
        let mut matches: Vec<CatalogEntry> = self
            .entries
            .iter()
            .filter(|entry| {
                let name = entry.name.to_lowercase();
                tokens.iter().any(|t| name.contains(t))
            })
            .cloned()
            .collect();
        matches.truncate(limit);
        Ok(matches)
    }

    async fn fetch_by_id(&self, fdc_id: u64) -> Result<Option<CatalogEntry>, EngineError> {
        Ok(self.by_id().get(&fdc_id).map(|e| (*e).clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntryForm, Source};

    fn entry(fdc_id: u64, name: &str) -> CatalogEntry {
        CatalogEntry {
            fdc_id,
            name: name.to_string(),
            source: Source::Foundation,
            form: EntryForm::Raw,
            kcal_100g: 100.0,
            protein_100g: Some(10.0),
            carbs_100g: Some(5.0),
            fat_100g: Some(2.0),
            sodium_mg_100g: Some(50.0),
            sugar_g_100g: Some(1.0),
            ingredients: Vec::new(),
        }
    }

    #[tokio::test]
    async fn search_matches_on_token_overlap() {
        let gateway = InMemoryCatalogGateway::new(vec![
            entry(1, "Chicken, breast, raw"),
            entry(2, "Grapes, raw"),
        ]);
        let results = gateway.search("chicken breast raw", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].fdc_id, 1);
    }

    #[tokio::test]
    async fn fetch_by_id_returns_none_for_unknown() {
        let gateway = InMemoryCatalogGateway::new(vec![entry(1, "Grapes, raw")]);
        assert!(gateway.fetch_by_id(999).await.unwrap().is_none());
        assert!(gateway.fetch_by_id(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn respects_limit() {
        let gateway = InMemoryCatalogGateway::new(vec![
            entry(1, "Grapes raw red"),
            entry(2, "Grapes raw green"),
            entry(3, "Grapes raw seedless"),
        ]);
        let results = gateway.search("grapes raw", 2).await.unwrap();
        assert_eq!(results.len(), 2);
    }
}
