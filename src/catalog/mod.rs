//! Catalog access boundary (spec.md §2.3/§6).
//!
//! `CatalogGateway` plays the role a `Provider` enum plays for chat
//! completions: one trait object hides network plumbing from the rest of
//! the engine, so the pipeline stages call `search`/`fetch_by_id` against
//! an abstract catalog and never touch `reqwest` directly.

mod http;
mod in_memory;

pub use http::HttpCatalogGateway;
pub use in_memory::InMemoryCatalogGateway;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::model::CatalogEntry;

/// Abstraction over "a thing that can search a food catalog by name".
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogEntry>, EngineError>;

    async fn fetch_by_id(&self, fdc_id: u64) -> Result<Option<CatalogEntry>, EngineError>;

    /// Re-establish the underlying connection after a transient failure.
    /// No-op for in-memory fixtures.
    async fn reconnect(&self) -> Result<(), EngineError> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }
}
