pub mod categories;
pub mod feed;
pub mod torznab;

use crate::models::candidate::Candidate;
use async_trait::async_trait;

pub use categories::{extract_preset_from_query, CategoryPreset, PresetQuery};
pub use torznab::TorznabClient;

/// Source of torrent candidates.
///
/// `categories` semantics: `None` uses the configured default filter,
/// `Some("")` disables category filtering, anything else is a comma
/// separated list of Torznab category ids.
///
/// Searching never fails. Transport and parse problems are logged and an
/// empty list is returned.
#[async_trait]
pub trait Indexer: Send + Sync {
    async fn search(&self, query: &str, categories: Option<&str>, debug: bool) -> Vec<Candidate>;
}
