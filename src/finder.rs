use crate::core::error::FindError;
use crate::daemon::TorrentDaemon;
use crate::indexer::Indexer;
use crate::models::candidate::Candidate;
use crate::ranking::select_best;
use std::sync::Arc;
use tracing::{debug, info};

/// One-shot workflow: search the indexer, pick the best candidate and
/// hand it to the daemon
pub struct TorrentFinder {
    indexer: Arc<dyn Indexer>,
    daemon: Arc<dyn TorrentDaemon>,
}

impl TorrentFinder {
    pub fn new(indexer: Arc<dyn Indexer>, daemon: Arc<dyn TorrentDaemon>) -> Self {
        Self { indexer, daemon }
    }

    pub async fn find_candidates(
        &self,
        query: &str,
        categories: Option<&str>,
        debug: bool,
    ) -> Vec<Candidate> {
        let candidates = self.indexer.search(query, categories, debug).await;
        debug!(query, count = candidates.len(), "Finder received candidates");
        candidates
    }

    pub fn pick_best(candidates: &[Candidate]) -> Option<&Candidate> {
        select_best(candidates)
    }

    /// Search for `query` and submit the best match.
    ///
    /// Returns the submitted candidate.
    pub async fn find_and_submit(
        &self,
        query: &str,
        start: bool,
        download_dir: Option<&str>,
        debug: bool,
    ) -> Result<Candidate, FindError> {
        info!(query, "Searching indexer");
        let candidates = self.find_candidates(query, None, debug).await;

        let best = Self::pick_best(&candidates)
            .cloned()
            .ok_or_else(|| FindError::NoCandidates(query.to_string()))?;

        info!(
            title = best.display_title(),
            seeders = ?best.seeders,
            leechers = ?best.leechers,
            "Selected candidate"
        );
        debug!(magnet = %best.magnet, "Selected magnet");

        self.daemon.submit(&best.magnet, start, download_dir).await?;
        Ok(best)
    }
}
