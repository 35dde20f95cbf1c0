use crate::models::tracked::TrackedDownload;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-memory set of downloads awaiting completion.
///
/// One mutex guards the map. Every method holds it only for the map
/// operation itself, so callers can never keep it across an `.await`.
pub struct TrackedDownloads {
    downloads: Mutex<HashMap<String, TrackedDownload>>,
}

impl TrackedDownloads {
    pub fn new() -> Self {
        Self {
            downloads: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TrackedDownload>> {
        self.downloads.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a download, replacing any entry with the same tracking id
    pub fn insert(&self, download: TrackedDownload) {
        self.lock().insert(download.tracking_id.clone(), download);
    }

    /// Point-in-time copy of every tracked download
    pub fn snapshot(&self) -> Vec<TrackedDownload> {
        self.lock().values().cloned().collect()
    }

    /// Remove the given ids and return the ones that were actually present.
    ///
    /// Removal happens under one lock, so when callers race on the same id
    /// exactly one of them gets it back.
    pub fn remove_all<'a>(&self, tracking_ids: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
        let mut downloads = self.lock();
        tracking_ids
            .into_iter()
            .filter_map(|id| downloads.remove_entry(id).map(|(id, _)| id))
            .collect()
    }

    pub fn contains(&self, tracking_id: &str) -> bool {
        self.lock().contains_key(tracking_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }
}

impl Default for TrackedDownloads {
    fn default() -> Self {
        Self::new()
    }
}
