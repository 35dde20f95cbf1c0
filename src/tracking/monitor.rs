use crate::daemon::TorrentDaemon;
use crate::identity::{extract_info_hash, titles_match};
use crate::models::candidate::Candidate;
use crate::models::torrent_status::DaemonTorrentStatus;
use crate::models::tracked::TrackedDownload;
use crate::stores::tracked_downloads::TrackedDownloads;
use std::fmt::Display;
use std::future::Future;
use tracing::{debug, info, warn};

/// A tracked download the daemon reported as finished
#[derive(Clone, Debug, PartialEq)]
pub struct CompletedDownload {
    pub tracking_id: String,
    pub session_id: i64,
    pub status: DaemonTorrentStatus,
}

/// Reconciles user-requested downloads with what the daemon reports.
///
/// Each poll takes a snapshot of the tracked set, fetches daemon state
/// without holding any lock, matches every tracked entry against the
/// statuses and retires the ones that completed. An entry is retired in
/// exactly one poll: the first that observes a completed match.
pub struct DownloadMonitor {
    tracked: TrackedDownloads,
}

fn new_tracking_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

/// Hash reported by the daemon, or the one carried by its magnet
fn status_hash(status: &DaemonTorrentStatus) -> Option<String> {
    status
        .info_hash
        .clone()
        .or_else(|| status.magnet.as_deref().and_then(extract_info_hash))
}

/// Find the daemon status for a tracked download.
///
/// Rules are tried in order over the whole list: info-hash, exact magnet,
/// then title. The title rule never accepts a status whose hash is known
/// and differs from the tracked hash.
pub fn match_status<'a>(
    statuses: &'a [DaemonTorrentStatus],
    tracked: &TrackedDownload,
) -> Option<&'a DaemonTorrentStatus> {
    let hashes: Vec<Option<String>> = statuses.iter().map(status_hash).collect();
    let candidates = || statuses.iter().zip(hashes.iter());

    if let Some(tracked_hash) = tracked.info_hash.as_deref() {
        let by_hash = candidates().find(|(_, hash)| hash.as_deref() == Some(tracked_hash));
        if let Some((status, _)) = by_hash {
            return Some(status);
        }
    }

    if !tracked.magnet.is_empty() {
        let by_magnet = statuses
            .iter()
            .find(|status| status.magnet.as_deref() == Some(tracked.magnet.as_str()));
        if by_magnet.is_some() {
            return by_magnet;
        }
    }

    if tracked.title.is_empty() {
        return None;
    }

    // Stricter than a plain title rule: two known hashes that differ never
    // name the same torrent, however close the titles are
    candidates()
        .filter(|(_, hash)| match (tracked.info_hash.as_deref(), hash.as_deref()) {
            (Some(ours), Some(theirs)) => ours == theirs,
            _ => true,
        })
        .find(|(status, _)| titles_match(&tracked.title, &status.name))
        .map(|(status, _)| status)
}

impl DownloadMonitor {
    pub fn new() -> Self {
        Self {
            tracked: TrackedDownloads::new(),
        }
    }

    /// Start tracking a download requested by `session_id`
    pub fn track(&self, session_id: i64, candidate: &Candidate) -> String {
        let tracking_id = new_tracking_id();
        let info_hash = extract_info_hash(&candidate.magnet);

        info!(
            tracking_id = %tracking_id,
            session_id,
            title = candidate.display_title(),
            info_hash = ?info_hash,
            "Tracking download"
        );

        self.tracked.insert(TrackedDownload {
            tracking_id: tracking_id.clone(),
            session_id,
            title: candidate.title.clone().unwrap_or_default(),
            magnet: candidate.magnet.clone(),
            info_hash,
        });

        tracking_id
    }

    /// Run one reconciliation cycle with the given status source.
    ///
    /// Fetch failures are logged and leave the tracked set untouched.
    pub async fn poll<F, Fut, E>(&self, fetch: F) -> Vec<CompletedDownload>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<DaemonTorrentStatus>, E>>,
        E: Display,
    {
        let snapshot = self.tracked.snapshot();
        if snapshot.is_empty() {
            return Vec::new();
        }

        let statuses = match fetch().await {
            Ok(statuses) => statuses,
            Err(e) => {
                warn!(error = %e, tracked = snapshot.len(), "Download status poll failed");
                return Vec::new();
            }
        };

        let completed: Vec<CompletedDownload> = snapshot
            .into_iter()
            .filter_map(|tracked| {
                let status = match_status(&statuses, &tracked)?;
                status.is_complete().then(|| CompletedDownload {
                    tracking_id: tracked.tracking_id,
                    session_id: tracked.session_id,
                    status: status.clone(),
                })
            })
            .collect();

        if completed.is_empty() {
            debug!(statuses = statuses.len(), "No tracked downloads completed");
            return completed;
        }

        let removed = self
            .tracked
            .remove_all(completed.iter().map(|done| done.tracking_id.as_str()));

        // A concurrent poll may have retired some of these already
        let completed: Vec<CompletedDownload> = completed
            .into_iter()
            .filter(|done| removed.contains(&done.tracking_id))
            .collect();
        info!(completed = completed.len(), "Tracked downloads completed");

        completed
    }

    /// Poll the daemon for every torrent, active or not
    pub async fn poll_daemon(&self, daemon: &dyn TorrentDaemon) -> Vec<CompletedDownload> {
        self.poll(|| daemon.list_status(false)).await
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_tracking(&self, tracking_id: &str) -> bool {
        self.tracked.contains(tracking_id)
    }
}

impl Default for DownloadMonitor {
    fn default() -> Self {
        Self::new()
    }
}
