// Application state (AppState)

use crate::core::config::Config;
use crate::daemon::TorrentDaemon;
use crate::indexer::Indexer;
use crate::stores::sessions::UserSessions;
use crate::tracking::DownloadMonitor;
use std::sync::Arc;

/// Shared application state
///
/// Adapters are trait objects so the bot and finder can be driven by
/// in-process fakes. Every field is an `Arc` for cheap cloning into tasks.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    /// Torrent search backend
    pub indexer: Arc<dyn Indexer>,

    /// Download daemon
    pub daemon: Arc<dyn TorrentDaemon>,

    /// Downloads waiting for completion notices
    pub monitor: Arc<DownloadMonitor>,

    /// Per-chat bot sessions
    pub sessions: Arc<UserSessions>,
}

impl AppState {
    pub fn new(config: Config, indexer: Arc<dyn Indexer>, daemon: Arc<dyn TorrentDaemon>) -> Self {
        Self {
            config: Arc::new(config),
            indexer,
            daemon,
            monitor: Arc::new(DownloadMonitor::new()),
            sessions: Arc::new(UserSessions::new()),
        }
    }
}
