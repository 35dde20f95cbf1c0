pub mod eta;
pub mod transmission;

use crate::core::error::DispatchError;
use crate::models::torrent_status::DaemonTorrentStatus;
use async_trait::async_trait;

pub use transmission::TransmissionClient;

/// Download daemon that accepts magnets and reports torrent state
#[async_trait]
pub trait TorrentDaemon: Send + Sync {
    /// Queue a magnet. `download_dir` overrides the configured directory.
    async fn submit(
        &self,
        magnet: &str,
        start: bool,
        download_dir: Option<&str>,
    ) -> Result<(), DispatchError>;

    /// Current torrents, optionally only those still downloading
    async fn list_status(&self, active_only: bool) -> Result<Vec<DaemonTorrentStatus>, DispatchError>;

    async fn remove(&self, torrent_id: i64, delete_data: bool) -> Result<(), DispatchError>;
}
