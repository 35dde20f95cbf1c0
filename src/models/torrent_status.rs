/// Percent threshold at which a daemon torrent counts as finished
pub const COMPLETE_PERCENT: f64 = 99.9;

/// Snapshot of one torrent as reported by the download daemon
#[derive(Clone, Debug, PartialEq)]
pub struct DaemonTorrentStatus {
    pub torrent_id: Option<i64>,
    pub name: String,
    pub status: String,
    /// 0 to 100
    pub percent_done: f64,
    pub eta: Option<String>,
    pub magnet: Option<String>,
    /// Lowercase 40-char hex info-hash
    pub info_hash: Option<String>,
}

impl DaemonTorrentStatus {
    pub fn is_complete(&self) -> bool {
        self.percent_done >= COMPLETE_PERCENT
    }
}
