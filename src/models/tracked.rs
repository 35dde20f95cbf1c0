/// A download the user asked for and is waiting to hear about
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedDownload {
    pub tracking_id: String,
    /// Chat that requested the download
    pub session_id: i64,
    pub title: String,
    pub magnet: String,
    /// Normalized info-hash, computed once at tracking time
    pub info_hash: Option<String>,
}
