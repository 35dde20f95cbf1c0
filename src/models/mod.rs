pub mod candidate;
pub mod torrent_status;
pub mod tracked;
