pub mod sessions;
pub mod tracked_downloads;
