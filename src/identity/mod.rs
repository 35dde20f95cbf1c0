pub mod magnet;
pub mod title;

pub use magnet::extract_info_hash;
pub use title::{normalize_title, titles_match};
