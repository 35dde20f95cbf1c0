pub mod bot;
pub mod core;
pub mod daemon;
pub mod finder;
pub mod identity;
pub mod indexer;
pub mod models;
pub mod ranking;
pub mod stores;
pub mod tracking;
