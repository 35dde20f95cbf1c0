pub mod policy;

pub use policy::{ranking_key, select_best, sort_candidates, RankingKey};
