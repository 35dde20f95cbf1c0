use crate::models::candidate::Candidate;
use std::cmp::Ordering;
use tracing::debug;

/// Sort key for candidates, compared lexicographically (higher is better)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankingKey {
    pub seeders: u64,
    /// seeders / (leechers + 1)
    pub ratio: f64,
    /// 1 when the indexer reported seeders or leechers
    pub has_counts: u8,
}

impl Eq for RankingKey {}

impl Ord for RankingKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.seeders
            .cmp(&other.seeders)
            .then_with(|| self.ratio.total_cmp(&other.ratio))
            .then_with(|| self.has_counts.cmp(&other.has_counts))
    }
}

impl PartialOrd for RankingKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub fn ranking_key(candidate: &Candidate) -> RankingKey {
    let seeders = candidate.seeders.unwrap_or(0);
    let leechers = candidate.leechers.unwrap_or(0);
    let has_counts = candidate.seeders.is_some() || candidate.leechers.is_some();

    RankingKey {
        seeders,
        ratio: seeders as f64 / (leechers as f64 + 1.0),
        has_counts: u8::from(has_counts),
    }
}

/// Pick the highest ranked candidate.
///
/// On equal keys the earliest candidate wins.
pub fn select_best(candidates: &[Candidate]) -> Option<&Candidate> {
    let mut best: Option<(&Candidate, RankingKey)> = None;

    for candidate in candidates {
        let key = ranking_key(candidate);
        match best {
            Some((_, best_key)) if key <= best_key => {}
            _ => best = Some((candidate, key)),
        }
    }

    let (best, _) = best?;
    debug!(
        title = best.display_title(),
        seeders = ?best.seeders,
        leechers = ?best.leechers,
        "Best candidate selected"
    );
    Some(best)
}

/// Order candidates best first. Stable: equal keys keep their input order.
pub fn sort_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut keyed: Vec<(RankingKey, Candidate)> = candidates
        .into_iter()
        .map(|candidate| (ranking_key(&candidate), candidate))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| b.cmp(a));

    keyed.into_iter().map(|(_, candidate)| candidate).collect()
}
