use crate::identity::normalize_title;
use crate::models::torrent_status::DaemonTorrentStatus;

/// Result of resolving a removal request against the daemon's torrents
#[derive(Clone, Debug, PartialEq)]
pub enum RemovalMatch {
    NotFound,
    Unique(DaemonTorrentStatus),
    /// Several torrents fit; the user has to pick one
    Ambiguous(Vec<DaemonTorrentStatus>),
}

/// What the user asked to remove
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemovalTarget {
    Id(i64),
    Name(String),
}

impl RemovalTarget {
    /// `#12` targets a torrent id, anything else is a name
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.strip_prefix('#').map(|id| id.trim().parse::<i64>()) {
            Some(Ok(id)) => Some(RemovalTarget::Id(id)),
            _ => Some(RemovalTarget::Name(raw.to_string())),
        }
    }
}

/// Resolve a removal target.
///
/// Ids match exactly. Names match on normalized titles: a single exact
/// match wins outright, otherwise exact and partial matches are pooled and
/// the pool decides between unique and ambiguous.
pub fn find_removal_target(statuses: &[DaemonTorrentStatus], target: &RemovalTarget) -> RemovalMatch {
    let pool: Vec<DaemonTorrentStatus> = match target {
        RemovalTarget::Id(id) => statuses
            .iter()
            .filter(|status| status.torrent_id == Some(*id))
            .cloned()
            .collect(),
        RemovalTarget::Name(name) => {
            let wanted = normalize_title(name);
            if wanted.is_empty() {
                return RemovalMatch::NotFound;
            }

            let (exact, partial): (Vec<_>, Vec<_>) = statuses
                .iter()
                .map(|status| (status, normalize_title(&status.name)))
                .filter(|(_, have)| !have.is_empty() && have.contains(&wanted))
                .partition(|(_, have)| *have == wanted);

            if exact.len() == 1 {
                return RemovalMatch::Unique(exact[0].0.clone());
            }
            exact
                .into_iter()
                .chain(partial)
                .map(|(status, _)| status.clone())
                .collect()
        }
    };

    match pool.len() {
        0 => RemovalMatch::NotFound,
        1 => pool.into_iter().next().map_or(RemovalMatch::NotFound, RemovalMatch::Unique),
        _ => RemovalMatch::Ambiguous(pool),
    }
}
