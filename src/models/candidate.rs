/// A single torrent returned by the indexer
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    /// Magnet URI, never empty
    pub magnet: String,
    pub title: Option<String>,
    pub seeders: Option<u64>,
    /// Leechers, or peers when the indexer only reports that
    pub leechers: Option<u64>,
    pub size_bytes: Option<u64>,
    /// Indexer or feed the candidate came from
    pub source: String,
}

pub const DEFAULT_SOURCE: &str = "torznab";

impl Candidate {
    pub fn new(magnet: impl Into<String>) -> Self {
        Self {
            magnet: magnet.into(),
            title: None,
            seeders: None,
            leechers: None,
            size_bytes: None,
            source: DEFAULT_SOURCE.to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_counts(mut self, seeders: Option<u64>, leechers: Option<u64>) -> Self {
        self.seeders = seeders;
        self.leechers = leechers;
        self
    }

    pub fn with_size(mut self, size_bytes: Option<u64>) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    /// Title for display, `(untitled)` when the indexer gave none
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(untitled)")
    }
}
