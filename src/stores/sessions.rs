use crate::models::candidate::Candidate;
use crate::models::torrent_status::DaemonTorrentStatus;
use dashmap::DashMap;

/// Last search shown to a chat, kept in ranked order for paging
#[derive(Clone, Debug)]
pub struct PendingSearch {
    pub query: String,
    pub preset: Option<&'static str>,
    pub candidates: Vec<Candidate>,
    pub page: usize,
}

impl PendingSearch {
    pub fn page_count(&self, page_size: usize) -> usize {
        let page_size = page_size.max(1);
        self.candidates.len().div_ceil(page_size).max(1)
    }

    /// Items on the current page with their 1-based positions in the full list
    pub fn page_items(&self, page_size: usize) -> Vec<(usize, &Candidate)> {
        let page_size = page_size.max(1);
        self.candidates
            .iter()
            .enumerate()
            .skip(self.page * page_size)
            .take(page_size)
            .map(|(idx, candidate)| (idx + 1, candidate))
            .collect()
    }
}

#[derive(Clone, Debug, Default)]
struct ChatSession {
    search: Option<PendingSearch>,
    download_choice: Option<Candidate>,
    removal_choices: Vec<DaemonTorrentStatus>,
}

/// Per-chat state for the bot, keyed by chat id
pub struct UserSessions {
    sessions: DashMap<i64, ChatSession>,
}

impl UserSessions {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn save_search(
        &self,
        chat_id: i64,
        query: String,
        preset: Option<&'static str>,
        candidates: Vec<Candidate>,
    ) {
        let mut session = self.sessions.entry(chat_id).or_default();
        session.search = Some(PendingSearch {
            query,
            preset,
            candidates,
            page: 0,
        });
        session.download_choice = None;
    }

    pub fn get_search(&self, chat_id: i64) -> Option<PendingSearch> {
        self.sessions
            .get(&chat_id)
            .and_then(|session| session.search.clone())
    }

    /// Move the pending search by `delta` pages, clamped to the valid range.
    /// Returns the updated search, or `None` without an active search.
    pub fn turn_page(&self, chat_id: i64, delta: isize, page_size: usize) -> Option<PendingSearch> {
        let mut session = self.sessions.get_mut(&chat_id)?;
        let search = session.search.as_mut()?;

        let last_page = search.page_count(page_size) - 1;
        let target = search.page.saturating_add_signed(delta).min(last_page);
        search.page = target;

        Some(search.clone())
    }

    pub fn clear_search(&self, chat_id: i64) {
        if let Some(mut session) = self.sessions.get_mut(&chat_id) {
            session.search = None;
        }
    }

    pub fn remember_download_choice(&self, chat_id: i64, candidate: Candidate) {
        self.sessions.entry(chat_id).or_default().download_choice = Some(candidate);
    }

    pub fn pop_download_choice(&self, chat_id: i64) -> Option<Candidate> {
        self.sessions
            .get_mut(&chat_id)
            .and_then(|mut session| session.download_choice.take())
    }

    pub fn has_download_choice(&self, chat_id: i64) -> bool {
        self.sessions
            .get(&chat_id)
            .is_some_and(|session| session.download_choice.is_some())
    }

    pub fn remember_removal_choices(&self, chat_id: i64, choices: Vec<DaemonTorrentStatus>) {
        self.sessions.entry(chat_id).or_default().removal_choices = choices;
    }

    pub fn take_removal_choices(&self, chat_id: i64) -> Vec<DaemonTorrentStatus> {
        self.sessions
            .get_mut(&chat_id)
            .map(|mut session| std::mem::take(&mut session.removal_choices))
            .unwrap_or_default()
    }

    /// Forget everything pending for a chat
    pub fn reset(&self, chat_id: i64) {
        self.sessions.remove(&chat_id);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for UserSessions {
    fn default() -> Self {
        Self::new()
    }
}
