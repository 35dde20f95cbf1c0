use super::messages::{MessageFactory, HELP_TEXT, WELCOME_TEXT};
use super::removal::{find_removal_target, RemovalMatch, RemovalTarget};
use super::transport::{ChatTransport, ChatUpdate, UpdateKind};
use crate::core::config::DownloadDirOption;
use crate::core::state::AppState;
use crate::daemon::TorrentDaemon;
use crate::indexer::categories::preset_by_slug;
use crate::indexer::{extract_preset_from_query, Indexer};
use crate::models::candidate::Candidate;
use crate::ranking::sort_candidates;
use crate::stores::sessions::{PendingSearch, UserSessions};
use crate::tracking::DownloadMonitor;
use std::sync::Arc;
use tracing::{debug, info, warn};

const SELECTION_PREFIX: &str = "pick:";
const DIR_SELECTION_PREFIX: &str = "dir:";
const PAGE_PREFIX: &str = "page:";

/// A parsed chat message or button payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Search(String),
    Status { active_only: bool },
    NextPage,
    PrevPage,
    Select(usize),
    Directory(usize),
    Remove(Option<RemovalTarget>),
    Cancel,
    Unknown,
}

impl Command {
    pub fn parse_text(text: &str) -> Self {
        let text = text.trim();
        if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
            return text.parse().map_or(Command::Unknown, Command::Select);
        }

        let (head, rest) = text
            .split_once(char::is_whitespace)
            .map_or((text, ""), |(head, rest)| (head, rest.trim()));
        // "/status@my_bot" and "status" are the same command
        let head = head.trim_start_matches('/');
        let head = head.split('@').next().unwrap_or(head).to_lowercase();

        match head.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "search" | "find" => Command::Search(rest.to_string()),
            "status" => Command::Status {
                active_only: rest.eq_ignore_ascii_case("active"),
            },
            "next" | "more" => Command::NextPage,
            "prev" | "previous" => Command::PrevPage,
            "dir" => rest.parse().map_or(Command::Unknown, Command::Directory),
            "remove" | "delete" | "rm" => Command::Remove(RemovalTarget::parse(rest)),
            "cancel" => Command::Cancel,
            _ => Command::Unknown,
        }
    }

    pub fn parse_callback(data: &str) -> Self {
        let numbered = |prefix: &str, build: fn(usize) -> Command| {
            data.strip_prefix(prefix)
                .and_then(|n| n.parse().ok())
                .map(build)
        };

        if let Some(command) = numbered(SELECTION_PREFIX, Command::Select)
            .or_else(|| numbered(DIR_SELECTION_PREFIX, Command::Directory))
        {
            return command;
        }

        match data {
            "status" | "status:all" => Command::Status { active_only: false },
            "status:active" => Command::Status { active_only: true },
            "help" => Command::Help,
            "cancel" => Command::Cancel,
            _ => match data.strip_prefix(PAGE_PREFIX) {
                Some("next") => Command::NextPage,
                Some("prev") => Command::PrevPage,
                _ => Command::Unknown,
            },
        }
    }
}

/// Behaviour knobs for the chat controller
#[derive(Clone, Debug)]
pub struct ControllerSettings {
    /// Results per page
    pub max_results: usize,
    /// Only this chat may use the bot when set
    pub allowed_chat_id: Option<i64>,
    /// Choices offered after picking a torrent; empty means the daemon default
    pub download_dirs: Vec<DownloadDirOption>,
    pub start: bool,
    pub indexer_debug: bool,
}

/// Turns chat updates into searches, downloads and status reports
pub struct BotController {
    indexer: Arc<dyn Indexer>,
    daemon: Arc<dyn TorrentDaemon>,
    monitor: Arc<DownloadMonitor>,
    sessions: Arc<UserSessions>,
    transport: Arc<dyn ChatTransport>,
    messages: MessageFactory,
    settings: ControllerSettings,
}

impl BotController {
    pub fn new(
        indexer: Arc<dyn Indexer>,
        daemon: Arc<dyn TorrentDaemon>,
        monitor: Arc<DownloadMonitor>,
        sessions: Arc<UserSessions>,
        transport: Arc<dyn ChatTransport>,
        mut settings: ControllerSettings,
    ) -> Self {
        settings.max_results = settings.max_results.max(1);
        Self {
            indexer,
            daemon,
            monitor,
            sessions,
            transport,
            messages: MessageFactory::new(),
            settings,
        }
    }

    pub fn from_state(
        state: &AppState,
        transport: Arc<dyn ChatTransport>,
        settings: ControllerSettings,
    ) -> Self {
        Self::new(
            Arc::clone(&state.indexer),
            Arc::clone(&state.daemon),
            Arc::clone(&state.monitor),
            Arc::clone(&state.sessions),
            transport,
            settings,
        )
    }

    pub fn is_authorized(&self, chat_id: i64) -> bool {
        match self.settings.allowed_chat_id {
            Some(allowed) => allowed == chat_id,
            None => true,
        }
    }

    pub async fn handle(&self, update: &ChatUpdate) {
        let Some(chat_id) = update.chat_id else {
            debug!(update_id = update.update_id, "Skipping update without chat");
            return;
        };
        if !self.is_authorized(chat_id) {
            warn!(chat_id, "Ignoring message from unauthorized chat");
            return;
        }

        let command = match &update.kind {
            UpdateKind::Text(text) => Command::parse_text(text),
            UpdateKind::Callback { data, .. } => Command::parse_callback(data),
            UpdateKind::Unsupported => return,
        };
        debug!(chat_id, command = ?command, "Handling chat command");

        match command {
            Command::Start => self.reply(chat_id, WELCOME_TEXT).await,
            Command::Help => self.reply(chat_id, HELP_TEXT).await,
            Command::Search(query) => self.search(chat_id, &query).await,
            Command::Status { active_only } => self.send_status(chat_id, active_only).await,
            Command::NextPage => self.turn_page(chat_id, 1).await,
            Command::PrevPage => self.turn_page(chat_id, -1).await,
            Command::Select(selection) => self.select(chat_id, selection).await,
            Command::Directory(choice) => self.choose_directory(chat_id, choice).await,
            Command::Remove(target) => self.remove(chat_id, target).await,
            Command::Cancel => {
                self.sessions.reset(chat_id);
                self.reply(chat_id, "Cancelled. Send search <title> to start again.")
                    .await;
            }
            Command::Unknown => {
                self.reply(
                    chat_id,
                    "Say search <title> to look for something, status to inspect torrents, \
or send a number to pick from the last list.",
                )
                .await
            }
        }
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.transport.send_message(chat_id, text).await {
            warn!(chat_id, error = %e, "Failed to send chat reply");
        }
    }

    fn preset_label(search: &PendingSearch) -> Option<&'static str> {
        search
            .preset
            .filter(|slug| *slug != "all")
            .and_then(preset_by_slug)
            .map(|preset| preset.label)
    }

    async fn search(&self, chat_id: i64, raw_query: &str) {
        if raw_query.trim().is_empty() {
            self.reply(chat_id, "Give me something to search for, e.g. search dune.")
                .await;
            return;
        }

        let parsed = extract_preset_from_query(raw_query);
        if parsed.text.is_empty() {
            self.reply(chat_id, "Give me something to search for after the category keyword.")
                .await;
            return;
        }

        self.reply(chat_id, &MessageFactory::search_prompt(&parsed.text, parsed.preset))
            .await;

        let candidates = self
            .indexer
            .search(&parsed.text, parsed.categories(), self.settings.indexer_debug)
            .await;
        let ranked = sort_candidates(candidates);

        info!(chat_id, query = %parsed.text, preset = ?parsed.slug(), results = ranked.len(), "Chat search");
        if ranked.is_empty() {
            self.sessions.clear_search(chat_id);
            self.reply(
                chat_id,
                "Nothing found. Try a broader query or check the indexer configuration.",
            )
            .await;
            return;
        }

        self.sessions
            .save_search(chat_id, parsed.text.clone(), parsed.slug(), ranked);
        if let Some(search) = self.sessions.get_search(chat_id) {
            let page = MessageFactory::results_page(
                &search,
                self.settings.max_results,
                Self::preset_label(&search),
            );
            self.reply(chat_id, &page).await;
        }
    }

    async fn turn_page(&self, chat_id: i64, delta: isize) {
        match self
            .sessions
            .turn_page(chat_id, delta, self.settings.max_results)
        {
            Some(search) => {
                let page = MessageFactory::results_page(
                    &search,
                    self.settings.max_results,
                    Self::preset_label(&search),
                );
                self.reply(chat_id, &page).await;
            }
            None => {
                self.reply(chat_id, "No active search. Use search <title> first.")
                    .await
            }
        }
    }

    async fn select(&self, chat_id: i64, selection: usize) {
        let Some(search) = self.sessions.get_search(chat_id) else {
            self.reply(chat_id, "No active search. Use search <title> first.")
                .await;
            return;
        };

        let total = search.candidates.len();
        let Some(candidate) = selection
            .checked_sub(1)
            .and_then(|idx| search.candidates.get(idx))
            .cloned()
        else {
            self.reply(chat_id, &format!("Choose between 1 and {total}.")).await;
            return;
        };

        if self.settings.download_dirs.is_empty() {
            self.enqueue(chat_id, candidate, None).await;
            return;
        }

        let prompt = MessageFactory::download_dir_prompt(&candidate, &self.settings.download_dirs);
        self.sessions.remember_download_choice(chat_id, candidate);
        self.reply(chat_id, &prompt).await;
    }

    async fn choose_directory(&self, chat_id: i64, choice: usize) {
        let Some(candidate) = self.sessions.pop_download_choice(chat_id) else {
            self.reply(
                chat_id,
                "No torrent is waiting for a download location. Start with search <title>.",
            )
            .await;
            return;
        };

        let dirs = &self.settings.download_dirs;
        let Some(option) = choice.checked_sub(1).and_then(|idx| dirs.get(idx)) else {
            self.sessions.remember_download_choice(chat_id, candidate);
            self.reply(chat_id, &format!("Choose a directory between 1 and {}.", dirs.len()))
                .await;
            return;
        };

        self.enqueue(chat_id, candidate, Some(&option.path)).await;
    }

    async fn enqueue(&self, chat_id: i64, candidate: Candidate, download_dir: Option<&str>) {
        let title = candidate.display_title().to_string();
        self.reply(chat_id, &format!("Sending {title} to Transmission…"))
            .await;

        if let Err(e) = self
            .daemon
            .submit(&candidate.magnet, self.settings.start, download_dir)
            .await
        {
            warn!(chat_id, title = %title, error = %e, "Failed to queue torrent");
            self.reply(chat_id, &format!("Failed to queue torrent: {e}")).await;
            return;
        }

        let tracking_id = self.monitor.track(chat_id, &candidate);
        info!(chat_id, tracking_id = %tracking_id, download_dir = ?download_dir, "Torrent queued");
        self.reply(chat_id, "Done. I'll let you know when it finishes.")
            .await;
    }

    async fn send_status(&self, chat_id: i64, active_only: bool) {
        self.reply(chat_id, "Checking Transmission…").await;

        match self.daemon.list_status(active_only).await {
            Ok(statuses) => {
                self.reply(chat_id, &self.messages.status_message(&statuses, active_only))
                    .await
            }
            Err(e) => {
                warn!(chat_id, error = %e, "Status check failed");
                self.reply(chat_id, &format!("Status check failed: {e}")).await;
            }
        }
    }

    async fn remove(&self, chat_id: i64, target: Option<RemovalTarget>) {
        let Some(target) = target else {
            self.reply(chat_id, "Tell me what to remove, e.g. remove dune or remove #3.")
                .await;
            return;
        };

        // Answers to a disambiguation list resolve against that list first
        let choices = self.sessions.take_removal_choices(chat_id);
        let statuses = match target {
            RemovalTarget::Id(id) if choices.iter().any(|s| s.torrent_id == Some(id)) => choices,
            _ => match self.daemon.list_status(false).await {
                Ok(statuses) => statuses,
                Err(e) => {
                    warn!(chat_id, error = %e, "Could not list torrents for removal");
                    self.reply(chat_id, &format!("Could not list torrents: {e}")).await;
                    return;
                }
            },
        };

        match find_removal_target(&statuses, &target) {
            RemovalMatch::NotFound => {
                self.reply(chat_id, "No torrent matches that.").await;
            }
            RemovalMatch::Ambiguous(matches) => {
                let text = MessageFactory::removal_choices(&matches);
                self.sessions.remember_removal_choices(chat_id, matches);
                self.reply(chat_id, &text).await;
            }
            RemovalMatch::Unique(status) => {
                let Some(torrent_id) = status.torrent_id else {
                    self.reply(chat_id, &format!("{} has no id, cannot remove it.", status.name))
                        .await;
                    return;
                };
                match self.daemon.remove(torrent_id, true).await {
                    Ok(()) => {
                        info!(chat_id, torrent_id, name = %status.name, "Torrent removed on request");
                        self.reply(chat_id, &format!("Removed {}.", status.name)).await;
                    }
                    Err(e) => {
                        warn!(chat_id, torrent_id, error = %e, "Failed to remove torrent");
                        self.reply(chat_id, &format!("Failed to remove {}: {e}", status.name))
                            .await;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{DispatchError, TransportError};
    use crate::models::torrent_status::DaemonTorrentStatus;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(i64, String)>>,
    }

    impl RecordingTransport {
        fn texts(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
        }

        fn last(&self) -> String {
            self.texts().pop().unwrap_or_default()
        }
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn next_updates(&self, _offset: Option<i64>) -> Result<Vec<ChatUpdate>, TransportError> {
            Ok(Vec::new())
        }

        async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push((chat_id, text.to_string()));
            Ok(())
        }

        async fn answer_callback(&self, _callback_id: &str) -> Result<(), TransportError> {
            Ok(())
        }
    }

    struct FixedIndexer {
        results: Mutex<Vec<Candidate>>,
        seen_categories: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl Indexer for FixedIndexer {
        async fn search(&self, _query: &str, categories: Option<&str>, _debug: bool) -> Vec<Candidate> {
            self.seen_categories
                .lock()
                .unwrap()
                .push(categories.map(str::to_string));
            self.results.lock().unwrap().clone()
        }
    }

    #[derive(Default)]
    struct FakeDaemon {
        statuses: Vec<DaemonTorrentStatus>,
        /// torrent-get fails
        fail_listing: bool,
        /// torrent-add and torrent-remove fail
        fail_writes: bool,
        submitted: Mutex<Vec<(String, Option<String>)>>,
        removed: Mutex<Vec<i64>>,
    }

    fn refused() -> DispatchError {
        DispatchError::Unreachable("connection refused".to_string())
    }

    #[async_trait]
    impl TorrentDaemon for FakeDaemon {
        async fn submit(
            &self,
            magnet: &str,
            _start: bool,
            download_dir: Option<&str>,
        ) -> Result<(), DispatchError> {
            if self.fail_writes {
                return Err(refused());
            }
            self.submitted
                .lock()
                .unwrap()
                .push((magnet.to_string(), download_dir.map(str::to_string)));
            Ok(())
        }

        async fn list_status(&self, active_only: bool) -> Result<Vec<DaemonTorrentStatus>, DispatchError> {
            if self.fail_listing {
                return Err(refused());
            }
            Ok(self
                .statuses
                .iter()
                .filter(|s| !active_only || !s.is_complete())
                .cloned()
                .collect())
        }

        async fn remove(&self, torrent_id: i64, _delete_data: bool) -> Result<(), DispatchError> {
            if self.fail_writes {
                return Err(refused());
            }
            self.removed.lock().unwrap().push(torrent_id);
            Ok(())
        }
    }

    struct Harness {
        controller: BotController,
        transport: Arc<RecordingTransport>,
        indexer: Arc<FixedIndexer>,
        daemon: Arc<FakeDaemon>,
        monitor: Arc<DownloadMonitor>,
    }

    const CHAT: i64 = 42;

    fn candidates(count: usize) -> Vec<Candidate> {
        (1..=count)
            .map(|i| {
                Candidate::new(format!("magnet:?dn=item{i}"))
                    .with_title(format!("Item {i}"))
                    .with_counts(Some(i as u64), Some(0))
            })
            .collect()
    }

    fn status(id: i64, name: &str, percent: f64) -> DaemonTorrentStatus {
        DaemonTorrentStatus {
            torrent_id: Some(id),
            name: name.to_string(),
            status: "downloading".to_string(),
            percent_done: percent,
            eta: None,
            magnet: None,
            info_hash: None,
        }
    }

    fn harness(results: Vec<Candidate>, statuses: Vec<DaemonTorrentStatus>, dirs: bool) -> Harness {
        let daemon = FakeDaemon {
            statuses,
            ..Default::default()
        };
        harness_with_daemon(results, daemon, dirs)
    }

    fn harness_with_daemon(results: Vec<Candidate>, daemon: FakeDaemon, dirs: bool) -> Harness {
        let transport = Arc::new(RecordingTransport::default());
        let indexer = Arc::new(FixedIndexer {
            results: Mutex::new(results),
            seen_categories: Mutex::new(Vec::new()),
        });
        let daemon = Arc::new(daemon);
        let monitor = Arc::new(DownloadMonitor::new());
        let download_dirs = if dirs {
            vec![
                DownloadDirOption {
                    label: "Movies".to_string(),
                    path: "/data/movies".to_string(),
                },
                DownloadDirOption {
                    label: "TV".to_string(),
                    path: "/data/tv".to_string(),
                },
            ]
        } else {
            Vec::new()
        };

        let controller = BotController::new(
            indexer.clone(),
            daemon.clone(),
            monitor.clone(),
            Arc::new(UserSessions::new()),
            transport.clone(),
            ControllerSettings {
                max_results: 5,
                allowed_chat_id: Some(CHAT),
                download_dirs,
                start: true,
                indexer_debug: false,
            },
        );

        Harness {
            controller,
            transport,
            indexer,
            daemon,
            monitor,
        }
    }

    fn text(chat_id: i64, body: &str) -> ChatUpdate {
        ChatUpdate {
            update_id: 1,
            chat_id: Some(chat_id),
            kind: UpdateKind::Text(body.to_string()),
        }
    }

    fn callback(data: &str) -> ChatUpdate {
        ChatUpdate {
            update_id: 2,
            chat_id: Some(CHAT),
            kind: UpdateKind::Callback {
                callback_id: "cb".to_string(),
                data: data.to_string(),
            },
        }
    }

    #[test]
    fn test_parse_text_commands() {
        assert_eq!(Command::parse_text("/start"), Command::Start);
        assert_eq!(Command::parse_text("HELP"), Command::Help);
        assert_eq!(
            Command::parse_text("search  tv the bear "),
            Command::Search("tv the bear".to_string())
        );
        assert_eq!(Command::parse_text("search"), Command::Search(String::new()));
        assert_eq!(
            Command::parse_text("/status@finder_bot active"),
            Command::Status { active_only: true }
        );
        assert_eq!(Command::parse_text("status"), Command::Status { active_only: false });
        assert_eq!(Command::parse_text(" 3 "), Command::Select(3));
        assert_eq!(Command::parse_text("dir 2"), Command::Directory(2));
        assert_eq!(Command::parse_text("dir movies"), Command::Unknown);
        assert_eq!(
            Command::parse_text("remove #7"),
            Command::Remove(Some(RemovalTarget::Id(7)))
        );
        assert_eq!(Command::parse_text("remove"), Command::Remove(None));
        assert_eq!(Command::parse_text("next"), Command::NextPage);
        assert_eq!(Command::parse_text("what?"), Command::Unknown);
    }

    #[test]
    fn test_parse_callbacks() {
        assert_eq!(Command::parse_callback("pick:4"), Command::Select(4));
        assert_eq!(Command::parse_callback("dir:1"), Command::Directory(1));
        assert_eq!(
            Command::parse_callback("status:active"),
            Command::Status { active_only: true }
        );
        assert_eq!(Command::parse_callback("page:prev"), Command::PrevPage);
        assert_eq!(Command::parse_callback("pick:x"), Command::Unknown);
    }

    #[tokio::test]
    async fn test_search_pick_directory_submit_track() {
        let h = harness(candidates(3), Vec::new(), true);

        h.controller.handle(&text(CHAT, "search movies Item")).await;
        let texts = h.transport.texts();
        assert_eq!(texts[0], "Searching Movies for “Item”…");
        assert!(texts[1].starts_with("Top 3 results for Item (Movies)"));
        // Highest seeders first
        assert!(texts[1].contains("1. Item 3"));
        assert_eq!(
            h.indexer.seen_categories.lock().unwrap().as_slice(),
            &[Some("2000".to_string())]
        );

        h.controller.handle(&callback("pick:1")).await;
        assert!(h.transport.last().starts_with("Where should I save Item 3?"));

        h.controller.handle(&text(CHAT, "dir 2")).await;
        assert_eq!(
            h.daemon.submitted.lock().unwrap().as_slice(),
            &[("magnet:?dn=item3".to_string(), Some("/data/tv".to_string()))]
        );
        assert_eq!(h.monitor.tracked_count(), 1);
        assert_eq!(h.transport.last(), "Done. I'll let you know when it finishes.");
    }

    #[tokio::test]
    async fn test_pick_without_directories_uses_default() {
        let h = harness(candidates(2), Vec::new(), false);

        h.controller.handle(&text(CHAT, "search Item")).await;
        h.controller.handle(&text(CHAT, "2")).await;

        assert_eq!(
            h.daemon.submitted.lock().unwrap().as_slice(),
            &[("magnet:?dn=item1".to_string(), None)]
        );
        assert_eq!(h.monitor.tracked_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_directory_keeps_choice() {
        let h = harness(candidates(1), Vec::new(), true);

        h.controller.handle(&text(CHAT, "search Item")).await;
        h.controller.handle(&text(CHAT, "1")).await;
        h.controller.handle(&text(CHAT, "dir 9")).await;
        assert_eq!(h.transport.last(), "Choose a directory between 1 and 2.");

        h.controller.handle(&text(CHAT, "dir 1")).await;
        assert_eq!(h.daemon.submitted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_selection_errors() {
        let h = harness(candidates(2), Vec::new(), false);

        h.controller.handle(&text(CHAT, "1")).await;
        assert_eq!(h.transport.last(), "No active search. Use search <title> first.");

        h.controller.handle(&text(CHAT, "search Item")).await;
        h.controller.handle(&text(CHAT, "5")).await;
        assert_eq!(h.transport.last(), "Choose between 1 and 2.");
        assert!(h.daemon.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_results_and_bare_preset() {
        let h = harness(Vec::new(), Vec::new(), false);

        h.controller.handle(&text(CHAT, "search tv")).await;
        assert_eq!(
            h.transport.last(),
            "Give me something to search for after the category keyword."
        );

        h.controller.handle(&text(CHAT, "search nothing here")).await;
        assert!(h.transport.last().starts_with("Nothing found."));
    }

    #[tokio::test]
    async fn test_paging() {
        let h = harness(candidates(7), Vec::new(), false);

        h.controller.handle(&text(CHAT, "search Item")).await;
        assert!(h.transport.last().contains("(page 1/2)"));

        h.controller.handle(&text(CHAT, "next")).await;
        let page = h.transport.last();
        assert!(page.contains("(page 2/2)"));
        assert!(page.contains("6. Item 2"));

        h.controller.handle(&callback("page:prev")).await;
        assert!(h.transport.last().contains("(page 1/2)"));
    }

    #[tokio::test]
    async fn test_unauthorized_chat_is_ignored() {
        let h = harness(candidates(1), Vec::new(), false);

        h.controller.handle(&text(7, "search Item")).await;

        assert!(h.transport.texts().is_empty());
        assert!(h.indexer.seen_categories.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_active() {
        let h = harness(
            Vec::new(),
            vec![status(1, "Done", 100.0), status(2, "Going", 40.0)],
            false,
        );

        h.controller.handle(&text(CHAT, "status active")).await;
        let report = h.transport.last();

        assert!(report.starts_with("Active torrents"));
        assert!(report.contains("Name: Going"));
        assert!(!report.contains("Name: Done"));
    }

    #[tokio::test]
    async fn test_remove_disambiguation() {
        let h = harness(
            Vec::new(),
            vec![status(1, "Dune 2021", 100.0), status(2, "Dune Part Two", 100.0)],
            false,
        );

        h.controller.handle(&text(CHAT, "remove dune")).await;
        let listing = h.transport.last();
        assert!(listing.contains("#1 Dune 2021"));
        assert!(listing.contains("#2 Dune Part Two"));
        assert!(h.daemon.removed.lock().unwrap().is_empty());

        h.controller.handle(&text(CHAT, "remove #2")).await;
        assert_eq!(h.daemon.removed.lock().unwrap().as_slice(), &[2]);
        assert_eq!(h.transport.last(), "Removed Dune Part Two.");
    }

    #[tokio::test]
    async fn test_cancel_clears_pending_choice() {
        let h = harness(candidates(1), Vec::new(), true);

        h.controller.handle(&text(CHAT, "search Item")).await;
        h.controller.handle(&text(CHAT, "1")).await;
        h.controller.handle(&text(CHAT, "cancel")).await;
        h.controller.handle(&text(CHAT, "dir 1")).await;

        assert!(h.transport.last().starts_with("No torrent is waiting"));
        assert!(h.daemon.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_submit_is_reported_and_not_tracked() {
        let daemon = FakeDaemon {
            fail_writes: true,
            ..Default::default()
        };
        let h = harness_with_daemon(candidates(1), daemon, false);

        h.controller.handle(&text(CHAT, "search Item")).await;
        h.controller.handle(&text(CHAT, "1")).await;

        assert_eq!(
            h.transport.last(),
            "Failed to queue torrent: Daemon unreachable: connection refused"
        );
        assert_eq!(h.monitor.tracked_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_status_check_is_reported() {
        let daemon = FakeDaemon {
            fail_listing: true,
            ..Default::default()
        };
        let h = harness_with_daemon(Vec::new(), daemon, false);

        h.controller.handle(&callback("status")).await;

        assert_eq!(
            h.transport.last(),
            "Status check failed: Daemon unreachable: connection refused"
        );
    }

    #[tokio::test]
    async fn test_removal_listing_failure_is_reported() {
        let daemon = FakeDaemon {
            fail_listing: true,
            ..Default::default()
        };
        let h = harness_with_daemon(Vec::new(), daemon, false);

        h.controller.handle(&text(CHAT, "remove dune")).await;

        assert_eq!(
            h.transport.last(),
            "Could not list torrents: Daemon unreachable: connection refused"
        );
        assert!(h.daemon.removed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_remove_is_reported() {
        let daemon = FakeDaemon {
            statuses: vec![status(3, "Dune 2021", 100.0)],
            fail_writes: true,
            ..Default::default()
        };
        let h = harness_with_daemon(Vec::new(), daemon, false);

        h.controller.handle(&text(CHAT, "remove #3")).await;

        assert_eq!(
            h.transport.last(),
            "Failed to remove Dune 2021: Daemon unreachable: connection refused"
        );
    }

    #[tokio::test]
    async fn test_empty_search_drops_previous_results() {
        let h = harness(candidates(2), Vec::new(), false);

        h.controller.handle(&text(CHAT, "search Item")).await;
        h.indexer.results.lock().unwrap().clear();
        h.controller.handle(&text(CHAT, "search Nothing")).await;
        h.controller.handle(&text(CHAT, "1")).await;

        assert_eq!(h.transport.last(), "No active search. Use search <title> first.");
        assert!(h.daemon.submitted.lock().unwrap().is_empty());
    }
}
