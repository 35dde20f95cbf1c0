use crate::core::config::DownloadDirOption;
use crate::indexer::CategoryPreset;
use crate::models::candidate::Candidate;
use crate::models::torrent_status::DaemonTorrentStatus;
use crate::stores::sessions::PendingSearch;
use std::collections::HashMap;

const PROGRESS_WIDTH: usize = 10;
const UNKNOWN: &str = "—";

const DEFAULT_STATUS_DESCRIPTIONS: [(&str, &str); 10] = [
    ("downloading", "actively downloading"),
    ("seeding", "completed and seeding"),
    ("stopped", "paused or finished"),
    ("paused", "paused"),
    ("checking", "verifying data"),
    ("check pending", "waiting to verify data"),
    ("download pending", "waiting in queue"),
    ("seed pending", "waiting to seed"),
    ("queued", "waiting in queue"),
    ("error", "Transmission reported an error"),
];

pub const HELP_TEXT: &str = "Commands:\n\
- search <title>: look up torrents and see the top matches.\n\
- Prefix with search movies ..., search tv ... or search software ... for category presets.\n\
- <number>: pick one of the listed torrents to download it.\n\
- next / prev: page through the last results.\n\
- status or status active: list torrents with a short explanation of their state.\n\
- remove <name> or remove #<id>: delete a torrent and its data.\n\
- cancel: forget the pending search or choice.\n\
- help: show this message again.";

pub const WELCOME_TEXT: &str = "Send search <title> to see the top torrents, status to inspect downloads, \
then reply with a number to start the transfer.";

/// Renders every user-facing bot message
pub struct MessageFactory {
    status_descriptions: HashMap<String, String>,
}

impl MessageFactory {
    pub fn new() -> Self {
        Self::with_descriptions(
            DEFAULT_STATUS_DESCRIPTIONS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    pub fn with_descriptions(descriptions: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            status_descriptions: descriptions.into_iter().collect(),
        }
    }

    pub fn search_prompt(query: &str, preset: Option<&CategoryPreset>) -> String {
        match preset {
            Some(preset) if preset.slug == "all" => format!("Searching all categories for “{query}”…"),
            Some(preset) => format!("Searching {} for “{query}”…", preset.label),
            None => format!("Searching for “{query}”…"),
        }
    }

    pub fn explain_status(&self, status: &str) -> &str {
        self.status_descriptions
            .get(&status.to_lowercase())
            .map(String::as_str)
            .unwrap_or("status reported by Transmission")
    }

    pub fn progress_bar(percent: f64) -> String {
        let filled = ((percent / 100.0) * PROGRESS_WIDTH as f64).round();
        let filled = filled.clamp(0.0, PROGRESS_WIDTH as f64) as usize;
        format!("{}{}", "#".repeat(filled), "-".repeat(PROGRESS_WIDTH - filled))
    }

    /// One block per torrent, separated by blank lines
    pub fn format_status_report(&self, statuses: &[DaemonTorrentStatus]) -> String {
        statuses
            .iter()
            .map(|status| {
                let torrent_id = status
                    .torrent_id
                    .map_or_else(|| UNKNOWN.to_string(), |id| id.to_string());
                let name = if status.name.is_empty() {
                    "(unknown)"
                } else {
                    status.name.as_str()
                };
                [
                    format!("ID  : {torrent_id}"),
                    format!("Name: {name}"),
                    format!("State: {}", self.explain_status(&status.status)),
                    format!(
                        "Done : {:5.1}%   {}",
                        status.percent_done,
                        Self::progress_bar(status.percent_done)
                    ),
                    format!("ETA  : {}", status.eta.as_deref().unwrap_or(UNKNOWN)),
                ]
                .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn status_message(&self, statuses: &[DaemonTorrentStatus], active_only: bool) -> String {
        if statuses.is_empty() {
            return if active_only {
                "No active torrents right now.".to_string()
            } else {
                "Transmission has no torrents yet.".to_string()
            };
        }
        let heading = if active_only { "Active torrents" } else { "All torrents" };
        format!("{heading}\n\n{}", self.format_status_report(statuses))
    }

    pub fn format_bytes(value: Option<u64>) -> String {
        const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

        let Some(value) = value.filter(|v| *v > 0) else {
            return "unknown".to_string();
        };

        let mut size = value as f64;
        let mut idx = 0;
        while size >= 1024.0 && idx < UNITS.len() - 1 {
            size /= 1024.0;
            idx += 1;
        }

        if idx == 0 {
            format!("{value} {}", UNITS[0])
        } else {
            format!("{size:.1} {}", UNITS[idx])
        }
    }

    pub fn format_candidate_card(index: usize, candidate: &Candidate) -> [String; 2] {
        let count = |value: Option<u64>| value.map_or_else(|| "?".to_string(), |v| v.to_string());
        [
            format!("{index}. {}", candidate.display_title()),
            format!(
                "seeds: {} | peers: {} | size: {} | source: {}",
                count(candidate.seeders),
                count(candidate.leechers),
                Self::format_bytes(candidate.size_bytes),
                candidate.source
            ),
        ]
    }

    /// Current page of a pending search
    pub fn results_page(search: &PendingSearch, page_size: usize, preset_label: Option<&str>) -> String {
        let items = search.page_items(page_size);
        let pages = search.page_count(page_size);
        let suffix = preset_label.map(|label| format!(" ({label})")).unwrap_or_default();

        let mut lines = vec![format!(
            "Top {} results for {}{suffix} (page {}/{pages}):",
            search.candidates.len(),
            search.query,
            search.page + 1
        )];
        for (index, candidate) in items {
            lines.extend(Self::format_candidate_card(index, candidate));
        }
        lines.push(if pages > 1 {
            "Reply with a number to download it, or next / prev to see more.".to_string()
        } else {
            "Reply with a number to download it.".to_string()
        });
        lines.join("\n")
    }

    pub fn download_dir_prompt(candidate: &Candidate, options: &[DownloadDirOption]) -> String {
        let mut lines = vec![format!("Where should I save {}?", candidate.display_title())];
        lines.extend(
            options
                .iter()
                .enumerate()
                .map(|(idx, option)| format!("{}. {} ({})", idx + 1, option.label, option.path)),
        );
        lines.push("Reply with dir <number>.".to_string());
        lines.join("\n")
    }

    pub fn removal_choices(statuses: &[DaemonTorrentStatus]) -> String {
        let mut lines = vec!["Several torrents match. Send remove #<id> to pick one:".to_string()];
        lines.extend(statuses.iter().map(|status| match status.torrent_id {
            Some(id) => format!("#{id} {}", status.name),
            None => format!("(no id) {}", status.name),
        }));
        lines.join("\n")
    }

    pub fn completion_notice(name: &str) -> String {
        format!("✅ Torrent ready: {name}")
    }
}

impl Default for MessageFactory {
    fn default() -> Self {
        Self::new()
    }
}
