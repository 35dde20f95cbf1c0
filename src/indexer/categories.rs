/// Named shortcut that expands into Torznab category ids
#[derive(Debug, PartialEq, Eq)]
pub struct CategoryPreset {
    pub slug: &'static str,
    pub label: &'static str,
    /// Comma separated ids, empty for "no filter"
    pub categories: &'static str,
    pub aliases: &'static [&'static str],
}

pub static PRESETS: &[CategoryPreset] = &[
    CategoryPreset {
        slug: "movies",
        label: "Movies",
        categories: "2000",
        aliases: &["movie", "movies", "film", "films"],
    },
    CategoryPreset {
        slug: "tv",
        label: "TV Shows",
        categories: "5000",
        aliases: &["tv", "tvshow", "tv-show", "tv shows", "tv show", "series", "tvseries"],
    },
    CategoryPreset {
        slug: "software",
        label: "Software",
        categories: "4000",
        aliases: &["software", "apps", "application", "applications"],
    },
    CategoryPreset {
        slug: "software-mac",
        label: "Software (macOS)",
        categories: "4050",
        aliases: &["software mac", "mac software", "mac", "macos"],
    },
    CategoryPreset {
        slug: "software-win",
        label: "Software (Windows)",
        categories: "4010,4020",
        aliases: &[
            "software win",
            "software windows",
            "win software",
            "windows software",
            "windows",
        ],
    },
    CategoryPreset {
        slug: "all",
        label: "All categories",
        categories: "",
        aliases: &["all", "any"],
    },
];

/// A free-form query split into an optional preset and the search text
#[derive(Debug, PartialEq, Eq)]
pub struct PresetQuery {
    pub preset: Option<&'static CategoryPreset>,
    pub text: String,
}

impl PresetQuery {
    /// Category filter to hand to `Indexer::search`, `None` without a preset
    pub fn categories(&self) -> Option<&'static str> {
        self.preset.map(|preset| preset.categories)
    }

    pub fn slug(&self) -> Option<&'static str> {
        self.preset.map(|preset| preset.slug)
    }
}

pub fn preset_by_slug(slug: &str) -> Option<&'static CategoryPreset> {
    PRESETS.iter().find(|preset| preset.slug == slug)
}

pub fn available_presets() -> impl Iterator<Item = &'static str> {
    PRESETS.iter().map(|preset| preset.slug)
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '-'
}

/// Match `alias` at the start of `query`.
///
/// Alias tokens may be joined by any run of whitespace or dashes, and the
/// alias must end at a separator or at the end of the query. Returns the
/// remaining text on success.
fn match_alias<'q>(alias: &str, query: &'q str) -> Option<&'q str> {
    let mut rest = query;

    for (idx, token) in alias.split(is_separator).filter(|t| !t.is_empty()).enumerate() {
        if idx > 0 {
            let trimmed = rest.trim_start_matches(is_separator);
            if trimmed.len() == rest.len() {
                return None;
            }
            rest = trimmed;
        }

        let head = rest.get(..token.len())?;
        if !head.eq_ignore_ascii_case(token) {
            return None;
        }
        rest = &rest[token.len()..];
    }

    match rest.chars().next() {
        None => Some(""),
        Some(c) if is_separator(c) => Some(rest.trim_start_matches(is_separator).trim()),
        Some(_) => None,
    }
}

/// Detect a category preset prefix in a user query.
///
/// "tv show The Bear" yields the `tv` preset and the text "The Bear".
/// Longer aliases are tried first so "software mac" beats "software".
pub fn extract_preset_from_query(query: &str) -> PresetQuery {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return PresetQuery {
            preset: None,
            text: String::new(),
        };
    }

    let mut rules: Vec<(&'static str, &'static CategoryPreset)> = PRESETS
        .iter()
        .flat_map(|preset| preset.aliases.iter().map(move |alias| (*alias, preset)))
        .collect();
    rules.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    for (alias, preset) in rules {
        if let Some(remainder) = match_alias(alias, trimmed) {
            return PresetQuery {
                preset: Some(preset),
                text: remainder.to_string(),
            };
        }
    }

    PresetQuery {
        preset: None,
        text: trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tv_show_prefix() {
        let parsed = extract_preset_from_query("TV show The Bear");
        assert_eq!(parsed.categories(), Some("5000"));
        assert_eq!(parsed.text, "The Bear");
        assert_eq!(parsed.slug(), Some("tv"));
    }

    #[test]
    fn test_longer_alias_wins() {
        let parsed = extract_preset_from_query("software mac Xcode");
        assert_eq!(parsed.slug(), Some("software-mac"));
        assert_eq!(parsed.text, "Xcode");

        let parsed = extract_preset_from_query("windows-software  7zip");
        assert_eq!(parsed.slug(), Some("software-win"));
        assert_eq!(parsed.categories(), Some("4010,4020"));
        assert_eq!(parsed.text, "7zip");
    }

    #[test]
    fn test_alias_needs_word_boundary() {
        let parsed = extract_preset_from_query("Movieland");
        assert_eq!(parsed.preset, None);
        assert_eq!(parsed.text, "Movieland");

        let parsed = extract_preset_from_query("tv showing");
        assert_eq!(parsed.slug(), Some("tv"));
        assert_eq!(parsed.text, "showing");
    }

    #[test]
    fn test_all_preset_disables_filter() {
        let parsed = extract_preset_from_query("all Dune");
        assert_eq!(parsed.categories(), Some(""));
        assert_eq!(parsed.text, "Dune");
    }

    #[test]
    fn test_alias_only_and_empty_queries() {
        let parsed = extract_preset_from_query("  films ");
        assert_eq!(parsed.slug(), Some("movies"));
        assert_eq!(parsed.text, "");

        let parsed = extract_preset_from_query("   ");
        assert_eq!(parsed.preset, None);
        assert_eq!(parsed.text, "");
    }

    #[test]
    fn test_plain_query_untouched() {
        let parsed = extract_preset_from_query("  The Matrix 1999 ");
        assert_eq!(parsed.preset, None);
        assert_eq!(parsed.text, "The Matrix 1999");
    }

    #[test]
    fn test_preset_lookup() {
        assert_eq!(preset_by_slug("tv").map(|p| p.label), Some("TV Shows"));
        assert!(preset_by_slug("music").is_none());
        assert_eq!(available_presets().count(), 6);
    }
}
