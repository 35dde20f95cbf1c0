// Loose title comparison, used only when no hash or magnet match exists

/// Lowercase, collapse every run of non-alphanumeric characters to one space, trim.
pub fn normalize_title(title: &str) -> String {
    let mut normalized = String::with_capacity(title.len());
    let mut pending_space = false;

    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_space && !normalized.is_empty() {
                normalized.push(' ');
            }
            pending_space = false;
            normalized.push(ch);
        } else {
            pending_space = true;
        }
    }

    normalized
}

/// True when the normalized titles are equal or one contains the other.
///
/// Deliberately loose: "Alien" matches "Aliens". Callers must prefer
/// info-hash and magnet equality over this.
pub fn titles_match(expected: &str, actual: &str) -> bool {
    let expected = normalize_title(expected);
    let actual = normalize_title(actual);

    if expected.is_empty() || actual.is_empty() {
        return false;
    }

    expected == actual || actual.contains(&expected) || expected.contains(&actual)
}
