/// Render a daemon ETA in seconds as "1d 2h 3m", or "45s" under a minute.
///
/// Negative values mean unknown and map to `None`.
pub fn format_eta_seconds(seconds: i64) -> Option<String> {
    if seconds < 0 {
        return None;
    }

    let (minutes, secs) = (seconds / 60, seconds % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    let (days, hours) = (hours / 24, hours % 24);

    let parts: Vec<String> = [(days, 'd'), (hours, 'h'), (minutes, 'm')]
        .into_iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();

    if parts.is_empty() {
        Some(format!("{secs}s"))
    } else {
        Some(parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_eta_seconds() {
        assert_eq!(format_eta_seconds(-1), None);
        assert_eq!(format_eta_seconds(0).as_deref(), Some("0s"));
        assert_eq!(format_eta_seconds(45).as_deref(), Some("45s"));
        assert_eq!(format_eta_seconds(61).as_deref(), Some("1m"));
        assert_eq!(format_eta_seconds(3_600).as_deref(), Some("1h"));
        assert_eq!(format_eta_seconds(93_784).as_deref(), Some("1d 2h 3m"));
        assert_eq!(format_eta_seconds(86_400 + 120).as_deref(), Some("1d 2m"));
    }
}
