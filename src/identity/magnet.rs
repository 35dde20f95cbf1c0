// Info-hash extraction from magnet URIs (BEP-9)

use data_encoding::BASE32;

const BTIH_PREFIX: &str = "urn:btih:";
const HEX_HASH_LEN: usize = 40;
const BASE32_HASH_LEN: usize = 32;

/// Extract the normalized info-hash from a magnet URI.
///
/// Accepts both the 40-char hex and the 32-char base32 encodings of the
/// 160-bit hash and always returns lowercase hex. Returns `None` for
/// non-magnet URIs and for magnets without a usable `xt=urn:btih:` value.
pub fn extract_info_hash(magnet_uri: &str) -> Option<String> {
    let uri = magnet_uri.trim();
    if uri.is_empty() {
        return None;
    }

    let (scheme, rest) = split_scheme(uri);
    if let Some(scheme) = scheme {
        if !scheme.eq_ignore_ascii_case("magnet") {
            return None;
        }
    }

    let query = query_part(rest)?;
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).ok()?;

    pairs
        .iter()
        .filter(|(key, _)| key == "xt")
        .find_map(|(_, value)| hash_from_exact_topic(value))
}

/// Normalize a hash string reported by a daemon or indexer.
///
/// Same encodings as the magnet path, without the URN prefix.
pub fn normalize_info_hash(raw: &str) -> Option<String> {
    let raw = raw.trim();

    if raw.len() == HEX_HASH_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Some(raw.to_ascii_lowercase());
    }

    if raw.len() == BASE32_HASH_LEN && raw.bytes().all(is_base32_char) {
        let decoded = BASE32.decode(raw.to_ascii_uppercase().as_bytes()).ok()?;
        return Some(hex::encode(decoded));
    }

    None
}

fn hash_from_exact_topic(xt: &str) -> Option<String> {
    let prefix = xt.get(..BTIH_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(BTIH_PREFIX) {
        return None;
    }
    normalize_info_hash(&xt[BTIH_PREFIX.len()..])
}

fn is_base32_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'2'..=b'7')
}

/// Split `scheme:rest`. Only a syntactically valid scheme (RFC 3986) counts.
fn split_scheme(uri: &str) -> (Option<&str>, &str) {
    let Some(colon) = uri.find(':') else {
        return (None, uri);
    };

    let candidate = &uri[..colon];
    let mut bytes = candidate.bytes();
    let valid = match bytes.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
        }
        _ => false,
    };

    if valid {
        (Some(candidate), &uri[colon + 1..])
    } else {
        (None, uri)
    }
}

fn query_part(rest: &str) -> Option<&str> {
    let (_, query) = rest.split_once('?')?;
    let query = match query.split_once('#') {
        Some((query, _fragment)) => query,
        None => query,
    };
    Some(query)
}
