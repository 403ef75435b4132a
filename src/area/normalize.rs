use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static PARENTHESIZED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*\)").expect("valid regex"));
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("valid regex"));
static EDGE_HYPHENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-+|-+$").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Reduce a human-entered location to its area key.
///
/// "Mumbai (400001)", "MUMBAI400001" and "mumbai-" all become "mumbai".
/// Input made only of noise (digits, hyphens, parentheses, whitespace)
/// becomes the empty string, which callers must never treat as a key.
///
/// This is the only implementation of the transform. Stored jobs carry
/// keys produced here (see [`area_keys`]) and the database compares them
/// as opaque strings.
pub fn normalize_area(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_codes = PARENTHESIZED.replace(trimmed, "");
    let without_digits = DIGITS.replace_all(without_codes.trim(), "");
    let without_hyphens = EDGE_HYPHENS.replace_all(without_digits.trim(), "");
    let collapsed = WHITESPACE.replace_all(without_hyphens.trim(), " ");
    collapsed.trim().to_lowercase()
}

/// Split a provider's comma-separated service area into area keys.
pub fn parse_service_areas(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(normalize_area)
        .filter(|key| !key.is_empty())
        .collect()
}

/// Distinct non-empty area keys of `locations`, in first-seen order.
pub fn area_keys<S: AsRef<str>>(locations: &[S]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(locations.len());
    for key in locations.iter().map(|location| normalize_area(location.as_ref())) {
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
