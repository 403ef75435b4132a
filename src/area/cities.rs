use super::normalize::normalize_area;

/// Append `raw` to `cities` unless an entry already normalizes to the same
/// area key, then backfill an empty legacy `city` from the first entry.
///
/// Returns whether `cities` changed. A `raw` value with no area key leaves
/// both fields untouched.
pub fn add_city(cities: &mut Vec<String>, city: &mut String, raw: &str) -> bool {
    let key = normalize_area(raw);
    if key.is_empty() {
        return false;
    }

    let present = cities.iter().any(|existing| normalize_area(existing) == key);
    if !present {
        cities.push(raw.trim().to_string());
    }
    if city.is_empty() {
        if let Some(first) = cities.first() {
            *city = first.clone();
        }
    }
    !present
}

/// Remove every entry of `cities` with the same area key as `raw`.
///
/// The legacy `city` moves to the first remaining entry (or empty) only
/// when it named the removed area. Returns whether `cities` changed.
pub fn remove_city(cities: &mut Vec<String>, city: &mut String, raw: &str) -> bool {
    let key = normalize_area(raw);
    if key.is_empty() {
        return false;
    }

    let before = cities.len();
    cities.retain(|existing| normalize_area(existing) != key);
    if normalize_area(city) == key {
        *city = cities.first().cloned().unwrap_or_default();
    }
    cities.len() != before
}
