use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use crate::config::SourceConfig;
use crate::extract::RawItem;
use crate::record::GuestEntry;
use crate::segment::GuestCandidate;

// "ce lundi 3 mars 2024", "lundi 3 mars 2024", "3 mars 2024", "1er avril 2023"
static FRENCH_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:er)?\s+(janvier|février|fevrier|mars|avril|mai|juin|juillet|août|aout|septembre|octobre|novembre|décembre|decembre)\s+(\d{4})")
        .unwrap()
});
static ISO_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    // No trailing \b: a "T" right after the day (ISO timestamps) is not a
    // word boundary.
    Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})").unwrap()
});
// Table-separator artifacts left in source HTML: long dash/underscore runs.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s\-–—_.·…]*$").unwrap()
});

/// Reduce date text to a calendar date. Unparsable or invalid text yields
/// None, never a fabricated date.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = ISO_DATE_RE.captures(text) {
        let (y, m, d) = (
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        );
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    if let Some(caps) = FRENCH_DATE_RE.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month = french_month(&caps[2].to_lowercase())?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    debug!("Unparsable date text: {}", text);
    None
}

fn french_month(name: &str) -> Option<u32> {
    let month = match name {
        "janvier" => 1,
        "février" | "fevrier" => 2,
        "mars" => 3,
        "avril" => 4,
        "mai" => 5,
        "juin" => 6,
        "juillet" => 7,
        "août" | "aout" => 8,
        "septembre" => 9,
        "octobre" => 10,
        "novembre" => 11,
        "décembre" | "decembre" => 12,
        _ => return None,
    };
    Some(month)
}

/// Strip leading separator artifacts left by segmentation and collapse
/// repeated whitespace.
pub fn clean_text(s: &str) -> String {
    let stripped = s.trim_start_matches([',', '-', '–', '—', ':', ';', ' ']);
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Literal placeholder runs (dash/underscore separators) count as empty.
pub fn is_placeholder(s: &str) -> bool {
    PLACEHOLDER_RE.is_match(s)
}

/// Turn one item's segmented candidates into normalized guest entries:
/// canonical date, corrected names, cleaned role text, validity window.
///
/// `None` means the validity window dropped the whole item; callers must not
/// resurrect it, not even as a placeholder row. `Some(vec![])` means the item
/// survived but carried no usable guests.
pub fn normalize_item(
    item: &RawItem,
    candidates: Vec<GuestCandidate>,
    config: &SourceConfig,
) -> Option<Vec<GuestEntry>> {
    let date = item.date_text.text().and_then(parse_date_text);

    // Sources documented as unreliable outside a known-good window drop the
    // whole item; absent dates pass (the window binds on dates, not on their
    // absence).
    if let (Some(window), Some(d)) = (&config.validity_window, date) {
        let before = window.from.is_some_and(|from| d < from);
        let after = window.to.is_some_and(|to| d > to);
        if before || after {
            debug!(
                "{}: item {} outside validity window, dropped",
                config.name, item.canonical_key
            );
            return None;
        }
    }

    let title = item.title.text().map(clean_text).filter(|t| !t.is_empty());

    let entries = candidates
        .into_iter()
        .filter_map(|c| {
            let name = clean_text(&c.name);
            let role = clean_text(&c.role);
            // Both reduced to placeholders: the record is an artifact.
            if is_placeholder(&name) && is_placeholder(&role) {
                return None;
            }
            let name = config.corrections.get(&name).cloned().unwrap_or(name);
            if name.is_empty() {
                return None;
            }
            Some(GuestEntry {
                item_id: item.canonical_key.clone(),
                title: title.clone(),
                canonical_date: date,
                guest_name: Some(name),
                guest_role_text: if role.is_empty() { None } else { Some(role) },
                raw_description: item.description.text().map(|s| s.to_string()),
            })
        })
        .collect();
    Some(entries)
}

// ── Tests ──
