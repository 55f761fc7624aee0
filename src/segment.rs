use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::config::SegmentationConfig;

// Name boundary: one or two capitalized given names (diacritics allowed,
// hyphenated compounds like "Jean-Pierre"), then one or more all-caps or
// apostrophe/hyphen-joined surname tokens.
static NAME_CAPS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\p{Lu}\p{Ll}+(?:-\p{Lu}\p{Ll}+)?(?: \p{Lu}\p{Ll}+(?:-\p{Lu}\p{Ll}+)?)? (?:\p{Lu}[\p{Lu}'’-]+)(?: \p{Lu}[\p{Lu}'’-]+)*)",
    )
    .unwrap()
});

// Same shape anchored to the whole line, no trailing punctuation: the
// "name-only first line" case of delimiter-marked blocks.
static NAME_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\p{Lu}\p{Ll}+(?:-\p{Lu}\p{Ll}+)?(?: \p{Lu}\p{Ll}+(?:-\p{Lu}\p{Ll}+)?)? (?:\p{Lu}[\p{Lu}'’-]+)(?: \p{Lu}[\p{Lu}'’-]+)*$",
    )
    .unwrap()
});

// Loose mixed-case shape for the single-guest inline form: two to four
// capitalized tokens ("Jean Dupont", "Anne-Marie Le Guen").
static MIXED_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\p{Lu}[\p{Ll}\p{Lu}'’-]+(?: \p{Lu}[\p{Ll}\p{Lu}'’-]+){1,3}$").unwrap()
});

/// One (name, role) pair as segmented; names are still uncorrected and role
/// text uncleaned until normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestCandidate {
    pub name: String,
    pub role: String,
}

/// Split a free-text description into guest candidates. An empty result is
/// an expected outcome, not an error: not every description carries guest
/// structure.
pub fn segment(description: &str, cfg: &SegmentationConfig) -> Vec<GuestCandidate> {
    let text = description.trim();
    if text.is_empty() {
        return Vec::new();
    }

    if let Some(blocks) = split_marked_blocks(text, &cfg.block_markers) {
        return blocks
            .iter()
            .filter_map(|block| segment_block(block, cfg))
            .collect();
    }

    if let Some(tail) = after_prefix(text, &cfg.with_prefix) {
        return tail
            .lines()
            .map(str::trim)
            .filter(|l| l.chars().count() >= cfg.min_line_len)
            .filter_map(|l| split_name_role(l, cfg))
            .collect();
    }

    if let Some(candidate) = inline_single_guest(text, cfg) {
        return vec![candidate];
    }

    debug!("No guest pattern matched description: {:.60}…", text);
    Vec::new()
}

/// Shape 1: split on section-marker glyphs, discarding the preamble before
/// the first marker. Returns None when no marker occurs.
fn split_marked_blocks(text: &str, markers: &[String]) -> Option<Vec<String>> {
    if !markers.iter().any(|m| !m.is_empty() && text.contains(m.as_str())) {
        return None;
    }
    // Longest marker first so "▶️" is consumed before its bare "▶" prefix.
    let mut ordered: Vec<&String> = markers.iter().filter(|m| !m.is_empty()).collect();
    ordered.sort_by_key(|m| std::cmp::Reverse(m.len()));

    let mut sentinel = text.to_string();
    for marker in ordered {
        sentinel = sentinel.replace(marker.as_str(), "\u{1}");
    }

    let blocks: Vec<String> = sentinel
        .split('\u{1}')
        .skip(1) // preamble
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .collect();
    Some(blocks)
}

/// One delimiter-marked block: if the first line alone is a bare name and a
/// second line exists, the second line carries the role, so both lines form
/// the block text. Otherwise the first line stands alone.
fn segment_block(block: &str, cfg: &SegmentationConfig) -> Option<GuestCandidate> {
    let lines: Vec<&str> = block.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let first = lines.first()?;

    let text = if NAME_ONLY_RE.is_match(first) && lines.len() > 1 {
        format!("{} {}", first, lines[1])
    } else {
        first.to_string()
    };
    split_name_role(&text, cfg)
}

/// Shape 2 prefix: case-insensitive search, returns the text after it.
fn after_prefix<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return None;
    }
    let re = RegexBuilder::new(&regex::escape(prefix))
        .case_insensitive(true)
        .build()
        .ok()?;
    let m = re.find(text)?;
    Some(&text[m.end()..])
}

/// Shape 3: "Name, role, <marker> …". The name precedes the first comma and
/// the role is the span between the name and the trailing marker phrase.
fn inline_single_guest(text: &str, cfg: &SegmentationConfig) -> Option<GuestCandidate> {
    let (head, tail) = text.split_once(',')?;
    let name = head.trim();
    if !MIXED_NAME_RE.is_match(name) || !name_length_ok(name, cfg) {
        return None;
    }

    let marker_pos = cfg
        .trailing_markers
        .iter()
        .filter(|m| !m.is_empty())
        .filter_map(|m| tail.find(m.as_str()))
        .min()?;
    let role = tail[..marker_pos]
        .trim()
        .trim_end_matches(',')
        .trim()
        .to_string();

    Some(GuestCandidate {
        name: name.to_string(),
        role,
    })
}

/// Split "Jean DUPONT, économiste" at the name boundary; role text is the
/// remainder with leading separators stripped.
fn split_name_role(text: &str, cfg: &SegmentationConfig) -> Option<GuestCandidate> {
    let text = text.trim();
    let caps = NAME_CAPS_RE.captures(text)?;
    let m = caps.get(1).unwrap();
    let name = m.as_str().trim();
    if !name_length_ok(name, cfg) {
        return None;
    }
    let role = text[m.end()..]
        .trim_start_matches([',', '-', '–', '—', ':', ' '])
        .trim()
        .to_string();
    Some(GuestCandidate {
        name: name.to_string(),
        role,
    })
}

/// Guards against mis-segmented sentences masquerading as names.
fn name_length_ok(name: &str, cfg: &SegmentationConfig) -> bool {
    let len = name.chars().count();
    len >= cfg.min_name_len && len <= cfg.max_name_len
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SegmentationConfig {
        SegmentationConfig::default()
    }

    #[test]
    fn delimiter_marked_two_guests() {
        let pairs = segment(
            "▶️ Jean DUPONT, économiste\n▶️ Marie MARTIN, avocate",
            &cfg(),
        );
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].name, "Jean DUPONT");
        assert_eq!(pairs[0].role, "économiste");
        assert_eq!(pairs[1].name, "Marie MARTIN");
        assert_eq!(pairs[1].role, "avocate");
    }

    #[test]
    fn preamble_before_first_marker_is_discarded() {
        let pairs = segment(
            "Ce soir un grand débat sur l'économie.\n▶️ Jean DUPONT, économiste",
            &cfg(),
        );
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].name, "Jean DUPONT");
    }

    #[test]
    fn name_only_first_line_pulls_role_from_second_line() {
        let pairs = segment("▶️ Jean DUPONT\néconomiste au CNRS", &cfg());
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].name, "Jean DUPONT");
        assert_eq!(pairs[0].role, "économiste au CNRS");
    }

    #[test]
    fn prefix_marked_keeps_only_name_lines() {
        let pairs = segment(
            "Émission spéciale.\nAvec :\nJean DUPONT, économiste\nok\nMarie MARTIN, avocate",
            &cfg(),
        );
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].name, "Marie MARTIN");
        assert_eq!(pairs[1].role, "avocate");
    }

    #[test]
    fn prefix_match_is_case_insensitive() {
        let pairs = segment("AVEC : Jean DUPONT, économiste", &cfg());
        // Single line after the prefix still qualifies.
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].name, "Jean DUPONT");
    }

    #[test]
    fn inline_single_guest_shape() {
        let pairs = segment("Jean Dupont, économiste, répond aux questions", &cfg());
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].name, "Jean Dupont");
        assert_eq!(pairs[0].role, "économiste");
    }

    #[test]
    fn inline_without_trailing_marker_is_unsegmentable() {
        let pairs = segment("Jean Dupont, économiste au long cours", &cfg());
        assert!(pairs.is_empty());
    }

    #[test]
    fn plain_sentence_is_unsegmentable() {
        assert!(segment("Retour sur l'actualité de la semaine.", &cfg()).is_empty());
        assert!(segment("", &cfg()).is_empty());
    }

    #[test]
    fn diacritics_and_compound_names() {
        let pairs = segment("▶️ Jean-Pierre D'ARVOR, présentateur", &cfg());
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].name, "Jean-Pierre D'ARVOR");
        let pairs = segment("▶️ Éric LE GRAND, historien", &cfg());
        assert_eq!(pairs[0].name, "Éric LE GRAND");
    }

    #[test]
    fn name_length_bounds_reject_outliers() {
        let mut c = cfg();
        c.min_name_len = 12;
        // "Jean DUPONT" is 11 chars, below the configured minimum.
        assert!(segment("▶️ Jean DUPONT, économiste", &c).is_empty());
    }

    #[test]
    fn overlong_candidate_rejected() {
        let long = format!("▶️ Jean {}", "D".repeat(70));
        assert!(segment(&long, &cfg()).is_empty());
    }

    #[test]
    fn bare_glyph_marker_also_splits() {
        let pairs = segment("• Jean DUPONT, économiste", &cfg());
        assert_eq!(pairs.len(), 1);
    }
}
