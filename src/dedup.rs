use std::collections::HashSet;

use crate::record::GuestEntry;

/// Collapse exact duplicates on (item_id, guest_name, guest_role_text),
/// first-seen retained, then sort by the same key so output order never
/// depends on fetch order.
pub fn dedup_entries(entries: Vec<GuestEntry>) -> Vec<GuestEntry> {
    let mut seen = HashSet::new();
    let mut out: Vec<GuestEntry> = entries
        .into_iter()
        .filter(|e| seen.insert(e.dedup_key()))
        .collect();
    out.sort_by(|a, b| a.dedup_key().cmp(&b.dedup_key()));
    out
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(item: &str, name: &str, role: &str) -> GuestEntry {
        GuestEntry {
            item_id: item.to_string(),
            title: None,
            canonical_date: None,
            guest_name: Some(name.to_string()),
            guest_role_text: Some(role.to_string()),
            raw_description: None,
        }
    }

    #[test]
    fn identical_key_collapses_to_one_row() {
        let out = dedup_entries(vec![
            entry("ep-1", "Jean Dupont", "économiste"),
            entry("ep-1", "Jean Dupont", "économiste"),
        ]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn same_name_different_role_both_kept() {
        let out = dedup_entries(vec![
            entry("ep-1", "Jean Dupont", "économiste"),
            entry("ep-1", "Jean Dupont", "essayiste"),
        ]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn first_seen_wins() {
        let mut a = entry("ep-1", "Jean Dupont", "économiste");
        a.title = Some("first".into());
        let mut b = entry("ep-1", "Jean Dupont", "économiste");
        b.title = Some("second".into());
        let out = dedup_entries(vec![a, b]);
        assert_eq!(out[0].title.as_deref(), Some("first"));
    }

    #[test]
    fn output_sorted_by_key_not_arrival() {
        let out = dedup_entries(vec![
            entry("ep-2", "Marie Martin", "avocate"),
            entry("ep-1", "Jean Dupont", "économiste"),
        ]);
        assert_eq!(out[0].item_id, "ep-1");
        assert_eq!(out[1].item_id, "ep-2");
    }
}
