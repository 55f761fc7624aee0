use std::io::Write;

use anyhow::Result;

use crate::record::GuestEntry;

const COLUMNS: &[&str] = &[
    "item_id",
    "title",
    "canonical_date",
    "guest_name",
    "guest_role_text",
    "raw_description",
];

/// Write the record table as CSV with a fixed column order and header row.
pub fn write_csv<W: Write>(out: &mut W, records: &[GuestEntry]) -> Result<()> {
    writeln!(out, "{}", COLUMNS.join(","))?;
    for r in records {
        let row = [
            csv_field(&r.item_id),
            csv_field(r.title.as_deref().unwrap_or("")),
            csv_field(
                &r.canonical_date
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            ),
            csv_field(r.guest_name.as_deref().unwrap_or("")),
            csv_field(r.guest_role_text.as_deref().unwrap_or("")),
            csv_field(r.raw_description.as_deref().unwrap_or("")),
        ];
        writeln!(out, "{}", row.join(","))?;
    }
    Ok(())
}

/// One serialized record per line.
pub fn write_jsonl<W: Write>(out: &mut W, records: &[GuestEntry]) -> Result<()> {
    for r in records {
        serde_json::to_writer(&mut *out, r)?;
        writeln!(out)?;
    }
    Ok(())
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn entry() -> GuestEntry {
        GuestEntry {
            item_id: "https://example.org/ep-1".into(),
            title: Some("Grand débat".into()),
            canonical_date: NaiveDate::from_ymd_opt(2024, 3, 3),
            guest_name: Some("Jean Dupont".into()),
            guest_role_text: Some("économiste, essayiste".into()),
            raw_description: None,
        }
    }

    #[test]
    fn csv_has_header_and_quotes_commas() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[entry()]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "item_id,title,canonical_date,guest_name,guest_role_text,raw_description"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("2024-03-03"));
        assert!(row.contains("\"économiste, essayiste\""));
    }

    #[test]
    fn csv_escapes_embedded_quotes() {
        let mut e = entry();
        e.guest_role_text = Some("dit \"le prof\"".into());
        let mut buf = Vec::new();
        write_csv(&mut buf, &[e]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\"dit \"\"le prof\"\"\""));
    }

    #[test]
    fn jsonl_one_record_per_line() {
        let mut buf = Vec::new();
        write_jsonl(&mut buf, &[entry(), entry()]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2);
        let v: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(v["guest_name"], "Jean Dupont");
        assert_eq!(v["canonical_date"], "2024-03-03");
    }
}
