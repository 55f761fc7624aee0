use chrono::NaiveDate;
use serde::Serialize;

/// One normalized guest row. The durable output of a run; everything else
/// (listing pages, raw items) lives only for the duration of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuestEntry {
    /// Canonical item URL (variant suffix stripped).
    pub item_id: String,
    pub title: Option<String>,
    pub canonical_date: Option<NaiveDate>,
    /// Absent only on itemless placeholder rows (see `emit_itemless_rows`).
    pub guest_name: Option<String>,
    pub guest_role_text: Option<String>,
    pub raw_description: Option<String>,
}

impl GuestEntry {
    /// Placeholder row for an item that yielded no guests.
    pub fn itemless(item_id: &str, title: Option<String>, date: Option<NaiveDate>) -> Self {
        GuestEntry {
            item_id: item_id.to_string(),
            title,
            canonical_date: date,
            guest_name: None,
            guest_role_text: None,
            raw_description: None,
        }
    }

    /// Final uniqueness key: (item_id, guest_name, guest_role_text).
    pub fn dedup_key(&self) -> (String, Option<String>, Option<String>) {
        (
            self.item_id.clone(),
            self.guest_name.clone(),
            self.guest_role_text.clone(),
        )
    }
}

/// Pipeline stage a failure was recorded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// A listing page failed to fetch; it contributed zero items.
    Discovery,
    /// An item page failed to fetch; the item was skipped.
    Fetch,
}

/// A failure is a value handed back to the caller, never an exception
/// crossing a stage boundary.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionFailure {
    pub url: String,
    pub stage: FailureStage,
    pub reason: String,
}

/// Per-source counters printed after a run.
#[derive(Debug, Clone, Default)]
pub struct SourceStats {
    pub source: String,
    pub discovered: usize,
    pub fetched_ok: usize,
    pub fetch_errors: usize,
    pub entries: usize,
}

impl SourceStats {
    pub fn print(&self) {
        println!(
            "{}: {} items discovered, {} fetched ok, {} fetch errors, {} entries",
            self.source, self.discovered, self.fetched_ok, self.fetch_errors, self.entries,
        );
    }
}
