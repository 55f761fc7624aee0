use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::config::{CompiledSource, ConfigError, SourceConfig};
use crate::dedup::dedup_entries;
use crate::discover::discover_items;
use crate::extract::{extract_item, RawItem};
use crate::fetch::PageFetcher;
use crate::normalize::{clean_text, normalize_item, parse_date_text};
use crate::record::{ExtractionFailure, FailureStage, GuestEntry, SourceStats};
use crate::segment::segment;

/// Best-effort result of a run: the record table plus everything that was
/// lost and why. A run always completes; only configuration errors abort.
#[derive(Debug)]
pub struct RunOutput {
    pub records: Vec<GuestEntry>,
    pub failures: Vec<ExtractionFailure>,
    pub stats: Vec<SourceStats>,
}

/// Run the whole pipeline over the given sources. Configuration is compiled
/// up front, so the one fatal error class surfaces before any fetch.
pub fn run(sources: &[SourceConfig], fetcher: &dyn PageFetcher) -> Result<RunOutput, ConfigError> {
    let compiled: Vec<CompiledSource> = sources
        .iter()
        .map(|s| s.compile())
        .collect::<Result<_, _>>()?;

    let mut records = Vec::new();
    let mut failures = Vec::new();
    let mut stats = Vec::new();

    for source in &compiled {
        let s = run_source(source, fetcher, &mut records, &mut failures);
        info!(
            "{}: {} discovered, {} fetched ok, {} fetch errors, {} entries",
            s.source, s.discovered, s.fetched_ok, s.fetch_errors, s.entries,
        );
        stats.push(s);
    }

    let before = records.len();
    let records = dedup_entries(records);
    if records.len() < before {
        debug!("Deduplicated {} -> {} entries", before, records.len());
    }

    Ok(RunOutput {
        records,
        failures,
        stats,
    })
}

fn run_source(
    source: &CompiledSource,
    fetcher: &dyn PageFetcher,
    records: &mut Vec<GuestEntry>,
    failures: &mut Vec<ExtractionFailure>,
) -> SourceStats {
    let name = &source.config.name;
    let items = discover_items(source, fetcher, failures);

    let mut stats = SourceStats {
        source: name.clone(),
        discovered: items.len(),
        ..Default::default()
    };

    let pb = ProgressBar::new(items.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    for item in items {
        pb.inc(1);
        let doc = match fetcher.fetch(&item.url) {
            Ok(doc) => doc,
            Err(e) => {
                // One item's failure never blocks its siblings.
                warn!("{}: {}", name, e);
                failures.push(ExtractionFailure {
                    url: item.url.clone(),
                    stage: FailureStage::Fetch,
                    reason: e.reason,
                });
                stats.fetch_errors += 1;
                continue;
            }
        };
        stats.fetched_ok += 1;

        let raw = extract_item(&item.url, &item.canonical_key, &doc, &source.fields);
        let entries = process_item(source, &raw);
        stats.entries += entries.len();
        records.extend(entries);
    }

    pb.finish_and_clear();
    stats
}

/// Segment + normalize one fetched item. Zero entries is an expected
/// outcome; the itemless placeholder row is opt-in per source.
fn process_item(source: &CompiledSource, raw: &RawItem) -> Vec<GuestEntry> {
    let candidates = match raw.description.text() {
        Some(desc) => segment(desc, &source.config.segmentation),
        None => Vec::new(),
    };
    if candidates.is_empty() {
        debug!(
            "{}: no guest structure in {}",
            source.config.name, raw.canonical_key
        );
    }

    // A window-dropped item leaves no trace at all; the placeholder branch
    // below is only for items that survived normalization guestless.
    let Some(entries) = normalize_item(raw, candidates, &source.config) else {
        return Vec::new();
    };
    if entries.is_empty() && source.config.emit_itemless_rows {
        let title = raw.title.text().map(clean_text).filter(|t| !t.is_empty());
        let date = raw.date_text.text().and_then(parse_date_text);
        return vec![GuestEntry::itemless(&raw.canonical_key, title, date)];
    }
    entries
}

// ── Tests ──
