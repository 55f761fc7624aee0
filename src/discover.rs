use std::collections::{HashSet, VecDeque};

use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::CompiledSource;
use crate::fetch::PageFetcher;
use crate::record::{ExtractionFailure, FailureStage};

/// An item URL plus its canonical key (variant suffix stripped).
#[derive(Debug, Clone)]
pub struct DiscoveredItem {
    pub url: String,
    pub canonical_key: String,
}

/// Walk the source's listing pages (following pagination) and return every
/// item URL in discovery order, one per canonical key. Listing pages that
/// fail to fetch contribute zero items and a failure record; they never
/// abort discovery.
pub fn discover_items(
    source: &CompiledSource,
    fetcher: &dyn PageFetcher,
    failures: &mut Vec<ExtractionFailure>,
) -> Vec<DiscoveredItem> {
    let mut queue: VecDeque<String> = source.config.listing_urls.iter().cloned().collect();
    let mut visited_listings: HashSet<String> = queue.iter().cloned().collect();
    let mut seen_keys: HashSet<String> = HashSet::new();
    let mut items = Vec::new();

    while let Some(listing_url) = queue.pop_front() {
        let doc = match fetcher.fetch(&listing_url) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Listing fetch failed: {}", e);
                failures.push(ExtractionFailure {
                    url: listing_url,
                    stage: FailureStage::Discovery,
                    reason: e.reason,
                });
                continue;
            }
        };

        let before = items.len();
        collect_item_links(source, &doc, &mut seen_keys, &mut items);
        debug!(
            "{}: {} item links on {}",
            source.config.name,
            items.len() - before,
            listing_url
        );

        // Pagination continuation; none found means this page is terminal.
        for next in pagination_links(source, &doc) {
            if visited_listings.insert(next.clone()) {
                queue.push_back(next);
            }
        }
    }

    info!(
        "{}: discovered {} items across {} listing pages",
        source.config.name,
        items.len(),
        visited_listings.len()
    );
    items
}

fn collect_item_links(
    source: &CompiledSource,
    doc: &Html,
    seen_keys: &mut HashSet<String>,
    items: &mut Vec<DiscoveredItem>,
) {
    let anchors = Selector::parse("a[href]").unwrap();
    for el in doc.select(&anchors) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let Some(abs) = resolve(&source.base, href) else {
            continue;
        };
        // Same-origin only; navigation, ads and cross-domain links fall out
        // of the item pattern anyway, but host check is cheaper first.
        if abs.host_str() != source.base.host_str() {
            continue;
        }
        let url = abs.to_string();
        if !source.item_link.is_match(&url) {
            continue;
        }
        let key = canonical_key(source, &url);
        // First-encountered variant wins, discovery order preserved.
        if seen_keys.insert(key.clone()) {
            items.push(DiscoveredItem {
                url,
                canonical_key: key,
            });
        }
    }
}

fn pagination_links(source: &CompiledSource, doc: &Html) -> Vec<String> {
    let mut links = Vec::new();
    for sel in &source.pagination {
        for el in doc.select(sel) {
            let Some(href) = el.value().attr("href") else {
                continue;
            };
            let Some(abs) = resolve(&source.base, href) else {
                continue;
            };
            if abs.host_str() == source.base.host_str() {
                links.push(abs.to_string());
            }
        }
    }
    links
}

fn resolve(base: &Url, href: &str) -> Option<Url> {
    base.join(href).ok()
}

/// Strip the variant suffix (if configured) to collapse language/format
/// variants of one logical item onto a single key.
pub fn canonical_key(source: &CompiledSource, url: &str) -> String {
    match &source.variant_suffix {
        Some(re) => re.replace_all(url, "").to_string(),
        None => url.to_string(),
    }
}

// ── Tests ──
