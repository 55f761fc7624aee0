use scraper::Html;

use crate::config::{CompiledFields, CompiledStrategy};

/// One extracted raw field, tagged with the index of the strategy that
/// produced it (0 = primary selector, 1 = first fallback, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawField {
    pub value: Option<String>,
    pub strategy: Option<usize>,
}

impl RawField {
    fn absent() -> Self {
        RawField::default()
    }

    pub fn text(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Raw strings pulled off one item page. Lives only until normalization.
#[derive(Debug, Clone)]
pub struct RawItem {
    pub url: String,
    pub canonical_key: String,
    pub title: RawField,
    pub date_text: RawField,
    pub description: RawField,
    pub banner: RawField,
}

/// Apply every field's strategy chain to the document. A field with no
/// winning strategy is absent, never an error.
pub fn extract_item(url: &str, canonical_key: &str, doc: &Html, fields: &CompiledFields) -> RawItem {
    RawItem {
        url: url.to_string(),
        canonical_key: canonical_key.to_string(),
        title: apply_chain(doc, &fields.title),
        date_text: apply_chain(doc, &fields.date),
        description: apply_chain(doc, &fields.description),
        banner: apply_chain(doc, &fields.banner),
    }
}

/// Try strategies in order; first non-empty trimmed text wins and records
/// its index as provenance.
fn apply_chain(doc: &Html, chain: &[CompiledStrategy]) -> RawField {
    for (idx, strategy) in chain.iter().enumerate() {
        let candidate = match strategy {
            CompiledStrategy::Selector(sel) => doc
                .select(sel)
                .map(|el| tidy_text(&el.text().collect::<Vec<_>>().join("\n")))
                .find(|t| !t.is_empty()),
            CompiledStrategy::AnchorPhrase(phrase) => scan_text_nodes(doc, phrase),
            CompiledStrategy::Regex(re) => {
                let flat = flatten_text(doc);
                re.captures(&flat).map(|caps| {
                    let m = caps.get(1).unwrap_or_else(|| caps.get(0).unwrap());
                    tidy_text(m.as_str())
                })
            }
        };
        if let Some(text) = candidate {
            if !text.is_empty() {
                return RawField {
                    value: Some(text),
                    strategy: Some(idx),
                };
            }
        }
    }
    RawField::absent()
}

/// Text-scan fallback: the first leaf text node containing the anchor phrase
/// is the field's source. The only strategy immune to template drift.
fn scan_text_nodes(doc: &Html, phrase: &str) -> Option<String> {
    doc.root_element()
        .text()
        .find(|node| node.contains(phrase))
        .map(tidy_text)
}

/// All text nodes joined with newlines, for regex strategies.
fn flatten_text(doc: &Html) -> String {
    doc.root_element().text().collect::<Vec<_>>().join("\n")
}

/// Collapse horizontal whitespace per line but keep line boundaries; the
/// segmenter's heuristics are line-based.
fn tidy_text(s: &str) -> String {
    s.lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Tests ──
