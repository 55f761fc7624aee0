use std::collections::HashMap;

use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Configuration problems are the one fatal error class: they are caught by
/// `SourceConfig::compile` before any fetch happens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("source `{name}`: no listing URLs configured")]
    NoListingUrls { name: String },
    #[error("source `{name}`: invalid base URL `{url}`: {reason}")]
    BadBaseUrl {
        name: String,
        url: String,
        reason: String,
    },
    #[error("source `{name}`: empty strategy chain for required field `{field}`")]
    EmptyChain { name: String, field: &'static str },
    #[error("source `{name}`: invalid selector `{selector}`: {reason}")]
    BadSelector {
        name: String,
        selector: String,
        reason: String,
    },
    #[error("source `{name}`: invalid regex `{pattern}`: {reason}")]
    BadRegex {
        name: String,
        pattern: String,
        reason: String,
    },
    #[error("source `{name}`: empty anchor phrase in strategy chain")]
    EmptyAnchorPhrase { name: String },
    #[error("source `{name}`: name length bounds are inverted ({min} > {max})")]
    BadNameBounds {
        name: String,
        min: usize,
        max: usize,
    },
}

/// One extraction strategy. Chains are tried in order; the first strategy
/// producing non-empty trimmed text wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// CSS selector; text of the first matching element that has any.
    Selector { selector: String },
    /// Scan all leaf text nodes for one containing this phrase. Immune to
    /// template drift, so it usually sits last in the chain.
    AnchorPhrase { phrase: String },
    /// Regex over the document's flattened text; capture group 1 if present,
    /// whole match otherwise.
    Regex { pattern: String },
}

/// Per-field strategy chains. Title and description are required to have at
/// least one strategy; date and banner chains may be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldStrategies {
    #[serde(default)]
    pub title: Vec<Strategy>,
    #[serde(default)]
    pub date: Vec<Strategy>,
    #[serde(default)]
    pub description: Vec<Strategy>,
    #[serde(default)]
    pub banner: Vec<Strategy>,
}

/// Heuristics for splitting a description into (name, role) pairs.
/// Thresholds are empirical and source-specific; they are configuration,
/// not inferred rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Guest-block separator glyphs (shape 1).
    #[serde(default = "default_block_markers")]
    pub block_markers: Vec<String>,
    /// Introductory phrase marking a guest list (shape 2), e.g. "Avec :".
    #[serde(default = "default_with_prefix")]
    pub with_prefix: String,
    /// Trailing marker phrases bounding the role in the inline shape (3).
    #[serde(default = "default_trailing_markers")]
    pub trailing_markers: Vec<String>,
    #[serde(default = "default_min_name_len")]
    pub min_name_len: usize,
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,
    /// Lines shorter than this are discarded as noise in shape 2.
    #[serde(default = "default_min_line_len")]
    pub min_line_len: usize,
}

fn default_block_markers() -> Vec<String> {
    ["▶️", "▶", "►", "➤", "•"].iter().map(|s| s.to_string()).collect()
}
fn default_with_prefix() -> String {
    "avec :".to_string()
}
fn default_trailing_markers() -> Vec<String> {
    ["répond", "débat"].iter().map(|s| s.to_string()).collect()
}
fn default_min_name_len() -> usize {
    5
}
fn default_max_name_len() -> usize {
    60
}
fn default_min_line_len() -> usize {
    8
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        SegmentationConfig {
            block_markers: default_block_markers(),
            with_prefix: default_with_prefix(),
            trailing_markers: default_trailing_markers(),
            min_name_len: default_min_name_len(),
            max_name_len: default_max_name_len(),
            min_line_len: default_min_line_len(),
        }
    }
}

/// Inclusive date window outside of which a source's records are dropped.
/// Only set for sources documented as unreliable outside a known-good range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: Option<chrono::NaiveDate>,
    pub to: Option<chrono::NaiveDate>,
}

/// Politeness delay bounds between consecutive fetches to the same origin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for DelayRange {
    fn default() -> Self {
        DelayRange {
            min_ms: 500,
            max_ms: 1500,
        }
    }
}

/// Everything source-specific: one of these per archive replaces one
/// hand-written script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    /// Origin used to resolve relative links.
    pub base_url: String,
    /// Root listing URLs; pagination is discovered from these.
    pub listing_urls: Vec<String>,
    /// Regex an absolute URL must match to count as an item link.
    pub item_link_pattern: String,
    /// Regex stripped from an item URL to form its canonical key
    /// (language/format variant collapsing).
    #[serde(default)]
    pub variant_suffix: Option<String>,
    /// CSS selectors locating pagination-continuation links.
    #[serde(default)]
    pub pagination_selectors: Vec<String>,
    pub fields: FieldStrategies,
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    /// Exact-match corrections: observed spelling -> canonical name.
    #[serde(default)]
    pub corrections: HashMap<String, String>,
    #[serde(default)]
    pub validity_window: Option<DateWindow>,
    /// Emit one placeholder row for items with no surviving guests.
    #[serde(default)]
    pub emit_itemless_rows: bool,
    #[serde(default)]
    pub delay: DelayRange,
}

impl SourceConfig {
    /// Compile selectors and regexes up front. Any error here aborts the run
    /// before the first fetch.
    pub fn compile(&self) -> Result<CompiledSource, ConfigError> {
        if self.listing_urls.is_empty() {
            return Err(ConfigError::NoListingUrls {
                name: self.name.clone(),
            });
        }
        let base = Url::parse(&self.base_url).map_err(|e| ConfigError::BadBaseUrl {
            name: self.name.clone(),
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if self.segmentation.min_name_len > self.segmentation.max_name_len {
            return Err(ConfigError::BadNameBounds {
                name: self.name.clone(),
                min: self.segmentation.min_name_len,
                max: self.segmentation.max_name_len,
            });
        }

        let item_link = self.compile_regex(&self.item_link_pattern)?;
        let variant_suffix = self
            .variant_suffix
            .as_deref()
            .map(|p| self.compile_regex(p))
            .transpose()?;
        let pagination = self
            .pagination_selectors
            .iter()
            .map(|s| self.compile_selector(s))
            .collect::<Result<Vec<_>, _>>()?;

        let fields = CompiledFields {
            title: self.compile_chain("title", &self.fields.title, true)?,
            date: self.compile_chain("date", &self.fields.date, false)?,
            description: self.compile_chain("description", &self.fields.description, true)?,
            banner: self.compile_chain("banner", &self.fields.banner, false)?,
        };

        Ok(CompiledSource {
            config: self.clone(),
            base,
            item_link,
            variant_suffix,
            pagination,
            fields,
        })
    }

    fn compile_chain(
        &self,
        field: &'static str,
        chain: &[Strategy],
        required: bool,
    ) -> Result<Vec<CompiledStrategy>, ConfigError> {
        if required && chain.is_empty() {
            return Err(ConfigError::EmptyChain {
                name: self.name.clone(),
                field,
            });
        }
        chain
            .iter()
            .map(|s| match s {
                Strategy::Selector { selector } => {
                    Ok(CompiledStrategy::Selector(self.compile_selector(selector)?))
                }
                Strategy::AnchorPhrase { phrase } => {
                    if phrase.trim().is_empty() {
                        Err(ConfigError::EmptyAnchorPhrase {
                            name: self.name.clone(),
                        })
                    } else {
                        Ok(CompiledStrategy::AnchorPhrase(phrase.clone()))
                    }
                }
                Strategy::Regex { pattern } => {
                    Ok(CompiledStrategy::Regex(self.compile_regex(pattern)?))
                }
            })
            .collect()
    }

    fn compile_selector(&self, selector: &str) -> Result<Selector, ConfigError> {
        Selector::parse(selector).map_err(|e| ConfigError::BadSelector {
            name: self.name.clone(),
            selector: selector.to_string(),
            reason: e.to_string(),
        })
    }

    fn compile_regex(&self, pattern: &str) -> Result<Regex, ConfigError> {
        Regex::new(pattern).map_err(|e| ConfigError::BadRegex {
            name: self.name.clone(),
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
    }
}

/// A compiled extraction strategy, ready to apply to a document.
#[derive(Debug, Clone)]
pub enum CompiledStrategy {
    Selector(Selector),
    AnchorPhrase(String),
    Regex(Regex),
}

#[derive(Debug, Clone)]
pub struct CompiledFields {
    pub title: Vec<CompiledStrategy>,
    pub date: Vec<CompiledStrategy>,
    pub description: Vec<CompiledStrategy>,
    pub banner: Vec<CompiledStrategy>,
}

/// A source with every selector and regex compiled.
#[derive(Debug, Clone)]
pub struct CompiledSource {
    pub config: SourceConfig,
    pub base: Url,
    pub item_link: Regex,
    pub variant_suffix: Option<Regex>,
    pub pagination: Vec<Selector>,
    pub fields: CompiledFields,
}

// ── Tests ──
