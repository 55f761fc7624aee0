use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use scraper::Html;
use tracing::debug;
use url::Url;

use crate::config::DelayRange;

const USER_AGENT: &str = concat!("guest_scraper/", env!("CARGO_PKG_VERSION"));
const TIMEOUT_SECS: u64 = 30;

/// Typed fetch failure. A value, not an exception: the pipeline records it
/// and moves on to the next URL.
#[derive(Debug, Clone, thiserror::Error)]
#[error("fetch failed for {url}: {reason}")]
pub struct FetchFailure {
    pub url: String,
    pub reason: String,
}

/// The transport collaborator. The core never retries at this layer; retry
/// policy, if any, belongs to the implementation behind this trait.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<Html, FetchFailure>;
}

/// Blocking HTTP fetcher with a bounded random politeness delay between
/// consecutive requests to the same origin.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    default_delay: DelayRange,
    origin_delays: HashMap<String, DelayRange>,
    last_hit: RefCell<HashMap<String, Instant>>,
}

impl HttpFetcher {
    pub fn new(delay: DelayRange) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()?;
        Ok(HttpFetcher {
            client,
            default_delay: delay,
            origin_delays: HashMap::new(),
            last_hit: RefCell::new(HashMap::new()),
        })
    }

    /// Delay bounds for one origin, overriding the default. When the same
    /// origin is configured twice, the widest bounds win.
    pub fn set_origin_delay(&mut self, origin: &str, delay: DelayRange) {
        self.origin_delays
            .entry(origin.to_string())
            .and_modify(|d| {
                d.min_ms = d.min_ms.max(delay.min_ms);
                d.max_ms = d.max_ms.max(delay.max_ms);
            })
            .or_insert(delay);
    }

    /// Sleep a random duration in [min_ms, max_ms] when the same origin was
    /// hit before. Rate-limiting contract only, not correctness.
    fn polite_wait(&self, url: &str) {
        let origin = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_else(|| url.to_string());
        let delay = self
            .origin_delays
            .get(&origin)
            .copied()
            .unwrap_or(self.default_delay);

        let seen = self.last_hit.borrow().contains_key(&origin);
        if seen && delay.max_ms > 0 {
            let ms = fastrand::u64(delay.min_ms..=delay.max_ms.max(delay.min_ms));
            std::thread::sleep(Duration::from_millis(ms));
        }
        self.last_hit.borrow_mut().insert(origin, Instant::now());
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Html, FetchFailure> {
        self.polite_wait(url);

        let start = Instant::now();
        let response = self.client.get(url).send().map_err(|e| FetchFailure {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        let body = response.text().map_err(|e| FetchFailure {
            url: url.to_string(),
            reason: format!("body read failed: {}", e),
        })?;
        debug!(
            "Fetched {} ({} bytes, {} ms)",
            url,
            body.len(),
            start.elapsed().as_millis()
        );

        Ok(Html::parse_document(&body))
    }
}
