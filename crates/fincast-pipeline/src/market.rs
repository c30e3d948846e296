//! Best-effort market snapshot sources.
//!
//! A snapshot is supplementary context: every failure here is logged and the
//! pipeline continues with an empty mapping.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use fincast_core::config::MarketSettings;
use fincast_core::traits::MarketDataSource;
use fincast_core::MarketSnapshot;

/// Ratios kept from the top-ratios list; everything else is dropped.
pub const DESIRED_RATIOS: [&str; 9] = [
    "Market Cap",
    "Current Price",
    "High / Low",
    "Stock P/E",
    "Book Value",
    "Dividend Yield",
    "ROCE",
    "ROE",
    "Face Value",
];

const USER_AGENT: &str = "Mozilla/5.0";

/// Scrapes the headline ratios of a screener.in company page.
pub struct ScreenerSource {
    http: reqwest::Client,
    url: String,
}

impl ScreenerSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).user_agent(USER_AGENT).build()?;
        Ok(Self { http, url: url.to_string() })
    }
}

#[async_trait]
impl MarketDataSource for ScreenerSource {
    fn name(&self) -> &str {
        "screener"
    }

    async fn fetch(&self) -> Result<MarketSnapshot> {
        let html = self.http.get(&self.url).send().await?.error_for_status()?.text().await?;
        parse_top_ratios(&html)
    }
}

/// Always returns the same snapshot.
pub struct StaticMarketSource {
    snapshot: MarketSnapshot,
}

impl StaticMarketSource {
    pub fn new(snapshot: MarketSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl MarketDataSource for StaticMarketSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> Result<MarketSnapshot> {
        Ok(self.snapshot.clone())
    }
}

/// Used when market data is disabled.
pub struct EmptyMarketSource;

#[async_trait]
impl MarketDataSource for EmptyMarketSource {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn fetch(&self) -> Result<MarketSnapshot> {
        Ok(MarketSnapshot::new())
    }
}

pub fn market_source_from_settings(settings: &MarketSettings) -> Result<Arc<dyn MarketDataSource>> {
    if !settings.enabled {
        tracing::info!("Market data disabled");
        return Ok(Arc::new(EmptyMarketSource));
    }
    Ok(Arc::new(ScreenerSource::new(&settings.url, Duration::from_secs(settings.timeout_secs))?))
}

/// Fetches a snapshot, degrading any failure to an empty mapping.
pub async fn fetch_or_empty(source: &dyn MarketDataSource) -> MarketSnapshot {
    match source.fetch().await {
        Ok(snapshot) => {
            tracing::info!(source = source.name(), entries = snapshot.len(), "market snapshot fetched");
            snapshot
        }
        Err(e) => {
            tracing::warn!(source = source.name(), "market data unavailable, continuing without it: {:#}", e);
            MarketSnapshot::new()
        }
    }
}

struct RatioPatterns {
    list: Regex,
    item: Regex,
    name: Regex,
    tag: Regex,
}

static PATTERNS: LazyLock<Result<RatioPatterns, regex::Error>> = LazyLock::new(|| {
    Ok(RatioPatterns {
        list: Regex::new(r#"(?s)<ul[^>]*\bid="top-ratios"[^>]*>(.*?)</ul>"#)?,
        item: Regex::new(r"(?s)<li[^>]*>(.*?)</li>")?,
        name: Regex::new(r#"(?s)<span[^>]*class="name"[^>]*>(.*?)</span>"#)?,
        tag: Regex::new(r"<[^>]+>")?,
    })
});

/// Extracts the desired ratios from the `<ul id="top-ratios">` list.
pub fn parse_top_ratios(html: &str) -> Result<MarketSnapshot> {
    let patterns = PATTERNS.as_ref().map_err(|e| anyhow!("invalid ratio pattern: {e}"))?;
    let list = patterns
        .list
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or_else(|| anyhow!("top-ratios list not found in page"))?;

    let mut snapshot = MarketSnapshot::new();
    for item in patterns.item.captures_iter(list.as_str()) {
        let Some(body) = item.get(1).map(|m| m.as_str()) else { continue };
        let Some(name) = patterns.name.captures(body) else { continue };
        let (Some(whole), Some(label)) = (name.get(0), name.get(1)) else { continue };
        let label = clean_text(&patterns.tag, label.as_str());
        if !DESIRED_RATIOS.contains(&label.as_str()) {
            continue;
        }
        // The value span nests number spans, so take everything after the label.
        let value = clean_text(&patterns.tag, &body[whole.end()..]);
        if !value.is_empty() {
            snapshot.insert(label, value);
        }
    }
    Ok(snapshot)
}

fn clean_text(tag: &Regex, fragment: &str) -> String {
    let text = tag.replace_all(fragment, " ");
    let text = text.replace("&nbsp;", " ").replace("&amp;", "&").replace("&#8377;", "₹");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_patterns_compile() {
        assert!(PATTERNS.as_ref().is_ok());
    }

    #[test]
    fn clean_text_collapses_whitespace_and_tags() {
        let tag = Regex::new(r"<[^>]+>").unwrap();
        assert_eq!(clean_text(&tag, "\n  ₹ <span class=\"number\">14,62,339</span>\n Cr. "), "₹ 14,62,339 Cr.");
    }
}
