//! Web search client
//!
//! Scrapes the DuckDuckGo HTML endpoint, which needs no API key. Result
//! extraction is regex based: each `result__a` anchor opens a hit and the
//! first `result__snippet` before the next anchor is its body.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::ResearchConfig;

/// One organic search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub body: String,
    pub url: String,
}

impl SearchHit {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            url: String::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search endpoint returned status {0}")]
    Status(StatusCode),

    #[error("search backend unavailable: {0}")]
    Unavailable(String),
}

/// Text search capability: a query and a result bound in, hits out.
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn text(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;
}

static RESULT_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<a([^>]*class="[^"]*result__a[^"]*"[^>]*)>(.*?)</a>"#)
        .expect("result link pattern")
});

static RESULT_SNIPPET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)class="[^"]*result__snippet[^"]*"[^>]*>(.*?)</(?:a|div|td|span)>"#)
        .expect("result snippet pattern")
});

static HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href="([^"]*)""#).expect("href pattern"));

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));

pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; toolroute/0.1)")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &ResearchConfig) -> Self {
        Self::new(
            config.search_endpoint.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }
}

#[async_trait]
impl SearchService for DuckDuckGoSearch {
    async fn text(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        tracing::debug!("[DuckDuckGo] Searching for: {}", query);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("[DuckDuckGo] Endpoint returned {}", status);
            return Err(SearchError::Status(status));
        }

        let html = response.text().await?;
        let hits = parse_results(&html, max_results);
        tracing::debug!("[DuckDuckGo] Parsed {} results", hits.len());
        Ok(hits)
    }
}

/// Extracts at most `max_results` hits from a DuckDuckGo HTML results page.
pub fn parse_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let links: Vec<_> = RESULT_LINK.captures_iter(html).collect();
    let mut hits = Vec::new();

    for (i, link) in links.iter().enumerate() {
        if hits.len() >= max_results {
            break;
        }

        let (Some(whole), Some(attrs), Some(title_html)) = (link.get(0), link.get(1), link.get(2))
        else {
            continue;
        };

        let title = clean_text(title_html.as_str());
        if title.is_empty() {
            continue;
        }

        let segment_end = links
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(html.len());
        let segment = &html[whole.end()..segment_end];

        let body = RESULT_SNIPPET
            .captures(segment)
            .and_then(|c| c.get(1))
            .map(|m| clean_text(m.as_str()))
            .unwrap_or_default();

        let url = HREF
            .captures(attrs.as_str())
            .and_then(|c| c.get(1))
            .map(|m| normalize_url(&decode_entities(m.as_str())))
            .unwrap_or_default();

        hits.push(SearchHit { title, body, url });
    }

    hits
}

fn clean_text(html: &str) -> String {
    let stripped = TAG.replace_all(html, "");
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn normalize_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}
