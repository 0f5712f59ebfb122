// src/services/research.rs
//! Pesticide research search across the EU pesticides database and FAO AGRIS.

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{info, warn};
use regex::Regex;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::GardenError;
use crate::models::{ResearchFinding, ResearchReport, ResearchSource};

const MAX_FINDINGS_PER_SOURCE: usize = 20;

lazy_static! {
    static ref TABLE_ROW: Regex = Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").unwrap();
    static ref TABLE_CELL: Regex = Regex::new(r"(?is)<td[^>]*>(.*?)</td>").unwrap();
    static ref LINK: Regex =
        Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#).unwrap();
    static ref AGRIS_RESULT: Regex = Regex::new(
        r#"(?is)<h[2-4][^>]*>\s*<a\s[^>]*?href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>\s*</h[2-4]>(?:\s*<(?:p|div)[^>]*>(.*?)</(?:p|div)>)?"#
    )
    .unwrap();
    static ref TAG: Regex = Regex::new(r"(?s)<[^>]+>").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

#[async_trait]
pub trait ResearchBackend: Send + Sync {
    fn source(&self) -> ResearchSource;

    async fn search(&self, query: &str) -> Result<Vec<ResearchFinding>, GardenError>;
}

/// EU pesticides database active-substance listing.
pub struct EuPesticidesBackend {
    client: Client,
    url: String,
}

impl EuPesticidesBackend {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl ResearchBackend for EuPesticidesBackend {
    fn source(&self) -> ResearchSource {
        ResearchSource::Eu
    }

    async fn search(&self, query: &str) -> Result<Vec<ResearchFinding>, GardenError> {
        let html = fetch_html(&self.client, &self.url, &[("search", query)]).await?;
        Ok(parse_eu_substances(&html, query, &self.url))
    }
}

/// FAO AGRIS bibliographic search.
pub struct AgrisBackend {
    client: Client,
    url: String,
}

impl AgrisBackend {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl ResearchBackend for AgrisBackend {
    fn source(&self) -> ResearchSource {
        ResearchSource::Agris
    }

    async fn search(&self, query: &str) -> Result<Vec<ResearchFinding>, GardenError> {
        let html = fetch_html(&self.client, &self.url, &[("query", query)]).await?;
        Ok(parse_agris_results(&html, &self.url))
    }
}

async fn fetch_html(client: &Client, url: &str, query: &[(&str, &str)]) -> Result<String, GardenError> {
    let response = client
        .get(url)
        .query(query)
        .header("Accept", "text/html")
        .send()
        .await
        .map_err(|e| GardenError::Research(format!("{} request failed: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(GardenError::Research(format!("{} returned {}", url, status)));
    }

    response
        .text()
        .await
        .map_err(|e| GardenError::Research(format!("Failed to read {} body: {}", url, e)))
}

#[derive(Clone)]
pub struct ResearchClient {
    eu: Arc<dyn ResearchBackend>,
    agris: Arc<dyn ResearchBackend>,
}

impl ResearchClient {
    pub fn new(eu: Arc<dyn ResearchBackend>, agris: Arc<dyn ResearchBackend>) -> Self {
        Self { eu, agris }
    }

    pub fn from_config(client: Client, config: &Config) -> Self {
        Self::new(
            Arc::new(EuPesticidesBackend::new(
                client.clone(),
                config.eu_pesticides_url.clone(),
            )),
            Arc::new(AgrisBackend::new(client, config.agris_search_url.clone())),
        )
    }

    /// Query both sources concurrently. A failing source contributes no
    /// findings and is reported in `failed_sources`.
    pub async fn search(&self, query: &str) -> ResearchReport {
        let query = query.trim();
        let (eu, agris) = tokio::join!(self.eu.search(query), self.agris.search(query));

        let mut findings = Vec::new();
        let mut failed_sources = Vec::new();
        for (source, outcome) in [(self.eu.source(), eu), (self.agris.source(), agris)] {
            match outcome {
                Ok(found) => {
                    info!("{:?} research returned {} findings for '{}'", source, found.len(), query);
                    findings.extend(found);
                }
                Err(e) => {
                    warn!("{:?} research source failed: {}", source, e);
                    failed_sources.push(source);
                }
            }
        }

        ResearchReport {
            query: query.to_string(),
            findings: dedupe_by_title(findings),
            failed_sources,
        }
    }
}

fn dedupe_by_title(findings: Vec<ResearchFinding>) -> Vec<ResearchFinding> {
    let mut seen = HashSet::new();
    findings
        .into_iter()
        .filter(|f| seen.insert(f.title.to_lowercase()))
        .collect()
}

/// Rows of the active-substance table whose name contains `query`.
/// The first cell is the substance; the rest become the detail line.
pub fn parse_eu_substances(html: &str, query: &str, base_url: &str) -> Vec<ResearchFinding> {
    let needle = query.trim().to_lowercase();

    TABLE_ROW
        .captures_iter(html)
        .filter_map(|row| {
            let cells: Vec<&str> = TABLE_CELL
                .captures_iter(&row[1])
                .filter_map(|c| c.get(1).map(|m| m.as_str()))
                .collect();
            let (first, rest) = cells.split_first()?;

            let title = strip_tags(first);
            if title.is_empty() || (!needle.is_empty() && !title.to_lowercase().contains(&needle)) {
                return None;
            }

            let url = LINK
                .captures(first)
                .map(|link| resolve_url(base_url, &link[1]));
            let detail = rest
                .iter()
                .map(|cell| strip_tags(cell))
                .filter(|cell| !cell.is_empty())
                .collect::<Vec<_>>()
                .join(" | ");

            Some(ResearchFinding {
                source: ResearchSource::Eu,
                title,
                url,
                detail: (!detail.is_empty()).then_some(detail),
            })
        })
        .take(MAX_FINDINGS_PER_SOURCE)
        .collect()
}

/// Result headings (`<h2..h4><a href>title</a></h..>`) with the
/// paragraph that follows as the snippet.
pub fn parse_agris_results(html: &str, base_url: &str) -> Vec<ResearchFinding> {
    AGRIS_RESULT
        .captures_iter(html)
        .filter_map(|result| {
            let title = strip_tags(&result[2]);
            if title.is_empty() {
                return None;
            }
            let detail = result
                .get(3)
                .map(|m| strip_tags(m.as_str()))
                .filter(|d| !d.is_empty());

            Some(ResearchFinding {
                source: ResearchSource::Agris,
                title,
                url: Some(resolve_url(base_url, &result[1])),
                detail,
            })
        })
        .take(MAX_FINDINGS_PER_SOURCE)
        .collect()
}

fn strip_tags(fragment: &str) -> String {
    let text = TAG.replace_all(fragment, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Absolute links pass through; `/path` is joined to the origin of `base`.
fn resolve_url(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let origin_end = base
        .find("://")
        .and_then(|scheme| base[scheme + 3..].find('/').map(|i| scheme + 3 + i))
        .unwrap_or(base.len());
    let origin = &base[..origin_end];

    if href.starts_with('/') {
        format!("{}{}", origin, href)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), href)
    }
}
