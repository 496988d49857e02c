//! Encyclopedia lookup client for MediaWiki sites (Wikipedia by default).
//!
//! Direct summary lookup first; on a miss, search, then fetch the summary of the best
//! title. If that fetch fails too, the cleaned search snippet is used as the extract.

use serde::Deserialize;
use std::time::Duration;
use zacai_core::{EncyclopediaArticle, EncyclopediaLookup, LookupError};

const CLIENT_NAME: &str = "wikipedia";
const SEARCH_LIMIT: &str = "5";

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    title: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    extract: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub title: String,
    #[serde(default)]
    pub snippet: String,
}

/// Parses a page summary; disambiguation pages and empty extracts are misses.
pub fn parse_summary(body: &str) -> Option<EncyclopediaArticle> {
    let summary: SummaryResponse = serde_json::from_str(body).ok()?;
    if summary.kind.as_deref() == Some("disambiguation") || summary.extract.trim().is_empty() {
        return None;
    }
    Some(EncyclopediaArticle {
        title: summary.title,
        extract: summary.extract.trim().to_string(),
        category: summary
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "general".to_string()),
        related_topics: Vec::new(),
    })
}

pub fn parse_search(body: &str) -> Result<Vec<SearchHit>, LookupError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| LookupError::Parse(e.to_string()))?;
    Ok(response.query.map(|q| q.search).unwrap_or_default())
}

/// Strips the HTML highlight markup MediaWiki puts in search snippets.
pub fn clean_snippet(snippet: &str) -> String {
    let fragment = scraper::Html::parse_fragment(snippet);
    fragment
        .root_element()
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title-cases the first letter and replaces spaces with underscores ("solar system" → "Solar_system").
fn page_title(topic: &str) -> String {
    let topic = topic.trim().replace(' ', "_");
    let mut chars = topic.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub struct WikipediaClient {
    client: reqwest::Client,
    base_url: String,
}

impl WikipediaClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("ZacAI/0.1 (zacai-skills)")
            .build()
            .map_err(|e| LookupError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_text(&self, url: reqwest::Url) -> Result<String, LookupError> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;
        let status = res.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(status.to_string()));
        }
        if !status.is_success() {
            return Err(LookupError::Network(format!("HTTP {}", status)));
        }
        res.text()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))
    }

    async fn summary(&self, title: &str) -> Result<EncyclopediaArticle, LookupError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| LookupError::Parse(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| LookupError::Parse("base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .extend(["api", "rest_v1", "page", "summary"])
            .push(&page_title(title));
        let body = self.get_text(url).await?;
        parse_summary(&body).ok_or_else(|| LookupError::NotFound(title.to_string()))
    }

    async fn search(&self, topic: &str) -> Result<Vec<SearchHit>, LookupError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/w/api.php", self.base_url),
            &[
                ("action", "query"),
                ("list", "search"),
                ("format", "json"),
                ("srlimit", SEARCH_LIMIT),
                ("srsearch", topic),
            ],
        )
        .map_err(|e| LookupError::Parse(e.to_string()))?;
        let body = self.get_text(url).await?;
        parse_search(&body)
    }
}

#[async_trait::async_trait]
impl EncyclopediaLookup for WikipediaClient {
    fn name(&self) -> &str {
        CLIENT_NAME
    }

    async fn summarize(&self, topic: &str) -> Result<EncyclopediaArticle, LookupError> {
        match self.summary(topic).await {
            Ok(article) => {
                tracing::info!(target: "zacai::lookup", topic, title = %article.title, "Encyclopedia direct hit");
                return Ok(article);
            }
            Err(e) => {
                tracing::debug!(target: "zacai::lookup", topic, error = %e, "Direct summary missed; searching");
            }
        }

        let hits = self.search(topic).await?;
        let Some(best) = hits.first() else {
            return Err(LookupError::NotFound(topic.to_string()));
        };
        let related: Vec<String> = hits.iter().skip(1).map(|h| h.title.clone()).collect();

        let article = match self.summary(&best.title).await {
            Ok(article) => article,
            Err(e) => {
                tracing::debug!(
                    target: "zacai::lookup",
                    title = %best.title,
                    error = %e,
                    "Summary after search failed; using snippet"
                );
                let extract = clean_snippet(&best.snippet);
                if extract.is_empty() {
                    return Err(LookupError::NotFound(topic.to_string()));
                }
                EncyclopediaArticle {
                    title: best.title.clone(),
                    extract,
                    category: "general".to_string(),
                    related_topics: Vec::new(),
                }
            }
        };
        Ok(EncyclopediaArticle {
            related_topics: related,
            ..article
        })
    }
}
