// src/ingest/providers/github.rs
//! Code-hosting search provider: recently pushed ecosystem repositories.
//!
//! Several search queries run in sequence; results are merged, forks and
//! archived repos skipped, deduplicated by URL and ranked by stars. An HTTP
//! 403 means the rate limit is exhausted, so the remaining queries are
//! skipped and whatever was gathered so far is returned.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use metrics::counter;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashSet;

use crate::ingest::normalize_text;
use crate::ingest::types::SignalProvider;
use crate::signal::{RepositoryStats, Signal, SignalMetadata, Timestamp, CODE_REPOSITORY_TAG};

pub const SEARCH_URL: &str = "https://api.github.com/search/repositories";
pub const ENV_TOKEN: &str = "GITHUB_ACCESS_TOKEN";
pub const DEFAULT_LOOKBACK_DAYS: i64 = 14;
pub const DEFAULT_LIMIT: usize = 40;

/// `{date}` is replaced with the lookback cutoff (`YYYY-MM-DD`).
pub const QUERIES: &[&str] = &[
    "solana language:rust pushed:>{date}",
    "solana language:typescript pushed:>{date}",
    "anchor-lang pushed:>{date}",
    "solana-program pushed:>{date}",
    "topic:solana pushed:>{date}",
    "solana ai agent pushed:>{date}",
    "pump.fun solana pushed:>{date}",
];

/* ---- Search API response (only the fields we read) ---- */

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<RepoItem>,
}

#[derive(Debug, Deserialize)]
pub struct RepoItem {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub pushed_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub fork: bool,
}

impl RepoItem {
    fn into_signal(self) -> Signal {
        let description = self
            .description
            .as_deref()
            .map(normalize_text)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "No description".to_string());
        let timestamp = self
            .pushed_at
            .as_deref()
            .map(Timestamp::parse)
            .unwrap_or_else(|| Timestamp::Unparsed(String::new()));
        let metadata = SignalMetadata {
            repository: Some(RepositoryStats {
                stars: self.stargazers_count,
                forks: self.forks_count,
                language: self.language.filter(|l| !l.is_empty()),
                topics: self.topics,
                open_issues: self.open_issues_count,
                watchers: self.watchers_count,
                created_at: self.created_at,
            }),
            ..Default::default()
        };
        Signal::new(CODE_REPOSITORY_TAG, self.full_name, description)
            .with_url(self.html_url)
            .with_timestamp(timestamp)
            .with_metadata(metadata)
    }
}

/// Map one search response body to signals: first `limit` items, forks and
/// archived repos skipped.
pub fn parse_search_response(body: &str, limit: usize) -> Result<Vec<Signal>> {
    let resp: SearchResponse =
        serde_json::from_str(body).context("parsing repository search response")?;
    Ok(resp
        .items
        .into_iter()
        .take(limit)
        .filter(|r| !r.archived && !r.fork)
        .map(RepoItem::into_signal)
        .collect())
}

/// URL dedup (first wins), stars descending (stable), truncate.
pub fn rank_repositories(signals: Vec<Signal>, limit: usize) -> Vec<Signal> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Signal> = signals
        .into_iter()
        .filter(|s| seen.insert(s.url.clone()))
        .collect();
    unique.sort_by(|a, b| b.stars().cmp(&a.stars()));
    unique.truncate(limit);
    unique
}

pub fn build_query(template: &str, since: NaiveDate) -> String {
    template.replace("{date}", &since.format("%Y-%m-%d").to_string())
}

pub struct GitHubProvider {
    client: reqwest::Client,
    token: Option<String>,
    lookback_days: i64,
    limit: usize,
    base_url: String,
}

impl GitHubProvider {
    pub fn new(token: Option<String>, lookback_days: i64, limit: usize) -> Result<Self> {
        Ok(Self {
            client: crate::ingest::http_client()?,
            token: token.filter(|t| !t.trim().is_empty()),
            lookback_days,
            limit,
            base_url: SEARCH_URL.to_string(),
        })
    }

    /// Token from `GITHUB_ACCESS_TOKEN`, unauthenticated otherwise.
    pub fn from_env(lookback_days: i64, limit: usize) -> Result<Self> {
        Self::new(std::env::var(ENV_TOKEN).ok(), lookback_days, limit)
    }

    /// Point the provider at another search endpoint (mirrors, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    async fn search(&self, query: &str) -> Result<SearchOutcome> {
        let per_page = self.limit.clamp(1, 100).to_string();
        let mut req = self
            .client
            .get(&self.base_url)
            .header("Accept", "application/vnd.github.v3+json")
            .query(&[
                ("q", query),
                ("sort", "updated"),
                ("order", "desc"),
                ("per_page", per_page.as_str()),
            ]);
        if let Some(token) = &self.token {
            req = req.header("Authorization", format!("token {token}"));
        }

        let resp = req.send().await.context("repository search request")?;
        let status = resp.status();
        if status == StatusCode::FORBIDDEN {
            return Ok(SearchOutcome::RateLimited);
        }
        if !status.is_success() {
            anyhow::bail!("repository search returned HTTP {status}");
        }
        let body = resp.text().await.context("repository search body")?;
        Ok(SearchOutcome::Items(parse_search_response(&body, self.limit)?))
    }
}

enum SearchOutcome {
    Items(Vec<Signal>),
    RateLimited,
}

#[async_trait]
impl SignalProvider for GitHubProvider {
    async fn fetch(&self) -> Result<Vec<Signal>> {
        let since = (Utc::now() - Duration::days(self.lookback_days)).date_naive();
        tracing::debug!(
            target: "ingest",
            provider = "github",
            authenticated = self.is_authenticated(),
            %since,
            "searching repositories"
        );

        let mut all = Vec::new();
        for template in QUERIES {
            let query = build_query(template, since);
            match self.search(&query).await {
                Ok(SearchOutcome::Items(mut v)) => all.append(&mut v),
                Ok(SearchOutcome::RateLimited) => {
                    tracing::warn!(target: "ingest", provider = "github", %query, "rate limit hit, stopping search");
                    counter!("ingest_provider_errors_total").increment(1);
                    break;
                }
                Err(e) => {
                    tracing::warn!(target: "ingest", provider = "github", %query, error = ?e, "query failed");
                    counter!("ingest_provider_errors_total").increment(1);
                }
            }
        }
        Ok(rank_repositories(all, self.limit))
    }

    fn name(&self) -> &'static str {
        "github"
    }
}
