// src/signal.rs
//! Normalized signal record shared by every provider and the narrative core.
//!
//! A `Signal` looks the same regardless of where it came from. Source-specific
//! fields live in `SignalMetadata`, which types the known shapes (repository
//! stats, chain metrics, evidence lists, explanatory text) and keeps unknown
//! keys in `extra` so newer providers don't break older readers.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Wire tag of the on-chain metrics source.
pub const CHAIN_METRICS_TAG: &str = "helius_onchain";
/// Wire tag of the code-hosting search source.
pub const CODE_REPOSITORY_TAG: &str = "github";
/// Wire tag of the curated research corpus.
pub const CURATED_RESEARCH_TAG: &str = "research";

/// Origin of a signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SignalSource {
    /// Real-time on-chain data (highest-trust source).
    ChainMetrics,
    CodeRepository,
    CuratedResearch,
    Other(String),
}

impl SignalSource {
    pub fn as_str(&self) -> &str {
        match self {
            SignalSource::ChainMetrics => CHAIN_METRICS_TAG,
            SignalSource::CodeRepository => CODE_REPOSITORY_TAG,
            SignalSource::CuratedResearch => CURATED_RESEARCH_TAG,
            SignalSource::Other(s) => s.as_str(),
        }
    }

    pub fn is_chain_metrics(&self) -> bool {
        matches!(self, SignalSource::ChainMetrics)
    }
}

impl From<&str> for SignalSource {
    fn from(s: &str) -> Self {
        match s.trim() {
            CHAIN_METRICS_TAG => SignalSource::ChainMetrics,
            CODE_REPOSITORY_TAG => SignalSource::CodeRepository,
            CURATED_RESEARCH_TAG => SignalSource::CuratedResearch,
            other => SignalSource::Other(other.to_string()),
        }
    }
}

impl From<String> for SignalSource {
    fn from(s: String) -> Self {
        SignalSource::from(s.as_str())
    }
}

impl From<SignalSource> for String {
    fn from(s: SignalSource) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point in time a signal was observed. Parsing never fails: values that
/// can't be read are kept verbatim as `Unparsed` and treated as recent by
/// the scorer.
#[derive(Debug, Clone, PartialEq)]
pub enum Timestamp {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
    Unparsed(String),
}

impl Timestamp {
    pub fn now() -> Self {
        Timestamp::Zoned(Utc::now().fixed_offset())
    }

    /// Accepts RFC 3339 (`Z` or offset), naive `YYYY-MM-DD[T ]HH:MM:SS[.f]`
    /// and plain dates.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Timestamp::Zoned(dt);
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(n) = NaiveDateTime::parse_from_str(s, fmt) {
                return Timestamp::Naive(n);
            }
        }
        if let Some(n) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Timestamp::Naive(n);
        }
        Timestamp::Unparsed(s.to_string())
    }

    /// Wall-clock value with the zone dropped (zoned values are taken in UTC).
    pub fn naive(&self) -> Option<NaiveDateTime> {
        match self {
            Timestamp::Zoned(dt) => Some(dt.naive_utc()),
            Timestamp::Naive(n) => Some(*n),
            Timestamp::Unparsed(_) => None,
        }
    }

    /// Whole days between this timestamp and `now`, or `None` when unknown.
    pub fn age_days(&self, now: NaiveDateTime) -> Option<i64> {
        self.naive().map(|ts| (now - ts).num_days())
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Zoned(dt) => write!(f, "{}", dt.to_rfc3339()),
            Timestamp::Naive(n) => write!(f, "{}", n.format("%Y-%m-%dT%H:%M:%S%.f")),
            Timestamp::Unparsed(s) => f.write_str(s),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Timestamp::parse(&raw))
    }
}

/// Self-reported strength of a chain signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStrength {
    High,
    Medium,
    Low,
    #[serde(other)]
    Unrated,
}

impl SignalStrength {
    /// Map an activity level string ("high" / "medium" / ...) to a strength.
    pub fn from_level(level: &str) -> Self {
        match level.trim().to_ascii_lowercase().as_str() {
            "high" => SignalStrength::High,
            "medium" => SignalStrength::Medium,
            "low" => SignalStrength::Low,
            _ => SignalStrength::Unrated,
        }
    }
}

/// Repository statistics attached by the code-hosting provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryStats {
    #[serde(default)]
    pub stars: u64,
    #[serde(default)]
    pub forks: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    #[serde(default)]
    pub open_issues: u64,
    #[serde(default)]
    pub watchers: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Source-specific fields. Missing fields are empty defaults, never errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalMetadata {
    /// Category assigned upstream (curated corpus, chain program table).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Free-text evidence items.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why_emerging: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<SignalStrength>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositoryStats>,
    /// Point-in-time chain metrics (name → value).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, f64>,
    /// Unknown keys, preserved as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A normalized unit of evidence about ecosystem activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub source: SignalSource,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub timestamp: Timestamp,
    #[serde(default)]
    pub metadata: SignalMetadata,
    #[serde(default)]
    pub narrative_tags: Vec<String>,
    #[serde(default)]
    pub relevance_score: f64,
}

impl Signal {
    pub fn new(
        source: impl Into<SignalSource>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            title: title.into(),
            description: description.into(),
            url: String::new(),
            timestamp: Timestamp::now(),
            metadata: SignalMetadata::default(),
            narrative_tags: Vec::new(),
            relevance_score: 0.0,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_timestamp(mut self, ts: Timestamp) -> Self {
        self.timestamp = ts;
        self
    }

    pub fn with_metadata(mut self, metadata: SignalMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Title and description joined by a space (the classifier's haystack).
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }

    pub fn preset_category(&self) -> Option<&str> {
        self.metadata
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Star count, only meaningful for code-repository signals.
    pub fn stars(&self) -> u64 {
        self.metadata.repository.as_ref().map_or(0, |r| r.stars)
    }

    pub fn topics(&self) -> &[String] {
        self.metadata
            .repository
            .as_ref()
            .map_or(&[], |r| r.topics.as_slice())
    }

    pub fn evidence_count(&self) -> usize {
        self.metadata.evidence.len()
    }
}
