// src/taxonomy.rs
//! Narrative taxonomy: category table (id, display name, base explanation,
//! keywords, static boost) plus every numeric tunable of the scoring engine.
//!
//! Loaded from TOML so the taxonomy can be retuned without touching the
//! algorithm. Lookup order for `from_env()`:
//! 1) `$NARRATIVE_TAXONOMY_PATH`
//! 2) `config/taxonomy.toml`
//! 3) the built-in copy of `config/taxonomy.toml`

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_TAXONOMY_PATH: &str = "config/taxonomy.toml";
pub const ENV_TAXONOMY_PATH: &str = "NARRATIVE_TAXONOMY_PATH";

const BUILTIN_TAXONOMY: &str = include_str!("../config/taxonomy.toml");

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyRoot {
    #[serde(default)]
    pub tuning: Tuning,
    #[serde(default)]
    pub categories: Vec<CategoryCfg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryCfg {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub base_why: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Static category prior added to the strength score.
    #[serde(default)]
    pub boost: f64,
    #[serde(default)]
    pub emoji: Option<String>,
}

/// Numeric knobs of classification, scoring, evidence and ranking.
/// Every field defaults to the reference value.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Relevance gained per matched keyword.
    pub keyword_weight: f64,

    pub volume_per_signal: f64,
    pub volume_cap: f64,

    pub diversity_per_source: f64,
    pub diversity_cap: f64,
    pub chain_metrics_bonus: f64,

    pub stars_divisor: f64,
    pub stars_cap: f64,
    pub evidence_weight: f64,
    pub evidence_cap: f64,
    pub high_strength_points: f64,
    pub medium_strength_points: f64,
    pub quality_cap: f64,

    /// Signals strictly younger than this many days count as recent.
    pub recency_window_days: i64,
    pub recency_per_signal: f64,
    pub recency_cap: f64,

    pub boost_cap: f64,

    /// Momentum is rising when recency exceeds this.
    pub rising_above: f64,
    /// Momentum is stable when recency exceeds this (and isn't rising).
    pub stable_above: f64,

    pub confidence: ConfidenceTuning,

    pub evidence_limit: usize,
    pub why_limit: usize,
    pub min_strength: f64,
    pub top_n: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            keyword_weight: 0.15,
            volume_per_signal: 3.0,
            volume_cap: 25.0,
            diversity_per_source: 8.0,
            diversity_cap: 25.0,
            chain_metrics_bonus: 10.0,
            stars_divisor: 500.0,
            stars_cap: 10.0,
            evidence_weight: 1.5,
            evidence_cap: 10.0,
            high_strength_points: 3.0,
            medium_strength_points: 1.0,
            quality_cap: 25.0,
            recency_window_days: 7,
            recency_per_signal: 2.0,
            recency_cap: 15.0,
            boost_cap: 10.0,
            rising_above: 10.0,
            stable_above: 5.0,
            confidence: ConfidenceTuning::default(),
            evidence_limit: 12,
            why_limit: 3,
            min_strength: 20.0,
            top_n: 7,
        }
    }
}

impl Tuning {
    /// Weights, caps and thresholds must be finite and non-negative; a
    /// zero stars divisor, recency window or `top_n` is rejected too.
    pub fn validate(&self) -> Result<()> {
        let c = &self.confidence;
        let fields = [
            ("keyword_weight", self.keyword_weight),
            ("volume_per_signal", self.volume_per_signal),
            ("volume_cap", self.volume_cap),
            ("diversity_per_source", self.diversity_per_source),
            ("diversity_cap", self.diversity_cap),
            ("chain_metrics_bonus", self.chain_metrics_bonus),
            ("stars_divisor", self.stars_divisor),
            ("stars_cap", self.stars_cap),
            ("evidence_weight", self.evidence_weight),
            ("evidence_cap", self.evidence_cap),
            ("high_strength_points", self.high_strength_points),
            ("medium_strength_points", self.medium_strength_points),
            ("quality_cap", self.quality_cap),
            ("recency_per_signal", self.recency_per_signal),
            ("recency_cap", self.recency_cap),
            ("boost_cap", self.boost_cap),
            ("rising_above", self.rising_above),
            ("stable_above", self.stable_above),
            ("min_strength", self.min_strength),
            ("confidence.per_evidence", c.per_evidence),
            ("confidence.corroborated_base", c.corroborated_base),
            ("confidence.corroborated_cap", c.corroborated_cap),
            ("confidence.diverse_base", c.diverse_base),
            ("confidence.diverse_cap", c.diverse_cap),
            ("confidence.single_base", c.single_base),
            ("confidence.single_cap", c.single_cap),
        ];
        for (name, v) in fields {
            if !v.is_finite() || v < 0.0 {
                bail!("{name} must be a finite non-negative number, got {v}");
            }
        }
        if self.stars_divisor == 0.0 {
            bail!("stars_divisor must be greater than zero");
        }
        if self.recency_window_days <= 0 {
            bail!("recency_window_days must be positive, got {}", self.recency_window_days);
        }
        if self.top_n == 0 {
            bail!("top_n must be at least 1");
        }
        Ok(())
    }
}

/// Confidence tiers: corroborated (many sources incl. chain data), diverse,
/// and single-source.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfidenceTuning {
    pub per_evidence: f64,
    pub corroborated_min_sources: usize,
    pub corroborated_base: f64,
    pub corroborated_cap: f64,
    pub diverse_min_sources: usize,
    pub diverse_base: f64,
    pub diverse_cap: f64,
    pub single_base: f64,
    pub single_cap: f64,
}

impl Default for ConfidenceTuning {
    fn default() -> Self {
        Self {
            per_evidence: 3.0,
            corroborated_min_sources: 3,
            corroborated_base: 60.0,
            corroborated_cap: 90.0,
            diverse_min_sources: 2,
            diverse_base: 45.0,
            diverse_cap: 75.0,
            single_base: 30.0,
            single_cap: 50.0,
        }
    }
}

/* ----------------------------
Validated taxonomy
---------------------------- */

/// One category with its keywords lowercased for matching.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub base_why: String,
    pub keywords: Vec<String>,
    pub boost: f64,
    pub emoji: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Taxonomy {
    pub tuning: Tuning,
    categories: Vec<Category>,
    index: HashMap<String, usize>,
}

impl Taxonomy {
    /// Resolve the taxonomy using env var, then default path, then built-in.
    pub fn from_env() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_TAXONOMY_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!(
                    "{ENV_TAXONOMY_PATH} points to non-existent path {}",
                    pb.display()
                ));
            }
            return Self::load(&pb);
        }
        let default = PathBuf::from(DEFAULT_TAXONOMY_PATH);
        if default.exists() {
            return Self::load(&default);
        }
        debug!(target: "taxonomy", "no taxonomy file found, using built-in");
        Self::builtin()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading taxonomy from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing taxonomy {}", path.display()))
    }

    /// The reference taxonomy compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_TAXONOMY).context("parsing built-in taxonomy")
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let root: TaxonomyRoot = toml::from_str(toml_str)?;
        Self::from_root(root)
    }

    pub fn from_root(root: TaxonomyRoot) -> Result<Self> {
        if root.categories.is_empty() {
            bail!("taxonomy defines no categories");
        }
        root.tuning.validate().context("invalid [tuning]")?;

        let mut categories = Vec::with_capacity(root.categories.len());
        let mut index = HashMap::with_capacity(root.categories.len());
        for cfg in root.categories {
            let id = cfg.id.trim().to_string();
            if id.is_empty() {
                bail!("category `{}` has an empty id", cfg.name);
            }
            if index.insert(id.clone(), categories.len()).is_some() {
                bail!("duplicate category id `{id}`");
            }
            categories.push(Category {
                id,
                name: cfg.name,
                base_why: cfg.base_why.trim().to_string(),
                keywords: clean_keywords(cfg.keywords),
                boost: cfg.boost,
                emoji: cfg.emoji,
            });
        }

        Ok(Self {
            tuning: root.tuning,
            categories,
            index,
        })
    }

    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Categories in declaration order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.index.get(id).map(|&i| &self.categories[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

fn clean_keywords(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let k = it.trim().to_lowercase();
        if !k.is_empty() && !out.contains(&k) {
            out.push(k);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_reference_categories() {
        let t = Taxonomy::builtin().unwrap();
        assert_eq!(t.len(), 9);
        assert!(t.contains("ai_agents"));
        assert!(t.contains("zk_compression"));
        assert_eq!(t.get("ai_agents").unwrap().boost, 5.0);
        assert_eq!(t.get("rwa_tokenization").unwrap().boost, 5.0);
        assert_eq!(t.get("stablecoins_payfi").unwrap().boost, 4.0);
        assert_eq!(t.get("infrastructure").unwrap().boost, 3.0);
        assert_eq!(t.get("memecoins").unwrap().boost, 0.0);
        assert_eq!(t.categories()[0].id, "ai_agents");
    }

    #[test]
    fn tuning_defaults_fill_missing_fields() {
        let t = Taxonomy::from_toml_str(
            r#"
[tuning]
top_n = 3

[tuning.confidence]
single_cap = 40.0

[[categories]]
id = "x"
name = "X"
keywords = [" Foo ", "foo", "", "BAR"]
"#,
        )
        .unwrap();
        assert_eq!(t.tuning.top_n, 3);
        assert!((t.tuning.keyword_weight - 0.15).abs() < 1e-12);
        assert!((t.tuning.confidence.single_cap - 40.0).abs() < 1e-12);
        assert!((t.tuning.confidence.diverse_cap - 75.0).abs() < 1e-12);
        assert_eq!(t.get("x").unwrap().keywords, vec!["foo", "bar"]);
    }

    #[test]
    fn duplicate_and_empty_ids_are_rejected() {
        let dup = r#"
[[categories]]
id = "a"
name = "A"
[[categories]]
id = "a"
name = "A again"
"#;
        assert!(Taxonomy::from_toml_str(dup).is_err());
        assert!(Taxonomy::from_toml_str("[tuning]\ntop_n = 1\n").is_err());
        let blank = "[[categories]]\nid = \"  \"\nname = \"Blank\"\n";
        assert!(Taxonomy::from_toml_str(blank).is_err());
    }

    #[test]
    fn bad_tuning_fails_at_load_time() {
        let with = |tuning: &str| format!("[tuning]\n{tuning}\n[[categories]]\nid = \"a\"\nname = \"A\"\n");
        let err = Taxonomy::from_toml_str(&with("boost_cap = -1.0")).unwrap_err();
        assert!(format!("{err:#}").contains("boost_cap"));
        assert!(Taxonomy::from_toml_str(&with("quality_cap = nan")).is_err());
        assert!(Taxonomy::from_toml_str(&with("stars_divisor = 0.0")).is_err());
        assert!(Taxonomy::from_toml_str(&with("top_n = 0")).is_err());
        assert!(Taxonomy::from_toml_str(&with("recency_window_days = 0")).is_err());
        assert!(Taxonomy::from_toml_str(&with("[tuning.confidence]\nsingle_cap = -5.0")).is_err());
        assert!(Taxonomy::from_toml_str(&with("boost_cap = 0.0")).is_ok());
    }
}
