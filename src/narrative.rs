// src/narrative.rs
//! A narrative: one thematic category plus the signals that support it and
//! everything derived from them (scores, evidence, metrics, explanation).
//!
//! Derivations are recomputed from `signals` (and the stored base
//! explanation), so running them twice on the same signal set is a no-op.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::evidence::extract_evidence;
use crate::ideas::BuildIdea;
use crate::score::{score_signals, Momentum, StrengthBreakdown};
use crate::signal::Signal;
use crate::taxonomy::{Category, Tuning};

#[derive(Debug, Clone)]
pub struct Narrative {
    pub name: String,
    pub category: String,
    pub emoji: Option<String>,
    pub signals: Vec<Arc<Signal>>,
    pub strength_score: f64,
    pub confidence: f64,
    pub momentum: Momentum,
    pub breakdown: StrengthBreakdown,
    pub evidence: Vec<String>,
    pub why_emerging: String,
    pub key_metrics: BTreeMap<String, f64>,
    pub build_ideas: Vec<BuildIdea>,
    base_why: String,
    boost: f64,
}

impl Narrative {
    pub fn new(name: impl Into<String>, category: impl Into<String>, base_why: impl Into<String>) -> Self {
        let base_why = base_why.into();
        Self {
            name: name.into(),
            category: category.into(),
            emoji: None,
            signals: Vec::new(),
            strength_score: 0.0,
            confidence: 0.0,
            momentum: Momentum::default(),
            breakdown: StrengthBreakdown::default(),
            evidence: Vec::new(),
            why_emerging: base_why.clone(),
            key_metrics: BTreeMap::new(),
            build_ideas: Vec::new(),
            base_why,
            boost: 0.0,
        }
    }

    /// Empty narrative for a taxonomy category.
    pub fn from_category(cat: &Category) -> Self {
        let mut n = Self::new(cat.name.clone(), cat.id.clone(), cat.base_why.clone());
        n.emoji = cat.emoji.clone();
        n.boost = cat.boost;
        n
    }

    pub fn add_signal(&mut self, signal: Arc<Signal>) {
        self.signals.push(signal);
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    pub fn base_why(&self) -> &str {
        &self.base_why
    }

    /// Recompute strength, confidence and momentum. With no signals both
    /// scores are zero and momentum keeps its current value.
    pub fn calculate_strength(&mut self, tuning: &Tuning, now: NaiveDateTime) {
        let score = score_signals(&self.signals, self.boost, tuning, now);
        self.strength_score = score.strength;
        self.confidence = score.confidence;
        self.breakdown = score.breakdown;
        if let Some(m) = score.momentum {
            self.momentum = m;
        }
    }

    pub fn extract_evidence(&mut self, limit: usize) {
        self.evidence = extract_evidence(&self.signals, limit);
    }

    /// Merge metrics of chain signals; later signals overwrite earlier keys.
    pub fn extract_metrics(&mut self) {
        let mut metrics = BTreeMap::new();
        for s in self.signals.iter().filter(|s| s.source.is_chain_metrics()) {
            for (k, v) in &s.metadata.metrics {
                metrics.insert(k.clone(), *v);
            }
        }
        self.key_metrics = metrics;
    }

    /// Base explanation + up to `limit` distinct signal explanations +
    /// an on-chain metrics line.
    pub fn enrich_why_emerging(&mut self, limit: usize) {
        let mut seen = HashSet::new();
        let drivers: Vec<&str> = self
            .signals
            .iter()
            .filter_map(|s| s.metadata.why_emerging.as_deref())
            .map(str::trim)
            .filter(|w| !w.is_empty() && seen.insert(*w))
            .take(limit)
            .collect();

        let mut why = self.base_why.clone();
        if !drivers.is_empty() {
            why.push_str("\n\n**Key Drivers:**\n");
            for d in drivers {
                why.push_str("• ");
                why.push_str(d);
                why.push('\n');
            }
            why = why.trim().to_string();
        }

        let onchain = metrics_summary(&self.key_metrics);
        if !onchain.is_empty() {
            why.push_str("\n\n**On-Chain Validation:** ");
            why.push_str(&onchain.join(", "));
        }

        self.why_emerging = why;
    }

    /// Run every derivation in order.
    pub fn refresh(&mut self, tuning: &Tuning, now: NaiveDateTime) {
        self.calculate_strength(tuning, now);
        self.extract_evidence(tuning.evidence_limit);
        self.extract_metrics();
        self.enrich_why_emerging(tuning.why_limit);
    }

    pub fn to_record(&self) -> NarrativeRecord {
        NarrativeRecord {
            name: self.name.clone(),
            category: self.category.clone(),
            signal_count: self.signals.len(),
            strength_score: round1(self.strength_score),
            confidence: round1(self.confidence),
            momentum: self.momentum,
            breakdown: self.breakdown,
            why_emerging: self.why_emerging.clone(),
            evidence: self.evidence.clone(),
            key_metrics: self.key_metrics.clone(),
            build_ideas: self.build_ideas.clone(),
            signals: self.signals.clone(),
        }
    }
}

/// Serializable view of a narrative (scores rounded to one decimal).
#[derive(Debug, Clone, Serialize)]
pub struct NarrativeRecord {
    pub name: String,
    pub category: String,
    pub signal_count: usize,
    pub strength_score: f64,
    pub confidence: f64,
    pub momentum: Momentum,
    pub breakdown: StrengthBreakdown,
    pub why_emerging: String,
    pub evidence: Vec<String>,
    pub key_metrics: BTreeMap<String, f64>,
    pub build_ideas: Vec<BuildIdea>,
    pub signals: Vec<Arc<Signal>>,
}

pub(crate) fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Human-readable bits for the well-known chain metrics.
pub fn metrics_summary(metrics: &BTreeMap<String, f64>) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(tps) = metrics.get("tps") {
        out.push(format!("{} TPS network activity", group_thousands(*tps)));
    }
    if let Some(supply) = metrics.get("total_supply_usd") {
        out.push(format!("${:.2}B stablecoin supply", supply / 1e9));
    }
    if let Some(n) = metrics.get("recent_tx_count") {
        out.push(format!("{} recent transactions", n.round() as i64));
    }
    out
}

/// `1234567.0` → `"1,234,567"` (rounded to an integer).
pub fn group_thousands(x: f64) -> String {
    let n = x.round() as i64;
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalMetadata;
    use chrono::Utc;

    fn chain(metrics: &[(&str, f64)]) -> Arc<Signal> {
        let meta = SignalMetadata {
            metrics: metrics.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            ..Default::default()
        };
        Arc::new(Signal::new("helius_onchain", "net", "stats").with_metadata(meta))
    }

    fn why(text: &str) -> Arc<Signal> {
        let meta = SignalMetadata {
            why_emerging: Some(text.into()),
            ..Default::default()
        };
        Arc::new(Signal::new("research", "r", "d").with_metadata(meta))
    }

    #[test]
    fn metrics_merge_is_last_write_wins_and_chain_only() {
        let mut n = Narrative::new("Infra", "infrastructure", "base");
        n.add_signal(chain(&[("tps", 3000.0), ("slot", 1.0)]));
        n.add_signal(chain(&[("tps", 4200.0)]));
        let mut research = SignalMetadata::default();
        research.metrics.insert("tps".into(), 1.0);
        n.add_signal(Arc::new(Signal::new("research", "r", "d").with_metadata(research)));
        n.extract_metrics();
        assert_eq!(n.key_metrics.get("tps"), Some(&4200.0));
        assert_eq!(n.key_metrics.get("slot"), Some(&1.0));
    }

    #[test]
    fn why_emerging_lists_distinct_drivers_and_is_idempotent() {
        let mut n = Narrative::new("AI", "ai_agents", "Base reason.");
        for w in ["one", "two", "one", "three", "four"] {
            n.add_signal(why(w));
        }
        n.add_signal(chain(&[("tps", 4321.0), ("total_supply_usd", 5.5e9)]));
        n.extract_metrics();
        n.enrich_why_emerging(3);
        let first = n.why_emerging.clone();
        assert!(first.starts_with("Base reason.\n\n**Key Drivers:**\n• one\n• two\n• three"));
        assert!(!first.contains("four"));
        assert!(first.ends_with(
            "**On-Chain Validation:** 4,321 TPS network activity, $5.50B stablecoin supply"
        ));

        n.enrich_why_emerging(3);
        assert_eq!(n.why_emerging, first);
    }

    #[test]
    fn empty_narrative_keeps_stable_momentum() {
        let mut n = Narrative::new("X", "x", "b");
        n.refresh(&Tuning::default(), Utc::now().naive_utc());
        assert_eq!(n.strength_score, 0.0);
        assert_eq!(n.confidence, 0.0);
        assert_eq!(n.momentum, Momentum::Stable);
        assert_eq!(n.why_emerging, "b");
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1000.0), "1,000");
        assert_eq!(group_thousands(1234567.4), "1,234,567");
    }

    #[test]
    fn record_rounds_scores() {
        let mut n = Narrative::new("X", "x", "b");
        n.strength_score = 42.26;
        n.confidence = 51.04;
        let r = n.to_record();
        assert_eq!(r.strength_score, 42.3);
        assert_eq!(r.confidence, 51.0);
        assert_eq!(r.signal_count, 0);
    }
}
