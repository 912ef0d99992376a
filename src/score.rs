// src/score.rs
//! Multi-factor narrative scoring.
//!
//! Strength is the sum of five independently capped components, capped again
//! at 100:
//!   volume (25) + source diversity (25) + quality (25) + recency (15) + category boost (10)
//!
//! Confidence is tiered by source diversity and curated evidence volume;
//! momentum is read off the recency component. Pure: no I/O, `now` is passed in.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::signal::{Signal, SignalSource, SignalStrength};
use crate::taxonomy::Tuning;

pub const MAX_STRENGTH: f64 = 100.0;

/// Directional trend of a narrative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Momentum {
    Rising,
    #[default]
    Stable,
    Declining,
}

impl Momentum {
    pub fn as_str(&self) -> &'static str {
        match self {
            Momentum::Rising => "rising",
            Momentum::Stable => "stable",
            Momentum::Declining => "declining",
        }
    }
}

impl fmt::Display for Momentum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five strength components of one scoring run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StrengthBreakdown {
    pub volume: f64,
    pub diversity: f64,
    pub quality: f64,
    pub recency: f64,
    pub category_boost: f64,
}

impl StrengthBreakdown {
    pub fn total(&self) -> f64 {
        (self.volume + self.diversity + self.quality + self.recency + self.category_boost)
            .min(MAX_STRENGTH)
    }
}

/// Full result for one narrative.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NarrativeScore {
    pub strength: f64,
    pub confidence: f64,
    /// `None` when there was nothing to score (momentum is left as is).
    pub momentum: Option<Momentum>,
    pub breakdown: StrengthBreakdown,
    pub evidence_count: usize,
    pub source_diversity: usize,
}

/// Score a narrative's signals. `boost` is the category's static prior.
pub fn score_signals(
    signals: &[Arc<Signal>],
    boost: f64,
    tuning: &Tuning,
    now: NaiveDateTime,
) -> NarrativeScore {
    if signals.is_empty() {
        return NarrativeScore::default();
    }

    let sources: BTreeSet<&SignalSource> = signals.iter().map(|s| &s.source).collect();
    let has_chain = sources.iter().any(|s| s.is_chain_metrics());
    let evidence_count = evidence_count(signals);

    let breakdown = StrengthBreakdown {
        volume: volume_score(signals.len(), tuning),
        diversity: diversity_score(sources.len(), has_chain, tuning),
        quality: quality_score(signals, evidence_count, tuning),
        recency: recency_score(signals, now, tuning),
        category_boost: category_boost(boost, tuning),
    };

    NarrativeScore {
        strength: breakdown.total(),
        confidence: confidence(sources.len(), has_chain, evidence_count, tuning),
        momentum: Some(momentum_for(breakdown.recency, tuning)),
        breakdown,
        evidence_count,
        source_diversity: sources.len(),
    }
}

/// Curated evidence items across all signals.
pub fn evidence_count(signals: &[Arc<Signal>]) -> usize {
    signals.iter().map(|s| s.evidence_count()).sum()
}

pub fn volume_score(count: usize, t: &Tuning) -> f64 {
    (count as f64 * t.volume_per_signal).min(t.volume_cap)
}

pub fn diversity_score(distinct_sources: usize, has_chain: bool, t: &Tuning) -> f64 {
    let base = (distinct_sources as f64 * t.diversity_per_source).min(t.diversity_cap);
    if has_chain {
        (base + t.chain_metrics_bonus).min(t.diversity_cap)
    } else {
        base
    }
}

pub fn quality_score(signals: &[Arc<Signal>], evidence_count: usize, t: &Tuning) -> f64 {
    let stars: u64 = signals
        .iter()
        .filter(|s| s.source == SignalSource::CodeRepository)
        .map(|s| s.stars())
        .sum();

    let mut q = (stars as f64 / t.stars_divisor).min(t.stars_cap);
    q += (evidence_count as f64 * t.evidence_weight).min(t.evidence_cap);
    for s in signals {
        match s.metadata.signal_strength {
            Some(SignalStrength::High) => q += t.high_strength_points,
            Some(SignalStrength::Medium) => q += t.medium_strength_points,
            _ => {}
        }
    }
    q.min(t.quality_cap)
}

/// Unknown timestamps count as recent (fail-open).
pub fn recency_score(signals: &[Arc<Signal>], now: NaiveDateTime, t: &Tuning) -> f64 {
    let recent = signals
        .iter()
        .filter(|s| match s.timestamp.age_days(now) {
            Some(days) => days < t.recency_window_days,
            None => true,
        })
        .count();
    (recent as f64 * t.recency_per_signal).min(t.recency_cap)
}

pub fn category_boost(boost: f64, t: &Tuning) -> f64 {
    boost.max(0.0).min(t.boost_cap)
}

pub fn confidence(distinct_sources: usize, has_chain: bool, evidence: usize, t: &Tuning) -> f64 {
    let c = &t.confidence;
    let bump = evidence as f64 * c.per_evidence;
    if distinct_sources >= c.corroborated_min_sources && has_chain {
        (c.corroborated_base + bump).min(c.corroborated_cap)
    } else if distinct_sources >= c.diverse_min_sources {
        (c.diverse_base + bump).min(c.diverse_cap)
    } else {
        (c.single_base + bump).min(c.single_cap)
    }
}

pub fn momentum_for(recency: f64, t: &Tuning) -> Momentum {
    if recency > t.rising_above {
        Momentum::Rising
    } else if recency > t.stable_above {
        Momentum::Stable
    } else {
        Momentum::Declining
    }
}
