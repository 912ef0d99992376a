// src/detector.rs
//! Narrative aggregator: owns one `Narrative` per taxonomy category, routes
//! classified signals into them, runs the derivations and ranks the result.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

use crate::classify::Classifier;
use crate::narrative::{round1, Narrative, NarrativeRecord};
use crate::signal::Signal;
use crate::taxonomy::Taxonomy;

/// Run-level view over the ranked narratives.
#[derive(Debug, Clone, Serialize)]
pub struct NarrativeSummary {
    pub detection_time: DateTime<Utc>,
    /// Sum of per-narrative signal counts (a signal in two narratives counts twice).
    pub total_signals: usize,
    pub active_narratives: usize,
    pub top_narrative: Option<String>,
    pub avg_confidence: f64,
    pub narratives: Vec<NarrativeRecord>,
}

pub struct NarrativeDetector {
    classifier: Classifier,
    taxonomy: Arc<Taxonomy>,
    narratives: Vec<Narrative>,
}

impl NarrativeDetector {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        let narratives = taxonomy
            .categories()
            .iter()
            .map(Narrative::from_category)
            .collect();
        Self {
            classifier: Classifier::new(taxonomy.clone()),
            taxonomy,
            narratives,
        }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Classify a batch, refresh every narrative and return the ranked top list.
    /// Signals accumulate across calls.
    pub fn process(&mut self, signals: Vec<Signal>) -> Vec<Narrative> {
        self.process_at(signals, Utc::now().naive_utc())
    }

    /// Same as `process` with an explicit clock.
    pub fn process_at(&mut self, signals: Vec<Signal>, now: NaiveDateTime) -> Vec<Narrative> {
        let batch = signals.len();
        let mut routed = 0usize;
        for signal in signals {
            let tagged = Arc::new(self.classifier.tag(signal));
            for id in &tagged.narrative_tags {
                if let Some(n) = self.narratives.iter_mut().find(|n| &n.category == id) {
                    n.add_signal(tagged.clone());
                    routed += 1;
                }
            }
        }

        let tuning = &self.taxonomy.tuning;
        for n in &mut self.narratives {
            n.refresh(tuning, now);
            debug!(
                target: "detector",
                category = %n.category,
                signals = n.signal_count(),
                strength = n.strength_score,
                confidence = n.confidence,
                momentum = %n.momentum,
                "narrative scored"
            );
        }

        let top = self.top_narratives(tuning.top_n);
        info!(
            target: "detector",
            batch,
            routed,
            emerging = top.len(),
            "narrative detection complete"
        );
        top
    }

    /// All narratives in taxonomy order, including empty ones.
    pub fn narratives(&self) -> &[Narrative] {
        &self.narratives
    }

    pub fn get(&self, category: &str) -> Option<&Narrative> {
        self.narratives.iter().find(|n| n.category == category)
    }

    pub fn get_mut(&mut self, category: &str) -> Option<&mut Narrative> {
        self.narratives.iter_mut().find(|n| n.category == category)
    }

    /// Non-empty narratives above the strength floor, strongest first.
    pub fn top_narratives(&self, limit: usize) -> Vec<Narrative> {
        let min = self.taxonomy.tuning.min_strength;
        let mut ranked: Vec<&Narrative> = self
            .narratives
            .iter()
            .filter(|n| n.signal_count() > 0 && n.strength_score >= min)
            .collect();
        ranked.sort_by(|a, b| rank_order(a, b));
        ranked.into_iter().take(limit).cloned().collect()
    }

    pub fn summary(&self, limit: usize) -> NarrativeSummary {
        let active = self.narratives.iter().filter(|n| n.signal_count() > 0).count();
        summarize(&self.top_narratives(limit), active, self.total_signals())
    }

    fn total_signals(&self) -> usize {
        self.narratives.iter().map(|n| n.signal_count()).sum()
    }
}

/// Descending by strength, then signal count, then confidence. `sort_by` is
/// stable, so exact ties keep taxonomy order.
fn rank_order(a: &Narrative, b: &Narrative) -> Ordering {
    b.strength_score
        .total_cmp(&a.strength_score)
        .then_with(|| b.signal_count().cmp(&a.signal_count()))
        .then_with(|| b.confidence.total_cmp(&a.confidence))
}

/// Summary over an already ranked list. `active` counts every narrative
/// holding at least one signal, including those under the strength floor.
pub fn summarize(top: &[Narrative], active: usize, total_signals: usize) -> NarrativeSummary {
    let avg_confidence = if top.is_empty() {
        0.0
    } else {
        top.iter().map(|n| n.confidence).sum::<f64>() / top.len() as f64
    };
    NarrativeSummary {
        detection_time: Utc::now(),
        total_signals,
        active_narratives: active,
        top_narrative: top.first().map(|n| n.name.clone()),
        avg_confidence: round1(avg_confidence),
        narratives: top.iter().map(Narrative::to_record).collect(),
    }
}

/// One-shot detection with a fresh detector.
pub fn detect_narratives(taxonomy: Arc<Taxonomy>, signals: Vec<Signal>) -> Vec<Narrative> {
    NarrativeDetector::new(taxonomy).process(signals)
}
