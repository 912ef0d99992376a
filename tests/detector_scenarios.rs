// tests/detector_scenarios.rs
// End-to-end checks of classification → scoring → ranking through the
// public detector API. Self-contained: inline TOML or the built-in taxonomy.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use narrative_radar::{
    detect_narratives, Momentum, NarrativeDetector, Signal, SignalMetadata, Taxonomy, Timestamp,
};
use std::sync::Arc;

const TEST_TOML: &str = r#"
[tuning]
min_strength = 20.0
top_n = 7

[[categories]]
id = "payments"
name = "Payments"
base_why = "Stable rails are spreading."
keywords = ["stablecoin", "payments"]

[[categories]]
id = "tokenization"
name = "Tokenization"
base_why = "Assets are moving on-chain."
keywords = ["tokenized", "rwa"]
"#;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn aged(source: &str, title: &str, days: i64) -> Signal {
    Signal::new(source, title, "")
        .with_timestamp(Timestamp::Naive(now() - Duration::days(days)))
}

fn taxonomy() -> Arc<Taxonomy> {
    Arc::new(Taxonomy::from_toml_str(TEST_TOML).unwrap())
}

#[test]
fn empty_batch_yields_no_narratives() {
    let out = detect_narratives(taxonomy(), Vec::new());
    assert!(out.is_empty());
}

#[test]
fn stale_two_source_narrative_scores_25_and_declines() {
    let mut d = NarrativeDetector::new(taxonomy());
    let top = d.process_at(
        vec![
            aged("github", "stablecoin sdk", 30),
            aged("research", "payments report", 30),
            aged("github", "stablecoin bridge", 40),
        ],
        now(),
    );
    assert_eq!(top.len(), 1);
    let n = &top[0];
    assert_eq!(n.category, "payments");
    assert_eq!(n.strength_score, 25.0);
    assert_eq!(n.momentum, Momentum::Declining);
    assert_eq!(n.confidence, 45.0);
}

#[test]
fn chain_backed_narrative_reaches_75_confidence() {
    let evidence = SignalMetadata {
        evidence: (1..=5).map(|i| format!("fact {i}")).collect(),
        ..Default::default()
    };
    let mut d = NarrativeDetector::new(taxonomy());
    d.process_at(
        vec![
            aged("helius_onchain", "stablecoin supply", 0),
            aged("github", "payments sdk", 0),
            aged("research", "stablecoin outlook", 0).with_metadata(evidence),
        ],
        now(),
    );
    let n = d.get("payments").unwrap();
    assert_eq!(n.confidence, 75.0);
    assert_eq!(n.momentum, Momentum::Stable);
}

#[test]
fn evidence_from_description_patterns() {
    let mut d = NarrativeDetector::new(taxonomy());
    d.process_at(
        vec![Signal::new(
            "research",
            "Tokenized treasuries",
            "RWA TVL hit $1.5B, up 45% with 12K daily active wallets while fees rose 15%.",
        )],
        now(),
    );
    let n = d.get("tokenization").unwrap();
    assert!(n.evidence.contains(&"Market signal: $1.5B".to_string()));
    assert!(n.evidence.contains(&"Growth: 45%".to_string()));
    assert!(n.evidence.contains(&"Scale: 12K daily active".to_string()));
    assert!(!n.evidence.iter().any(|e| e.contains("15%")));
}

#[test]
fn weak_narratives_are_filtered() {
    let mut d = NarrativeDetector::new(taxonomy());
    let top = d.process_at(vec![aged("research", "rwa note", 30)], now());
    // 3 (volume) + 8 (diversity) = 11 < 20
    assert!(top.is_empty());
    assert_eq!(d.get("tokenization").unwrap().signal_count(), 1);
}

#[test]
fn equal_narratives_keep_taxonomy_order_across_runs() {
    let batch = || {
        vec![
            aged("github", "tokenized fund", 1),
            aged("research", "rwa desk", 1),
            aged("github", "stablecoin app", 1),
            aged("research", "payments desk", 1),
        ]
    };
    for _ in 0..3 {
        let mut d = NarrativeDetector::new(taxonomy());
        let top = d.process_at(batch(), now());
        let ids: Vec<_> = top.iter().map(|n| n.category.as_str()).collect();
        assert_eq!(ids, vec!["payments", "tokenization"]);
        assert_eq!(top[0].strength_score, top[1].strength_score);
    }
}

#[test]
fn builtin_taxonomy_returns_at_most_top_n_in_order() {
    let taxonomy = Arc::new(Taxonomy::builtin().unwrap());
    let mut signals = Vec::new();
    for cat in taxonomy.categories() {
        let kw = &cat.keywords[0];
        signals.push(aged("github", &format!("{kw} tooling"), 1));
        signals.push(aged("research", &format!("{kw} analysis"), 2));
        signals.push(aged("research", &format!("{kw} follow-up"), 3));
    }
    let top_n = taxonomy.tuning.top_n;
    let min = taxonomy.tuning.min_strength;
    let mut d = NarrativeDetector::new(taxonomy);
    let top = d.process_at(signals, now());

    assert_eq!(top.len(), top_n);
    for pair in top.windows(2) {
        assert!(pair[0].strength_score >= pair[1].strength_score);
    }
    assert!(top.iter().all(|n| n.strength_score >= min && n.signal_count() > 0));
    assert!(top.iter().all(|n| n.strength_score <= 100.0 && n.confidence <= 100.0));
    assert!(top.iter().all(|n| n.evidence.len() <= 12));
}

#[test]
fn rerunning_derivations_is_idempotent() {
    let mut d = NarrativeDetector::new(taxonomy());
    let meta = SignalMetadata {
        why_emerging: Some("Cheap settlement.".into()),
        ..Default::default()
    };
    d.process_at(
        vec![aged("research", "stablecoin payments", 0).with_metadata(meta)],
        now(),
    );
    let first = d.get("payments").unwrap().clone();
    let tuning = d.taxonomy().tuning.clone();
    let n = d.get_mut("payments").unwrap();
    n.refresh(&tuning, now());
    assert_eq!(n.why_emerging, first.why_emerging);
    assert_eq!(n.strength_score, first.strength_score);
    assert_eq!(n.evidence, first.evidence);
    assert!(n.why_emerging.contains("**Key Drivers:**\n• Cheap settlement."));
}
