// src/evidence.rs
//! Evidence extraction: short supporting facts mined from signal text.
//!
//! Three independent matchers run over a description:
//! - amounts:     `$1.5B`, `$100M+`, `$1,200`   → "Market signal: <amount>"
//! - growth:      `45%`, `2,800%` (only > 20)    → "Growth: <pct>"
//! - scale:       `12K daily active`, `300K users` → "Scale: <match>"
//!
//! `extract_evidence` adds curated metadata evidence verbatim, dedups on the
//! exact string and caps the list.

use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

use crate::signal::Signal;

const SCALE_WORDS: &str = "users|transactions|tokens|daily|active";

fn amount_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\$\d+(?:[.,]\d+)*[KMB]?\+?").unwrap())
}

fn percent_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:[.,]\d+)*%").unwrap())
}

fn scale_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)\d+(?:[.,]\d+)*[KM]\+?(?:\s+(?:{SCALE_WORDS}))+"
        ))
        .unwrap()
    })
}

/// Dollar amounts, e.g. `"Market signal: $1.5B"`.
pub fn extract_amounts(text: &str) -> Vec<String> {
    amount_re()
        .find_iter(text)
        .map(|m| format!("Market signal: {}", m.as_str()))
        .collect()
}

/// Percentages above the noise floor of 20%, e.g. `"Growth: 45%"`.
pub fn extract_growth(text: &str) -> Vec<String> {
    percent_re()
        .find_iter(text)
        .filter(|m| percent_value(m.as_str()).is_some_and(|v| v > 20.0))
        .map(|m| format!("Growth: {}", m.as_str()))
        .collect()
}

/// Magnitude counts followed by a scale word, e.g. `"Scale: 12K daily active"`.
pub fn extract_scale(text: &str) -> Vec<String> {
    scale_re()
        .find_iter(text)
        .map(|m| format!("Scale: {}", m.as_str()))
        .collect()
}

/// `"2,800%"` → 2800.0. Commas are thousands separators.
fn percent_value(raw: &str) -> Option<f64> {
    raw.trim_end_matches('%').replace(',', "").parse::<f64>().ok()
}

/// All matcher output for one description, in matcher order.
pub fn extract_from_text(text: &str) -> Vec<String> {
    let mut out = extract_amounts(text);
    out.extend(extract_growth(text));
    out.extend(extract_scale(text));
    out
}

/// Deduplicated evidence over a narrative's signals, at most `limit` items.
/// Order follows first appearance; it carries no ranking meaning.
pub fn extract_evidence(signals: &[Arc<Signal>], limit: usize) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for signal in signals {
        let candidates = signal
            .metadata
            .evidence
            .iter()
            .cloned()
            .chain(extract_from_text(&signal.description));
        for item in candidates {
            if seen.insert(item.clone()) {
                out.push(item);
            }
        }
    }

    out.truncate(limit);
    out
}
