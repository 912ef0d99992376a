// src/ingest/mod.rs
pub mod config;
pub mod providers;
pub mod types;

use crate::ingest::types::{IngestOutcome, SignalProvider};
use crate::signal::Signal;
use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::time::Duration;

pub const USER_AGENT: &str = "NarrativeRadar/2.0";
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_TEXT_CHARS: usize = 1500;

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_signals_total", "Signals kept after normalization and dedup.");
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch/parse errors."
        );
        describe_counter!(
            "ingest_dedup_total",
            "Signals dropped as duplicates (same url and title)."
        );
        describe_gauge!("ingest_last_run_ts", "Unix ts when ingest last ran.");
    });
}

/// HTTP client shared by the network providers.
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .context("building http client")
}

/// Normalize free text: decode entities, strip tags, ASCII quotes,
/// collapse whitespace, cap length.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z][^>]*>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // “ ” ‘ ’ « »
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > MAX_TEXT_CHARS {
        out = out.chars().take(MAX_TEXT_CHARS).collect();
    }
    out
}

/// Normalize title/description and drop repeated (url, title) pairs.
/// Signals without a url are never deduplicated. Returns (kept, dropped).
pub fn normalize_dedup(raw: Vec<Signal>) -> (Vec<Signal>, usize) {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut keep = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;

    for mut s in raw {
        s.title = normalize_text(&s.title);
        s.description = normalize_text(&s.description);
        if !s.url.is_empty() && !seen.insert((s.url.clone(), s.title.clone())) {
            dropped += 1;
            continue;
        }
        keep.push(s);
    }
    (keep, dropped)
}

/// Run every provider once, in order. A failing provider is logged and
/// counted; the others still contribute.
pub async fn run_once(providers: &[Box<dyn SignalProvider>]) -> IngestOutcome {
    ensure_metrics_described();

    let mut raw = Vec::new();
    let mut per_provider = Vec::with_capacity(providers.len());
    let mut errors = 0usize;
    for p in providers {
        match p.fetch().await {
            Ok(mut v) => {
                tracing::info!(target: "ingest", provider = p.name(), count = v.len(), "provider fetched");
                per_provider.push((p.name(), v.len()));
                raw.append(&mut v);
            }
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, provider = p.name(), "provider error");
                counter!("ingest_provider_errors_total").increment(1);
                per_provider.push((p.name(), 0));
                errors += 1;
            }
        }
    }

    let (signals, dedup) = normalize_dedup(raw);

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    counter!("ingest_signals_total").increment(signals.len() as u64);
    counter!("ingest_dedup_total").increment(dedup as u64);
    gauge!("ingest_last_run_ts").set(now as f64);

    IngestOutcome {
        signals,
        per_provider,
        provider_errors: errors,
        dedup_dropped: dedup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_decodes_strips_and_collapses() {
        let s = "  <p>Hello,&nbsp;&nbsp; <b>world</b>!</p>\n\n “quoted” ";
        assert_eq!(normalize_text(s), "Hello, world! \"quoted\"");
    }

    #[test]
    fn normalize_text_keeps_dollar_amounts_and_comparisons() {
        assert_eq!(normalize_text("TVL > $1.5B, up 45%."), "TVL > $1.5B, up 45%.");
    }

    #[test]
    fn normalize_text_caps_length() {
        let long = "a".repeat(MAX_TEXT_CHARS + 50);
        assert_eq!(normalize_text(&long).chars().count(), MAX_TEXT_CHARS);
    }

    #[test]
    fn dedup_on_url_and_title_first_wins() {
        let a = Signal::new("github", "org/a", "first").with_url("https://x/a");
        let b = Signal::new("github", "org/a", "second").with_url("https://x/a");
        let c = Signal::new("research", "other", "same url").with_url("https://x/a");
        let d = Signal::new("research", "no url", "");
        let e = Signal::new("research", "no url", "");
        let (kept, dropped) = normalize_dedup(vec![a, b, c, d, e]);
        assert_eq!(dropped, 1);
        assert_eq!(kept.len(), 4);
        assert_eq!(kept[0].description, "first");
    }
}
