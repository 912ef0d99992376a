// src/ingest/config.rs
//! Curated research corpus loading. TOML (`[[signals]]` tables) or JSON
//! (array of entries, or `{ "signals": [...] }`).

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::signal::SignalStrength;

pub const ENV_CORPUS_PATH: &str = "NARRATIVE_CORPUS_PATH";
pub const DEFAULT_CORPUS_TOML: &str = "config/research.toml";
pub const DEFAULT_CORPUS_JSON: &str = "config/research.json";

const BUILTIN_CORPUS: &str = include_str!("../../config/research.toml");

/// One curated research item.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CorpusEntry {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub why_emerging: Option<String>,
    #[serde(default)]
    pub signal_strength: Option<SignalStrength>,
}

#[derive(Deserialize)]
struct CorpusFile {
    #[serde(default)]
    signals: Vec<CorpusEntry>,
}

/// Load the corpus from an explicit path.
pub fn load_corpus_from(path: &Path) -> Result<Vec<CorpusEntry>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading corpus from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_corpus(&content, ext.as_str())
        .with_context(|| format!("parsing corpus {}", path.display()))
}

/// Load the corpus using env var + fallbacks:
/// 1) $NARRATIVE_CORPUS_PATH
/// 2) config/research.toml
/// 3) config/research.json
/// 4) built-in corpus
pub fn load_corpus_default() -> Result<Vec<CorpusEntry>> {
    if let Ok(p) = std::env::var(ENV_CORPUS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_corpus_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CORPUS_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_CORPUS_TOML);
    if toml_p.exists() {
        return load_corpus_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_CORPUS_JSON);
    if json_p.exists() {
        return load_corpus_from(&json_p);
    }
    builtin_corpus()
}

pub fn builtin_corpus() -> Result<Vec<CorpusEntry>> {
    parse_toml(BUILTIN_CORPUS).context("parsing built-in corpus")
}

fn parse_corpus(s: &str, hint_ext: &str) -> Result<Vec<CorpusEntry>> {
    let try_toml = hint_ext == "toml" || s.contains("[[signals]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported corpus format"))
}

fn parse_toml(s: &str) -> Result<Vec<CorpusEntry>> {
    let v: CorpusFile = toml::from_str(s)?;
    Ok(clean_entries(v.signals))
}

fn parse_json(s: &str) -> Result<Vec<CorpusEntry>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum JsonCorpus {
        List(Vec<CorpusEntry>),
        Wrapped(CorpusFile),
    }
    let entries = match serde_json::from_str::<JsonCorpus>(s)? {
        JsonCorpus::List(v) => v,
        JsonCorpus::Wrapped(f) => f.signals,
    };
    Ok(clean_entries(entries))
}

/// Trim text fields and drop entries without a title.
fn clean_entries(items: Vec<CorpusEntry>) -> Vec<CorpusEntry> {
    items
        .into_iter()
        .filter_map(|mut e| {
            e.title = e.title.trim().to_string();
            e.description = e.description.trim().to_string();
            e.url = e.url.trim().to_string();
            e.evidence.retain(|x| !x.trim().is_empty());
            (!e.title.is_empty()).then_some(e)
        })
        .collect()
}
