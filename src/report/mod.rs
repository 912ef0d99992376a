// src/report/mod.rs
//! Report rendering and output.
//!
//! Renderers are pure `&[Narrative] -> String` functions; `ReportWriter`
//! owns the output directory and file names.

pub mod html;
pub mod json;
pub mod markdown;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::narrative::{group_thousands, Narrative};
use crate::score::Momentum;
use crate::signal::SignalSource;

pub const REPORT_VERSION: &str = "2.0";
pub const MARKDOWN_FILE: &str = "narrative_report.md";
pub const HTML_FILE: &str = "narrative_report.html";
pub const JSON_FILE: &str = "narrative_data.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    Markdown,
    Html,
    Json,
    All,
}

impl ReportFormat {
    /// Concrete formats this selection stands for.
    pub fn expand(self) -> Vec<ReportFormat> {
        match self {
            ReportFormat::All => vec![ReportFormat::Markdown, ReportFormat::Html, ReportFormat::Json],
            f => vec![f],
        }
    }

    pub fn file_name(self) -> Option<&'static str> {
        match self {
            ReportFormat::Markdown => Some(MARKDOWN_FILE),
            ReportFormat::Html => Some(HTML_FILE),
            ReportFormat::Json => Some(JSON_FILE),
            ReportFormat::All => None,
        }
    }
}

impl FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "html" => Ok(ReportFormat::Html),
            "json" => Ok(ReportFormat::Json),
            "all" | "" => Ok(ReportFormat::All),
            other => bail!("unknown report format `{other}` (expected markdown, html, json or all)"),
        }
    }
}

/// One file produced by `ReportWriter::save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReport {
    pub format: ReportFormat,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render and write the selected formats (duplicates are written once).
    pub fn save(
        &self,
        narratives: &[Narrative],
        formats: &[ReportFormat],
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<WrittenReport>> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("creating output dir {}", self.output_dir.display()))?;

        let mut selected: Vec<ReportFormat> = Vec::new();
        for f in formats.iter().flat_map(|f| f.expand()) {
            if !selected.contains(&f) {
                selected.push(f);
            }
        }

        let mut written = Vec::with_capacity(selected.len());
        for format in selected {
            let content = match format {
                ReportFormat::Markdown => markdown::render(narratives, timestamp),
                ReportFormat::Html => html::render(narratives, timestamp),
                ReportFormat::Json => json::render(narratives, timestamp)?,
                ReportFormat::All => continue,
            };
            let Some(name) = format.file_name() else {
                continue;
            };
            let path = self.output_dir.join(name);
            fs::write(&path, content)
                .with_context(|| format!("writing report {}", path.display()))?;
            info!(target: "report", format = ?format, path = %path.display(), "report written");
            written.push(WrittenReport { format, path });
        }
        Ok(written)
    }
}

/* ---- shared formatting helpers ---- */

pub(crate) fn total_signals(narratives: &[Narrative]) -> usize {
    narratives.iter().map(|n| n.signal_count()).sum()
}

pub(crate) fn emoji(n: &Narrative) -> &str {
    n.emoji.as_deref().unwrap_or("📊")
}

pub(crate) fn momentum_icon(m: Momentum) -> &'static str {
    match m {
        Momentum::Rising => "📈",
        Momentum::Stable => "➡️",
        Momentum::Declining => "📉",
    }
}

pub(crate) fn source_icon(s: &SignalSource) -> &'static str {
    match s {
        SignalSource::CodeRepository => "🐙",
        SignalSource::ChainMetrics => "⛓️",
        SignalSource::CuratedResearch => "📰",
        SignalSource::Other(_) => "📊",
    }
}

/// Ten-cell bar, one filled cell per 10 points.
pub(crate) fn strength_bar(score: f64) -> String {
    let filled = ((score / 10.0) as usize).min(10);
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

pub(crate) fn title_case(s: &str) -> String {
    s.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut cs = w.chars();
            match cs.next() {
                Some(first) => first.to_uppercase().chain(cs.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Integral values grouped without decimals, others with two.
pub(crate) fn format_metric(v: f64) -> String {
    if v.fract() == 0.0 {
        return group_thousands(v);
    }
    let fixed = format!("{:.2}", v.abs());
    let (int, dec) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let whole = int.parse::<f64>().map(group_thousands).unwrap_or_else(|_| int.to_string());
    let sign = if v < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{whole}.{dec}")
}

/// Char-boundary safe prefix with a trailing ellipsis when cut.
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push_str("...");
    out
}

/// Header stats from the first narratives that carry them.
pub(crate) fn onchain_headline(narratives: &[Narrative]) -> (String, String) {
    let mut tps = "N/A".to_string();
    let mut stables = "N/A".to_string();
    for n in narratives {
        if let Some(v) = n.key_metrics.get("tps").filter(|v| **v > 0.0) {
            tps = group_thousands(*v);
        }
        if let Some(v) = n.key_metrics.get("total_supply_usd").filter(|v| **v > 0.0) {
            stables = format!("${:.1}B", v / 1e9);
        }
    }
    (tps, stables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_parse_case_insensitively() {
        assert_eq!("MD".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert_eq!("html".parse::<ReportFormat>().unwrap(), ReportFormat::Html);
        assert_eq!(" All ".parse::<ReportFormat>().unwrap(), ReportFormat::All);
        assert!("pdf".parse::<ReportFormat>().is_err());
        assert_eq!(ReportFormat::All.expand().len(), 3);
    }

    #[test]
    fn helpers() {
        assert_eq!(strength_bar(64.0), "██████░░░░");
        assert_eq!(strength_bar(100.0), "██████████");
        assert_eq!(title_case("total_supply_usd"), "Total Supply Usd");
        assert_eq!(format_metric(4200.0), "4,200");
        assert_eq!(format_metric(1234.5), "1,234.50");
        assert_eq!(format_metric(1.999), "2.00");
        assert_eq!(format_metric(-0.5), "-0.50");
        assert_eq!(format_metric(-1234.25), "-1,234.25");
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo...");
        assert_eq!(truncate_chars("short", 10), "short");
    }
}
