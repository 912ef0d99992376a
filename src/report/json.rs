// src/report/json.rs
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::{total_signals, REPORT_VERSION};
use crate::narrative::{Narrative, NarrativeRecord};

/// Top-level shape of `narrative_data.json`.
#[derive(Debug, Serialize)]
pub struct ReportDocument {
    pub version: &'static str,
    pub timestamp: String,
    pub total_signals: usize,
    pub narratives: Vec<NarrativeRecord>,
}

pub fn document(narratives: &[Narrative], timestamp: DateTime<Utc>) -> ReportDocument {
    ReportDocument {
        version: REPORT_VERSION,
        timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        total_signals: total_signals(narratives),
        narratives: narratives.iter().map(Narrative::to_record).collect(),
    }
}

pub fn render(narratives: &[Narrative], timestamp: DateTime<Utc>) -> Result<String> {
    serde_json::to_string_pretty(&document(narratives, timestamp))
        .context("serializing narrative data")
}
