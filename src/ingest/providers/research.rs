// src/ingest/providers/research.rs
use anyhow::Result;
use async_trait::async_trait;

use crate::ingest::config::{load_corpus_default, CorpusEntry};
use crate::ingest::types::SignalProvider;
use crate::signal::{Signal, SignalMetadata, Timestamp, CURATED_RESEARCH_TAG};

/// Serves the curated corpus as research signals stamped with the fetch time.
pub struct ResearchProvider {
    entries: Vec<CorpusEntry>,
}

impl ResearchProvider {
    pub fn new(entries: Vec<CorpusEntry>) -> Self {
        Self { entries }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(load_corpus_default()?))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn entry_to_signal(e: &CorpusEntry, now: &Timestamp) -> Signal {
    let metadata = SignalMetadata {
        category: e.category.clone(),
        evidence: e.evidence.clone(),
        why_emerging: e.why_emerging.clone(),
        signal_strength: e.signal_strength,
        ..Default::default()
    };
    Signal::new(CURATED_RESEARCH_TAG, e.title.clone(), e.description.clone())
        .with_url(e.url.clone())
        .with_timestamp(now.clone())
        .with_metadata(metadata)
}

#[async_trait]
impl SignalProvider for ResearchProvider {
    async fn fetch(&self) -> Result<Vec<Signal>> {
        let now = Timestamp::now();
        Ok(self.entries.iter().map(|e| entry_to_signal(e, &now)).collect())
    }

    fn name(&self) -> &'static str {
        "research"
    }
}
