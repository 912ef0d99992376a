// src/ingest/types.rs
use anyhow::Result;

use crate::signal::Signal;

/// A source of raw signals. Implementations do their own I/O, timeouts and
/// retries; the narrative core only sees the materialized batch.
#[async_trait::async_trait]
pub trait SignalProvider: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Signal>>;
    fn name(&self) -> &'static str;
}

/// Result of one ingest pass.
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    pub signals: Vec<Signal>,
    /// Signals returned per provider, in provider order (before dedup).
    pub per_provider: Vec<(&'static str, usize)>,
    pub provider_errors: usize,
    pub dedup_dropped: usize,
}
