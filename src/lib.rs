// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod signal;
pub mod taxonomy;

// Narrative core (classification, scoring, evidence, aggregation)
pub mod classify;
pub mod detector;
pub mod evidence;
pub mod narrative;
pub mod score;

// Collaborators around the core
pub mod ideas;
pub mod ingest;
pub mod pipeline;
pub mod report;

// ---- Re-exports for stable public API ----
pub use crate::classify::{Classification, Classifier};
pub use crate::detector::{detect_narratives, NarrativeDetector, NarrativeSummary};
pub use crate::narrative::{Narrative, NarrativeRecord};
pub use crate::score::Momentum;
pub use crate::signal::{Signal, SignalMetadata, SignalSource, Timestamp};
pub use crate::taxonomy::{Taxonomy, Tuning};
