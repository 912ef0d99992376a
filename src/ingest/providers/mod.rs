// src/ingest/providers/mod.rs
pub mod chain;
pub mod github;
pub mod research;

pub use chain::ChainRpcProvider;
pub use github::GitHubProvider;
pub use research::ResearchProvider;
