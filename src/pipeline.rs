// src/pipeline.rs
//! End-to-end run: fetch → detect → ideas → reports.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use crate::detector::NarrativeDetector;
use crate::ideas::IdeaCatalog;
use crate::ingest::providers::{github, ChainRpcProvider, GitHubProvider, ResearchProvider};
use crate::ingest::run_once;
use crate::ingest::types::SignalProvider;
use crate::narrative::Narrative;
use crate::report::{ReportFormat, ReportWriter, WrittenReport};
use crate::taxonomy::Taxonomy;

pub const ENV_OUTPUT_DIR: &str = "NARRATIVE_OUTPUT_DIR";
pub const ENV_FORMAT: &str = "NARRATIVE_FORMAT";
pub const ENV_TOP_N: &str = "NARRATIVE_TOP_N";
pub const ENV_LOOKBACK_DAYS: &str = "GITHUB_LOOKBACK_DAYS";
pub const ENV_GITHUB_LIMIT: &str = "GITHUB_LIMIT";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    pub formats: Vec<ReportFormat>,
    /// Overrides the taxonomy's `top_n` when set.
    pub top_n: Option<usize>,
    pub github_token: Option<String>,
    pub chain_api_key: Option<String>,
    pub lookback_days: i64,
    pub github_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            formats: vec![ReportFormat::All],
            top_n: None,
            github_token: None,
            chain_api_key: None,
            lookback_days: github::DEFAULT_LOOKBACK_DAYS,
            github_limit: github::DEFAULT_LIMIT,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(dir) = env_nonempty(ENV_OUTPUT_DIR) {
            cfg.output_dir = PathBuf::from(dir);
        }
        if let Some(raw) = env_nonempty(ENV_FORMAT) {
            cfg.formats = parse_formats(&raw)?;
        }
        cfg.top_n = env_parse::<usize>(ENV_TOP_N)?;
        if let Some(days) = env_parse::<i64>(ENV_LOOKBACK_DAYS)? {
            cfg.lookback_days = days;
        }
        if let Some(limit) = env_parse::<usize>(ENV_GITHUB_LIMIT)? {
            cfg.github_limit = limit;
        }
        cfg.github_token = env_nonempty(github::ENV_TOKEN);
        cfg.chain_api_key = env_nonempty(crate::ingest::providers::chain::ENV_API_KEY);
        Ok(cfg)
    }

    /// Providers in trust order: chain data, code hosting, curated corpus.
    pub fn providers(&self) -> Result<Vec<Box<dyn SignalProvider>>> {
        Ok(vec![
            Box::new(ChainRpcProvider::new(self.chain_api_key.clone())?),
            Box::new(GitHubProvider::new(
                self.github_token.clone(),
                self.lookback_days,
                self.github_limit,
            )?),
            Box::new(ResearchProvider::from_env()?),
        ])
    }
}

/// Comma-separated list, e.g. `markdown,json`.
pub fn parse_formats(raw: &str) -> Result<Vec<ReportFormat>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ReportFormat::from_str)
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("parsing {ENV_FORMAT}={raw}"))
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env_nonempty(key)
        .map(|v| v.parse::<T>().with_context(|| format!("parsing {key}={v}")))
        .transpose()
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub signals_collected: usize,
    pub provider_errors: usize,
    pub narratives: Vec<Narrative>,
    pub ideas: usize,
    pub files: Vec<WrittenReport>,
}

/// Full run with providers and data files resolved from the environment.
pub async fn run_pipeline(cfg: &PipelineConfig) -> Result<PipelineOutcome> {
    let taxonomy = Arc::new(Taxonomy::from_env().context("loading taxonomy")?);
    let catalog = IdeaCatalog::from_env().context("loading idea catalog")?;
    let providers = cfg.providers()?;
    run_with(cfg, taxonomy, &catalog, &providers).await
}

/// Run against explicit collaborators.
pub async fn run_with(
    cfg: &PipelineConfig,
    taxonomy: Arc<Taxonomy>,
    catalog: &IdeaCatalog,
    providers: &[Box<dyn SignalProvider>],
) -> Result<PipelineOutcome> {
    info!(target: "pipeline", providers = providers.len(), "fetching signals");
    let ingest = run_once(providers).await;
    let signals_collected = ingest.signals.len();

    let limit = cfg.top_n.unwrap_or(taxonomy.tuning.top_n);
    let mut detector = NarrativeDetector::new(taxonomy);
    detector.process(ingest.signals);
    let mut narratives = detector.top_narratives(limit);
    for n in &narratives {
        info!(
            target: "pipeline",
            narrative = %n.name,
            strength = n.strength_score,
            confidence = n.confidence,
            signals = n.signal_count(),
            "emerging narrative"
        );
    }

    let ideas = catalog.attach_ideas(&mut narratives);

    let writer = ReportWriter::new(&cfg.output_dir);
    let files = writer.save(&narratives, &cfg.formats, Utc::now())?;

    info!(
        target: "pipeline",
        signals = signals_collected,
        narratives = narratives.len(),
        ideas,
        reports = files.len(),
        "pipeline complete"
    );

    Ok(PipelineOutcome {
        signals_collected,
        provider_errors: ingest.provider_errors,
        narratives,
        ideas,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn formats_parse_from_lists() {
        assert_eq!(
            parse_formats("markdown, json").unwrap(),
            vec![ReportFormat::Markdown, ReportFormat::Json]
        );
        assert!(parse_formats("markdown,pdf").is_err());
    }

    #[serial_test::serial]
    #[test]
    fn config_reads_env() {
        for k in [ENV_OUTPUT_DIR, ENV_FORMAT, ENV_TOP_N, ENV_LOOKBACK_DAYS, ENV_GITHUB_LIMIT] {
            env::remove_var(k);
        }
        let d = PipelineConfig::from_env().unwrap();
        assert_eq!(d.output_dir, PathBuf::from("output"));
        assert_eq!(d.formats, vec![ReportFormat::All]);
        assert_eq!(d.top_n, None);
        assert_eq!(d.lookback_days, 14);

        env::set_var(ENV_OUTPUT_DIR, "/tmp/radar");
        env::set_var(ENV_FORMAT, "html");
        env::set_var(ENV_TOP_N, "3");
        env::set_var(ENV_GITHUB_LIMIT, "10");
        let c = PipelineConfig::from_env().unwrap();
        assert_eq!(c.output_dir, PathBuf::from("/tmp/radar"));
        assert_eq!(c.formats, vec![ReportFormat::Html]);
        assert_eq!(c.top_n, Some(3));
        assert_eq!(c.github_limit, 10);

        env::set_var(ENV_TOP_N, "many");
        assert!(PipelineConfig::from_env().is_err());

        for k in [ENV_OUTPUT_DIR, ENV_FORMAT, ENV_TOP_N, ENV_GITHUB_LIMIT] {
            env::remove_var(k);
        }
    }
}
