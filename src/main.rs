//! Narrative Radar — Binary Entrypoint
//! Loads `.env`, initializes tracing, runs one detection pass and writes
//! the reports. Configuration is environment-only (see `README.md`).

use narrative_radar::pipeline::{run_pipeline, PipelineConfig};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const ENV_LOG_FORMAT: &str = "NARRATIVE_LOG_FORMAT";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(ENV_LOG_FORMAT).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    // `json` for log shippers, compact text otherwise
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = match PipelineConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = ?e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match run_pipeline(&cfg).await {
        Ok(outcome) => {
            if let Some(top) = outcome.narratives.first() {
                let start = top.build_ideas.first().map(|i| i.name.as_str()).unwrap_or("-");
                tracing::info!(narrative = %top.name, start_with = start, "top recommendation");
            }
            for f in &outcome.files {
                tracing::info!(format = ?f.format, path = %f.path.display(), "report");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = ?e, "pipeline failed");
            ExitCode::FAILURE
        }
    }
}
