// tests/pipeline_e2e.rs
// Full run with mock providers: ingest → detect → ideas → report files.

use anyhow::{bail, Result};
use async_trait::async_trait;
use narrative_radar::ideas::IdeaCatalog;
use narrative_radar::ingest::config::builtin_corpus;
use narrative_radar::ingest::providers::ResearchProvider;
use narrative_radar::ingest::types::SignalProvider;
use narrative_radar::pipeline::{run_with, PipelineConfig};
use narrative_radar::report::{ReportFormat, HTML_FILE, JSON_FILE, MARKDOWN_FILE};
use narrative_radar::signal::{RepositoryStats, SignalMetadata, SignalStrength};
use narrative_radar::{Signal, Taxonomy};
use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

struct MockChain;

#[async_trait]
impl SignalProvider for MockChain {
    async fn fetch(&self) -> Result<Vec<Signal>> {
        let meta = SignalMetadata {
            category: Some("stablecoins_payfi".into()),
            evidence: vec!["Total stablecoin supply on Solana: $12.40B".into()],
            signal_strength: Some(SignalStrength::High),
            metrics: BTreeMap::from([("total_supply_usd".to_string(), 12.4e9)]),
            ..Default::default()
        };
        Ok(vec![Signal::new(
            "helius_onchain",
            "$12.40B Stablecoins on Solana",
            "Total stablecoin supply on Solana: $12.40B.",
        )
        .with_url("https://solscan.io")
        .with_metadata(meta)])
    }
    fn name(&self) -> &'static str {
        "MockChain"
    }
}

struct MockRepos;

#[async_trait]
impl SignalProvider for MockRepos {
    async fn fetch(&self) -> Result<Vec<Signal>> {
        let repo = |stars| SignalMetadata {
            repository: Some(RepositoryStats {
                stars,
                ..Default::default()
            }),
            ..Default::default()
        };
        Ok(vec![
            Signal::new("github", "org/agent-kit", "Autonomous agent toolkit")
                .with_url("https://github.com/org/agent-kit")
                .with_metadata(repo(2_000)),
            Signal::new("github", "org/usdc-pay", "Stablecoin payment rails")
                .with_url("https://github.com/org/usdc-pay")
                .with_metadata(repo(300)),
        ])
    }
    fn name(&self) -> &'static str {
        "MockRepos"
    }
}

struct Offline;

#[async_trait]
impl SignalProvider for Offline {
    async fn fetch(&self) -> Result<Vec<Signal>> {
        bail!("offline")
    }
    fn name(&self) -> &'static str {
        "Offline"
    }
}

#[tokio::test]
async fn run_writes_all_reports() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = PipelineConfig {
        output_dir: tmp.path().join("out"),
        ..Default::default()
    };
    let providers: Vec<Box<dyn SignalProvider>> = vec![
        Box::new(MockChain),
        Box::new(Offline),
        Box::new(MockRepos),
        Box::new(ResearchProvider::new(builtin_corpus().unwrap())),
    ];
    let taxonomy = Arc::new(Taxonomy::builtin().unwrap());
    let catalog = IdeaCatalog::builtin().unwrap();

    let out = run_with(&cfg, taxonomy, &catalog, &providers).await.unwrap();

    assert_eq!(out.provider_errors, 1);
    assert!(out.signals_collected >= 3);
    assert!(!out.narratives.is_empty() && out.narratives.len() <= 7);
    assert!(out.ideas > 0);
    assert!(out.narratives.iter().all(|n| !n.build_ideas.is_empty()));
    for pair in out.narratives.windows(2) {
        assert!(pair[0].strength_score >= pair[1].strength_score);
    }

    let payfi = out
        .narratives
        .iter()
        .find(|n| n.category == "stablecoins_payfi")
        .expect("stablecoin narrative present");
    assert!(payfi.why_emerging.contains("**On-Chain Validation:** $12.40B stablecoin supply"));

    assert_eq!(out.files.len(), 3);
    for name in [MARKDOWN_FILE, HTML_FILE, JSON_FILE] {
        assert!(tmp.path().join("out").join(name).exists(), "{name} missing");
    }

    let md = fs::read_to_string(tmp.path().join("out").join(MARKDOWN_FILE)).unwrap();
    assert!(md.starts_with("# 🔮 Solana Narrative Radar Report"));
    assert!(md.contains(&payfi.name));

    let html = fs::read_to_string(tmp.path().join("out").join(HTML_FILE)).unwrap();
    assert!(html.contains("<title>Solana Narrative Radar | Live Dashboard</title>"));

    let raw = fs::read_to_string(tmp.path().join("out").join(JSON_FILE)).unwrap();
    let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(v["version"], "2.0");
    assert_eq!(v["narratives"].as_array().unwrap().len(), out.narratives.len());
    assert_eq!(v["narratives"][0]["name"], out.narratives[0].name.as_str());
}

#[tokio::test]
async fn single_format_and_top_n_override() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = PipelineConfig {
        output_dir: tmp.path().to_path_buf(),
        formats: vec![ReportFormat::Json],
        top_n: Some(2),
        ..Default::default()
    };
    let providers: Vec<Box<dyn SignalProvider>> =
        vec![Box::new(ResearchProvider::new(builtin_corpus().unwrap()))];
    let out = run_with(
        &cfg,
        Arc::new(Taxonomy::builtin().unwrap()),
        &IdeaCatalog::builtin().unwrap(),
        &providers,
    )
    .await
    .unwrap();

    assert!(out.narratives.len() <= 2);
    assert_eq!(out.files.len(), 1);
    assert!(tmp.path().join(JSON_FILE).exists());
    assert!(!tmp.path().join(MARKDOWN_FILE).exists());
}

#[tokio::test]
async fn no_signals_still_writes_empty_reports() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = PipelineConfig {
        output_dir: tmp.path().to_path_buf(),
        ..Default::default()
    };
    let providers: Vec<Box<dyn SignalProvider>> = vec![Box::new(Offline)];
    let out = run_with(
        &cfg,
        Arc::new(Taxonomy::builtin().unwrap()),
        &IdeaCatalog::builtin().unwrap(),
        &providers,
    )
    .await
    .unwrap();

    assert!(out.narratives.is_empty());
    assert_eq!(out.ideas, 0);
    let v: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tmp.path().join(JSON_FILE)).unwrap()).unwrap();
    assert_eq!(v["total_signals"], 0);
    assert!(v["narratives"].as_array().unwrap().is_empty());
}
