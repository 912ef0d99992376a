// src/ingest/providers/chain.rs
//! On-chain metrics via JSON-RPC.
//!
//! The fetch side gathers raw stats (network performance, program activity,
//! stablecoin supply, marketplace activity). The `*_signal` builders are pure
//! and turn those stats into chain-metrics signals with a strength rating and
//! numeric `metrics`. Individual RPC failures only blank out the stat they
//! feed; without an API key the provider yields nothing.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::ingest::types::SignalProvider;
use crate::narrative::group_thousands;
use crate::signal::{Signal, SignalMetadata, SignalStrength, Timestamp, CHAIN_METRICS_TAG};

pub const ENV_API_KEY: &str = "HELIUS_API_KEY";
pub const RPC_URL: &str = "https://mainnet.helius-rpc.com";
pub const EXPLORER_URL: &str = "https://solscan.io";

const PROGRAM_SIGNATURE_LIMIT: u32 = 100;
const MARKETPLACE_SIGNATURE_LIMIT: u32 = 50;
const PROGRAM_SIGNALS_MAX: usize = 5;
const EVIDENCE_CHARS: usize = 100;

/// Tracked programs: (program id, display name, category).
pub const PROGRAMS: &[(&str, &str, &str)] = &[
    ("JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4", "Jupiter", "defi_evolution"),
    ("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8", "Raydium", "defi_evolution"),
    ("whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc", "Orca Whirlpools", "defi_evolution"),
    ("MFv2hWf31Z9kbCa1snEPYctwafyhdvnV7FZnsebVacA", "Marginfi", "defi_evolution"),
    ("KLend2g3cP87ber7j6xNxhQNGFpxmuQJ9HqaJwk9iCKc", "Kamino", "defi_evolution"),
    ("6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P", "Pump.fun", "memecoins"),
    ("mSoLzYCxHdYgdzU16g5QSh3i5K3z3KZK7ytfqcJm7So", "Marinade", "infrastructure"),
    ("Jito4APyf642JPZPx3hGc6WWJ8zPKtRbRs4P815Awbb", "Jito", "infrastructure"),
    ("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s", "Metaplex", "zk_compression"),
    ("cmtDvXumGCrqC1Age74AVPhSRVXJMd8PJS91L8KbNCK", "Bubblegum (cNFT)", "zk_compression"),
];

/// Tracked stablecoin mints: (mint, symbol). The first one leads the summary.
pub const STABLECOINS: &[(&str, &str)] = &[
    ("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", "USDC"),
    ("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB", "USDT"),
    ("USDSwr9ApdHk5bvJKMjzff41FfuX8bSxdKcR81vTwcA", "USDS"),
];

/// Tracked NFT marketplaces: (program id, name).
pub const MARKETPLACES: &[(&str, &str)] = &[
    ("M2mx93ekt1fmXSVkTrUL9xVFHkmME8HTUi5Cyc5aF7K", "Magic Eden"),
    ("TSWAPaqyCSx2KABk68Shruf4rp7CxcNi8hAsbdwmHbN", "Tensor"),
];

/* ---- Raw stats ---- */

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkStats {
    pub tps: u64,
    pub slot: u64,
    pub epoch: u64,
    pub block_height: u64,
    pub active_validators: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramActivity {
    pub program_id: String,
    pub name: String,
    pub category: String,
    pub recent_tx_count: usize,
}

impl ProgramActivity {
    /// "high" above 80 recent transactions, "medium" above 40.
    pub fn activity_level(&self) -> SignalStrength {
        match self.recent_tx_count {
            n if n > 80 => SignalStrength::High,
            n if n > 40 => SignalStrength::Medium,
            _ => SignalStrength::Low,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StablecoinSupply {
    /// (symbol, ui supply) in table order, only for mints that answered.
    pub tokens: Vec<(String, f64)>,
}

impl StablecoinSupply {
    pub fn total(&self) -> f64 {
        self.tokens.iter().map(|(_, v)| v).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketplaceActivity {
    /// (name, recent trades) in table order.
    pub marketplaces: Vec<(String, usize)>,
}

impl MarketplaceActivity {
    pub fn total(&self) -> usize {
        self.marketplaces.iter().map(|(_, n)| n).sum()
    }
}

/* ---- Pure builders ---- */

fn chain_signal(
    title: String,
    description: String,
    category: &str,
    strength: SignalStrength,
    metrics: BTreeMap<String, f64>,
) -> Signal {
    let evidence: String = description.chars().take(EVIDENCE_CHARS).collect();
    let metadata = SignalMetadata {
        category: Some(category.to_string()),
        evidence: vec![evidence],
        signal_strength: Some(strength),
        metrics,
        ..Default::default()
    };
    Signal::new(CHAIN_METRICS_TAG, title, description)
        .with_url(EXPLORER_URL)
        .with_timestamp(Timestamp::now())
        .with_metadata(metadata)
}

pub fn network_signal(n: &NetworkStats) -> Option<Signal> {
    if n.tps == 0 {
        return None;
    }
    let tps = group_thousands(n.tps as f64);
    let validators = group_thousands(n.active_validators as f64);
    let metrics = BTreeMap::from([
        ("tps".to_string(), n.tps as f64),
        ("slot".to_string(), n.slot as f64),
        ("epoch".to_string(), n.epoch as f64),
        ("block_height".to_string(), n.block_height as f64),
        ("active_validators".to_string(), n.active_validators as f64),
    ]);
    let strength = if n.tps > 3000 {
        SignalStrength::High
    } else {
        SignalStrength::Medium
    };
    Some(chain_signal(
        format!("Solana Network: {tps} TPS, {validators} Validators"),
        format!(
            "Real-time network performance: {tps} transactions per second across {validators} active validators. Epoch {}, block height {}.",
            n.epoch,
            group_thousands(n.block_height as f64)
        ),
        "infrastructure",
        strength,
        metrics,
    ))
}

/// Busiest programs first; only medium/high activity, at most five.
pub fn program_signals(programs: &[ProgramActivity]) -> Vec<Signal> {
    let mut sorted: Vec<&ProgramActivity> = programs.iter().collect();
    sorted.sort_by(|a, b| b.recent_tx_count.cmp(&a.recent_tx_count));
    sorted
        .into_iter()
        .take(PROGRAM_SIGNALS_MAX)
        .filter(|p| {
            matches!(
                p.activity_level(),
                SignalStrength::High | SignalStrength::Medium
            )
        })
        .map(|p| {
            let level = p.activity_level();
            let level_str = match level {
                SignalStrength::High => "high",
                _ => "medium",
            };
            let metrics =
                BTreeMap::from([("recent_tx_count".to_string(), p.recent_tx_count as f64)]);
            chain_signal(
                format!("{}: {} recent transactions", p.name, p.recent_tx_count),
                format!(
                    "{} showing {level_str} activity with {} transactions in recent blocks. This indicates strong {} narrative momentum.",
                    p.name,
                    p.recent_tx_count,
                    p.category.replace('_', " ")
                ),
                &p.category,
                level,
                metrics,
            )
        })
        .collect()
}

pub fn stablecoin_signal(s: &StablecoinSupply) -> Option<Signal> {
    let total = s.total();
    if total <= 0.0 {
        return None;
    }
    let (lead_name, lead_supply) = s.tokens.first().cloned()?;
    let mut metrics = BTreeMap::from([("total_supply_usd".to_string(), total)]);
    for (name, supply) in &s.tokens {
        metrics.insert(format!("{}_supply", name.to_lowercase()), *supply);
    }
    let strength = if total > 5e9 {
        SignalStrength::High
    } else {
        SignalStrength::Medium
    };
    Some(chain_signal(
        format!("${:.2}B Stablecoins on Solana", total / 1e9),
        format!(
            "Total stablecoin supply on Solana: ${:.2}B. {lead_name} leads with ${:.2}B. Strong PayFi infrastructure signal.",
            total / 1e9,
            lead_supply / 1e9
        ),
        "stablecoins_payfi",
        strength,
        metrics,
    ))
}

pub fn marketplace_signal(m: &MarketplaceActivity) -> Option<Signal> {
    let total = m.total();
    if total == 0 {
        return None;
    }
    // First maximum wins on ties.
    let (top_name, top_trades) = m
        .marketplaces
        .iter()
        .fold(None::<&(String, usize)>, |best, cur| match best {
            Some(b) if b.1 >= cur.1 => Some(b),
            _ => Some(cur),
        })
        .cloned()?;
    let mut metrics = BTreeMap::from([("total_recent_trades".to_string(), total as f64)]);
    for (name, trades) in &m.marketplaces {
        metrics.insert(
            format!("{}_trades", name.to_lowercase().replace(' ', "_")),
            *trades as f64,
        );
    }
    let strength = if total > 50 {
        SignalStrength::Medium
    } else {
        SignalStrength::Low
    };
    Some(chain_signal(
        format!("NFT Trading: {total} recent trades"),
        format!(
            "{top_name} leading with {top_trades} recent trades. NFT and compressed NFT activity remains active, signaling ongoing zk_compression adoption."
        ),
        "zk_compression",
        strength,
        metrics,
    ))
}

/* ---- RPC response pieces ---- */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSample {
    #[serde(default)]
    pub num_transactions: u64,
    #[serde(default)]
    pub sample_period_secs: u64,
}

/// Transactions per second of the first sample, rounded.
pub fn tps_from_samples(samples: &[PerformanceSample]) -> u64 {
    samples
        .first()
        .map(|s| {
            let period = s.sample_period_secs.max(1);
            (s.num_transactions as f64 / period as f64).round() as u64
        })
        .unwrap_or(0)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EpochInfo {
    #[serde(default)]
    epoch: u64,
    #[serde(default)]
    absolute_slot: u64,
    #[serde(default)]
    block_height: u64,
}

#[derive(Debug, Deserialize)]
struct VoteAccounts {
    #[serde(default)]
    current: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TokenSupply {
    value: TokenAmount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAmount {
    #[serde(default)]
    ui_amount_string: String,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<Value>,
}

/* ---- Provider ---- */

pub struct ChainRpcProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    rpc_url: String,
}

impl ChainRpcProvider {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: crate::ingest::http_client()?,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            rpc_url: RPC_URL.to_string(),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(std::env::var(ENV_API_KEY).ok())
    }

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = url.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn rpc<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let key = self.api_key.as_deref().unwrap_or_default();
        let payload = json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": params});
        let resp = self
            .client
            .post(&self.rpc_url)
            .query(&[("api-key", key)])
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("rpc {method} request"))?;
        let envelope: RpcEnvelope<T> = resp
            .error_for_status()
            .with_context(|| format!("rpc {method} status"))?
            .json()
            .await
            .with_context(|| format!("rpc {method} body"))?;
        match (envelope.result, envelope.error) {
            (Some(r), _) => Ok(r),
            (None, Some(e)) => bail!("rpc {method} error: {e}"),
            (None, None) => bail!("rpc {method} returned no result"),
        }
    }

    /// Log-and-drop wrapper: one failed call must not sink the whole fetch.
    async fn rpc_opt<T: DeserializeOwned>(&self, method: &str, params: Value) -> Option<T> {
        match self.rpc(method, params).await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(target: "ingest", provider = "chain", method, error = ?e, "rpc call failed");
                None
            }
        }
    }

    pub async fn network_stats(&self) -> NetworkStats {
        let mut stats = NetworkStats::default();
        if let Some(samples) = self
            .rpc_opt::<Vec<PerformanceSample>>("getRecentPerformanceSamples", json!([1]))
            .await
        {
            stats.tps = tps_from_samples(&samples);
        }
        if let Some(info) = self.rpc_opt::<EpochInfo>("getEpochInfo", json!([])).await {
            stats.epoch = info.epoch;
            stats.slot = info.absolute_slot;
            stats.block_height = info.block_height;
        }
        if let Some(votes) = self.rpc_opt::<VoteAccounts>("getVoteAccounts", json!([])).await {
            stats.active_validators = votes.current.len() as u64;
        }
        stats
    }

    async fn signature_count(&self, address: &str, limit: u32) -> Option<usize> {
        self.rpc_opt::<Vec<Value>>("getSignaturesForAddress", json!([address, {"limit": limit}]))
            .await
            .map(|v| v.len())
    }

    pub async fn program_activity(&self) -> Vec<ProgramActivity> {
        let mut out = Vec::new();
        for (id, name, category) in PROGRAMS {
            match self.signature_count(id, PROGRAM_SIGNATURE_LIMIT).await {
                Some(n) if n > 0 => out.push(ProgramActivity {
                    program_id: id.to_string(),
                    name: name.to_string(),
                    category: category.to_string(),
                    recent_tx_count: n,
                }),
                _ => {}
            }
        }
        out
    }

    pub async fn stablecoin_supply(&self) -> StablecoinSupply {
        let mut supply = StablecoinSupply::default();
        for (mint, symbol) in STABLECOINS {
            if let Some(ts) = self.rpc_opt::<TokenSupply>("getTokenSupply", json!([mint])).await {
                let ui = ts.value.ui_amount_string.parse::<f64>().unwrap_or(0.0);
                supply.tokens.push((symbol.to_string(), ui));
            }
        }
        supply
    }

    pub async fn marketplace_activity(&self) -> MarketplaceActivity {
        let mut activity = MarketplaceActivity::default();
        for (id, name) in MARKETPLACES {
            if let Some(n) = self.signature_count(id, MARKETPLACE_SIGNATURE_LIMIT).await {
                activity.marketplaces.push((name.to_string(), n));
            }
        }
        activity
    }
}

#[async_trait]
impl SignalProvider for ChainRpcProvider {
    async fn fetch(&self) -> Result<Vec<Signal>> {
        if !self.has_api_key() {
            tracing::info!(target: "ingest", provider = "chain", "no {ENV_API_KEY} set, skipping on-chain data");
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        out.extend(network_signal(&self.network_stats().await));
        out.extend(program_signals(&self.program_activity().await));
        out.extend(stablecoin_signal(&self.stablecoin_supply().await));
        out.extend(marketplace_signal(&self.marketplace_activity().await));
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalSource;

    #[test]
    fn network_signal_rates_by_tps() {
        assert!(network_signal(&NetworkStats::default()).is_none());
        let s = network_signal(&NetworkStats {
            tps: 4210,
            slot: 1,
            epoch: 812,
            block_height: 370_000_000,
            active_validators: 1320,
        })
        .unwrap();
        assert_eq!(s.source, SignalSource::ChainMetrics);
        assert_eq!(s.title, "Solana Network: 4,210 TPS, 1,320 Validators");
        assert_eq!(s.preset_category(), Some("infrastructure"));
        assert_eq!(s.metadata.signal_strength, Some(SignalStrength::High));
        assert_eq!(s.metadata.metrics["tps"], 4210.0);
        assert_eq!(s.url, EXPLORER_URL);
        assert_eq!(s.evidence_count(), 1);
    }

    #[test]
    fn program_signals_keep_busy_programs_only() {
        let p = |name: &str, n: usize| ProgramActivity {
            program_id: format!("{name}-id"),
            name: name.into(),
            category: "defi_evolution".into(),
            recent_tx_count: n,
        };
        let v = program_signals(&[p("Quiet", 10), p("Busy", 100), p("Mid", 41), p("Edge", 40)]);
        let titles: Vec<_> = v.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Busy: 100 recent transactions", "Mid: 41 recent transactions"]
        );
        assert_eq!(v[0].metadata.signal_strength, Some(SignalStrength::High));
        assert_eq!(v[1].metadata.signal_strength, Some(SignalStrength::Medium));
        assert!(v[1].description.contains("strong defi evolution narrative"));
    }

    #[test]
    fn stablecoin_signal_sums_supply() {
        assert!(stablecoin_signal(&StablecoinSupply::default()).is_none());
        let s = stablecoin_signal(&StablecoinSupply {
            tokens: vec![("USDC".into(), 4.25e9), ("USDT".into(), 1.5e9)],
        })
        .unwrap();
        assert_eq!(s.title, "$5.75B Stablecoins on Solana");
        assert!(s.description.contains("USDC leads with $4.25B"));
        assert_eq!(s.metadata.signal_strength, Some(SignalStrength::High));
        assert_eq!(s.metadata.metrics["total_supply_usd"], 5.75e9);
        assert_eq!(s.metadata.metrics["usdt_supply"], 1.5e9);
    }

    #[test]
    fn marketplace_signal_names_the_leader() {
        let s = marketplace_signal(&MarketplaceActivity {
            marketplaces: vec![("Magic Eden".into(), 30), ("Tensor".into(), 30)],
        })
        .unwrap();
        assert_eq!(s.title, "NFT Trading: 60 recent trades");
        assert!(s.description.starts_with("Magic Eden leading with 30"));
        assert_eq!(s.metadata.signal_strength, Some(SignalStrength::Medium));
        assert_eq!(s.metadata.metrics["magic_eden_trades"], 30.0);
    }

    #[test]
    fn tps_from_first_sample() {
        let samples: Vec<PerformanceSample> = serde_json::from_value(serde_json::json!([
            {"numTransactions": 252000, "samplePeriodSecs": 60, "slot": 1}
        ]))
        .unwrap();
        assert_eq!(tps_from_samples(&samples), 4200);
        assert_eq!(tps_from_samples(&[]), 0);
    }

    #[tokio::test]
    async fn no_api_key_yields_nothing() {
        let p = ChainRpcProvider::new(Some("  ".into())).unwrap();
        assert!(!p.has_api_key());
        assert!(p.fetch().await.unwrap().is_empty());
    }
}
