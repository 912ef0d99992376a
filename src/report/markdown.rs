// src/report/markdown.rs
//! Markdown report: header, executive summary, one section per narrative,
//! action plan.

use chrono::{DateTime, Utc};

use super::{
    emoji, format_metric, momentum_icon, source_icon, strength_bar, title_case, total_signals,
    REPORT_VERSION,
};
use crate::narrative::Narrative;

const EVIDENCE_SHOWN: usize = 6;
const IDEAS_SHOWN: usize = 3;
const SIGNALS_SHOWN: usize = 5;

pub fn render(narratives: &[Narrative], timestamp: DateTime<Utc>) -> String {
    let mut md: Vec<String> = Vec::new();

    md.push("# 🔮 Solana Narrative Radar Report".into());
    md.push(format!("\n**Generated:** {}", timestamp.format("%Y-%m-%d %H:%M UTC")));
    md.push("\n**Analysis Period:** Past 14 days".into());
    md.push(format!("\n**Total Signals Analyzed:** {}", total_signals(narratives)));
    md.push("\n**Data Sources:** GitHub API, Helius On-Chain Data, Ecosystem Research".into());
    md.push("\n---\n".into());

    md.push("## 📊 Executive Summary\n".into());
    md.push(
        "The following narratives are emerging in the Solana ecosystem, ranked by signal \
         strength, source diversity, and on-chain validation:\n"
            .into(),
    );
    for (i, n) in narratives.iter().enumerate() {
        md.push(format!(
            "{}. **{}** [{}] {:.0}/100 {}",
            i + 1,
            n.name,
            strength_bar(n.strength_score),
            n.strength_score,
            momentum_icon(n.momentum)
        ));
        md.push(format!(
            "   - Confidence: {:.0}% | Signals: {}",
            n.confidence,
            n.signal_count()
        ));
    }
    md.push("\n---\n".into());

    for n in narratives {
        section(&mut md, n);
    }

    action_plan(&mut md, narratives);

    md.push("\n---\n".into());
    md.push(format!("*Report generated by Solana Narrative Radar v{REPORT_VERSION}*"));
    md.push("\n*Data sources: GitHub API (authenticated), Helius On-Chain API, Curated Research*".into());

    md.join("\n")
}

fn section(md: &mut Vec<String>, n: &Narrative) {
    md.push(format!("## {} {}", emoji(n), n.name));
    md.push(format!(
        "\n**Strength Score:** {:.0}/100 | **Confidence:** {:.0}% | **Momentum:** {} | **Signals:** {}\n",
        n.strength_score,
        n.confidence,
        title_case(n.momentum.as_str()),
        n.signal_count()
    ));

    md.push("### 🎯 Why This Narrative is Emerging".into());
    md.push(format!("\n{}\n", n.why_emerging));

    if !n.evidence.is_empty() {
        md.push("\n### 🔍 Key Evidence".into());
        for ev in n.evidence.iter().take(EVIDENCE_SHOWN) {
            md.push(format!("- {ev}"));
        }
    }

    let positive: Vec<_> = n.key_metrics.iter().filter(|(_, v)| **v > 0.0).collect();
    if !positive.is_empty() {
        md.push("\n### 📡 On-Chain Metrics (via Helius)".into());
        for (key, value) in positive {
            md.push(format!("- **{}:** {}", title_case(key), format_metric(*value)));
        }
    }

    if !n.build_ideas.is_empty() {
        md.push("\n### 💡 Build Ideas".into());
        for idea in n.build_ideas.iter().take(IDEAS_SHOWN) {
            md.push(format!("\n#### {}", idea.name));
            md.push(format!("\n{}", idea.description));
            md.push(format!("\n- **Tech Stack:** {}", idea.tech_stack.join(", ")));
            md.push(format!("- **Difficulty:** {}", title_case(idea.difficulty.as_str())));
            md.push(format!("- **Time to Build:** {}", idea.time_to_build));
            md.push(format!("- **Revenue Model:** {}", idea.potential_revenue));
            md.push(format!("- **Why Now:** {}", idea.why_now));
        }
    }

    md.push("\n### 📡 Top Signals".into());
    for s in n.signals.iter().take(SIGNALS_SHOWN) {
        md.push(format!("- {} [{}]({})", source_icon(&s.source), s.title, s.url));
    }

    md.push("\n---\n".into());
}

fn action_plan(md: &mut Vec<String>, narratives: &[Narrative]) {
    md.push("## 🚀 Recommended Action Plan\n".into());
    md.push("Based on narrative strength, confidence levels, and on-chain validation:\n".into());

    if let Some(top) = narratives.first() {
        md.push(format!("1. **Highest Priority:** {}", top.name));
        md.push(format!(
            "   - Strength {:.0}/100 with {:.0}% confidence",
            top.strength_score, top.confidence
        ));
        if let Some(idea) = top.build_ideas.first() {
            md.push(format!("   - Start with: **{}**", idea.name));
        }
    }
    if let Some(second) = narratives.get(1) {
        md.push(format!("\n2. **Secondary Focus:** {}", second.name));
        md.push(format!(
            "   - {} momentum, good market timing",
            title_case(second.momentum.as_str())
        ));
    }
    if let Some(third) = narratives.get(2) {
        md.push(format!("\n3. **Emerging Opportunity:** {}", third.name));
    }
}
