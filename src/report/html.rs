// src/report/html.rs
//! Self-contained HTML dashboard. Every piece of narrative or signal text
//! goes through `html_escape` before it lands in the page.

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};

use super::{
    emoji, momentum_icon, onchain_headline, source_icon, title_case, total_signals,
    truncate_chars, REPORT_VERSION,
};
use crate::narrative::Narrative;

const EVIDENCE_PILLS: usize = 4;
const PILL_CHARS: usize = 40;
const IDEAS_SHOWN: usize = 2;
const IDEA_DESC_CHARS: usize = 120;
const SIGNALS_SHOWN: usize = 3;
const SIGNAL_TITLE_CHARS: usize = 45;
/// Explanations longer than this start collapsed.
const WHY_COLLAPSE_CHARS: usize = 200;

const STYLE: &str = r#"
:root { --purple:#9945FF; --green:#14F195; --blue:#00D1FF; --bg:#0a0a0f; --card:#12121a; --text:#fff; --muted:#8888a0; --border:#2a2a3a; }
* { margin:0; padding:0; box-sizing:border-box; }
body { font-family:-apple-system,BlinkMacSystemFont,'Inter',sans-serif; background:var(--bg); color:var(--text); line-height:1.6; }
.container { max-width:1400px; margin:0 auto; padding:20px; }
.hero { background:linear-gradient(135deg,rgba(153,69,255,.15),rgba(0,209,255,.15)); border:1px solid var(--border); border-radius:24px; padding:40px; margin-bottom:30px; }
.hero h1 { font-size:2.6rem; font-weight:800; margin-bottom:12px; }
.tagline { color:var(--muted); margin-bottom:24px; }
.stats-grid { display:grid; grid-template-columns:repeat(auto-fit,minmax(180px,1fr)); gap:16px; }
.stat-card { background:rgba(255,255,255,.05); border:1px solid var(--border); border-radius:12px; padding:16px 20px; text-align:center; }
.stat-value { font-size:1.8rem; font-weight:700; color:var(--green); }
.stat-label, .metric, .strength-labels, .why-text, .idea-desc, .signal { font-size:.85rem; color:var(--muted); }
.section-title { font-size:1.4rem; margin:30px 0 20px; }
.narratives-grid { display:grid; grid-template-columns:repeat(auto-fit,minmax(380px,1fr)); gap:24px; }
.narrative-card { background:var(--card); border:1px solid var(--border); border-radius:16px; padding:24px; }
.narrative-header { display:flex; justify-content:space-between; margin-bottom:16px; }
.narrative-emoji { font-size:2rem; }
.narrative-title { font-size:1.15rem; font-weight:700; }
.score-badge { background:linear-gradient(135deg,var(--purple),var(--green)); border-radius:12px; padding:8px 14px; font-weight:800; font-size:1.4rem; }
.metrics-row { display:flex; gap:16px; align-items:center; margin-bottom:12px; }
.metric-value { color:var(--text); font-weight:600; }
.momentum-badge { padding:4px 10px; border-radius:12px; font-size:.75rem; font-weight:600; }
.momentum-rising { background:rgba(20,241,149,.15); color:var(--green); }
.momentum-stable { background:rgba(0,209,255,.15); color:var(--blue); }
.momentum-declining { background:rgba(255,107,107,.15); color:#FF6B6B; }
.strength-bar { height:8px; background:var(--border); border-radius:4px; overflow:hidden; }
.strength-fill { height:100%; background:linear-gradient(90deg,var(--purple),var(--green)); }
.strength-labels { display:flex; justify-content:space-between; margin-top:4px; }
.why-section, .evidence-section, .ideas-section, .signals-section { margin-top:16px; }
.why-title, .ideas-title { font-weight:600; margin-bottom:6px; }
.why-text-content { white-space:pre-line; }
.why-text-content.collapsed { display:-webkit-box; -webkit-line-clamp:4; -webkit-box-orient:vertical; overflow:hidden; }
.why-toggle { background:none; border:none; color:var(--purple); cursor:pointer; margin-top:4px; }
.evidence-pills { display:flex; flex-wrap:wrap; gap:6px; }
.evidence-pill { background:rgba(153,69,255,.12); border:1px solid var(--border); border-radius:10px; padding:3px 10px; font-size:.75rem; }
.idea-card { background:rgba(255,255,255,.03); border:1px solid var(--border); border-radius:10px; padding:12px; margin-top:8px; }
.idea-name { font-weight:600; }
.idea-tag { display:inline-block; background:rgba(0,209,255,.12); border-radius:8px; padding:2px 8px; margin:6px 6px 0 0; font-size:.7rem; }
.signal { display:flex; gap:8px; padding:8px 0; border-bottom:1px solid var(--border); text-decoration:none; }
.signal:hover { color:var(--green); }
.action-plan { background:linear-gradient(135deg,rgba(20,241,149,.1),rgba(0,209,255,.1)); border:1px solid var(--border); border-radius:16px; padding:30px; margin:40px 0; }
.action-item { background:var(--card); border:1px solid var(--border); border-radius:10px; padding:18px; margin:12px 0; display:flex; gap:16px; }
.action-number { background:linear-gradient(135deg,var(--purple),var(--green)); width:32px; height:32px; border-radius:50%; display:flex; align-items:center; justify-content:center; font-weight:700; flex-shrink:0; }
.action-title { font-weight:600; }
.action-desc { font-size:.9rem; color:var(--muted); }
footer { text-align:center; padding:40px 20px; color:var(--muted); font-size:.85rem; border-top:1px solid var(--border); }
footer a { color:var(--purple); text-decoration:none; }
@media (max-width:768px) { .narratives-grid { grid-template-columns:1fr; } .stats-grid { grid-template-columns:repeat(2,1fr); } }
"#;

const SCRIPT: &str = r#"
function toggleWhy(btn) {
  const content = btn.previousElementSibling;
  const collapsed = content.classList.toggle('collapsed');
  btn.textContent = collapsed ? 'Read more ▼' : 'Show less ▲';
}
"#;

pub fn render(narratives: &[Narrative], timestamp: DateTime<Utc>) -> String {
    let (tps, stables) = onchain_headline(narratives);
    let mut h = String::with_capacity(16 * 1024);

    h.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    h.push_str("<meta charset=\"UTF-8\">\n");
    h.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    h.push_str("<title>Solana Narrative Radar | Live Dashboard</title>\n");
    h.push_str("<style>");
    h.push_str(STYLE);
    h.push_str("</style>\n</head>\n<body>\n<div class=\"container\">\n");

    h.push_str("<header class=\"hero\">\n<h1>🔮 Solana Narrative Radar</h1>\n");
    h.push_str("<p class=\"tagline\">Narrative detection with on-chain data validation via Helius API</p>\n");
    h.push_str("<div class=\"stats-grid\">\n");
    stat(&mut h, &narratives.len().to_string(), "Active Narratives");
    stat(&mut h, &total_signals(narratives).to_string(), "Signals Analyzed");
    stat(&mut h, &tps, "Network TPS");
    stat(&mut h, &stables, "Stablecoin TVL");
    stat(&mut h, &timestamp.format("%H:%M").to_string(), "Last Updated (UTC)");
    h.push_str("</div>\n</header>\n");

    h.push_str("<h2 class=\"section-title\">📊 Emerging Narratives</h2>\n");
    h.push_str("<div class=\"narratives-grid\">\n");
    for n in narratives {
        card(&mut h, n);
    }
    h.push_str("</div>\n");

    action_plan(&mut h, narratives);

    h.push_str(&format!(
        "<footer>\n<p>Generated by <strong>Solana Narrative Radar v{REPORT_VERSION}</strong></p>\n\
         <p>Data sources: <a href=\"https://helius.xyz\" target=\"_blank\">Helius API</a> (on-chain), GitHub API, Ecosystem Research</p>\n\
         <p>Report generated: {}</p>\n</footer>\n",
        timestamp.format("%Y-%m-%d %H:%M UTC")
    ));
    h.push_str("</div>\n<script>");
    h.push_str(SCRIPT);
    h.push_str("</script>\n</body>\n</html>\n");
    h
}

fn stat(h: &mut String, value: &str, label: &str) {
    h.push_str(&format!(
        "<div class=\"stat-card\"><div class=\"stat-value\">{}</div><div class=\"stat-label\">{}</div></div>\n",
        encode_text(value),
        encode_text(label)
    ));
}

fn card(h: &mut String, n: &Narrative) {
    let momentum = n.momentum.as_str();
    h.push_str("<div class=\"narrative-card\">\n");
    h.push_str(&format!(
        "<div class=\"narrative-header\"><div><div class=\"narrative-emoji\">{}</div>\
         <div class=\"narrative-title\">{}</div></div>\
         <div class=\"score-badge\">{:.0}</div></div>\n",
        encode_text(emoji(n)),
        encode_text(&n.name),
        n.strength_score
    ));
    h.push_str(&format!(
        "<div class=\"metrics-row\">\
         <div class=\"metric\">Confidence: <span class=\"metric-value\">{:.0}%</span></div>\
         <div class=\"metric\">Signals: <span class=\"metric-value\">{}</span></div>\
         <span class=\"momentum-badge momentum-{momentum}\">{} {}</span></div>\n",
        n.confidence,
        n.signal_count(),
        momentum_icon(n.momentum),
        title_case(momentum)
    ));
    h.push_str(&format!(
        "<div class=\"strength-bar\"><div class=\"strength-fill\" style=\"width: {:.1}%\"></div></div>\
         <div class=\"strength-labels\"><span>Signal Strength</span><span>{:.0}/100</span></div>\n",
        n.strength_score, n.strength_score
    ));

    let long = n.why_emerging.chars().count() > WHY_COLLAPSE_CHARS;
    h.push_str(&format!(
        "<div class=\"why-section\"><div class=\"why-title\">🎯 Why This Narrative is Emerging</div>\
         <div class=\"why-text\"><span class=\"why-text-content{}\">{}</span>{}</div></div>\n",
        if long { " collapsed" } else { "" },
        encode_text(&n.why_emerging),
        if long {
            "<button class=\"why-toggle\" onclick=\"toggleWhy(this)\">Read more ▼</button>"
        } else {
            ""
        }
    ));

    if !n.evidence.is_empty() {
        h.push_str("<div class=\"evidence-section\"><div class=\"why-title\">Key Evidence:</div><div class=\"evidence-pills\">");
        for ev in n.evidence.iter().take(EVIDENCE_PILLS) {
            h.push_str(&format!(
                "<span class=\"evidence-pill\">{}</span>",
                encode_text(&truncate_chars(ev, PILL_CHARS))
            ));
        }
        h.push_str("</div></div>\n");
    }

    if !n.build_ideas.is_empty() {
        h.push_str("<div class=\"ideas-section\"><div class=\"ideas-title\">💡 Top Build Ideas</div>\n");
        for idea in n.build_ideas.iter().take(IDEAS_SHOWN) {
            h.push_str(&format!(
                "<div class=\"idea-card\"><div class=\"idea-name\">{}</div>\
                 <div class=\"idea-desc\">{}</div>\
                 <span class=\"idea-tag\">{}</span><span class=\"idea-tag\">{}</span><span class=\"idea-tag\">{}</span></div>\n",
                encode_text(&idea.name),
                encode_text(&truncate_chars(&idea.description, IDEA_DESC_CHARS)),
                title_case(idea.difficulty.as_str()),
                encode_text(&idea.time_to_build),
                encode_text(&truncate_chars(&idea.potential_revenue, 30))
            ));
        }
        h.push_str("</div>\n");
    }

    h.push_str("<div class=\"signals-section\"><div class=\"why-title\">📡 Recent Signals:</div>\n");
    for s in n.signals.iter().take(SIGNALS_SHOWN) {
        h.push_str(&format!(
            "<a href=\"{}\" class=\"signal\" target=\"_blank\" rel=\"noopener\"><span>{}</span> {}</a>\n",
            encode_double_quoted_attribute(&s.url),
            source_icon(&s.source),
            encode_text(&truncate_chars(&s.title, SIGNAL_TITLE_CHARS))
        ));
    }
    h.push_str("</div>\n</div>\n");
}

fn action_plan(h: &mut String, narratives: &[Narrative]) {
    h.push_str("<div class=\"action-plan\">\n<h2>🚀 Recommended Action Plan</h2>\n");
    if let Some(top) = narratives.first() {
        let next = match top.build_ideas.first() {
            Some(idea) => format!("Start with: {}", idea.name),
            None => "Strong momentum in this space.".to_string(),
        };
        action_item(
            h,
            1,
            &format!("Highest Priority: {}", top.name),
            &format!(
                "Strength {:.0}/100 with {:.0}% confidence. {next}",
                top.strength_score, top.confidence
            ),
        );
    }
    if let Some(second) = narratives.get(1) {
        action_item(
            h,
            2,
            &format!("Secondary Focus: {}", second.name),
            &format!(
                "{} momentum with solid on-chain validation. Good timing for builders.",
                title_case(second.momentum.as_str())
            ),
        );
    }
    if let Some(third) = narratives.get(2) {
        action_item(
            h,
            3,
            &format!("Watch: {}", third.name),
            "Emerging opportunity with growing signal strength. Monitor for timing.",
        );
    }
    h.push_str("</div>\n");
}

fn action_item(h: &mut String, idx: usize, title: &str, desc: &str) {
    h.push_str(&format!(
        "<div class=\"action-item\"><div class=\"action-number\">{idx}</div><div>\
         <div class=\"action-title\">{}</div><div class=\"action-desc\">{}</div></div></div>\n",
        encode_text(title),
        encode_text(desc)
    ));
}
