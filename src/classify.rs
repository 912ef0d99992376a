// src/classify.rs
//! Multi-label keyword classifier.
//!
//! A signal can land in several categories at once. Matching is plain
//! case-insensitive substring search over `title + " " + description`, with
//! repository topics as an extra hint for code-hosting signals.

use std::sync::Arc;

use crate::signal::{Signal, SignalSource};
use crate::taxonomy::Taxonomy;

/// Outcome of classifying one signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Category ids without duplicates: preset first, then keyword hits in
    /// taxonomy order, then topic-only hits.
    pub categories: Vec<String>,
    /// Best keyword-density score over all categories, never below the
    /// signal's prior `relevance_score`.
    pub relevance_score: f64,
}

impl Classification {
    /// Write tags and relevance onto the signal.
    pub fn apply(self, mut signal: Signal) -> Signal {
        signal.narrative_tags = self.categories;
        signal.relevance_score = self.relevance_score;
        signal
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    taxonomy: Arc<Taxonomy>,
}

impl Classifier {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Pure classification; the signal is left untouched.
    pub fn classify(&self, signal: &Signal) -> Classification {
        let mut categories: Vec<String> = Vec::new();
        let mut relevance = signal.relevance_score;
        let weight = self.taxonomy.tuning.keyword_weight;

        if let Some(preset) = signal.preset_category() {
            if self.taxonomy.contains(preset) {
                categories.push(preset.to_string());
            }
        }

        let text = signal.text().to_lowercase();
        for cat in self.taxonomy.categories() {
            let count = count_keyword_hits(&text, &cat.keywords);
            if count == 0 {
                continue;
            }
            push_unique(&mut categories, &cat.id);
            relevance = relevance.max((count as f64 * weight).min(1.0));
        }

        if signal.source == SignalSource::CodeRepository {
            for topic in signal.topics() {
                let topic = topic.to_lowercase();
                for cat in self.taxonomy.categories() {
                    if cat.keywords.iter().any(|kw| topic.contains(kw.as_str())) {
                        push_unique(&mut categories, &cat.id);
                    }
                }
            }
        }

        Classification {
            categories,
            relevance_score: relevance,
        }
    }

    /// Classify and return the enriched signal.
    pub fn tag(&self, signal: Signal) -> Signal {
        self.classify(&signal).apply(signal)
    }
}

/// Number of distinct keywords present in `text_lower`. Keywords are
/// expected lowercased (the taxonomy does this on load).
pub fn count_keyword_hits(text_lower: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .filter(|kw| text_lower.contains(kw.as_str()))
        .count()
}

fn push_unique(out: &mut Vec<String>, id: &str) {
    if !out.iter().any(|c| c == id) {
        out.push(id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{RepositoryStats, SignalMetadata};

    const TEST_TOML: &str = r#"
[[categories]]
id = "ai"
name = "AI"
keywords = ["agent", "LLM", "autonomous"]

[[categories]]
id = "pay"
name = "Payments"
keywords = ["stablecoin", "usdc"]

[[categories]]
id = "meme"
name = "Memes"
keywords = ["pump", "bonk"]
"#;

    fn classifier() -> Classifier {
        Classifier::new(Arc::new(Taxonomy::from_toml_str(TEST_TOML).unwrap()))
    }

    #[test]
    fn keyword_hits_are_multi_label_and_case_insensitive() {
        let c = classifier();
        let s = Signal::new(
            "research",
            "Autonomous AGENT pays in USDC",
            "An LLM settles with a stablecoin.",
        );
        let out = c.classify(&s);
        assert_eq!(out.categories, vec!["ai", "pay"]);
        // ai: agent + llm + autonomous = 3 hits → 0.45
        assert!((out.relevance_score - 0.45).abs() < 1e-9);
    }

    #[test]
    fn preset_category_is_included_even_without_keywords() {
        let c = classifier();
        let meta = SignalMetadata {
            category: Some("meme".into()),
            ..Default::default()
        };
        let s = Signal::new("research", "Quiet title", "nothing here").with_metadata(meta);
        let out = c.classify(&s);
        assert_eq!(out.categories, vec!["meme"]);
        assert_eq!(out.relevance_score, 0.0);
    }

    #[test]
    fn unknown_preset_is_ignored() {
        let c = classifier();
        let meta = SignalMetadata {
            category: Some("gaming".into()),
            ..Default::default()
        };
        let s = Signal::new("research", "t", "d").with_metadata(meta);
        assert!(c.classify(&s).categories.is_empty());
    }

    #[test]
    fn repository_topics_add_categories_without_relevance() {
        let c = classifier();
        let meta = SignalMetadata {
            repository: Some(RepositoryStats {
                stars: 10,
                topics: vec!["pump-fun-sdk".into()],
                ..Default::default()
            }),
            ..Default::default()
        };
        let s = Signal::new("github", "org/repo", "No description").with_metadata(meta.clone());
        let out = c.classify(&s);
        assert_eq!(out.categories, vec!["meme"]);
        assert_eq!(out.relevance_score, 0.0);

        // Topics are ignored for other sources.
        let other = Signal::new("research", "org/repo", "No description").with_metadata(meta);
        assert!(c.classify(&other).categories.is_empty());
    }

    #[test]
    fn relevance_is_capped_and_never_lowered() {
        let c = classifier();
        let mut s = Signal::new(
            "research",
            "agent llm autonomous",
            "agent agent agent",
        );
        s.relevance_score = 0.9;
        let out = c.classify(&s);
        assert!((out.relevance_score - 0.9).abs() < 1e-9);

        let tax = Taxonomy::from_toml_str(TEST_TOML)
            .unwrap()
            .with_tuning(crate::taxonomy::Tuning {
                keyword_weight: 0.5,
                ..Default::default()
            });
        let heavy = Classifier::new(Arc::new(tax));
        let out = heavy.classify(&Signal::new("x", "agent llm autonomous", ""));
        assert_eq!(out.relevance_score, 1.0);
    }

    #[test]
    fn tag_writes_tags_and_score_and_is_deterministic() {
        let c = classifier();
        let s = Signal::new("research", "bonk pump", "usdc");
        let a = c.tag(s.clone());
        let b = c.tag(s);
        assert_eq!(a.narrative_tags, vec!["pay", "meme"]);
        assert_eq!(a, b);
        assert!((a.relevance_score - 0.30).abs() < 1e-9);
    }
}
