// src/ideas.rs
//! Build-idea catalog. Templates are data (`config/ideas.toml`); a narrative
//! gets up to five of its category's templates, each stamped with a small
//! context block (name, strength, top evidence).

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::narrative::Narrative;

pub const DEFAULT_IDEAS_PATH: &str = "config/ideas.toml";
pub const ENV_IDEAS_PATH: &str = "NARRATIVE_IDEAS_PATH";
pub const MAX_IDEAS_PER_NARRATIVE: usize = 5;
const CONTEXT_EVIDENCE: usize = 3;

const BUILTIN_IDEAS: &str = include_str!("../config/ideas.toml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeContext {
    pub narrative_name: String,
    pub narrative_strength: f64,
    pub supporting_evidence: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildIdea {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub potential_revenue: String,
    #[serde(default)]
    pub time_to_build: String,
    #[serde(default)]
    pub why_now: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_context: Option<NarrativeContext>,
}

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
struct CatalogRoot {
    #[serde(default)]
    ideas: Vec<IdeaTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
struct IdeaTemplate {
    category: String,
    #[serde(flatten)]
    idea: BuildIdea,
}

/// Templates grouped by category id, in file order.
#[derive(Debug, Clone, Default)]
pub struct IdeaCatalog {
    groups: Vec<(String, Vec<BuildIdea>)>,
}

impl IdeaCatalog {
    /// `$NARRATIVE_IDEAS_PATH`, then `config/ideas.toml`, then built-in.
    pub fn from_env() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_IDEAS_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_IDEAS_PATH} points to non-existent path {}", pb.display());
            }
            return Self::load(&pb);
        }
        let path = PathBuf::from(DEFAULT_IDEAS_PATH);
        if path.exists() {
            return Self::load(&path);
        }
        debug!(target: "ideas", path = %path.display(), "idea catalog not found, using built-in");
        Self::builtin()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading idea catalog {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing idea catalog {}", path.display()))
    }

    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_IDEAS).context("parsing built-in idea catalog")
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let root: CatalogRoot = toml::from_str(toml_str)?;
        let mut catalog = Self::default();
        for t in root.ideas {
            let category = t.category.trim().to_string();
            match catalog.groups.iter_mut().find(|(c, _)| *c == category) {
                Some((_, list)) => list.push(t.idea),
                None => catalog.groups.push((category, vec![t.idea])),
            }
        }
        Ok(catalog)
    }

    pub fn templates(&self, category: &str) -> Option<&[BuildIdea]> {
        self.groups
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, v)| v.as_slice())
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(c, _)| c.as_str())
    }

    /// Ideas for one narrative. Unknown categories get a single generic
    /// analytics idea (without context).
    pub fn generate(&self, narrative: &Narrative) -> Vec<BuildIdea> {
        let Some(templates) = self.templates(&narrative.category) else {
            return vec![generic_idea(&narrative.name)];
        };
        let ctx = NarrativeContext {
            narrative_name: narrative.name.clone(),
            narrative_strength: narrative.strength_score,
            supporting_evidence: narrative
                .evidence
                .iter()
                .take(CONTEXT_EVIDENCE)
                .cloned()
                .collect(),
        };
        templates
            .iter()
            .take(MAX_IDEAS_PER_NARRATIVE)
            .map(|t| BuildIdea {
                narrative_context: Some(ctx.clone()),
                ..t.clone()
            })
            .collect()
    }

    /// Fill `build_ideas` on every narrative; returns the number attached.
    pub fn attach_ideas(&self, narratives: &mut [Narrative]) -> usize {
        let mut total = 0;
        for n in narratives.iter_mut() {
            n.build_ideas = self.generate(n);
            total += n.build_ideas.len();
        }
        total
    }
}

fn generic_idea(name: &str) -> BuildIdea {
    let lower = name.to_lowercase();
    BuildIdea {
        name: format!("{name} Analytics Dashboard"),
        description: format!(
            "Comprehensive analytics tool for tracking {lower} trends and metrics."
        ),
        tech_stack: vec!["React".into(), "Helius".into(), "TypeScript".into()],
        difficulty: Difficulty::Intermediate,
        potential_revenue: "SaaS subscription".into(),
        time_to_build: "3-4 weeks".into(),
        why_now: format!("Growing activity in {lower} space. Analytics tools are needed."),
        narrative_context: None,
    }
}
