//! Analyzer configuration.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::knowledge_base::{KnowledgeBase, Season};

pub const KB_PATH_ENV: &str = "PLANT_KB_PATH";
pub const SEASON_ENV: &str = "PLANT_SEASON";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Season used for seasonal advice; the current local season when unset.
    #[serde(default)]
    pub season: Option<Season>,
    /// Replacement knowledge base file; the built-in table when unset.
    #[serde(default)]
    pub knowledge_base_path: Option<PathBuf>,
}

impl AnalyzerConfig {
    pub fn with_season(season: Season) -> Self {
        Self { season: Some(season), ..Self::default() }
    }

    /// Read `PLANT_SEASON` and `PLANT_KB_PATH`.
    pub fn from_env() -> Result<Self> {
        let season = match env::var(SEASON_ENV) {
            Ok(value) if !value.trim().is_empty() => Some(
                value
                    .parse::<Season>()
                    .map_err(|e| anyhow!(e))
                    .with_context(|| format!("Invalid {}", SEASON_ENV))?,
            ),
            _ => None,
        };

        let knowledge_base_path = env::var(KB_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self { season, knowledge_base_path })
    }

    pub fn season(&self) -> Season {
        self.season.unwrap_or_else(Season::current)
    }

    /// Load the configured knowledge base.
    pub fn load_knowledge_base(&self) -> Result<KnowledgeBase> {
        match &self.knowledge_base_path {
            Some(path) => KnowledgeBase::load(path),
            None => KnowledgeBase::builtin(),
        }
    }
}
