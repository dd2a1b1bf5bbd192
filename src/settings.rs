//! Runtime settings
//!
//! Loaded from JSON handed over by the host page or a native config file.
//! Missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};

use crate::config::Difficulty;
use crate::consts::PATH_SAMPLE_INTERVAL;
use crate::error::Result;

/// Session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Difficulty for new runs
    pub difficulty: Difficulty,
    /// Fixed RNG seed for reproducible runs; `None` lets the host pick one
    pub seed: Option<u64>,
    /// Minimum seconds between recorded path samples
    pub path_sample_interval: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Weaver,
            seed: None,
            path_sample_interval: PATH_SAMPLE_INTERVAL,
        }
    }
}

impl Settings {
    /// Parse settings JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        log::info!(
            "Loaded settings: {} difficulty, seed {:?}",
            settings.difficulty,
            settings.seed
        );
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
