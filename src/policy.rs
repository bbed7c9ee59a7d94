use serde::{Deserialize, Serialize};

use crate::types::DifficultyLevel;

const DEFAULT_MEDIUM_FROM: f64 = 0.3;
const DEFAULT_HARD_FROM: f64 = 0.7;

/// Mastery cutoffs for the difficulty recommendation.
///
/// `mastery < medium_from` recommends easy, `mastery >= hard_from`
/// recommends hard, anything between recommends medium.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyBands {
    pub medium_from: f64,
    pub hard_from: f64,
}

impl Default for DifficultyBands {
    fn default() -> Self {
        Self {
            medium_from: DEFAULT_MEDIUM_FROM,
            hard_from: DEFAULT_HARD_FROM,
        }
    }
}

impl DifficultyBands {
    pub fn from_env() -> Self {
        let mut bands = Self::default();

        if let Ok(val) = std::env::var("TUTORPATH_MEDIUM_FROM") {
            bands.medium_from = val.parse().unwrap_or(DEFAULT_MEDIUM_FROM);
        }
        if let Ok(val) = std::env::var("TUTORPATH_HARD_FROM") {
            bands.hard_from = val.parse().unwrap_or(DEFAULT_HARD_FROM);
        }

        bands
    }

    pub fn difficulty_for(&self, mastery: f64) -> DifficultyLevel {
        if mastery < self.medium_from {
            DifficultyLevel::Easy
        } else if mastery < self.hard_from {
            DifficultyLevel::Medium
        } else {
            DifficultyLevel::Hard
        }
    }
}
