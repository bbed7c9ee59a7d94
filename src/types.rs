use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Difficulty tier recommended for the next problem on a concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "medium" => Self::Medium,
            "hard" => Self::Hard,
            _ => Self::Easy,
        }
    }
}

/// Standing of one learner within one path, derived purely from mastery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathState {
    NotStarted,
    InProgress,
    Completed,
}

impl PathState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

/// An atomic unit of learnable material.
///
/// `prerequisites` and `next_concepts` are independently declared
/// relations; neither is derived from the other. `mastery_threshold`
/// gates both prerequisite satisfaction and path completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub next_concepts: Vec<String>,
    pub mastery_threshold: f64,
}

/// A named, ordered concept sequence representing a curriculum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningPath {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub sequence: Vec<String>,
}

/// Cumulative attempt history for one (learner, concept) pair.
///
/// Invariants: `correct <= attempts`, `mastery == correct / attempts`
/// (0.0 while no attempts are recorded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasteryRecord {
    pub attempts: u32,
    pub correct: u32,
    pub mastery: f64,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl Default for MasteryRecord {
    fn default() -> Self {
        Self {
            attempts: 0,
            correct: 0,
            mastery: 0.0,
            last_attempt_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    PathCompletion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementEvent {
    pub kind: AchievementKind,
    pub path_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate progress for one learner, owned by the persistence layer.
///
/// The engine only ever sees an immutable snapshot of this and returns
/// deltas for the caller to apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearnerProgress {
    pub mastery_by_concept: HashMap<String, MasteryRecord>,
    pub completed_paths: BTreeSet<String>,
    pub current_path: Option<String>,
    pub achievements: Vec<AchievementEvent>,
    pub last_activity: Option<DateTime<Utc>>,
}
