//! Path progression engine.
//!
//! Composes the immutable [`ConceptGraph`] with a learner's mastery
//! snapshot to answer: how far along a path is the learner, what should
//! they study now, and at what difficulty. Every query is a pure
//! function of its snapshot arguments; the engine holds no per-learner
//! state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::EngineError;
use crate::graph::ConceptGraph;
use crate::mastery::mastery_of;
use crate::policy::DifficultyBands;
use crate::types::{
    AchievementEvent, AchievementKind, DifficultyLevel, LearnerProgress, LearningPath,
    MasteryRecord, PathState,
};

/// Progress report for one learner on one path.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathProgress {
    pub path_id: String,
    pub path_name: String,
    pub completed_concepts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_concept: Option<String>,
    pub next_concepts: Vec<String>,
    pub completion_percentage: f64,
}

/// One checklist row per prerequisite of a concept.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrerequisiteStatus {
    pub concept_id: String,
    pub mastery: f64,
    pub threshold: f64,
    pub satisfied: bool,
}

/// Outcome of a completion request, for the caller to persist.
///
/// When the path was already completed the delta carries no
/// achievement: completion is idempotent, including the event log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionDelta {
    pub path_id: String,
    pub already_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievement: Option<AchievementEvent>,
}

pub struct PathEngine {
    graph: Arc<ConceptGraph>,
    bands: DifficultyBands,
}

impl PathEngine {
    pub fn new(graph: Arc<ConceptGraph>, bands: DifficultyBands) -> Self {
        Self { graph, bands }
    }

    pub fn graph(&self) -> &ConceptGraph {
        &self.graph
    }

    pub fn bands(&self) -> &DifficultyBands {
        &self.bands
    }

    /// Evaluate a learner's standing within a path.
    ///
    /// Scans the sequence in order and accumulates completed concepts
    /// until the first one below its threshold; that concept becomes
    /// the current one and the scan stops, so concepts past the first
    /// gap are never evaluated. When every concept clears its
    /// threshold there is no current concept and completion is 100%.
    pub fn progress(
        &self,
        path: &LearningPath,
        mastery_by_concept: &HashMap<String, MasteryRecord>,
    ) -> Result<PathProgress, EngineError> {
        if path.sequence.is_empty() {
            return Err(EngineError::EmptyPath(path.id.clone()));
        }

        let mut completed_concepts = Vec::new();
        let mut current_concept = None;

        for concept_id in &path.sequence {
            let threshold = self.graph.threshold_of(concept_id)?;
            if mastery_of(mastery_by_concept.get(concept_id)) >= threshold {
                completed_concepts.push(concept_id.clone());
            } else {
                current_concept = Some(concept_id.clone());
                break;
            }
        }

        let next_concepts = current_concept
            .as_deref()
            .map(|id| self.graph.next_concepts_of(id).to_vec())
            .unwrap_or_default();

        let completion_percentage =
            round2(100.0 * completed_concepts.len() as f64 / path.sequence.len() as f64);

        debug!(
            path_id = %path.id,
            completed = completed_concepts.len(),
            current = current_concept.as_deref().unwrap_or("-"),
            completion_percentage,
            "path progress evaluated"
        );

        Ok(PathProgress {
            path_id: path.id.clone(),
            path_name: path.name.clone(),
            completed_concepts,
            current_concept,
            next_concepts,
            completion_percentage,
        })
    }

    /// Difficulty tier for the learner's next problem on a concept.
    pub fn recommended_difficulty(
        &self,
        concept_id: &str,
        mastery_by_concept: &HashMap<String, MasteryRecord>,
    ) -> Result<DifficultyLevel, EngineError> {
        self.graph.concept(concept_id)?;
        Ok(self
            .bands
            .difficulty_for(mastery_of(mastery_by_concept.get(concept_id))))
    }

    /// Checklist of a concept's prerequisites, in declaration order.
    pub fn prerequisite_status(
        &self,
        concept_id: &str,
        mastery_by_concept: &HashMap<String, MasteryRecord>,
    ) -> Result<Vec<PrerequisiteStatus>, EngineError> {
        let concept = self.graph.concept(concept_id)?;

        concept
            .prerequisites
            .iter()
            .map(|prereq| {
                let threshold = self.graph.threshold_of(prereq)?;
                let mastery = mastery_of(mastery_by_concept.get(prereq));
                Ok(PrerequisiteStatus {
                    concept_id: prereq.clone(),
                    mastery,
                    threshold,
                    satisfied: mastery >= threshold,
                })
            })
            .collect()
    }

    /// NotStarted / InProgress / Completed, derived purely from
    /// mastery. Transitions happen only when mastery crosses
    /// thresholds; there is no separate completion attempt type.
    pub fn path_state(
        &self,
        path: &LearningPath,
        mastery_by_concept: &HashMap<String, MasteryRecord>,
    ) -> Result<PathState, EngineError> {
        let progress = self.progress(path, mastery_by_concept)?;

        if progress.current_concept.is_none() {
            return Ok(PathState::Completed);
        }
        let untouched = progress.completed_concepts.is_empty()
            && path
                .sequence
                .first()
                .map(|first| {
                    mastery_by_concept
                        .get(first)
                        .map(|r| r.attempts == 0)
                        .unwrap_or(true)
                })
                .unwrap_or(true);
        if untouched {
            Ok(PathState::NotStarted)
        } else {
            Ok(PathState::InProgress)
        }
    }

    /// Record that a learner finished a path. Set semantics for
    /// `completed_paths`; the achievement event is deduplicated by
    /// (path, kind), so repeated calls yield no second event.
    pub fn complete_path(
        &self,
        progress: &LearnerProgress,
        path: &LearningPath,
        now: DateTime<Utc>,
    ) -> CompletionDelta {
        let already_completed = progress.completed_paths.contains(&path.id)
            || progress.achievements.iter().any(|a| {
                a.kind == AchievementKind::PathCompletion && a.path_id == path.id
            });

        let achievement = (!already_completed).then(|| AchievementEvent {
            kind: AchievementKind::PathCompletion,
            path_id: path.id.clone(),
            timestamp: now,
        });

        CompletionDelta {
            path_id: path.id.clone(),
            already_completed,
            achievement,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
