//! In-memory reference implementation of the persistence collaborator.
//!
//! The engine itself never holds learner state; this store shows the
//! write discipline its persistence side must implement. Each
//! `(learner, concept)` mastery record sits behind its own
//! single-writer lock, so two concurrent attempts on the same pair can
//! never both read the same base record and drop an increment, while
//! writes to different pairs proceed without contention. The outer
//! maps are locked only long enough to locate or insert a cell, never
//! across a record update.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::engine::CompletionDelta;
use crate::mastery::{self, MasteryDelta};
use crate::types::{AchievementEvent, LearnerProgress, MasteryRecord};

#[derive(Default)]
struct LearnerMeta {
    completed_paths: std::collections::BTreeSet<String>,
    current_path: Option<String>,
    achievements: Vec<AchievementEvent>,
    last_activity: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct LearnerCell {
    concepts: RwLock<HashMap<String, Arc<Mutex<MasteryRecord>>>>,
    meta: Mutex<LearnerMeta>,
}

#[derive(Default)]
pub struct ProgressStore {
    learners: RwLock<HashMap<String, Arc<LearnerCell>>>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn learner_cell(&self, learner_id: &str) -> Arc<LearnerCell> {
        if let Some(cell) = self.learners.read().get(learner_id) {
            return Arc::clone(cell);
        }
        let mut learners = self.learners.write();
        Arc::clone(
            learners
                .entry(learner_id.to_string())
                .or_insert_with(|| Arc::new(LearnerCell::default())),
        )
    }

    fn record_cell(cell: &LearnerCell, concept_id: &str) -> Arc<Mutex<MasteryRecord>> {
        if let Some(record) = cell.concepts.read().get(concept_id) {
            return Arc::clone(record);
        }
        let mut concepts = cell.concepts.write();
        Arc::clone(
            concepts
                .entry(concept_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(MasteryRecord::default()))),
        )
    }

    /// Apply one attempt outcome under the per-key write lock and
    /// return the delta that was persisted.
    pub fn record_attempt(
        &self,
        learner_id: &str,
        concept_id: &str,
        was_correct: bool,
        now: DateTime<Utc>,
    ) -> MasteryDelta {
        let cell = self.learner_cell(learner_id);
        let record_cell = Self::record_cell(&cell, concept_id);

        let updated = {
            let mut record = record_cell.lock();
            *record = mastery::record_attempt(Some(&*record), was_correct, now);
            record.clone()
        };

        cell.meta.lock().last_activity = Some(now);
        debug!(
            learner_id,
            concept_id,
            attempts = updated.attempts,
            mastery = updated.mastery,
            "attempt recorded"
        );

        MasteryDelta {
            learner_id: learner_id.to_string(),
            concept_id: concept_id.to_string(),
            record: updated,
        }
    }

    /// Mastery for one concept; 0.0 for unknown learners or concepts.
    pub fn concept_mastery(&self, learner_id: &str, concept_id: &str) -> f64 {
        let Some(cell) = self.learners.read().get(learner_id).cloned() else {
            return 0.0;
        };
        let record = cell.concepts.read().get(concept_id).cloned();
        record.map(|r| r.lock().mastery).unwrap_or(0.0)
    }

    /// Immutable snapshot of everything known about a learner, for
    /// engine queries. Unknown learners yield an empty default.
    pub fn progress_snapshot(&self, learner_id: &str) -> LearnerProgress {
        let Some(cell) = self.learners.read().get(learner_id).cloned() else {
            return LearnerProgress::default();
        };

        let mastery_by_concept: HashMap<String, MasteryRecord> = cell
            .concepts
            .read()
            .iter()
            .map(|(id, record)| (id.clone(), record.lock().clone()))
            .collect();

        let meta = cell.meta.lock();
        LearnerProgress {
            mastery_by_concept,
            completed_paths: meta.completed_paths.clone(),
            current_path: meta.current_path.clone(),
            achievements: meta.achievements.clone(),
            last_activity: meta.last_activity,
        }
    }

    pub fn set_current_path(&self, learner_id: &str, path_id: &str, now: DateTime<Utc>) {
        let cell = self.learner_cell(learner_id);
        let mut meta = cell.meta.lock();
        meta.current_path = Some(path_id.to_string());
        meta.last_activity = Some(now);
    }

    /// Persist a completion delta. The dedup condition is re-checked
    /// under the learner's meta lock, so two racing completions of the
    /// same path still produce a single achievement event.
    pub fn apply_completion(&self, learner_id: &str, delta: &CompletionDelta, now: DateTime<Utc>) {
        let cell = self.learner_cell(learner_id);
        let mut meta = cell.meta.lock();

        meta.completed_paths.insert(delta.path_id.clone());
        if let Some(achievement) = &delta.achievement {
            let duplicate = meta.achievements.iter().any(|a| {
                a.kind == achievement.kind && a.path_id == achievement.path_id
            });
            if !duplicate {
                meta.achievements.push(achievement.clone());
            }
        }
        meta.last_activity = Some(now);
    }

    /// Achievement log, oldest first. Empty for unknown learners.
    pub fn achievements(&self, learner_id: &str) -> Vec<AchievementEvent> {
        self.learners
            .read()
            .get(learner_id)
            .map(|cell| cell.meta.lock().achievements.clone())
            .unwrap_or_default()
    }
}
