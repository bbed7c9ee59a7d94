use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::MasteryRecord;

/// Write-contract value emitted after an attempt: the caller swaps the
/// old record for `record` under its per-key write discipline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryDelta {
    pub learner_id: String,
    pub concept_id: String,
    pub record: MasteryRecord,
}

/// Fold one attempt outcome into a mastery record.
///
/// Returns a new record; never mutates shared state. Mastery is the
/// cumulative accuracy `correct / attempts` with no recency weighting.
pub fn record_attempt(
    prior: Option<&MasteryRecord>,
    was_correct: bool,
    now: DateTime<Utc>,
) -> MasteryRecord {
    let (attempts, correct) = prior
        .map(|r| (r.attempts, r.correct))
        .unwrap_or((0, 0));

    let attempts = attempts + 1;
    let correct = correct + u32::from(was_correct);

    MasteryRecord {
        attempts,
        correct,
        mastery: f64::from(correct) / f64::from(attempts),
        last_attempt_at: Some(now),
    }
}

/// Mastery value of a possibly-absent record. Absent means 0.0.
pub fn mastery_of(record: Option<&MasteryRecord>) -> f64 {
    record.map(|r| r.mastery).unwrap_or(0.0)
}
