//! # tutorpath - learning path & mastery progression engine
//!
//! Recommends, for a given learner, which concept to study next and at
//! what difficulty, from a directed graph of concept prerequisites and
//! a continuously updated per-concept mastery score.
//!
//! ## Module structure
//!
//! - [`catalog`] - the flat concepts + learning-paths document and its
//!   validated load
//! - [`graph`] - concept dependency graph (cycle-checked, immutable,
//!   readiness queries)
//! - [`mastery`] - cumulative-accuracy mastery ledger
//! - [`policy`] - mastery-to-difficulty tier mapping
//! - [`engine`] - path progress, recommendations, completion deltas
//! - [`store`] - in-memory reference persistence collaborator
//! - [`types`] - shared domain types
//! - [`error`] - error taxonomy
//!
//! ## Usage
//!
//! ```rust
//! use std::collections::HashMap;
//! use tutorpath::{Catalog, DifficultyBands, PathEngine};
//!
//! let catalog = Catalog::from_json(r#"{
//!     "concepts": {
//!         "fractions": { "name": "Fractions", "mastery_threshold": 0.7 },
//!         "decimals": {
//!             "name": "Decimals",
//!             "prerequisites": ["fractions"],
//!             "mastery_threshold": 0.7
//!         }
//!     },
//!     "learning_paths": {
//!         "arithmetic": { "name": "Arithmetic", "sequence": ["fractions", "decimals"] }
//!     }
//! }"#).unwrap();
//!
//! let engine = PathEngine::new(catalog.graph_handle(), DifficultyBands::default());
//! let path = catalog.path("arithmetic").unwrap();
//! let report = engine.progress(path, &HashMap::new()).unwrap();
//! assert_eq!(report.current_concept.as_deref(), Some("fractions"));
//! ```
//!
//! The graph and policy are immutable after construction and safe for
//! concurrent reads; all engine queries are pure functions of their
//! snapshot arguments.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod graph;
pub mod mastery;
pub mod policy;
pub mod store;
pub mod types;

pub use catalog::Catalog;
pub use engine::{CompletionDelta, PathEngine, PathProgress, PrerequisiteStatus};
pub use error::EngineError;
pub use graph::ConceptGraph;
pub use mastery::{mastery_of, record_attempt, MasteryDelta};
pub use policy::DifficultyBands;
pub use store::ProgressStore;
pub use types::{
    AchievementEvent, AchievementKind, Concept, DifficultyLevel, LearnerProgress, LearningPath,
    MasteryRecord, PathState,
};
