//! Concept catalog: the flat `concepts` + `learning_paths` document.
//!
//! One canonical schema, mirroring the knowledge-map JSON shape:
//! concepts and paths keyed by id, snake_case fields. Parsing feeds
//! straight into [`ConceptGraph::build`], so a catalog that
//! deserializes but references unknown ids or contains a prerequisite
//! cycle still fails loudly here rather than at query time.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::error::EngineError;
use crate::graph::ConceptGraph;
use crate::types::{Concept, LearningPath};

#[derive(Debug, Deserialize)]
struct CatalogDoc {
    concepts: BTreeMap<String, ConceptDoc>,
    #[serde(default)]
    learning_paths: BTreeMap<String, PathDoc>,
}

#[derive(Debug, Deserialize)]
struct ConceptDoc {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    prerequisites: Vec<String>,
    #[serde(default)]
    next_concepts: Vec<String>,
    mastery_threshold: f64,
}

#[derive(Debug, Deserialize)]
struct PathDoc {
    name: String,
    #[serde(default)]
    description: String,
    sequence: Vec<String>,
}

/// Validated, immutable catalog: a concept graph plus the named paths
/// defined over it.
#[derive(Debug)]
pub struct Catalog {
    graph: Arc<ConceptGraph>,
    paths: BTreeMap<String, LearningPath>,
}

impl Catalog {
    pub fn from_json(raw: &str) -> Result<Self, EngineError> {
        let doc: CatalogDoc = serde_json::from_str(raw).map_err(|err| {
            EngineError::validation(format!("malformed catalog document: {err}"))
        })?;

        let concepts = doc
            .concepts
            .into_iter()
            .map(|(id, c)| Concept {
                id,
                name: c.name,
                description: c.description,
                prerequisites: c.prerequisites,
                next_concepts: c.next_concepts,
                mastery_threshold: c.mastery_threshold,
            })
            .collect();

        let paths = doc
            .learning_paths
            .into_iter()
            .map(|(id, p)| LearningPath {
                id,
                name: p.name,
                description: p.description,
                sequence: p.sequence,
            })
            .collect();

        Self::from_parts(concepts, paths)
    }

    /// Build from already-materialized records (programmatic catalogs,
    /// tests). Same validation as [`Catalog::from_json`].
    pub fn from_parts(
        concepts: Vec<Concept>,
        paths: Vec<LearningPath>,
    ) -> Result<Self, EngineError> {
        let graph = ConceptGraph::build(concepts)?;

        let mut by_id = BTreeMap::new();
        for path in paths {
            graph.validate_path(&path)?;
            let id = path.id.clone();
            if by_id.insert(id.clone(), path).is_some() {
                return Err(EngineError::validation(format!(
                    "duplicate learning path id: {id}"
                )));
            }
        }

        debug!(paths = by_id.len(), "catalog loaded");
        Ok(Self {
            graph: Arc::new(graph),
            paths: by_id,
        })
    }

    pub fn graph(&self) -> &ConceptGraph {
        &self.graph
    }

    /// Shared handle for long-lived consumers such as [`crate::PathEngine`].
    pub fn graph_handle(&self) -> Arc<ConceptGraph> {
        Arc::clone(&self.graph)
    }

    pub fn concept(&self, concept_id: &str) -> Result<&Concept, EngineError> {
        self.graph.concept(concept_id)
    }

    /// Tolerant concept accessor for browsing surfaces; the one lookup
    /// that deliberately returns `None` instead of erroring.
    pub fn concept_details(&self, concept_id: &str) -> Option<&Concept> {
        self.graph.concept(concept_id).ok()
    }

    pub fn path(&self, path_id: &str) -> Result<&LearningPath, EngineError> {
        self.paths
            .get(path_id)
            .ok_or_else(|| EngineError::PathNotFound(path_id.to_string()))
    }

    /// All paths in stable id order.
    pub fn paths(&self) -> impl Iterator<Item = &LearningPath> {
        self.paths.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "concepts": {
            "fractions": {
                "name": "Fractions",
                "description": "Parts of a whole",
                "prerequisites": [],
                "next_concepts": ["decimals"],
                "mastery_threshold": 0.7
            },
            "decimals": {
                "name": "Decimals",
                "prerequisites": ["fractions"],
                "next_concepts": [],
                "mastery_threshold": 0.7
            }
        },
        "learning_paths": {
            "arithmetic": {
                "name": "Arithmetic basics",
                "description": "Fractions then decimals",
                "sequence": ["fractions", "decimals"]
            }
        }
    }"#;

    #[test]
    fn test_from_json_round_trip() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.graph().len(), 2);

        let concept = catalog.concept("decimals").unwrap();
        assert_eq!(concept.prerequisites, vec!["fractions".to_string()]);

        let path = catalog.path("arithmetic").unwrap();
        assert_eq!(path.sequence.len(), 2);
        assert_eq!(path.name, "Arithmetic basics");
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(
            catalog.path("ghost").unwrap_err(),
            EngineError::PathNotFound("ghost".to_string())
        );
    }

    #[test]
    fn test_missing_concept_is_an_error_but_details_is_tolerant() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert!(matches!(
            catalog.concept("ghost").unwrap_err(),
            EngineError::ConceptNotFound(_)
        ));
        assert!(catalog.concept_details("ghost").is_none());
        assert!(catalog.concept_details("fractions").is_some());
    }

    #[test]
    fn test_malformed_json_is_a_validation_error() {
        let err = Catalog::from_json("{ not json").unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));
    }

    #[test]
    fn test_path_with_unknown_concept_rejected_at_load() {
        let raw = r#"{
            "concepts": {
                "a": { "name": "A", "mastery_threshold": 0.7 }
            },
            "learning_paths": {
                "p": { "name": "P", "sequence": ["a", "ghost"] }
            }
        }"#;
        assert!(matches!(
            Catalog::from_json(raw).unwrap_err(),
            EngineError::Validation { .. }
        ));
    }

    #[test]
    fn test_paths_iterates_in_id_order() {
        let raw = r#"{
            "concepts": {
                "a": { "name": "A", "mastery_threshold": 0.5 }
            },
            "learning_paths": {
                "zeta": { "name": "Z", "sequence": ["a"] },
                "alpha": { "name": "A", "sequence": ["a"] }
            }
        }"#;
        let catalog = Catalog::from_json(raw).unwrap();
        let ids: Vec<&str> = catalog.paths().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
    }
}
