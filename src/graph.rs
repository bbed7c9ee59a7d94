//! Concept dependency graph.
//!
//! Owns the validated, immutable concept set and answers structural
//! queries: prerequisites, declared next-concept suggestions, and the
//! per-learner readiness predicate. Construction validates every id
//! reference and rejects prerequisite cycles; after `build` succeeds
//! the graph is safe for unlimited concurrent reads.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::EngineError;
use crate::mastery::mastery_of;
use crate::types::{Concept, LearningPath, MasteryRecord};

#[derive(Debug)]
struct ConceptNode {
    concept: Concept,
    prerequisite_set: HashSet<String>,
}

#[derive(Debug)]
pub struct ConceptGraph {
    nodes: HashMap<String, ConceptNode>,
    // Declaration order, for deterministic iteration and traversal.
    order: Vec<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    White,
    Gray,
    Black,
}

impl ConceptGraph {
    /// Validate and freeze a concept set.
    ///
    /// Fails when a concept id is duplicated, a `prerequisites` or
    /// `next_concepts` entry references an unknown id, a threshold is
    /// outside [0, 1], or the prerequisite edges contain a cycle. The
    /// error message for a cycle names the concept ids on it.
    pub fn build(concepts: Vec<Concept>) -> Result<Self, EngineError> {
        let mut nodes: HashMap<String, ConceptNode> = HashMap::with_capacity(concepts.len());
        let mut order = Vec::with_capacity(concepts.len());

        for concept in concepts {
            if !(0.0..=1.0).contains(&concept.mastery_threshold) {
                return Err(EngineError::validation(format!(
                    "concept {} has mastery_threshold {} outside [0, 1]",
                    concept.id, concept.mastery_threshold
                )));
            }
            let prerequisite_set: HashSet<String> =
                concept.prerequisites.iter().cloned().collect();
            let id = concept.id.clone();
            if nodes
                .insert(
                    id.clone(),
                    ConceptNode {
                        concept,
                        prerequisite_set,
                    },
                )
                .is_some()
            {
                return Err(EngineError::validation(format!(
                    "duplicate concept id: {id}"
                )));
            }
            order.push(id);
        }

        for id in &order {
            let node = &nodes[id];
            for prereq in &node.concept.prerequisites {
                if !nodes.contains_key(prereq) {
                    return Err(EngineError::validation(format!(
                        "concept {id} lists unknown prerequisite {prereq}"
                    )));
                }
            }
            for next in &node.concept.next_concepts {
                if !nodes.contains_key(next) {
                    return Err(EngineError::validation(format!(
                        "concept {id} lists unknown next concept {next}"
                    )));
                }
            }
        }

        let graph = Self { nodes, order };
        graph.check_acyclic()?;
        debug!(concepts = graph.order.len(), "concept graph built");
        Ok(graph)
    }

    // Three-color DFS over prerequisite edges. A gray node reached
    // twice closes a cycle; the error reports the ids on it.
    fn check_acyclic(&self) -> Result<(), EngineError> {
        let mut marks: HashMap<&str, Mark> = self
            .nodes
            .keys()
            .map(|id| (id.as_str(), Mark::White))
            .collect();
        let mut stack: Vec<&str> = Vec::new();

        for id in &self.order {
            if marks[id.as_str()] == Mark::White {
                self.visit(id, &mut marks, &mut stack)?;
            }
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        id: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
    ) -> Result<(), EngineError> {
        marks.insert(id, Mark::Gray);
        stack.push(id);

        for prereq in &self.nodes[id].concept.prerequisites {
            match marks[prereq.as_str()] {
                Mark::Gray => {
                    let start = stack
                        .iter()
                        .position(|&seen| seen == prereq.as_str())
                        .unwrap_or(0);
                    let mut cycle: Vec<&str> = stack[start..].to_vec();
                    cycle.push(prereq.as_str());
                    return Err(EngineError::validation(format!(
                        "prerequisite cycle: {}",
                        cycle.join(" -> ")
                    )));
                }
                Mark::White => self.visit(prereq.as_str(), marks, stack)?,
                Mark::Black => {}
            }
        }

        stack.pop();
        marks.insert(id, Mark::Black);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, concept_id: &str) -> bool {
        self.nodes.contains_key(concept_id)
    }

    /// Concepts in declaration order.
    pub fn concepts(&self) -> impl Iterator<Item = &Concept> {
        self.order.iter().map(|id| &self.nodes[id].concept)
    }

    pub fn concept(&self, concept_id: &str) -> Result<&Concept, EngineError> {
        self.nodes
            .get(concept_id)
            .map(|node| &node.concept)
            .ok_or_else(|| EngineError::ConceptNotFound(concept_id.to_string()))
    }

    pub fn prerequisites_of(&self, concept_id: &str) -> Result<&HashSet<String>, EngineError> {
        self.nodes
            .get(concept_id)
            .map(|node| &node.prerequisite_set)
            .ok_or_else(|| EngineError::ConceptNotFound(concept_id.to_string()))
    }

    /// Declared follow-up suggestions, in declaration order.
    ///
    /// Unknown ids yield an empty slice rather than an error: a
    /// terminal concept is a normal state, not a failure.
    pub fn next_concepts_of(&self, concept_id: &str) -> &[String] {
        self.nodes
            .get(concept_id)
            .map(|node| node.concept.next_concepts.as_slice())
            .unwrap_or(&[])
    }

    /// The mastery threshold gating both prerequisite satisfaction and
    /// path completion for this concept.
    pub fn threshold_of(&self, concept_id: &str) -> Result<f64, EngineError> {
        self.concept(concept_id).map(|c| c.mastery_threshold)
    }

    /// True iff every prerequisite of `concept_id` has reached its own
    /// threshold in the snapshot. A concept with no prerequisites is
    /// always ready; an unknown concept is never ready.
    pub fn is_ready(
        &self,
        concept_id: &str,
        mastery_by_concept: &HashMap<String, MasteryRecord>,
    ) -> bool {
        let Some(node) = self.nodes.get(concept_id) else {
            debug!(concept_id, "readiness check for unknown concept, failing closed");
            return false;
        };

        node.prerequisite_set.iter().all(|prereq| {
            let threshold = self.nodes[prereq].concept.mastery_threshold;
            mastery_of(mastery_by_concept.get(prereq)) >= threshold
        })
    }

    /// Concept ids in an order where every prerequisite precedes its
    /// dependents. Deterministic for a given declaration order.
    pub fn topological_order(&self) -> Vec<&str> {
        let mut done: HashSet<&str> = HashSet::with_capacity(self.nodes.len());
        let mut out: Vec<&str> = Vec::with_capacity(self.nodes.len());

        for id in &self.order {
            self.push_after_prerequisites(id, &mut done, &mut out);
        }
        out
    }

    fn push_after_prerequisites<'a>(
        &'a self,
        id: &'a str,
        done: &mut HashSet<&'a str>,
        out: &mut Vec<&'a str>,
    ) {
        if done.contains(id) {
            return;
        }
        done.insert(id);
        for prereq in &self.nodes[id].concept.prerequisites {
            self.push_after_prerequisites(prereq, done, out);
        }
        out.push(id);
    }

    /// Audit whether a path sequence is consistent with the
    /// prerequisite relation: no concept appears before a prerequisite
    /// of it that is also part of the sequence. Prerequisites absent
    /// from the sequence are not violations (they may be mastered
    /// outside the path).
    pub fn sequence_respects_prerequisites(&self, path: &LearningPath) -> bool {
        self.sequence_violations(path).is_empty()
    }

    fn sequence_violations<'a>(&'a self, path: &'a LearningPath) -> Vec<(&'a str, &'a str)> {
        let position: HashMap<&str, usize> = path
            .sequence
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.as_str(), idx))
            .collect();

        let mut violations = Vec::new();
        for (idx, concept_id) in path.sequence.iter().enumerate() {
            let Some(node) = self.nodes.get(concept_id) else {
                continue;
            };
            for prereq in &node.concept.prerequisites {
                if let Some(&prereq_idx) = position.get(prereq.as_str()) {
                    if prereq_idx > idx {
                        violations.push((concept_id.as_str(), prereq.as_str()));
                    }
                }
            }
        }
        violations
    }

    /// Validate a path against the graph: every sequence entry must be
    /// a known concept. Order inconsistencies are tolerated but logged,
    /// since prerequisites can be satisfied outside the path.
    pub fn validate_path(&self, path: &LearningPath) -> Result<(), EngineError> {
        for concept_id in &path.sequence {
            if !self.nodes.contains_key(concept_id) {
                return Err(EngineError::validation(format!(
                    "path {} references unknown concept {concept_id}",
                    path.id
                )));
            }
        }

        for (concept_id, prereq) in self.sequence_violations(path) {
            warn!(
                path_id = %path.id,
                concept_id,
                prerequisite = prereq,
                "path sequence places a concept before one of its prerequisites"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concept(id: &str, prereqs: &[&str], threshold: f64) -> Concept {
        Concept {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: String::new(),
            prerequisites: prereqs.iter().map(|s| s.to_string()).collect(),
            next_concepts: Vec::new(),
            mastery_threshold: threshold,
        }
    }

    fn record(mastery: f64) -> MasteryRecord {
        MasteryRecord {
            attempts: 10,
            correct: (mastery * 10.0).round() as u32,
            mastery,
            last_attempt_at: None,
        }
    }

    fn snapshot(entries: &[(&str, f64)]) -> HashMap<String, MasteryRecord> {
        entries
            .iter()
            .map(|(id, m)| (id.to_string(), record(*m)))
            .collect()
    }

    #[test]
    fn test_build_rejects_unknown_prerequisite() {
        let err = ConceptGraph::build(vec![concept("a", &["ghost"], 0.7)]).unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }), "{err}");
    }

    #[test]
    fn test_build_rejects_unknown_next_concept() {
        let mut a = concept("a", &[], 0.7);
        a.next_concepts = vec!["ghost".to_string()];
        let err = ConceptGraph::build(vec![a]).unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }), "{err}");
    }

    #[test]
    fn test_build_rejects_threshold_out_of_range() {
        let err = ConceptGraph::build(vec![concept("a", &[], 1.5)]).unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }), "{err}");
    }

    #[test]
    fn test_build_rejects_two_node_cycle_and_names_it() {
        let err = ConceptGraph::build(vec![
            concept("a", &["b"], 0.7),
            concept("b", &["a"], 0.7),
        ])
        .unwrap_err();
        let EngineError::Validation { reason } = &err else {
            panic!("expected validation error, got {err}");
        };
        assert!(reason.contains("cycle"), "{reason}");
        assert!(reason.contains('a') && reason.contains('b'), "{reason}");
    }

    #[test]
    fn test_build_rejects_self_cycle() {
        let err = ConceptGraph::build(vec![concept("a", &["a"], 0.7)]).unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }), "{err}");
    }

    #[test]
    fn test_build_accepts_diamond() {
        let graph = ConceptGraph::build(vec![
            concept("base", &[], 0.7),
            concept("left", &["base"], 0.7),
            concept("right", &["base"], 0.7),
            concept("top", &["left", "right"], 0.7),
        ])
        .unwrap();
        assert_eq!(graph.len(), 4);
    }

    #[test]
    fn test_is_ready_gates_on_prerequisite_threshold() {
        let graph = ConceptGraph::build(vec![
            concept("a", &[], 0.7),
            concept("b", &["a"], 0.7),
        ])
        .unwrap();

        assert!(!graph.is_ready("b", &snapshot(&[("a", 0.5)])));
        assert!(graph.is_ready("b", &snapshot(&[("a", 0.8)])));
    }

    #[test]
    fn test_is_ready_no_prerequisites_is_always_ready() {
        let graph = ConceptGraph::build(vec![concept("a", &[], 0.9)]).unwrap();
        assert!(graph.is_ready("a", &HashMap::new()));
    }

    #[test]
    fn test_is_ready_unknown_concept_fails_closed() {
        let graph = ConceptGraph::build(vec![concept("a", &[], 0.7)]).unwrap();
        assert!(!graph.is_ready("ghost", &snapshot(&[("a", 1.0)])));
    }

    #[test]
    fn test_is_ready_uses_prerequisite_own_threshold() {
        // b requires a; a's threshold (0.4) gates, not b's (0.9).
        let graph = ConceptGraph::build(vec![
            concept("a", &[], 0.4),
            concept("b", &["a"], 0.9),
        ])
        .unwrap();
        assert!(graph.is_ready("b", &snapshot(&[("a", 0.5)])));
    }

    #[test]
    fn test_next_concepts_of_unknown_is_empty() {
        let graph = ConceptGraph::build(vec![concept("a", &[], 0.7)]).unwrap();
        assert!(graph.next_concepts_of("ghost").is_empty());
    }

    #[test]
    fn test_prerequisites_of_unknown_errors() {
        let graph = ConceptGraph::build(vec![concept("a", &[], 0.7)]).unwrap();
        assert_eq!(
            graph.prerequisites_of("ghost").unwrap_err(),
            EngineError::ConceptNotFound("ghost".to_string())
        );
    }

    #[test]
    fn test_topological_order_puts_prerequisites_first() {
        let graph = ConceptGraph::build(vec![
            concept("top", &["left", "right"], 0.7),
            concept("left", &["base"], 0.7),
            concept("right", &["base"], 0.7),
            concept("base", &[], 0.7),
        ])
        .unwrap();

        let order = graph.topological_order();
        let pos = |id: &str| order.iter().position(|&o| o == id).unwrap();
        assert!(pos("base") < pos("left"));
        assert!(pos("base") < pos("right"));
        assert!(pos("left") < pos("top"));
        assert!(pos("right") < pos("top"));
    }

    #[test]
    fn test_sequence_audit_flags_inverted_order() {
        let graph = ConceptGraph::build(vec![
            concept("a", &[], 0.7),
            concept("b", &["a"], 0.7),
        ])
        .unwrap();

        let inverted = LearningPath {
            id: "p".to_string(),
            name: "P".to_string(),
            description: String::new(),
            sequence: vec!["b".to_string(), "a".to_string()],
        };
        assert!(!graph.sequence_respects_prerequisites(&inverted));
        // Inverted order is tolerated at validation time.
        graph.validate_path(&inverted).unwrap();

        let ordered = LearningPath {
            sequence: vec!["a".to_string(), "b".to_string()],
            ..inverted
        };
        assert!(graph.sequence_respects_prerequisites(&ordered));
    }

    #[test]
    fn test_validate_path_rejects_unknown_concept() {
        let graph = ConceptGraph::build(vec![concept("a", &[], 0.7)]).unwrap();
        let path = LearningPath {
            id: "p".to_string(),
            name: "P".to_string(),
            description: String::new(),
            sequence: vec!["a".to_string(), "ghost".to_string()],
        };
        assert!(matches!(
            graph.validate_path(&path).unwrap_err(),
            EngineError::Validation { .. }
        ));
    }
}
