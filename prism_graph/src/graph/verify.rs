//! Graph consistency checks.
//!
//! Verification is diagnostic: it never changes the graph and reports every
//! problem it finds to a listener instead of stopping at the first one.

use std::fmt;

use super::{Graph, GraphId};
use crate::error::{GraphError, GraphResult};
use crate::node::NodeId;

/// One failed check, with the context needed to debug it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationFailure {
    /// Graph that was verified.
    pub graph: GraphId,
    /// Node the check was about.
    pub node: NodeId,
    /// Type of that node.
    pub type_name: &'static str,
    /// What went wrong.
    pub message: String,
    /// The node's usages at the time of the check.
    pub usages: Vec<NodeId>,
    /// The node's predecessor at the time of the check.
    pub predecessor: Option<NodeId>,
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:?} ({}): {} [usages {:?}, predecessor {:?}]",
            self.graph, self.node, self.type_name, self.message, self.usages, self.predecessor
        )
    }
}

/// Receives verification failures.
pub trait VerificationListener {
    /// Called once per failed check.
    fn verification_failed(&mut self, failure: VerificationFailure);
}

impl VerificationListener for Vec<VerificationFailure> {
    fn verification_failed(&mut self, failure: VerificationFailure) {
        self.push(failure);
    }
}

impl Graph {
    /// Check one node against its back-edges and report every problem to
    /// `listener`. Returns the number of problems.
    pub fn verify_node(&self, id: NodeId, listener: &mut dyn VerificationListener) -> usize {
        let Some(node) = self.get(id) else {
            listener.verification_failed(VerificationFailure {
                graph: self.id,
                node: id,
                type_name: "?",
                message: "node is not alive".to_string(),
                usages: Vec::new(),
                predecessor: None,
            });
            return 1;
        };

        let mut problems = Vec::new();
        if node.id() != id {
            problems.push(format!("node records id {:?}", node.id()));
        }
        if node.graph_id() != Some(self.id) {
            problems.push(format!("node belongs to {:?}", node.graph_id()));
        }

        let mut inputs: Vec<NodeId> = node.inputs().collect();
        inputs.sort_unstable();
        inputs.dedup();
        for target in inputs {
            match self.get(target) {
                None => problems.push(format!("input {:?} is not alive", target)),
                Some(input) => {
                    let edges = node.input_slots().count(target);
                    let recorded = input.usages().iter().filter(|&&u| u == id).count();
                    if edges != recorded {
                        problems.push(format!(
                            "{} input edge(s) to {:?} but {} usage entries there",
                            edges, target, recorded
                        ));
                    }
                }
            }
        }
        for target in node.successors() {
            match self.get(target) {
                None => problems.push(format!("successor {:?} is not alive", target)),
                Some(successor) if successor.predecessor() != Some(id) => {
                    problems.push(format!(
                        "successor {:?} has predecessor {:?}",
                        target,
                        successor.predecessor()
                    ));
                }
                Some(_) => {}
            }
        }
        for &user in node.usages() {
            match self.get(user) {
                None => problems.push(format!("usage {:?} is not alive", user)),
                Some(user_node) if !user_node.input_slots().contains(id) => {
                    problems.push(format!("usage {:?} has no input edge to this node", user));
                }
                Some(_) => {}
            }
        }
        if let Some(pred) = node.predecessor() {
            match self.get(pred) {
                None => problems.push(format!("predecessor {:?} is not alive", pred)),
                Some(pred_node) if !pred_node.successor_slots().contains(id) => {
                    problems.push(format!(
                        "predecessor {:?} has no successor edge to this node",
                        pred
                    ));
                }
                Some(_) => {}
            }
        }

        let count = problems.len();
        for message in problems {
            listener.verification_failed(VerificationFailure {
                graph: self.id,
                node: id,
                type_name: node.schema().name(),
                message,
                usages: node.usages().to_vec(),
                predecessor: node.predecessor(),
            });
        }
        count
    }

    /// Verify every live node; returns the total number of problems.
    pub fn verify_with(&self, listener: &mut dyn VerificationListener) -> usize {
        self.ids().map(|id| self.verify_node(id, listener)).sum()
    }

    /// Verify every live node, logging each problem and returning all of
    /// them as [`GraphError::Verification`].
    pub fn verify(&self) -> GraphResult<()> {
        let mut failures: Vec<VerificationFailure> = Vec::new();
        self.verify_with(&mut failures);
        if failures.is_empty() {
            return Ok(());
        }
        for failure in &failures {
            log::warn!("verification failed: {}", failure);
        }
        Err(GraphError::Verification(failures))
    }
}
