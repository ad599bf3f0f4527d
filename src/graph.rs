//! Graph adapter: the directed graph the labeling runs on.

use std::collections::HashSet;
use std::fmt::Debug;

use itertools::Itertools;
use petgraph::prelude::{EdgeRef, NodeIndex};
use petgraph::stable_graph::{EdgeReference, StableGraph};
use petgraph::visit::IntoEdgeReferences;

use crate::error::{RcspError, RcspResult};
use crate::resources::ResourceVector;

/// Shorthand for petgraph stable graph
pub type GraphType<NodeWeight, EdgeWeight> = StableGraph<NodeWeight, EdgeWeight, petgraph::Directed, u32>;

/// Attributes the search reads from an edge
pub trait EdgeAttributes: Debug {
    fn cost(&self) -> f64;

    /// Consumption of each resource when traversing the edge
    fn resources(&self) -> &ResourceVector;
}

/// Plain edge weight: scalar cost plus resource consumption.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceEdge {
    pub cost: f64,
    pub resources: ResourceVector,
}

impl ResourceEdge {
    pub fn new(cost: f64, resources: impl Into<ResourceVector>) -> Self {
        Self { cost, resources: resources.into() }
    }
}

impl EdgeAttributes for ResourceEdge {
    fn cost(&self) -> f64 {
        self.cost
    }

    fn resources(&self) -> &ResourceVector {
        &self.resources
    }
}

/// Compact struct containing the graph and references to its source and sink node.
pub struct ProblemGraph<NodeWeight, EdgeWeight: EdgeAttributes> {
    pub dag: GraphType<NodeWeight, EdgeWeight>,
    pub start: NodeIndex,
    pub end: NodeIndex,
}

impl<NodeWeight, EdgeWeight: EdgeAttributes> ProblemGraph<NodeWeight, EdgeWeight> {
    pub fn new(dag: GraphType<NodeWeight, EdgeWeight>, start: NodeIndex, end: NodeIndex) -> Self {
        Self { dag, start, end }
    }

    /// Checks the adapter contract for `n_res` resources.
    ///
    /// # Errors
    ///
    /// - [`RcspError::InvalidGraph`] if source or sink are missing, or two edges
    ///   share the same endpoints
    /// - [`RcspError::DimensionMismatch`] if an edge carries the wrong number of resources
    pub fn validate(&self, n_res: usize) -> RcspResult<()> {
        if !self.dag.contains_node(self.start) {
            return Err(RcspError::InvalidGraph(format!("source {} not in graph", self.start.index())));
        }
        if !self.dag.contains_node(self.end) {
            return Err(RcspError::InvalidGraph(format!("sink {} not in graph", self.end.index())));
        }

        let mut seen = HashSet::with_capacity(self.dag.edge_count());
        for edge in (&self.dag).edge_references() {
            edge.weight().resources().expect_len(n_res)?;
            if !seen.insert((edge.source(), edge.target())) {
                return Err(RcspError::InvalidGraph(format!(
                    "parallel edges between {} and {}",
                    edge.source().index(),
                    edge.target().index()
                )));
            }
        }
        Ok(())
    }

    /// The edge `from -> to`, if any
    pub fn edge_between(&self, from: NodeIndex, to: NodeIndex) -> Option<EdgeReference<'_, EdgeWeight>> {
        self.dag.edges_directed(from, petgraph::Direction::Outgoing).find(|e| e.target() == to)
    }

    /// Re-sums cost and consumption along `path`, source side first.
    ///
    /// # Errors
    ///
    /// - [`RcspError::InvalidGraph`] if two consecutive nodes are not connected
    /// - [`RcspError::DimensionMismatch`] if an edge has the wrong arity
    pub fn evaluate_path(&self, path: &[NodeIndex], n_res: usize) -> RcspResult<(f64, ResourceVector)> {
        let mut cost = 0.0;
        let mut consumed = ResourceVector::zeros(n_res);
        for (from, to) in path.iter().copied().tuple_windows() {
            let edge = self.edge_between(from, to).ok_or_else(|| {
                RcspError::InvalidGraph(format!("no edge from {} to {}", from.index(), to.index()))
            })?;
            cost += edge.weight().cost();
            consumed = consumed.add(edge.weight().resources())?;
        }
        Ok((cost, consumed))
    }
}
