//! Heuristic fallbacks built on the same cost and resource accounting as the
//! labeling: a tabu-list depth-first construction and a cycle repair for
//! paths returned by a non-elementary search.
//!
//! Neither is exact. Both may fail on instances where a simple feasible path exists.

use std::collections::HashMap;

use petgraph::prelude::{EdgeRef, NodeIndex};
use petgraph::visit::{Dfs, NodeIndexable, Reversed};

use crate::config::ResourceBounds;
use crate::error::{RcspError, RcspResult};
use crate::graph::{EdgeAttributes, ProblemGraph};
use crate::resources::ResourceVector;
use crate::search::SearchBudget;
use crate::solution::Solution;

/// Depth-first construction of a simple path with a tabu list.
///
/// From the current node the outgoing edges are tried cheapest first (ties on
/// the target index). Nodes on the current path, and nodes that cannot reach
/// the sink at all, are tabu. The first path that reaches the sink inside the
/// resource window is returned.
pub struct Tabu<'g, NodeWeight, EdgeWeight: EdgeAttributes> {
    graph: &'g ProblemGraph<NodeWeight, EdgeWeight>,
    bounds: &'g ResourceBounds,
    budget: SearchBudget,
}

struct Frame<'g, EdgeWeight> {
    node: NodeIndex,
    resources: ResourceVector,
    candidates: Vec<(NodeIndex, &'g EdgeWeight)>,
    next: usize,
}

impl<'g, NodeWeight, EdgeWeight: EdgeAttributes> Tabu<'g, NodeWeight, EdgeWeight> {
    pub fn new(graph: &'g ProblemGraph<NodeWeight, EdgeWeight>, bounds: &'g ResourceBounds, budget: SearchBudget) -> Self {
        Self { graph, bounds, budget }
    }

    fn candidates(&self, node: NodeIndex) -> Vec<(NodeIndex, &'g EdgeWeight)> {
        let mut out: Vec<(NodeIndex, &'g EdgeWeight)> = self
            .graph
            .dag
            .edges_directed(node, petgraph::Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
            .collect();
        out.sort_by(|a, b| a.1.cost().total_cmp(&b.1.cost()).then_with(|| a.0.cmp(&b.0)));
        out
    }

    /// Nodes from which the sink is reachable
    fn reaches_sink(&self) -> Vec<bool> {
        let dag = &self.graph.dag;
        let mut reaches = vec![false; dag.node_bound()];
        let reversed = Reversed(dag);
        let mut dfs = Dfs::new(reversed, self.graph.end);
        while let Some(node) = dfs.next(reversed) {
            reaches[node.index()] = true;
        }
        reaches
    }

    /// # Errors
    ///
    /// - [`RcspError::NoFeasiblePath`] if the construction runs out of candidates
    /// - [`RcspError::DeadlineExceeded`] if the budget runs out first
    pub fn run(&self) -> RcspResult<Solution> {
        let start = self.graph.start;
        let end = self.graph.end;
        let max_res = self.bounds.max_res();

        let mut tabu: Vec<bool> = self.reaches_sink().into_iter().map(|reaches| !reaches).collect();
        if tabu[start.index()] {
            return Err(RcspError::NoFeasiblePath);
        }
        tabu[start.index()] = true;

        let mut stack = vec![Frame {
            node: start,
            resources: ResourceVector::zeros(self.bounds.n_res()),
            candidates: self.candidates(start),
            next: 0,
        }];
        let mut iterations = 0_u64;

        while let Some(frame) = stack.last_mut() {
            let Some(&(target, weight)) = frame.candidates.get(frame.next) else {
                // dead end
                tabu[frame.node.index()] = false;
                stack.pop();
                continue;
            };
            frame.next += 1;

            if self.budget.exhausted(iterations) {
                log::debug!("tabu construction limit reached: {iterations} iterations");
                return Err(RcspError::DeadlineExceeded { iterations });
            }
            iterations += 1;

            if tabu[target.index()] {
                continue;
            }
            let resources = frame.resources.add(weight.resources())?;
            if !resources.leq(max_res) {
                continue;
            }

            if target == end {
                if !self.bounds.admits(&resources) {
                    continue;
                }
                let mut path: Vec<NodeIndex> = stack.iter().map(|f| f.node).collect();
                path.push(end);
                log::debug!("tabu construction found a path after {iterations} iterations");
                return Solution::evaluate(self.graph, self.bounds, path, false);
            }

            tabu[target.index()] = true;
            stack.push(Frame {
                node: target,
                resources,
                candidates: self.candidates(target),
                next: 0,
            });
        }

        Err(RcspError::NoFeasiblePath)
    }
}

/// Position pair of the earliest node repetition on `path`
fn first_repeat(path: &[NodeIndex]) -> Option<(usize, usize)> {
    let mut seen = HashMap::with_capacity(path.len());
    for (pos, node) in path.iter().enumerate() {
        if let Some(first) = seen.insert(*node, pos) {
            return Some((first, pos));
        }
    }
    None
}

/// Cuts cycles out of `path` until no node repeats, then re-costs the result.
/// Best effort: the result is never marked complete.
///
/// # Errors
///
/// - [`RcspError::NoFeasiblePath`] if the simple path leaves the resource window
/// - [`RcspError::InvalidGraph`] if `path` is not a source-to-sink walk of the graph
pub fn repair_cycles<NodeWeight, EdgeWeight: EdgeAttributes>(
    graph: &ProblemGraph<NodeWeight, EdgeWeight>,
    bounds: &ResourceBounds,
    path: &[NodeIndex],
) -> RcspResult<Solution> {
    let mut path = path.to_vec();
    while let Some((first, second)) = first_repeat(&path) {
        log::trace!("removing cycle through node {}", path[first].index());
        path.drain(first..second);
    }
    Solution::evaluate(graph, bounds, path, false)
}
