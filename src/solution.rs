//! Complete source-to-sink paths returned to the caller.

use std::cmp::Ordering;
use std::fmt::{self, Debug};

use itertools::Itertools;
use petgraph::prelude::NodeIndex;

use crate::config::ResourceBounds;
use crate::error::{RcspError, RcspResult};
use crate::graph::{EdgeAttributes, ProblemGraph};
use crate::resources::ResourceVector;
use crate::search::SearchStats;

/// Solution object describing the chosen path between source and sink node
#[derive(Clone, PartialEq)]
pub struct Solution {
    /// Visited nodes, source first.
    pub path: Vec<NodeIndex>,
    pub total_cost: f64,
    pub consumed_resources: ResourceVector,
    /// False if a cap or the threshold stopped a search; the path is feasible but possibly not optimal.
    pub complete: bool,
    pub forward_stats: Option<SearchStats>,
    pub backward_stats: Option<SearchStats>,
}

impl Solution {
    /// Re-costs `path` edge by edge from the source and checks it against `bounds`.
    ///
    /// # Errors
    ///
    /// - [`RcspError::InvalidGraph`] if the path does not run from source to sink along edges
    /// - [`RcspError::NoFeasiblePath`] if the consumption leaves the resource window
    pub fn evaluate<NodeWeight, EdgeWeight: EdgeAttributes>(
        graph: &ProblemGraph<NodeWeight, EdgeWeight>,
        bounds: &ResourceBounds,
        path: Vec<NodeIndex>,
        complete: bool,
    ) -> RcspResult<Self> {
        if path.first() != Some(&graph.start) || path.last() != Some(&graph.end) {
            return Err(RcspError::InvalidGraph("path does not connect source and sink".to_string()));
        }
        let (total_cost, consumed_resources) = graph.evaluate_path(&path, bounds.n_res())?;
        if !bounds.admits(&consumed_resources) {
            return Err(RcspError::NoFeasiblePath);
        }
        Ok(Self {
            path,
            total_cost,
            consumed_resources,
            complete,
            forward_stats: None,
            backward_stats: None,
        })
    }

    #[must_use]
    pub fn with_stats(mut self, forward: Option<SearchStats>, backward: Option<SearchStats>) -> Self {
        self.forward_stats = forward;
        self.backward_stats = backward;
        self
    }

    /// Node weights along the path
    pub fn node_weights<'g, NodeWeight, EdgeWeight: EdgeAttributes>(
        &self,
        graph: &'g ProblemGraph<NodeWeight, EdgeWeight>,
    ) -> Vec<&'g NodeWeight> {
        self.path.iter().filter_map(|n| graph.dag.node_weight(*n)).collect()
    }

    /// No node appears twice on the path
    #[must_use]
    pub fn is_elementary(&self) -> bool {
        self.path.iter().all_unique()
    }
}

impl Debug for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\nSolution\n")?;
        writeln!(f, "Visiting: {}", self.path.iter().map(|n| n.index()).join("-"))?;
        writeln!(f, "Cost: {} Resources: {}", self.total_cost, self.consumed_resources)?;
        if !self.complete {
            f.write_str("(search stopped early)\n")?;
        }
        Ok(())
    }
}

/// Preference between two complete candidate paths: cheaper first, then
/// fewer nodes, then lexicographically smaller node sequence.
pub(crate) fn rank(a_cost: f64, a_path: &[NodeIndex], b_cost: f64, b_path: &[NodeIndex]) -> Ordering {
    a_cost
        .total_cmp(&b_cost)
        .then_with(|| a_path.len().cmp(&b_path.len()))
        .then_with(|| a_path.cmp(b_path))
}

/// Best candidate seen so far, by [`rank`]
#[derive(Debug, Default)]
pub(crate) struct Incumbent {
    best: Option<(f64, Vec<NodeIndex>)>,
}

impl Incumbent {
    /// Would a path of this cost and length be able to replace the incumbent?
    pub(crate) fn admits(&self, cost: f64, len: usize) -> bool {
        match &self.best {
            None => true,
            Some((best_cost, best_path)) => match cost.total_cmp(best_cost) {
                Ordering::Less => true,
                Ordering::Equal => len <= best_path.len(),
                Ordering::Greater => false,
            },
        }
    }

    pub(crate) fn offer(&mut self, cost: f64, path: Vec<NodeIndex>) {
        let better = match &self.best {
            None => true,
            Some((best_cost, best_path)) => rank(cost, &path, *best_cost, best_path) == Ordering::Less,
        };
        if better {
            self.best = Some((cost, path));
        }
    }

    pub(crate) fn into_path(self) -> Option<Vec<NodeIndex>> {
        self.best.map(|(_, path)| path)
    }
}
