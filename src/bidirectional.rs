//! Bidirectional coordinator: forward and backward labeling up to the
//! midpoint of the critical resource, then a join across single edges.

use itertools::Itertools;
use petgraph::prelude::{EdgeRef, NodeIndex};
use petgraph::visit::IntoEdgeReferences;

use crate::config::{ResourceBounds, SearchConfig};
use crate::error::{RcspError, RcspResult};
use crate::graph::{EdgeAttributes, ProblemGraph};
use crate::label::{CycleRule, Direction};
use crate::search::{DirectionOutcome, LabelSetting, SearchBudget, Termination};
use crate::solution::{Incumbent, Solution};

/// Forward and backward search over the same graph, joined at the end.
pub struct BidirectionalSearch<'g, NodeWeight, EdgeWeight: EdgeAttributes> {
    graph: &'g ProblemGraph<NodeWeight, EdgeWeight>,
    bounds: &'g ResourceBounds,
    config: &'g SearchConfig,
    budget: SearchBudget,
}

impl<'g, NodeWeight, EdgeWeight> BidirectionalSearch<'g, NodeWeight, EdgeWeight>
where
    NodeWeight: Sync,
    EdgeWeight: EdgeAttributes + Sync,
{
    pub fn new(
        graph: &'g ProblemGraph<NodeWeight, EdgeWeight>,
        bounds: &'g ResourceBounds,
        config: &'g SearchConfig,
        budget: SearchBudget,
    ) -> Self {
        Self { graph, bounds, config, budget }
    }

    /// Runs both directions (in parallel if configured), then joins them.
    ///
    /// # Errors
    ///
    /// - [`RcspError::NoFeasiblePath`] if both searches finished and no join fits the window
    /// - [`RcspError::DeadlineExceeded`] if a cap stopped a search and no join was found
    /// - [`RcspError::DimensionMismatch`] if `critical_resource` names no resource
    /// - anything [`LabelSetting::run`] reports
    pub fn run(&self) -> RcspResult<Solution> {
        self.config.validate(self.bounds)?;
        let critical = self.config.critical_resource;
        let forward = LabelSetting::new(self.graph, self.bounds, Direction::Forward, self.config, self.budget)
            .with_midpoint(critical);
        let backward = LabelSetting::new(self.graph, self.bounds, Direction::Backward, self.config, self.budget)
            .with_midpoint(critical);

        // the two directions share nothing but the read-only graph and bounds
        let (forward, backward) = if self.config.parallel {
            rayon::join(|| forward.run(), || backward.run())
        } else {
            (forward.run(), backward.run())
        };
        let forward = forward?;
        let backward = backward?;

        let complete = forward.termination == Termination::Exhausted && backward.termination == Termination::Exhausted;
        let capped = forward.termination == Termination::Budget || backward.termination == Termination::Budget;
        match join(self.graph, self.bounds, &forward, &backward, CycleRule::from_config(self.config))? {
            Some(path) => Ok(Solution::evaluate(self.graph, self.bounds, path, complete)?
                .with_stats(Some(forward.stats), Some(backward.stats))),
            None if capped => Err(RcspError::DeadlineExceeded {
                iterations: forward.stats.iterations + backward.stats.iterations,
            }),
            None => Err(RcspError::NoFeasiblePath),
        }
    }
}

/// Joins forward labels at `u` with backward labels at `v` for every edge `(u, v)`.
///
/// A pair is feasible when the joined path, re-summed from the source, fits
/// the window and respects `cycles`: in elementary mode the two partial paths
/// share no node, with two-cycle elimination the junction does not turn
/// straight back. Returns the best feasible source-to-sink node sequence.
///
/// # Errors
///
/// - [`RcspError::DimensionMismatch`] if an edge has the wrong arity
/// - [`RcspError::InvalidGraph`] if a label path does not follow the graph's edges
pub fn join<NodeWeight, EdgeWeight: EdgeAttributes>(
    graph: &ProblemGraph<NodeWeight, EdgeWeight>,
    bounds: &ResourceBounds,
    forward: &DirectionOutcome,
    backward: &DirectionOutcome,
    cycles: CycleRule,
) -> RcspResult<Option<Vec<NodeIndex>>> {
    debug_assert_eq!(forward.direction, Direction::Forward);
    debug_assert_eq!(backward.direction, Direction::Backward);

    let mut incumbent = Incumbent::default();
    let mut pairs = 0_u64;
    let mut offered = 0_u64;

    for edge in (&graph.dag).edge_references() {
        let forward_labels = forward.labels_at(edge.source());
        let backward_labels = backward.labels_at(edge.target());
        if forward_labels.is_empty() || backward_labels.is_empty() {
            continue;
        }
        let weight = edge.weight();

        for (f, b) in forward_labels.iter().cartesian_product(backward_labels) {
            pairs += 1;
            let cost = f.cost() + weight.cost() + b.cost();
            let len = f.path().len() + b.path().len();
            if !incumbent.admits(cost, len) {
                continue;
            }
            if cycles.elementary && b.path().iter().any(|n| f.visits(*n)) {
                continue;
            }
            if cycles.two_cycle_elimination
                && (f.predecessor() == Some(edge.target()) || b.predecessor() == Some(edge.source()))
            {
                continue;
            }

            let mut path = Vec::with_capacity(len);
            path.extend_from_slice(f.path());
            path.extend(b.path().iter().rev());
            // the reported totals are summed from the source, so feasibility is too
            let (cost, consumed) = graph.evaluate_path(&path, bounds.n_res())?;
            if !bounds.admits(&consumed) {
                continue;
            }
            offered += 1;
            incumbent.offer(cost, path);
        }
    }

    log::debug!("join checked {pairs} label pairs, {offered} feasible candidates offered");
    Ok(incumbent.into_path())
}
