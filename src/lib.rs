//! Resource constrained shortest path solver based on dominance labeling.
//!
//! A [`RcspSolver`] owns a [`ProblemGraph`] whose edges carry a cost and a
//! resource consumption vector, together with the `[min_res, max_res]` window
//! every complete path must respect. [`RcspSolver::solve`] runs a forward,
//! backward or bidirectional label-setting search and returns the cheapest
//! feasible source-to-sink path, optionally restricted to elementary paths.
//!
//! ```
//! use rcsp_labeling::{GraphType, ProblemGraph, RcspSolver, ResourceBounds, ResourceEdge};
//!
//! let mut dag = GraphType::default();
//! let s = dag.add_node("s");
//! let a = dag.add_node("a");
//! let t = dag.add_node("t");
//! dag.add_edge(s, a, ResourceEdge::new(1.0, [1.0]));
//! dag.add_edge(a, t, ResourceEdge::new(1.0, [1.0]));
//! dag.add_edge(s, t, ResourceEdge::new(5.0, [1.0]));
//!
//! let bounds = ResourceBounds::new([2.0], [0.0]).unwrap();
//! let solver = RcspSolver::new(ProblemGraph::new(dag, s, t), bounds).unwrap();
//! let solution = solver.solve().unwrap();
//! assert_eq!(solution.path, vec![s, a, t]);
//! assert_eq!(solution.total_cost, 2.0);
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::float_cmp)]

pub mod bidirectional;
pub mod config;
pub mod error;
pub mod frontier;
pub mod graph;
pub mod label;
pub mod resources;
pub mod search;
pub mod solution;
pub mod tabu;

use petgraph::prelude::NodeIndex;

pub use crate::bidirectional::BidirectionalSearch;
pub use crate::config::{ResourceBounds, SearchConfig, SearchMode};
pub use crate::error::{RcspError, RcspResult};
pub use crate::graph::{EdgeAttributes, GraphType, ProblemGraph, ResourceEdge};
pub use crate::label::{CycleRule, Direction, Label, StateKey};
pub use crate::resources::ResourceVector;
pub use crate::search::{LabelSetting, SearchBudget, SearchStats};
pub use crate::solution::Solution;
pub use crate::tabu::{repair_cycles, Tabu};

/// The solver structure holding the graph, its resource window and the search configuration
pub struct RcspSolver<NodeWeight, EdgeWeight: EdgeAttributes> {
    graph: ProblemGraph<NodeWeight, EdgeWeight>,
    bounds: ResourceBounds,
    config: SearchConfig,
}

impl<NodeWeight, EdgeWeight> RcspSolver<NodeWeight, EdgeWeight>
where
    NodeWeight: Sync,
    EdgeWeight: EdgeAttributes + Sync,
{
    /// Validates the graph against the bounds and builds a solver with the default configuration.
    /// The configuration is checked against the bounds on every solve.
    ///
    /// # Errors
    ///
    /// See [`ProblemGraph::validate`].
    pub fn new(graph: ProblemGraph<NodeWeight, EdgeWeight>, bounds: ResourceBounds) -> RcspResult<Self> {
        graph.validate(bounds.n_res())?;
        Ok(Self {
            graph,
            bounds,
            config: SearchConfig::default(),
        })
    }

    /// Replaces the search configuration.
    ///
    /// # Errors
    ///
    /// See [`SearchConfig::validate`].
    pub fn with_config(mut self, config: SearchConfig) -> RcspResult<Self> {
        config.validate(&self.bounds)?;
        self.config = config;
        Ok(self)
    }

    /// Returns reference to stored problem graph
    pub fn get_graph(&self) -> &ProblemGraph<NodeWeight, EdgeWeight> {
        &self.graph
    }

    /// Returns mutable reference to stored problem graph.
    /// The graph is validated again on every solve.
    pub fn get_graph_mut(&mut self) -> &mut ProblemGraph<NodeWeight, EdgeWeight> {
        &mut self.graph
    }

    pub fn get_bounds(&self) -> &ResourceBounds {
        &self.bounds
    }

    pub fn get_config(&self) -> &SearchConfig {
        &self.config
    }

    /// Primary function of solver. Finds the cheapest feasible path in the configured mode.
    ///
    /// # Errors
    ///
    /// - [`RcspError::NoFeasiblePath`] if no path fits the resource window
    /// - [`RcspError::DeadlineExceeded`] if a cap stopped the search before any path was found
    /// - [`RcspError::DimensionMismatch`] or [`RcspError::InvalidGraph`] if the graph was
    ///   modified into an invalid state, or the configuration does not fit the bounds
    pub fn solve(&self) -> RcspResult<Solution> {
        self.graph.validate(self.bounds.n_res())?;
        self.config.validate(&self.bounds)?;
        if self.graph.start == self.graph.end {
            return self.trivial();
        }

        let budget = SearchBudget::from_config(&self.config);
        log::debug!(
            "solving {:?} search, elementary={}, {} nodes, {} edges",
            self.config.mode,
            self.config.elementary,
            self.graph.dag.node_count(),
            self.graph.dag.edge_count()
        );

        match self.config.mode {
            SearchMode::Bidirectional => BidirectionalSearch::new(&self.graph, &self.bounds, &self.config, budget).run(),
            SearchMode::Forward => self.solve_unidirectional(Direction::Forward, budget),
            SearchMode::Backward => self.solve_unidirectional(Direction::Backward, budget),
        }
    }

    /// Tabu-list construction of an elementary path. Fast, but not exact.
    ///
    /// # Errors
    ///
    /// See [`Tabu::run`].
    pub fn solve_tabu(&self) -> RcspResult<Solution> {
        self.graph.validate(self.bounds.n_res())?;
        if self.graph.start == self.graph.end {
            return self.trivial();
        }
        Tabu::new(&self.graph, &self.bounds, SearchBudget::from_config(&self.config)).run()
    }

    /// Removes cycles from `path`, e.g. one returned by a non-elementary solve.
    ///
    /// # Errors
    ///
    /// See [`ProblemGraph::validate`] and [`repair_cycles`].
    pub fn repair(&self, path: &[NodeIndex]) -> RcspResult<Solution> {
        self.graph.validate(self.bounds.n_res())?;
        repair_cycles(&self.graph, &self.bounds, path)
    }

    fn solve_unidirectional(&self, direction: Direction, budget: SearchBudget) -> RcspResult<Solution> {
        let search = LabelSetting::new(&self.graph, &self.bounds, direction, &self.config, budget);
        let outcome = search.run()?;
        let (forward_stats, backward_stats) = match direction {
            Direction::Forward => (Some(outcome.stats), None),
            Direction::Backward => (None, Some(outcome.stats)),
        };

        match outcome.best_complete_path(&self.graph, search.target(), &self.bounds)? {
            Some(path) => {
                let complete = outcome.termination == search::Termination::Exhausted;
                Ok(Solution::evaluate(&self.graph, &self.bounds, path, complete)?
                    .with_stats(forward_stats, backward_stats))
            }
            None if outcome.termination == search::Termination::Budget => Err(RcspError::DeadlineExceeded {
                iterations: outcome.stats.iterations,
            }),
            None => Err(RcspError::NoFeasiblePath),
        }
    }

    fn trivial(&self) -> RcspResult<Solution> {
        Solution::evaluate(&self.graph, &self.bounds, vec![self.graph.start], true)
    }
}
