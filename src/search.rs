//! Single-direction label-setting search.

use std::cmp::Ordering;
use std::time::Instant;

use binary_heap_plus::BinaryHeap;
use petgraph::prelude::NodeIndex;
use petgraph::visit::NodeIndexable;
use typed_arena::Arena;

use crate::config::{ResourceBounds, SearchConfig};
use crate::error::{RcspError, RcspResult};
use crate::frontier::{DominanceRule, Frontier, Insertion, StoredLabel};
use crate::graph::{EdgeAttributes, ProblemGraph};
use crate::label::{CycleRule, Direction, Label};
use crate::solution::Incumbent;

/// Iteration cap and deadline shared by the searches of one solve.
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchBudget {
    max_iterations: Option<u64>,
    deadline: Option<Instant>,
}

impl SearchBudget {
    pub fn new(max_iterations: Option<u64>, deadline: Option<Instant>) -> Self {
        Self { max_iterations, deadline }
    }

    /// Starts the clock for the limits in `config`
    #[must_use]
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            deadline: config.time_limit.map(|limit| Instant::now() + limit),
        }
    }

    #[must_use]
    pub fn exhausted(&self, iterations: u64) -> bool {
        self.max_iterations.is_some_and(|max| iterations >= max)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Counters of one directional search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Labels popped and processed.
    pub iterations: u64,
    /// Labels stored in a frontier, the origin included.
    pub labels_created: u64,
    /// Extensions discarded plus stored labels evicted later.
    pub labels_pruned: u64,
}

/// Why a directional search stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// Priority queue ran empty.
    Exhausted,
    /// A complete path below the threshold was stored.
    Threshold,
    /// Iteration cap or deadline hit.
    Budget,
}

/// Frontiers left behind by a finished search.
#[derive(Clone, Debug)]
pub struct DirectionOutcome {
    pub direction: Direction,
    pub termination: Termination,
    pub stats: SearchStats,
    labels_at: Vec<Vec<Label>>,
}

impl DirectionOutcome {
    /// Non-dominated labels at `node`, cheapest first
    #[must_use]
    pub fn labels_at(&self, node: NodeIndex) -> &[Label] {
        self.labels_at.get(node.index()).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn label_count(&self) -> usize {
        self.labels_at.iter().map(Vec::len).sum()
    }

    /// Best complete path among the labels stored at `target`, oriented source
    /// to sink. Candidates are re-summed from the source and must fit the window.
    ///
    /// # Errors
    ///
    /// - [`RcspError::DimensionMismatch`] if an edge has the wrong arity
    /// - [`RcspError::InvalidGraph`] if a label path does not follow `graph`
    pub fn best_complete_path<NodeWeight, EdgeWeight: EdgeAttributes>(
        &self,
        graph: &ProblemGraph<NodeWeight, EdgeWeight>,
        target: NodeIndex,
        bounds: &ResourceBounds,
    ) -> RcspResult<Option<Vec<NodeIndex>>> {
        let mut incumbent = Incumbent::default();
        for label in self.labels_at(target) {
            if !incumbent.admits(label.cost(), label.path().len()) {
                continue;
            }
            let mut path = label.path().to_vec();
            if self.direction == Direction::Backward {
                path.reverse();
            }
            let (cost, consumed) = graph.evaluate_path(&path, bounds.n_res())?;
            if bounds.admits(&consumed) {
                incumbent.offer(cost, path);
            }
        }
        Ok(incumbent.into_path())
    }
}

/// Label-setting search in one direction over a problem graph.
pub struct LabelSetting<'g, NodeWeight, EdgeWeight: EdgeAttributes> {
    graph: &'g ProblemGraph<NodeWeight, EdgeWeight>,
    bounds: &'g ResourceBounds,
    direction: Direction,
    cycles: CycleRule,
    threshold: Option<f64>,
    midpoint: Option<(usize, f64)>,
    budget: SearchBudget,
}

impl<'g, NodeWeight, EdgeWeight: EdgeAttributes> LabelSetting<'g, NodeWeight, EdgeWeight> {
    pub fn new(
        graph: &'g ProblemGraph<NodeWeight, EdgeWeight>,
        bounds: &'g ResourceBounds,
        direction: Direction,
        config: &SearchConfig,
        budget: SearchBudget,
    ) -> Self {
        Self {
            graph,
            bounds,
            direction,
            cycles: CycleRule::from_config(config),
            threshold: config.threshold,
            midpoint: None,
            budget,
        }
    }

    /// Stop extending labels whose resource `critical` passed the middle of its window.
    /// Without such a resource the search runs to exhaustion.
    #[must_use]
    pub fn with_midpoint(mut self, critical: usize) -> Self {
        self.midpoint = self.bounds.midpoint(critical).map(|mid| (critical, mid));
        self
    }

    /// Node the search starts from
    #[must_use]
    pub fn origin(&self) -> NodeIndex {
        match self.direction {
            Direction::Forward => self.graph.start,
            Direction::Backward => self.graph.end,
        }
    }

    /// Node at which labels represent complete paths
    #[must_use]
    pub fn target(&self) -> NodeIndex {
        match self.direction {
            Direction::Forward => self.graph.end,
            Direction::Backward => self.graph.start,
        }
    }

    fn extendable(&self, label: &Label) -> bool {
        if label.node() == self.target() {
            return false;
        }
        match self.midpoint {
            Some((critical, mid)) => self.direction.short_of_midpoint(label.resources()[critical], mid),
            None => true,
        }
    }

    fn beats_threshold(&self, label: &Label) -> bool {
        let Some(threshold) = self.threshold else {
            return false;
        };
        label.node() == self.target()
            && label.cost() < threshold
            && self
                .direction
                .consumed(label.resources(), self.bounds)
                .is_ok_and(|consumed| self.bounds.admits(&consumed))
    }

    /// Runs the search until the queue is empty, the threshold is beaten or
    /// the budget runs out.
    ///
    /// # Errors
    ///
    /// - [`RcspError::InfeasibleBounds`] if the origin label violates the bounds
    /// - [`RcspError::DimensionMismatch`] if an edge has the wrong arity
    pub fn run(&self) -> RcspResult<DirectionOutcome> {
        let dag = &self.graph.dag;
        let direction = self.direction;
        let rule = DominanceRule { direction, cycles: self.cycles };

        let origin_resources = direction.origin_resources(self.bounds);
        if !direction.within_bound(&origin_resources, self.bounds) {
            return Err(RcspError::InfeasibleBounds(format!(
                "{direction} origin resources {origin_resources} outside bounds"
            )));
        }

        let arena = Arena::new();
        let mut labels_at: Vec<Frontier> = (0..dag.node_bound()).map(|_| Frontier::new()).collect();

        let mut unprocessed_labels = BinaryHeap::with_capacity_by(4096, |a: &&StoredLabel, b: &&StoredLabel| {
            // keep labels with small cost at front, earlier arrivals first on ties
            match b.label().cost().total_cmp(&a.label().cost()) {
                Ordering::Equal => b.seq().cmp(&a.seq()),
                unequal => unequal,
            }
        });

        let mut stats = SearchStats::default();
        let mut seq = 0;
        let origin = self.origin();
        if let Insertion::Stored { label, .. } =
            labels_at[origin.index()].insert(&arena, Label::origin(origin, origin_resources), seq, rule)
        {
            stats.labels_created += 1;
            unprocessed_labels.push(label);
        }

        log::debug!("{direction} labeling from node {} started", origin.index());

        let mut termination = Termination::Exhausted;
        'main: while let Some(process) = unprocessed_labels.pop() {
            if process.is_dominated() {
                continue;
            }
            if self.budget.exhausted(stats.iterations) {
                log::debug!("{direction} labeling limit reached: {} iterations", stats.iterations);
                termination = Termination::Budget;
                break;
            }
            stats.iterations += 1;

            let current = process.label();
            if !self.extendable(current) {
                continue;
            }

            for edge in dag.edges_directed(current.node(), direction.edge_direction()) {
                let next = direction.far_end(&edge);
                let weight = edge.weight();

                let child = match current.extend(direction, weight.cost(), next, weight.resources(), self.cycles) {
                    Ok(child) => child,
                    Err(RcspError::ElementaryViolation { .. }) => {
                        stats.labels_pruned += 1;
                        continue;
                    }
                    Err(err) => return Err(err),
                };
                if !direction.within_bound(child.resources(), self.bounds) {
                    stats.labels_pruned += 1;
                    continue;
                }

                seq += 1;
                match labels_at[next.index()].insert(&arena, child, seq, rule) {
                    Insertion::Rejected => stats.labels_pruned += 1,
                    Insertion::Stored { label, evicted } => {
                        log::trace!("{direction} stored {} evicting {evicted}", label.label());
                        stats.labels_created += 1;
                        stats.labels_pruned += evicted as u64;
                        if self.beats_threshold(label.label()) {
                            termination = Termination::Threshold;
                            break 'main;
                        }
                        unprocessed_labels.push(label);
                    }
                }
            }
        }

        log::debug!(
            "{direction} labeling finished ({termination:?}): {} iterations, {} labels created, {} pruned",
            stats.iterations,
            stats.labels_created,
            stats.labels_pruned
        );

        Ok(DirectionOutcome {
            direction,
            termination,
            stats,
            labels_at: labels_at.iter().map(Frontier::snapshot).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use petgraph::prelude::NodeIndex;

    use super::*;
    use crate::graph::{GraphType, ResourceEdge};
    use crate::resources::ResourceVector;

    /// s -> a -> t and s -> b -> t; the cheap route is long, the short route is expensive.
    fn diamond() -> ProblemGraph<&'static str, ResourceEdge> {
        let mut dag = GraphType::default();
        let s = dag.add_node("s");
        let a = dag.add_node("a");
        let b = dag.add_node("b");
        let t = dag.add_node("t");
        dag.add_edge(s, a, ResourceEdge::new(1.0, [3.0]));
        dag.add_edge(a, t, ResourceEdge::new(1.0, [3.0]));
        dag.add_edge(s, b, ResourceEdge::new(4.0, [1.0]));
        dag.add_edge(b, t, ResourceEdge::new(4.0, [1.0]));
        ProblemGraph::new(dag, s, t)
    }

    fn costs(labels: &[Label]) -> Vec<f64> {
        labels.iter().map(Label::cost).collect()
    }

    #[test]
    fn forward_keeps_pareto_labels_at_sink() {
        let g = diamond();
        let bounds = ResourceBounds::new([10.0], [0.0]).unwrap();
        let search = LabelSetting::new(&g, &bounds, Direction::Forward, &SearchConfig::default(), SearchBudget::default());
        let outcome = search.run().unwrap();

        assert_eq!(outcome.termination, Termination::Exhausted);
        assert_eq!(costs(outcome.labels_at(g.end)), vec![2.0, 8.0]);
        assert_eq!(outcome.labels_at(g.end)[0].resources(), &ResourceVector::from([6.0]));
        assert_eq!(outcome.stats.labels_created, 5);
    }

    #[test]
    fn forward_prunes_labels_over_max() {
        let g = diamond();
        let bounds = ResourceBounds::new([5.0], [0.0]).unwrap();
        let search = LabelSetting::new(&g, &bounds, Direction::Forward, &SearchConfig::default(), SearchBudget::default());
        let outcome = search.run().unwrap();

        assert_eq!(costs(outcome.labels_at(g.end)), vec![8.0]);
        assert_eq!(outcome.stats.labels_pruned, 1);
    }

    #[test]
    fn backward_tracks_remaining_budget() {
        let g = diamond();
        let bounds = ResourceBounds::new([10.0], [0.0]).unwrap();
        let search = LabelSetting::new(&g, &bounds, Direction::Backward, &SearchConfig::default(), SearchBudget::default());
        let outcome = search.run().unwrap();

        let at_source = outcome.labels_at(g.start);
        assert_eq!(costs(at_source), vec![2.0, 8.0]);
        assert_eq!(at_source[0].resources(), &ResourceVector::from([4.0]));
        assert_eq!(at_source[1].resources(), &ResourceVector::from([8.0]));
        assert_eq!(at_source[0].path(), &[g.end, NodeIndex::new(1), g.start]);
    }

    #[test]
    fn midpoint_stops_extension_but_keeps_labels() {
        let g = diamond();
        let bounds = ResourceBounds::new([4.0], [0.0]).unwrap();
        let search = LabelSetting::new(&g, &bounds, Direction::Forward, &SearchConfig::default(), SearchBudget::default())
            .with_midpoint(0);
        let outcome = search.run().unwrap();

        // a is reached with 3 > 2 and not extended further; b with 1 is extended
        assert_eq!(outcome.labels_at(NodeIndex::new(1)).len(), 1);
        assert_eq!(costs(outcome.labels_at(g.end)), vec![8.0]);
    }

    #[test]
    fn budget_stops_search() {
        let g = diamond();
        let bounds = ResourceBounds::new([10.0], [0.0]).unwrap();
        let search = LabelSetting::new(&g, &bounds, Direction::Forward, &SearchConfig::default(), SearchBudget::new(Some(1), None));
        let outcome = search.run().unwrap();

        assert_eq!(outcome.termination, Termination::Budget);
        assert_eq!(outcome.stats.iterations, 1);
        assert!(outcome.labels_at(g.end).is_empty());
    }

    #[test]
    fn threshold_exits_on_first_cheap_path() {
        let g = diamond();
        let bounds = ResourceBounds::new([10.0], [0.0]).unwrap();
        let config = SearchConfig::default().threshold(5.0);
        let search = LabelSetting::new(&g, &bounds, Direction::Forward, &config, SearchBudget::default());
        let outcome = search.run().unwrap();

        assert_eq!(outcome.termination, Termination::Threshold);
        assert_eq!(costs(outcome.labels_at(g.end)), vec![2.0]);
    }

    #[test]
    fn elementary_mode_blocks_cycles() {
        let mut dag = GraphType::default();
        let s = dag.add_node("s");
        let a = dag.add_node("a");
        let t = dag.add_node("t");
        dag.add_edge(s, a, ResourceEdge::new(1.0, [1.0]));
        dag.add_edge(a, s, ResourceEdge::new(-5.0, [1.0]));
        dag.add_edge(a, t, ResourceEdge::new(1.0, [1.0]));
        let g = ProblemGraph::new(dag, s, t);
        let bounds = ResourceBounds::new([6.0], [0.0]).unwrap();

        let strict = LabelSetting::new(&g, &bounds, Direction::Forward, &SearchConfig::default(), SearchBudget::default())
            .run()
            .unwrap();
        assert_eq!(costs(strict.labels_at(t)), vec![2.0]);

        let relaxed_config = SearchConfig::default().elementary(false);
        let relaxed = LabelSetting::new(&g, &bounds, Direction::Forward, &relaxed_config, SearchBudget::default())
            .run()
            .unwrap();
        let best = &relaxed.labels_at(t)[0];
        // s a s a s a t, stopped by the resource bound
        assert_eq!(best.cost(), -6.0);
        assert_eq!(best.path().len(), 7);
    }

    #[test]
    fn elementary_tie_keeps_route_that_can_still_turn_back() {
        // s=0, a=1, b=2, x=3, t=4; s a x and s b x meet x in the same state,
        // only the route through b may continue to a
        let mut dag = GraphType::default();
        let s = dag.add_node("s");
        let a = dag.add_node("a");
        let b = dag.add_node("b");
        let x = dag.add_node("x");
        let t = dag.add_node("t");
        dag.add_edge(s, a, ResourceEdge::new(0.0, [1.0]));
        dag.add_edge(a, x, ResourceEdge::new(1.0, [1.0]));
        dag.add_edge(s, b, ResourceEdge::new(1.0, [1.0]));
        dag.add_edge(b, x, ResourceEdge::new(0.0, [1.0]));
        dag.add_edge(x, a, ResourceEdge::new(-5.0, [1.0]));
        dag.add_edge(a, t, ResourceEdge::new(0.0, [1.0]));
        let g = ProblemGraph::new(dag, s, t);
        let bounds = ResourceBounds::new([10.0], [0.0]).unwrap();

        for direction in [Direction::Forward, Direction::Backward] {
            let search = LabelSetting::new(&g, &bounds, direction, &SearchConfig::default(), SearchBudget::default());
            let outcome = search.run().unwrap();
            let path = outcome.best_complete_path(&g, search.target(), &bounds).unwrap();
            assert_eq!(path, Some(vec![s, b, x, a, t]), "{direction}");
        }
    }

    #[test]
    fn two_cycle_elimination_blocks_only_immediate_returns() {
        // s=0, a=1, c=2, t=3; a <-> c is a cheap two-cycle, a -> c -> s -> a a longer one.
        // five edges at most
        let mut dag = GraphType::default();
        let s = dag.add_node("s");
        let a = dag.add_node("a");
        let c = dag.add_node("c");
        let t = dag.add_node("t");
        dag.add_edge(s, a, ResourceEdge::new(1.0, [1.0]));
        dag.add_edge(a, c, ResourceEdge::new(-2.0, [1.0]));
        dag.add_edge(c, a, ResourceEdge::new(-2.0, [1.0]));
        dag.add_edge(c, s, ResourceEdge::new(0.0, [1.0]));
        dag.add_edge(a, t, ResourceEdge::new(1.0, [1.0]));
        let g = ProblemGraph::new(dag, s, t);
        let bounds = ResourceBounds::new([5.0], [0.0]).unwrap();
        let best = |config: SearchConfig| {
            let search = LabelSetting::new(&g, &bounds, Direction::Forward, &config, SearchBudget::default());
            let outcome = search.run().unwrap();
            outcome.best_complete_path(&g, search.target(), &bounds).unwrap().unwrap()
        };

        let relaxed = best(SearchConfig::default().elementary(false));
        assert_eq!(relaxed, vec![s, a, c, a, t]);

        let two_cycle = best(SearchConfig::default().elementary(false).two_cycle_elimination(true));
        assert_eq!(two_cycle, vec![s, a, c, s, a, t]);

        let elementary = best(SearchConfig::default());
        assert_eq!(elementary, vec![s, a, t]);
    }
}
