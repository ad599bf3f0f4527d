//! Partial-path labels, their dominance relation and the extension operator.

use std::fmt;

use petgraph::graph::NodeIndex;
use petgraph::stable_graph::EdgeReference;
use petgraph::visit::EdgeRef;

use crate::config::{ResourceBounds, SearchConfig};
use crate::error::{RcspError, RcspResult};
use crate::resources::ResourceVector;

/// Search direction. Chosen once per search and passed explicitly to
/// extension and dominance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// From the source, resources accumulate by addition.
    Forward,
    /// From the sink, resources hold the remaining budget and shrink by subtraction.
    Backward,
}

impl Direction {
    /// petgraph direction of the edges a label at a node is extended along
    #[must_use]
    pub fn edge_direction(self) -> petgraph::Direction {
        match self {
            Direction::Forward => petgraph::Direction::Outgoing,
            Direction::Backward => petgraph::Direction::Incoming,
        }
    }

    /// Endpoint of `edge` a label moves to when extended along it
    #[must_use]
    pub fn far_end<E>(self, edge: &EdgeReference<'_, E>) -> NodeIndex {
        match self {
            Direction::Forward => edge.target(),
            Direction::Backward => edge.source(),
        }
    }

    /// Midpoint rule: a label is only extended while its critical resource
    /// has not passed `midpoint` in this direction.
    #[must_use]
    pub fn short_of_midpoint(self, value: f64, midpoint: f64) -> bool {
        match self {
            Direction::Forward => value <= midpoint,
            Direction::Backward => value >= midpoint,
        }
    }

    /// Resources carried by the origin label.
    ///
    /// Forward labels start empty. Backward labels start with the full budget
    /// `max_res` and subtract what each edge consumes.
    #[must_use]
    pub fn origin_resources(self, bounds: &ResourceBounds) -> ResourceVector {
        match self {
            Direction::Forward => ResourceVector::zeros(bounds.n_res()),
            Direction::Backward => bounds.max_res().clone(),
        }
    }

    /// Combines cumulative resources with one edge's consumption.
    ///
    /// # Errors
    ///
    /// [`RcspError::DimensionMismatch`] if the arities differ.
    pub fn accumulate(self, current: &ResourceVector, edge: &ResourceVector) -> RcspResult<ResourceVector> {
        match self {
            Direction::Forward => current.add(edge),
            Direction::Backward => current.subtract(edge),
        }
    }

    /// `a` is no worse than `b` on every resource.
    #[must_use]
    pub fn no_worse(self, a: &ResourceVector, b: &ResourceVector) -> bool {
        match self {
            Direction::Forward => a.leq(b),
            Direction::Backward => a.geq(b),
        }
    }

    /// Per-extension bound check: forward labels must stay below `max_res`,
    /// backward labels must keep at least `min_res` of budget.
    #[must_use]
    pub fn within_bound(self, resources: &ResourceVector, bounds: &ResourceBounds) -> bool {
        match self {
            Direction::Forward => resources.leq(bounds.max_res()),
            Direction::Backward => resources.geq(bounds.min_res()),
        }
    }

    /// Resources consumed along the path represented by `resources`.
    ///
    /// # Errors
    ///
    /// [`RcspError::DimensionMismatch`] if the arities differ.
    pub fn consumed(self, resources: &ResourceVector, bounds: &ResourceBounds) -> RcspResult<ResourceVector> {
        match self {
            Direction::Forward => Ok(resources.clone()),
            Direction::Backward => bounds.max_res().subtract(resources),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Backward => f.write_str("backward"),
        }
    }
}

/// Which revisits an extension may make, and what dominance must respect because of it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleRule {
    /// No node twice on a path.
    pub elementary: bool,
    /// No immediate return `u -> v -> u`.
    pub two_cycle_elimination: bool,
}

impl CycleRule {
    pub const RELAXED: CycleRule = CycleRule { elementary: false, two_cycle_elimination: false };
    pub const ELEMENTARY: CycleRule = CycleRule { elementary: true, two_cycle_elimination: false };
    pub const TWO_CYCLE: CycleRule = CycleRule { elementary: false, two_cycle_elimination: true };

    #[must_use]
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            elementary: config.elementary,
            two_cycle_elimination: config.two_cycle_elimination,
        }
    }

    /// Moving from `label` to `next` would make a forbidden revisit
    #[must_use]
    pub fn forbids(self, label: &Label, next: NodeIndex) -> bool {
        (self.elementary && label.visits(next)) || (self.two_cycle_elimination && label.predecessor() == Some(next))
    }

    /// Every continuation open to `b` is also open to `a`.
    ///
    /// Elementary mode needs `a`'s visited set inside `b`'s. Two-cycle
    /// elimination needs `a` to come from the same node as `b`, or from nowhere.
    #[must_use]
    pub fn leaves_open(self, a: &Label, b: &Label) -> bool {
        (!self.elementary || a.visited_subset_of(b))
            && (!self.two_cycle_elimination || a.predecessor().is_none() || a.predecessor() == b.predecessor())
    }
}

/// One partial path from the search origin to `node`.
///
/// Immutable once built; [`Label::extend`] always produces a new label.
/// The path is owned, so every label stays a complete witness of how it was
/// reached without referring back to its parent.
#[derive(Clone, Debug)]
pub struct Label {
    cost: f64,
    node: NodeIndex,
    resources: ResourceVector,
    path: Vec<NodeIndex>,
}

impl Label {
    /// Root label at `origin`
    pub fn origin(origin: NodeIndex, resources: ResourceVector) -> Self {
        Self {
            cost: 0.0,
            node: origin,
            resources,
            path: vec![origin],
        }
    }

    /// Label constructor. `path` must end with `node`.
    pub fn new(cost: f64, node: NodeIndex, resources: ResourceVector, path: Vec<NodeIndex>) -> Self {
        debug_assert_eq!(path.last(), Some(&node));
        Self { cost, node, resources, path }
    }

    #[must_use]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    #[must_use]
    pub fn node(&self) -> NodeIndex {
        self.node
    }

    #[must_use]
    pub fn resources(&self) -> &ResourceVector {
        &self.resources
    }

    /// Visited nodes in the order the search reached them, origin first.
    #[must_use]
    pub fn path(&self) -> &[NodeIndex] {
        &self.path
    }

    #[must_use]
    pub fn visits(&self, node: NodeIndex) -> bool {
        self.path.contains(&node)
    }

    /// Node visited right before `node`; `None` for an origin label
    #[must_use]
    pub fn predecessor(&self) -> Option<NodeIndex> {
        self.path.len().checked_sub(2).map(|i| self.path[i])
    }

    /// Every node on this label's path also lies on `other`'s path.
    #[must_use]
    pub fn visited_subset_of(&self, other: &Label) -> bool {
        self.path.iter().all(|n| other.path.contains(n))
    }

    /// Child label reached by traversing one edge towards `edge_node`.
    ///
    /// # Errors
    ///
    /// - [`RcspError::ElementaryViolation`] if `cycles` forbids moving to `edge_node`
    /// - [`RcspError::DimensionMismatch`] if `edge_resources` has the wrong arity
    pub fn extend(
        &self,
        direction: Direction,
        edge_cost: f64,
        edge_node: NodeIndex,
        edge_resources: &ResourceVector,
        cycles: CycleRule,
    ) -> RcspResult<Label> {
        if cycles.forbids(self, edge_node) {
            return Err(RcspError::ElementaryViolation { node: edge_node });
        }
        let resources = direction.accumulate(&self.resources, edge_resources)?;
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend_from_slice(&self.path);
        path.push(edge_node);

        Ok(Label {
            cost: self.cost + edge_cost,
            node: edge_node,
            resources,
            path,
        })
    }

    /// Strict dominance between two labels at the same node: cheaper, and no
    /// worse on every resource in the sense of `direction`.
    #[must_use]
    pub fn dominates(&self, other: &Label, direction: Direction) -> bool {
        debug_assert_eq!(self.node, other.node, "dominance across nodes is undefined");
        self.cost < other.cost && direction.no_worse(&self.resources, &other.resources)
    }

    /// Deduplication key over `(cost, resources, node)`; the path is ignored.
    #[must_use]
    pub fn state_key(&self) -> StateKey {
        StateKey {
            cost: normalized_bits(self.cost),
            resources: self.resources.iter().map(|r| normalized_bits(*r)).collect(),
            node: self.node,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({},{},{})", self.node.index(), self.cost, self.resources)
    }
}

/// Hashable identity of a label's search state.
///
/// Two labels reaching the same node with the same cost and resources share a
/// key even when their paths differ.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateKey {
    cost: u64,
    resources: Vec<u64>,
    node: NodeIndex,
}

// -0.0 and 0.0 must agree
fn normalized_bits(value: f64) -> u64 {
    (value + 0.0).to_bits()
}
