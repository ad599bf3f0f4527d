//! Error types for the labeling solver.
//!
//! Dominance and bound checks inside the search loop never produce errors,
//! they only decide whether a label is kept. The variants below are what a
//! caller can see as the outcome of a solve.

use petgraph::graph::NodeIndex;
use thiserror::Error;

/// Result type for solver operations
pub type RcspResult<T> = Result<T, RcspError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RcspError {
    /// Resource vector arity does not match the configured number of resources.
    #[error("resource dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// The resource window is empty or already violated at the origin.
    #[error("infeasible resource bounds: {0}")]
    InfeasibleBounds(String),

    /// Extension would revisit a node in elementary mode.
    ///
    /// Only returned by [`crate::Label::extend`]; the search treats it as a discard.
    #[error("node {} already visited on this path", node.index())]
    ElementaryViolation { node: NodeIndex },

    /// The search finished without any path satisfying the resource window.
    #[error("no feasible path between source and sink")]
    NoFeasiblePath,

    /// Iteration cap or time limit hit before any feasible path was found.
    #[error("search aborted after {iterations} iterations without a feasible path")]
    DeadlineExceeded { iterations: u64 },

    /// Graph does not satisfy the adapter contract.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),
}
