//! Resource bounds and search configuration.

use std::time::Duration;

use crate::error::{RcspError, RcspResult};
use crate::resources::ResourceVector;

/// The `[min_res, max_res]` window a complete path must respect.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceBounds {
    max_res: ResourceVector,
    min_res: ResourceVector,
}

impl ResourceBounds {
    /// Validates and builds the window.
    ///
    /// # Errors
    ///
    /// - [`RcspError::DimensionMismatch`] if the two vectors differ in arity
    /// - [`RcspError::InfeasibleBounds`] if some `min_res[i] > max_res[i]` or
    ///   `max_res[i] < 0`, since the empty path at the source would already be infeasible
    pub fn new(max_res: impl Into<ResourceVector>, min_res: impl Into<ResourceVector>) -> RcspResult<Self> {
        let max_res = max_res.into();
        let min_res = min_res.into();
        min_res.expect_len(max_res.len())?;

        for (i, (lo, hi)) in min_res.iter().zip(max_res.iter()).enumerate() {
            if lo > hi {
                return Err(RcspError::InfeasibleBounds(format!(
                    "resource {i}: min {lo} exceeds max {hi}"
                )));
            }
            if *hi < 0.0 {
                return Err(RcspError::InfeasibleBounds(format!(
                    "resource {i}: max {hi} is negative, origin cannot satisfy it"
                )));
            }
        }
        Ok(Self { max_res, min_res })
    }

    #[must_use]
    pub fn n_res(&self) -> usize {
        self.max_res.len()
    }

    #[must_use]
    pub fn max_res(&self) -> &ResourceVector {
        &self.max_res
    }

    #[must_use]
    pub fn min_res(&self) -> &ResourceVector {
        &self.min_res
    }

    /// Midpoint of the window on resource `index`, if that resource exists
    #[must_use]
    pub fn midpoint(&self, index: usize) -> Option<f64> {
        let lo = self.min_res.as_slice().get(index)?;
        let hi = self.max_res.as_slice().get(index)?;
        Some((lo + hi) / 2.0)
    }

    /// `consumed` lies inside the window
    #[must_use]
    pub fn admits(&self, consumed: &ResourceVector) -> bool {
        consumed.within(&self.min_res, &self.max_res)
    }
}

/// Which searches run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Single search from the source; results read at the sink.
    Forward,
    /// Single search from the sink; results read at the source.
    Backward,
    /// Both searches up to the midpoint, then a join.
    #[default]
    Bidirectional,
}

/// Parameters for a labeling run.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Searches to run (default: bidirectional).
    pub mode: SearchMode,

    /// Forbid repeated nodes (default: true).
    pub elementary: bool,

    /// Forbid only immediate returns `u -> v -> u` (default: false).
    /// Cheaper than elementary mode; implied by it.
    pub two_cycle_elimination: bool,

    /// Cap on labels processed, applied to each direction separately.
    pub max_iterations: Option<u64>,

    /// Wall-clock limit, measured from the start of the solve.
    pub time_limit: Option<Duration>,

    /// Early exit: a directional search stops once it stores a feasible
    /// complete path cheaper than this.
    pub threshold: Option<f64>,

    /// Run the two bidirectional searches on the rayon pool (default: true).
    pub parallel: bool,

    /// Resource used by the midpoint rule (default: 0).
    /// Its consumption must be non-negative on every edge.
    pub critical_resource: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Bidirectional,
            elementary: true,
            two_cycle_elimination: false,
            max_iterations: None,
            time_limit: None,
            threshold: None,
            parallel: true,
            critical_resource: 0,
        }
    }
}

impl SearchConfig {
    /// Builder: set search mode.
    #[must_use]
    pub fn mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder: set elementary mode.
    #[must_use]
    pub fn elementary(mut self, elementary: bool) -> Self {
        self.elementary = elementary;
        self
    }

    /// Builder: set two-cycle elimination.
    #[must_use]
    pub fn two_cycle_elimination(mut self, enabled: bool) -> Self {
        self.two_cycle_elimination = enabled;
        self
    }

    /// Builder: set iteration cap.
    #[must_use]
    pub fn max_iterations(mut self, max: u64) -> Self {
        self.max_iterations = Some(max);
        self
    }

    /// Builder: set time limit.
    #[must_use]
    pub fn time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Builder: set early exit threshold.
    #[must_use]
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Builder: run bidirectional directions in parallel or sequentially.
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Builder: set midpoint resource.
    #[must_use]
    pub fn critical_resource(mut self, index: usize) -> Self {
        self.critical_resource = index;
        self
    }

    /// Checks the configuration against the bounds it will run with.
    ///
    /// # Errors
    ///
    /// [`RcspError::DimensionMismatch`] if the bidirectional midpoint rule has
    /// no resource at `critical_resource`.
    pub fn validate(&self, bounds: &ResourceBounds) -> RcspResult<()> {
        if self.mode == SearchMode::Bidirectional && self.critical_resource >= bounds.n_res() {
            return Err(RcspError::DimensionMismatch {
                expected: bounds.n_res(),
                found: self.critical_resource + 1,
            });
        }
        Ok(())
    }
}
