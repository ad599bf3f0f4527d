//! Fixed-arity resource consumption vectors.

use std::fmt;
use std::ops::Index;

use crate::error::{RcspError, RcspResult};

/// Cumulative consumption of each constrained resource.
///
/// All vectors combined or compared within one search have the same length.
/// Arithmetic returns a new vector; nothing is mutated in place.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ResourceVector(Vec<f64>);

impl ResourceVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// All-zero vector of arity `n_res`
    pub fn zeros(n_res: usize) -> Self {
        Self(vec![0.0; n_res])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> + '_ {
        self.0.iter()
    }

    /// Elementwise sum.
    ///
    /// # Errors
    ///
    /// [`RcspError::DimensionMismatch`] if the arities differ.
    pub fn add(&self, other: &ResourceVector) -> RcspResult<ResourceVector> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Elementwise difference `self - other`.
    ///
    /// # Errors
    ///
    /// [`RcspError::DimensionMismatch`] if the arities differ.
    pub fn subtract(&self, other: &ResourceVector) -> RcspResult<ResourceVector> {
        self.zip_with(other, |a, b| a - b)
    }

    /// Componentwise `self <= other`. Vectors of different arity are incomparable.
    #[must_use]
    pub fn leq(&self, other: &ResourceVector) -> bool {
        self.len() == other.len() && self.0.iter().zip(&other.0).all(|(a, b)| a <= b)
    }

    /// Componentwise `self >= other`. Vectors of different arity are incomparable.
    #[must_use]
    pub fn geq(&self, other: &ResourceVector) -> bool {
        other.leq(self)
    }

    /// True if every component lies inside `[min, max]`.
    #[must_use]
    pub fn within(&self, min: &ResourceVector, max: &ResourceVector) -> bool {
        min.leq(self) && self.leq(max)
    }

    /// Checks that the arity equals `expected`.
    ///
    /// # Errors
    ///
    /// [`RcspError::DimensionMismatch`] otherwise.
    pub fn expect_len(&self, expected: usize) -> RcspResult<()> {
        if self.len() == expected {
            Ok(())
        } else {
            Err(RcspError::DimensionMismatch { expected, found: self.len() })
        }
    }

    fn zip_with(&self, other: &ResourceVector, op: impl Fn(f64, f64) -> f64) -> RcspResult<ResourceVector> {
        other.expect_len(self.len())?;
        Ok(Self(self.0.iter().zip(&other.0).map(|(a, b)| op(*a, *b)).collect()))
    }
}

impl From<Vec<f64>> for ResourceVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl<const N: usize> From<[f64; N]> for ResourceVector {
    fn from(values: [f64; N]) -> Self {
        Self(values.to_vec())
    }
}

impl Index<usize> for ResourceVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl fmt::Display for ResourceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str("]")
    }
}
