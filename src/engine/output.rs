//! Output types of LWPR predictions.
//!
//! ## Purpose
//!
//! This module defines the containers returned by the model's prediction
//! entry points. All values are in the caller's (unnormalized) units.
//!
//! ## Key concepts
//!
//! * **Confidence**: weighted standard error of the blended prediction,
//!   built from each field's noise variance and the spread of the local
//!   predictions around the blend.
//! * **Max activation**: the largest activation of any field at the query,
//!   a measure of how well the input space around it is covered.
//! * **Jacobian**: `n_out * n_in` row-major matrix of `∂y_o / ∂x_i`.
//!
//! ## Invariants
//!
//! * Every vector has one entry per output dimension (`n_out * n_in` for
//!   the Jacobian).
//! * Confidence values are never negative.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use core::fmt::{Display, Formatter, Result};
use num_traits::Float;

// ============================================================================
// Prediction
// ============================================================================

/// Prediction together with its confidence bound and coverage diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction<T> {
    /// Blended prediction per output.
    pub values: Vec<T>,

    /// Confidence bound per output (zero where no field reached the cutoff).
    pub confidence: Vec<T>,

    /// Largest field activation per output.
    pub max_activation: Vec<T>,
}

impl<T: Float> Prediction<T> {
    /// Number of output dimensions.
    #[inline]
    pub fn n_out(&self) -> usize {
        self.values.len()
    }

    /// Whether any field of output `dim` activates for the query.
    ///
    /// Returns `false` for an out-of-range `dim`.
    pub fn is_covered(&self, dim: usize) -> bool {
        self.max_activation
            .get(dim)
            .is_some_and(|&w| w > T::zero())
    }
}

impl<T: Float + Display> Display for Prediction<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "{:>6} {:>14} {:>14} {:>10}", "Output", "Value", "Confidence", "Max w")?;
        for (o, ((v, c), w)) in self
            .values
            .iter()
            .zip(&self.confidence)
            .zip(&self.max_activation)
            .enumerate()
        {
            writeln!(f, "{:>6} {:>14.6} {:>14.6} {:>10.4}", o, v, c, w)?;
        }
        Ok(())
    }
}

// ============================================================================
// Jacobian
// ============================================================================

/// Prediction together with its derivative with respect to the input.
#[derive(Debug, Clone, PartialEq)]
pub struct JacobianOutput<T> {
    /// Blended prediction per output.
    pub values: Vec<T>,

    /// Row-major `n_out * n_in` Jacobian.
    pub jacobian: Vec<T>,

    /// Input dimensionality (row length of `jacobian`).
    pub n_in: usize,
}

impl<T: Float> JacobianOutput<T> {
    /// Gradient of output `dim`, or `None` if `dim` is out of range.
    pub fn gradient(&self, dim: usize) -> Option<&[T]> {
        let start = dim.checked_mul(self.n_in)?;
        self.jacobian.get(start..start + self.n_in)
    }

    /// Single entry `∂y_out / ∂x_input`.
    pub fn get(&self, out: usize, input: usize) -> Option<T> {
        if input >= self.n_in {
            return None;
        }
        self.jacobian.get(out * self.n_in + input).copied()
    }
}
