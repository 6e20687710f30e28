//! Running statistics of streamed inputs.
//!
//! ## Purpose
//!
//! This module tracks the mean and variance of a vector-valued stream without
//! storing samples. Two flavours are provided: a plain running estimate used
//! by the model for its global input statistics, and a weighted estimate with
//! fading memory used by every receptive field.
//!
//! ## Key concepts
//!
//! * **Running**: `mean_{n+1} = (n * mean_n + x) / (n + 1)`, the variance is
//!   updated against the new mean.
//! * **Weighted**: the previous estimate carries a prior weight (the field's
//!   decayed weight sum) and the new sample carries its activation.
//!
//! ## Invariants
//!
//! * Variances are never negative.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Running Statistics
// ============================================================================

/// Unweighted running mean and variance of a vector stream.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunningStats<T> {
    mean: Vec<T>,
    var: Vec<T>,
    count: usize,
}

impl<T: Float> RunningStats<T> {
    /// Empty statistics for `dim`-dimensional samples.
    pub fn new(dim: usize) -> Self {
        Self {
            mean: vec![T::zero(); dim],
            var: vec![T::zero(); dim],
            count: 0,
        }
    }

    /// Fold one sample into the estimate.
    pub fn update(&mut self, x: &[T]) {
        debug_assert_eq!(x.len(), self.mean.len());
        let n = T::from(self.count).unwrap();
        let n1 = n + T::one();
        for ((m, v), &xi) in self.mean.iter_mut().zip(self.var.iter_mut()).zip(x) {
            *m = (*m * n + xi) / n1;
            let d = xi - *m;
            *v = (*v * n + d * d) / n1;
        }
        self.count += 1;
    }

    /// Current mean.
    #[inline]
    pub fn mean(&self) -> &[T] {
        &self.mean
    }

    /// Current variance.
    #[inline]
    pub fn var(&self) -> &[T] {
        &self.var
    }

    /// Number of samples folded in.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }
}

// ============================================================================
// Weighted Statistics
// ============================================================================

/// Weighted mean and variance with an externally supplied prior weight.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeightedStats<T> {
    mean: Vec<T>,
    var: Vec<T>,
}

impl<T: Float> WeightedStats<T> {
    /// Statistics seeded with `mean` and zero variance.
    pub fn seeded(mean: &[T]) -> Self {
        Self {
            mean: mean.to_vec(),
            var: vec![T::zero(); mean.len()],
        }
    }

    /// Fold a sample with weight `w` into an estimate worth `prior`.
    ///
    /// Does nothing if both weights are zero.
    pub fn update(&mut self, x: &[T], w: T, prior: T) {
        debug_assert_eq!(x.len(), self.mean.len());
        let denom = prior + w;
        if denom <= T::zero() {
            return;
        }
        for ((m, v), &xi) in self.mean.iter_mut().zip(self.var.iter_mut()).zip(x) {
            *m = (prior * *m + w * xi) / denom;
            let d = xi - *m;
            *v = (prior * *v + w * d * d) / denom;
        }
    }

    /// Current weighted mean.
    #[inline]
    pub fn mean(&self) -> &[T] {
        &self.mean
    }

    /// Current weighted variance.
    #[inline]
    pub fn var(&self) -> &[T] {
        &self.var
    }
}
