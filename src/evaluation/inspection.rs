//! Read-only views of receptive fields.
//!
//! ## Purpose
//!
//! This module exposes the trained state of a single receptive field without
//! giving out mutable access, and derives the variable importance in
//! projection (VIP) score of each input.
//!
//! ## Key concepts
//!
//! * **VIP**: `sqrt(n_in * Σ_k β_k² SSs2_k U_kj² / ‖U_k‖² / Σ_k β_k² SSs2_k)`,
//!   zero for every input when the denominator vanishes.
//!
//! ## Invariants
//!
//! * Views borrow the model immutably; they cannot change it.
//! * VIP scores are non-negative.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::algorithms::receptive_field::ReceptiveField;
use crate::math::linalg::norm_sq;

/// Borrowed, read-only view of one receptive field.
#[derive(Debug, Clone, Copy)]
pub struct ReceptiveFieldView<'a, T> {
    rf: &'a ReceptiveField<T>,
}

impl<'a, T: Float> ReceptiveFieldView<'a, T> {
    /// Wrap a field.
    pub fn new(rf: &'a ReceptiveField<T>) -> Self {
        Self { rf }
    }

    /// Number of PLS directions.
    pub fn n_reg(&self) -> usize {
        self.rf.n_reg()
    }

    /// Weighted mean of the inputs the field has seen.
    pub fn mean_x(&self) -> &'a [T] {
        self.rf.stats.mean()
    }

    /// Weighted variance of the inputs the field has seen.
    pub fn var_x(&self) -> &'a [T] {
        self.rf.stats.var()
    }

    /// Center.
    pub fn center(&self) -> &'a [T] {
        &self.rf.center
    }

    /// Distance metric `D`, row-major.
    pub fn d(&self) -> &'a [T] {
        self.rf.metric.d()
    }

    /// Upper-triangular factor `M` of the metric, row-major.
    pub fn m(&self) -> &'a [T] {
        self.rf.metric.m()
    }

    /// Per-element learning rates of `M`, row-major.
    pub fn alpha(&self) -> &'a [T] {
        &self.rf.alpha
    }

    /// PLS directions.
    pub fn u(&self) -> &'a [Vec<T>] {
        &self.rf.u
    }

    /// PLS loadings.
    pub fn p(&self) -> &'a [Vec<T>] {
        &self.rf.p
    }

    /// Intercept.
    pub fn beta0(&self) -> T {
        self.rf.beta0
    }

    /// Regression coefficients, one per direction.
    pub fn beta(&self) -> &'a [T] {
        &self.rf.beta
    }

    /// Effective sample count per direction.
    pub fn n_data(&self) -> &'a [T] {
        &self.rf.n_data
    }

    /// Accumulated activation per direction.
    pub fn sum_w(&self) -> &'a [T] {
        &self.rf.sum_w
    }

    /// Whether the field has seen enough data to be relied upon.
    pub fn trustworthy(&self) -> bool {
        self.rf.trustworthy
    }

    /// Current forgetting factor.
    pub fn lambda(&self) -> T {
        self.rf.lambda
    }

    /// Slope of the local model (cached or reconstructed).
    pub fn slope(&self) -> Vec<T> {
        self.rf.slope()
    }

    /// Variable importance in projection, one score per input.
    pub fn vip(&self) -> Vec<T> {
        let n = self.rf.n_in();
        let mut num = vec![T::zero(); n];
        let mut denom = T::zero();
        for k in 0..self.rf.n_reg() {
            let u = &self.rf.u[k];
            let explained = self.rf.beta[k] * self.rf.beta[k] * self.rf.ss_s2[k];
            denom = denom + explained;
            let u_norm = norm_sq(u);
            if u_norm <= T::zero() {
                continue;
            }
            for (acc, &uj) in num.iter_mut().zip(u) {
                *acc = *acc + explained * uj * uj / u_norm;
            }
        }
        if denom <= T::zero() {
            return vec![T::zero(); n];
        }
        let scale = T::from(n).unwrap() / denom;
        num.into_iter().map(|v| (scale * v).max(T::zero()).sqrt()).collect()
    }
}
