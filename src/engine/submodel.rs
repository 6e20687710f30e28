//! Field manager of one output dimension.
//!
//! ## Purpose
//!
//! This module owns the receptive fields that model one output dimension. For
//! every sample it evaluates all activations, updates the active fields, and
//! either grows a new field or prunes a redundant one. It also blends the
//! fields' local predictions, confidences and slopes for queries.
//!
//! ## Design notes
//!
//! * **Arena**: fields live in a `Vec`; an index is only stable within one call
//!   since pruning uses `swap_remove`.
//! * **Two phases**: [`SubModel::evaluate`] inspects the fields and reserves
//!   the memory a new field would need, [`SubModel::apply`] mutates. A failed
//!   evaluation leaves the submodel untouched.
//! * **Pre-update weights**: the add and prune decisions use the activations
//!   computed before any field moved.
//!
//! ## Key concepts
//!
//! * **Add**: when no field activates above `w_gen`, a new field is centered
//!   at the sample.
//! * **Prune**: when the two most active fields both exceed `w_prune`, the one
//!   with fewer effective samples is removed (the later one on a tie).
//! * **Blend**: `y = Σ w_i y_i / Σ w_i` over fields with `w_i >= cutoff`.
//!
//! ## Invariants
//!
//! * Add and prune never happen for the same sample.
//! * A field is never updated with the sample that created it.
//!
//! ## Non-goals
//!
//! * This module does not normalize inputs or outputs.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// Internal dependencies
use crate::algorithms::receptive_field::ReceptiveField;
use crate::math::distance::DistanceMetric;
use crate::math::kernel::Kernel;
use crate::primitives::errors::LwprError;
use crate::primitives::params::Hyperparameters;

// ============================================================================
// Outputs
// ============================================================================

/// Outcome of the evaluation phase of one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation<T> {
    /// Activation of every field, in field order.
    pub weights: Vec<T>,

    /// Blended prediction of the fields above the activation floor.
    pub prediction: T,

    /// Whether a new field will be created.
    pub add: bool,
}

/// What the apply phase did to the field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structural {
    /// Neither added nor removed a field.
    Unchanged,

    /// Appended a field at the given index.
    Added(usize),

    /// Removed the field that was at the given index.
    Pruned(usize),
}

/// Blended prediction of one output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blend<T> {
    /// Blended value.
    pub value: T,

    /// Weighted standard error of the blend.
    pub confidence: T,

    /// Largest activation of any field.
    pub max_activation: T,
}

// ============================================================================
// SubModel
// ============================================================================

/// The receptive fields of one output dimension.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubModel<T> {
    fields: Vec<ReceptiveField<T>>,
}

impl<T: Float> SubModel<T> {
    /// Empty field manager.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Number of receptive fields.
    #[inline]
    pub fn num_rfs(&self) -> usize {
        self.fields.len()
    }

    /// Field at `idx`.
    #[inline]
    pub fn field(&self, idx: usize) -> Option<&ReceptiveField<T>> {
        self.fields.get(idx)
    }

    /// All fields.
    #[inline]
    pub fn fields(&self) -> &[ReceptiveField<T>] {
        &self.fields
    }

    /// Append an externally built field and return its index.
    ///
    /// Fails with [`LwprError::BadInputDim`] if the field's dimensionality
    /// differs from the fields already present.
    pub fn add_field(&mut self, rf: ReceptiveField<T>) -> Result<usize, LwprError> {
        if let Some(first) = self.fields.first() {
            if first.n_in() != rf.n_in() {
                return Err(LwprError::BadInputDim {
                    expected: first.n_in(),
                    got: rf.n_in(),
                });
            }
        }
        self.fields.try_reserve(1)?;
        self.fields.push(rf);
        Ok(self.fields.len() - 1)
    }

    /// Reset the metric learning rates of every field to `alpha`.
    pub fn reset_learning_rates(&mut self, alpha: T) {
        for rf in &mut self.fields {
            rf.reset_learning_rates(alpha);
        }
    }

    /// Cache the reconstructed slope of every field.
    pub fn cache_slopes(&mut self) {
        for rf in &mut self.fields {
            rf.cache_slope();
        }
    }

    // ========================================================================
    // Learning
    // ========================================================================

    /// Read-only evaluation phase for the sample `x`.
    ///
    /// Computes all activations and the pre-update blended prediction, decides
    /// whether a field will be created and reserves room for it.
    pub fn evaluate(
        &mut self,
        x: &[T],
        params: &Hyperparameters<T>,
    ) -> Result<Evaluation<T>, LwprError> {
        let floor = Hyperparameters::<T>::activation_floor();
        let mut weights = Vec::new();
        weights.try_reserve(self.fields.len())?;

        let mut sum_w = T::zero();
        let mut sum_wy = T::zero();
        let mut max_w = T::zero();
        for rf in &self.fields {
            let w = rf.activation(x, params.kernel);
            if w > floor {
                sum_w = sum_w + w;
                sum_wy = sum_wy + w * rf.predict_local(x).value;
            }
            max_w = max_w.max(w);
            weights.push(w);
        }

        let add = max_w < params.w_gen;
        if add {
            self.fields.try_reserve(1)?;
        }

        let prediction = if sum_w > T::zero() {
            sum_wy / sum_w
        } else {
            T::zero()
        };
        Ok(Evaluation {
            weights,
            prediction,
            add,
        })
    }

    /// Mutating phase: update active fields, then add or prune.
    ///
    /// `eval` must come from [`evaluate`](Self::evaluate) on the same sample
    /// with no mutation in between.
    pub fn apply(
        &mut self,
        eval: &Evaluation<T>,
        x: &[T],
        y: T,
        params: &Hyperparameters<T>,
        init_metric: &DistanceMetric<T>,
    ) -> Structural {
        debug_assert_eq!(eval.weights.len(), self.fields.len());
        let floor = Hyperparameters::<T>::activation_floor();

        for (rf, &w) in self.fields.iter_mut().zip(&eval.weights) {
            if w > floor {
                rf.update(x, y, w, params);
            }
        }

        if eval.add {
            self.fields
                .push(ReceptiveField::new(x, y, init_metric.clone(), params));
            return Structural::Added(self.fields.len() - 1);
        }

        match self.prune_candidate(&eval.weights, params.w_prune) {
            Some(idx) => {
                self.fields.swap_remove(idx);
                Structural::Pruned(idx)
            }
            None => Structural::Unchanged,
        }
    }

    /// Index of the field to remove, if the two most active fields overlap.
    fn prune_candidate(&self, weights: &[T], w_prune: T) -> Option<usize> {
        let mut first: Option<usize> = None;
        let mut second: Option<usize> = None;
        for (i, &w) in weights.iter().enumerate() {
            match first {
                Some(f) if w <= weights[f] => {
                    if second.is_none_or(|s| w > weights[s]) {
                        second = Some(i);
                    }
                }
                _ => {
                    second = first;
                    first = Some(i);
                }
            }
        }
        let (a, b) = (first?, second?);
        if !(weights[a] > w_prune && weights[b] > w_prune) {
            return None;
        }

        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let n_lo = self.fields[lo].effective_samples();
        let n_hi = self.fields[hi].effective_samples();
        Some(if n_lo < n_hi { lo } else { hi })
    }

    // ========================================================================
    // Prediction
    // ========================================================================

    /// Blend the fields with activation `>= cutoff`.
    ///
    /// Returns a zero value and zero confidence when no field reaches the
    /// cutoff.
    pub fn predict(&self, x: &[T], cutoff: T, kernel: Kernel) -> Blend<T> {
        let mut sum_w = T::zero();
        let mut sum_wy = T::zero();
        let mut sum_wy2 = T::zero();
        let mut sum_conf = T::zero();
        let mut max_w = T::zero();

        for rf in &self.fields {
            let w = rf.activation(x, kernel);
            max_w = max_w.max(w);
            if w < cutoff || w <= T::zero() {
                continue;
            }
            let local = rf.predict_local(x);
            sum_w = sum_w + w;
            sum_wy = sum_wy + w * local.value;
            sum_wy2 = sum_wy2 + w * local.value * local.value;
            sum_conf = sum_conf + w * rf.noise_variance() * (T::one() + w * local.leverage);
        }

        if sum_w <= T::zero() {
            return Blend {
                value: T::zero(),
                confidence: T::zero(),
                max_activation: max_w,
            };
        }

        let value = sum_wy / sum_w;
        let spread = (sum_conf + sum_wy2 - sum_w * value * value).max(T::zero());
        Blend {
            value,
            confidence: spread.sqrt() / sum_w,
            max_activation: max_w,
        }
    }

    /// Blended value and its gradient with respect to `x`.
    ///
    /// `gradient` must have one entry per input dimension.
    pub fn jacobian(&self, x: &[T], cutoff: T, kernel: Kernel, gradient: &mut [T]) -> T {
        let n = x.len();
        debug_assert_eq!(gradient.len(), n);

        let mut sum_w = T::zero();
        let mut sum_wy = T::zero();
        let mut sum_dw = vec![T::zero(); n];
        let mut sum_dwy = vec![T::zero(); n];
        let mut sum_wslope = vec![T::zero(); n];
        let mut dq = vec![T::zero(); n];
        let mut dx = vec![T::zero(); n];

        for rf in &self.fields {
            for ((d, &xi), &ci) in dx.iter_mut().zip(x).zip(rf.center()) {
                *d = xi - ci;
            }
            let w = kernel.weight(rf.metric().quadratic_form(&dx));
            if w < cutoff || w <= T::zero() {
                continue;
            }
            let y = rf.predict_local(x).value;
            let slope = rf.slope();
            rf.metric().quadratic_form_gradient(&dx, &mut dq);
            let dw_dq = kernel.dw_dq(w);

            sum_w = sum_w + w;
            sum_wy = sum_wy + w * y;
            for i in 0..n {
                let dw = dw_dq * dq[i];
                sum_dw[i] = sum_dw[i] + dw;
                sum_dwy[i] = sum_dwy[i] + dw * y;
                sum_wslope[i] = sum_wslope[i] + w * slope[i];
            }
        }

        if sum_w <= T::zero() {
            gradient.iter_mut().for_each(|g| *g = T::zero());
            return T::zero();
        }

        let value = sum_wy / sum_w;
        for (i, g) in gradient.iter_mut().enumerate() {
            *g = (sum_dwy[i] - value * sum_dw[i] + sum_wslope[i]) / sum_w;
        }
        value
    }
}
