//! The LWPR model.
//!
//! ## Purpose
//!
//! This module ties everything together: it normalizes samples, tracks the
//! global input statistics, fans every sample out to one field manager per
//! output dimension, and combines their blends into predictions, confidence
//! bounds and Jacobians in the caller's units.
//!
//! ## Design notes
//!
//! * **Validate, evaluate, apply**: an update first validates the sample, then
//!   runs the read-only evaluation of every submodel (which also reserves the
//!   memory a new field needs), and only then mutates. Any error leaves the
//!   model exactly as it was.
//! * **Normalization**: `x_n = x / norm_in`, `y_n = y / norm_out`; all fields
//!   live in normalized coordinates.
//! * **Duplication**: `Clone` is a deep copy with no shared state.
//!
//! ## Key concepts
//!
//! * **Update**: returns the blended prediction the model made for `x` before
//!   learning from `y`, useful for tracking the online training error.
//! * **Cutoff**: fields whose activation lies below the cutoff are ignored by
//!   the prediction entry points.
//!
//! ## Invariants
//!
//! * `n_in > 0`, `n_out > 0`, normalization scales are strictly positive.
//! * Hyperparameters stay valid: every setter validates before storing.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use core::str::FromStr;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// Internal dependencies
use crate::engine::output::{JacobianOutput, Prediction};
use crate::engine::submodel::{Structural, SubModel};
use crate::engine::validator::Validator;
use crate::evaluation::inspection::ReceptiveFieldView;
use crate::math::distance::{DistanceMetric, InitialMetric};
use crate::math::kernel::Kernel;
use crate::math::linalg::FloatLinalg;
use crate::math::stats::RunningStats;
use crate::primitives::errors::LwprError;
use crate::primitives::params::Hyperparameters;

/// Spherical metric new models start with.
const DEFAULT_INIT_D: f64 = 25.0;

// ============================================================================
// Model
// ============================================================================

/// Locally weighted projection regression model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Lwpr<T> {
    n_in: usize,
    n_out: usize,
    stats: RunningStats<T>,
    norm_in: Vec<T>,
    norm_out: Vec<T>,
    params: Hyperparameters<T>,
    init_metric: DistanceMetric<T>,
    subs: Vec<SubModel<T>>,
}

impl<T: FloatLinalg> Lwpr<T> {
    /// Create an untrained model with default hyperparameters.
    pub fn new(n_in: usize, n_out: usize) -> Result<Self, LwprError> {
        Validator::validate_dimension(n_in, "n_in")?;
        Validator::validate_dimension(n_out, "n_out")?;

        let mut subs = Vec::new();
        subs.try_reserve_exact(n_out)?;
        subs.extend((0..n_out).map(|_| SubModel::new()));

        Ok(Self {
            n_in,
            n_out,
            stats: RunningStats::new(n_in),
            norm_in: vec![T::one(); n_in],
            norm_out: vec![T::one(); n_out],
            params: Hyperparameters::default(),
            init_metric: DistanceMetric::spherical(T::from(DEFAULT_INIT_D).unwrap(), n_in)?,
            subs,
        })
    }

    // ========================================================================
    // Learning
    // ========================================================================

    /// Learn from the sample `(x, y)`.
    ///
    /// Returns the prediction for `x` made before the update.
    pub fn update(&mut self, x: &[T], y: &[T]) -> Result<Vec<T>, LwprError> {
        Validator::validate_input(x, self.n_in)?;
        Validator::validate_output(y, self.n_out)?;

        let xn = self.normalize_input(x);

        let mut evaluations = Vec::new();
        evaluations.try_reserve_exact(self.n_out)?;
        for sub in &mut self.subs {
            evaluations.push(sub.evaluate(&xn, &self.params)?);
        }

        self.stats.update(&xn);
        let mut yp = Vec::with_capacity(self.n_out);
        for (o, (sub, eval)) in self.subs.iter_mut().zip(&evaluations).enumerate() {
            let yn = y[o] / self.norm_out[o];
            match sub.apply(eval, &xn, yn, &self.params, &self.init_metric) {
                Structural::Added(idx) => {
                    debug!(output = o, index = idx, num_rfs = sub.num_rfs(), "added receptive field")
                }
                Structural::Pruned(idx) => {
                    debug!(output = o, index = idx, num_rfs = sub.num_rfs(), "pruned receptive field")
                }
                Structural::Unchanged => {}
            }
            yp.push(eval.prediction * self.norm_out[o]);
        }
        Ok(yp)
    }

    // ========================================================================
    // Prediction
    // ========================================================================

    /// Blended prediction using the fields with activation `>= cutoff`.
    pub fn predict(&self, x: &[T], cutoff: T) -> Result<Vec<T>, LwprError> {
        Ok(self.predict_with_confidence(x, cutoff)?.values)
    }

    /// Prediction with confidence bounds and maximum activations.
    pub fn predict_with_confidence(&self, x: &[T], cutoff: T) -> Result<Prediction<T>, LwprError> {
        Validator::validate_input(x, self.n_in)?;
        Validator::validate_cutoff(cutoff)?;

        let xn = self.normalize_input(x);
        let mut out = Prediction {
            values: Vec::with_capacity(self.n_out),
            confidence: Vec::with_capacity(self.n_out),
            max_activation: Vec::with_capacity(self.n_out),
        };
        for (sub, &scale) in self.subs.iter().zip(&self.norm_out) {
            let blend = sub.predict(&xn, cutoff, self.params.kernel);
            out.values.push(blend.value * scale);
            out.confidence.push(blend.confidence * scale);
            out.max_activation.push(blend.max_activation);
        }
        Ok(out)
    }

    /// Prediction and its Jacobian with respect to `x`.
    pub fn predict_jacobian(&self, x: &[T], cutoff: T) -> Result<JacobianOutput<T>, LwprError> {
        Validator::validate_input(x, self.n_in)?;
        Validator::validate_cutoff(cutoff)?;

        let xn = self.normalize_input(x);
        let mut values = Vec::with_capacity(self.n_out);
        let mut jacobian = vec![T::zero(); self.n_out * self.n_in];
        for (o, (sub, &scale)) in self.subs.iter().zip(&self.norm_out).enumerate() {
            let row = &mut jacobian[o * self.n_in..(o + 1) * self.n_in];
            let value = sub.jacobian(&xn, cutoff, self.params.kernel, row);
            for (g, &ni) in row.iter_mut().zip(&self.norm_in) {
                *g = scale * *g / ni;
            }
            values.push(value * scale);
        }
        Ok(JacobianOutput {
            values,
            jacobian,
            n_in: self.n_in,
        })
    }

    fn normalize_input(&self, x: &[T]) -> Vec<T> {
        x.iter().zip(&self.norm_in).map(|(&xi, &ni)| xi / ni).collect()
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Input dimensionality.
    #[inline]
    pub fn n_in(&self) -> usize {
        self.n_in
    }

    /// Output dimensionality.
    #[inline]
    pub fn n_out(&self) -> usize {
        self.n_out
    }

    /// Number of samples learned from.
    #[inline]
    pub fn n_data(&self) -> usize {
        self.stats.count()
    }

    /// Running mean of the normalized inputs.
    pub fn mean_x(&self) -> &[T] {
        self.stats.mean()
    }

    /// Running variance of the normalized inputs.
    pub fn var_x(&self) -> &[T] {
        self.stats.var()
    }

    /// Number of receptive fields of output `dim`.
    pub fn num_rfs(&self, dim: usize) -> Result<usize, LwprError> {
        Ok(self.submodel(dim)?.num_rfs())
    }

    /// Read-only view of field `idx` of output `dim`.
    pub fn receptive_field(
        &self,
        dim: usize,
        idx: usize,
    ) -> Result<ReceptiveFieldView<'_, T>, LwprError> {
        let sub = self.submodel(dim)?;
        let rf = sub.field(idx).ok_or(LwprError::OutOfRange {
            what: "receptive field",
            index: idx,
            len: sub.num_rfs(),
        })?;
        Ok(ReceptiveFieldView::new(rf))
    }

    /// Field manager of output `dim`.
    pub fn submodel(&self, dim: usize) -> Result<&SubModel<T>, LwprError> {
        self.subs.get(dim).ok_or(LwprError::OutOfRange {
            what: "output dimension",
            index: dim,
            len: self.n_out,
        })
    }

    /// Store the reconstructed slope of every field for faster Jacobians.
    pub fn cache_slopes(&mut self) {
        for sub in &mut self.subs {
            sub.cache_slopes();
        }
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    /// All hyperparameters.
    #[inline]
    pub fn params(&self) -> &Hyperparameters<T> {
        &self.params
    }

    /// Replace all hyperparameters at once.
    pub fn set_params(&mut self, params: Hyperparameters<T>) -> Result<(), LwprError> {
        Validator::validate_hyperparameters(&params)?;
        self.params = params;
        Ok(())
    }

    /// Activation below which a new field is created.
    pub fn w_gen(&self) -> T {
        self.params.w_gen
    }

    /// Set `w_gen`, in (0, 1].
    pub fn set_w_gen(&mut self, w_gen: T) -> Result<(), LwprError> {
        Validator::validate_unit_interval(w_gen, "w_gen")?;
        self.params.w_gen = w_gen;
        Ok(())
    }

    /// Activation above which overlapping fields are pruned.
    pub fn w_prune(&self) -> T {
        self.params.w_prune
    }

    /// Set `w_prune`, in (0, 1]. A value of 1 disables pruning.
    pub fn set_w_prune(&mut self, w_prune: T) -> Result<(), LwprError> {
        Validator::validate_unit_interval(w_prune, "w_prune")?;
        self.params.w_prune = w_prune;
        Ok(())
    }

    /// Smoothness penalty on distance metrics.
    pub fn penalty(&self) -> T {
        self.params.penalty
    }

    /// Set the smoothness penalty (non-negative).
    pub fn set_penalty(&mut self, penalty: T) -> Result<(), LwprError> {
        Validator::validate_non_negative(penalty, "penalty")?;
        self.params.penalty = penalty;
        Ok(())
    }

    /// Initial forgetting factor of new fields.
    pub fn init_lambda(&self) -> T {
        self.params.init_lambda
    }

    /// Set the initial forgetting factor, in (0, 1].
    pub fn set_init_lambda(&mut self, lambda: T) -> Result<(), LwprError> {
        Validator::validate_unit_interval(lambda, "init_lambda")?;
        self.params.init_lambda = lambda;
        Ok(())
    }

    /// Annealing rate of forgetting factors.
    pub fn tau_lambda(&self) -> T {
        self.params.tau_lambda
    }

    /// Set the annealing rate, in (0, 1].
    pub fn set_tau_lambda(&mut self, tau: T) -> Result<(), LwprError> {
        Validator::validate_unit_interval(tau, "tau_lambda")?;
        self.params.tau_lambda = tau;
        Ok(())
    }

    /// Final forgetting factor.
    pub fn final_lambda(&self) -> T {
        self.params.final_lambda
    }

    /// Set the final forgetting factor, in (0, 1].
    pub fn set_final_lambda(&mut self, lambda: T) -> Result<(), LwprError> {
        Validator::validate_unit_interval(lambda, "final_lambda")?;
        self.params.final_lambda = lambda;
        Ok(())
    }

    /// Prior of new projections' `SSs2` accumulators.
    pub fn init_s2(&self) -> T {
        self.params.init_s2
    }

    /// Set the `SSs2` prior (strictly positive).
    pub fn set_init_s2(&mut self, init_s2: T) -> Result<(), LwprError> {
        Validator::validate_positive(init_s2, "init_s2")?;
        self.params.init_s2 = init_s2;
        Ok(())
    }

    /// Initial learning rate of metric elements.
    pub fn init_alpha(&self) -> T {
        self.params.init_alpha
    }

    /// Set the initial learning rate (strictly positive).
    ///
    /// Also resets the learning rates of every existing field.
    pub fn set_init_alpha(&mut self, alpha: T) -> Result<(), LwprError> {
        Validator::validate_positive(alpha, "init_alpha")?;
        self.params.init_alpha = alpha;
        for sub in &mut self.subs {
            sub.reset_learning_rates(alpha);
        }
        Ok(())
    }

    /// Meta learning rate.
    pub fn meta_rate(&self) -> T {
        self.params.meta_rate
    }

    /// Set the meta learning rate (strictly positive).
    pub fn set_meta_rate(&mut self, rate: T) -> Result<(), LwprError> {
        Validator::validate_positive(rate, "meta_rate")?;
        self.params.meta_rate = rate;
        Ok(())
    }

    /// Error ratio below which a new PLS direction is grown.
    pub fn add_threshold(&self) -> T {
        self.params.add_threshold
    }

    /// Set the direction growth threshold (strictly positive).
    pub fn set_add_threshold(&mut self, threshold: T) -> Result<(), LwprError> {
        Validator::validate_positive(threshold, "add_threshold")?;
        self.params.add_threshold = threshold;
        Ok(())
    }

    /// Whether distance metrics are adapted.
    pub fn update_d(&self) -> bool {
        self.params.update_d
    }

    /// Enable or disable distance metric adaptation.
    pub fn set_update_d(&mut self, update_d: bool) {
        self.params.update_d = update_d;
    }

    /// Whether only the diagonal of metric factors is adapted.
    pub fn diag_only(&self) -> bool {
        self.params.diag_only
    }

    /// Restrict metric adaptation to the diagonal.
    pub fn set_diag_only(&mut self, diag_only: bool) {
        self.params.diag_only = diag_only;
    }

    /// Whether learning rates are meta-learned.
    pub fn use_meta(&self) -> bool {
        self.params.use_meta
    }

    /// Enable or disable meta learning of learning rates.
    pub fn set_use_meta(&mut self, use_meta: bool) {
        self.params.use_meta = use_meta;
    }

    /// Activation kernel.
    pub fn kernel(&self) -> Kernel {
        self.params.kernel
    }

    /// Set the activation kernel.
    pub fn set_kernel(&mut self, kernel: Kernel) {
        self.params.kernel = kernel;
    }

    /// Set the activation kernel by name (`"Gaussian"` or `"BiSquare"`).
    pub fn set_kernel_by_name(&mut self, name: &str) -> Result<(), LwprError> {
        self.params.kernel = Kernel::from_str(name)?;
        Ok(())
    }

    /// Initial distance metric `D` of new fields, row-major.
    pub fn init_d(&self) -> &[T] {
        self.init_metric.d()
    }

    /// Upper-triangular factor of the initial distance metric, row-major.
    pub fn init_m(&self) -> &[T] {
        self.init_metric.m()
    }

    /// Set the initial metric of new fields.
    pub fn set_init_metric(&mut self, spec: &InitialMetric<T>) -> Result<(), LwprError> {
        self.init_metric = spec.build(self.n_in)?;
        Ok(())
    }

    /// Set a spherical initial metric `delta * I`.
    pub fn set_init_d_spherical(&mut self, delta: T) -> Result<(), LwprError> {
        self.set_init_metric(&InitialMetric::Spherical(delta))
    }

    /// Set a diagonal initial metric.
    pub fn set_init_d_diagonal(&mut self, diag: &[T]) -> Result<(), LwprError> {
        self.set_init_metric(&InitialMetric::Diagonal(diag.to_vec()))
    }

    /// Set a full initial metric (row-major, symmetric positive-definite).
    pub fn set_init_d_full(&mut self, d: &[T]) -> Result<(), LwprError> {
        self.set_init_metric(&InitialMetric::Full(d.to_vec()))
    }

    /// Input normalization scales.
    pub fn norm_in(&self) -> &[T] {
        &self.norm_in
    }

    /// Set the input normalization scales (strictly positive).
    pub fn set_norm_in(&mut self, norm: &[T]) -> Result<(), LwprError> {
        Validator::validate_norm(norm, self.n_in, "norm_in")?;
        self.norm_in.copy_from_slice(norm);
        Ok(())
    }

    /// Output normalization scales.
    pub fn norm_out(&self) -> &[T] {
        &self.norm_out
    }

    /// Set the output normalization scales (strictly positive).
    pub fn set_norm_out(&mut self, norm: &[T]) -> Result<(), LwprError> {
        Validator::validate_norm(norm, self.n_out, "norm_out")?;
        self.norm_out.copy_from_slice(norm);
        Ok(())
    }
}
