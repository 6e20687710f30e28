//! Receptive fields: local linear experts fitted by incremental PLS.
//!
//! ## Purpose
//!
//! This module implements a single receptive field: its activation, its local
//! prediction, and the incremental partial-least-squares (PLS) update that
//! refits the local linear model from one weighted sample at a time.
//!
//! ## Design notes
//!
//! * **Fading memory**: every accumulator is multiplied by the forgetting
//!   factor `lambda` before the new weighted term is added.
//! * **Deflation**: the centered input is projected on direction `U_k`, then
//!   deflated by the loading `P_k` before the next projection.
//! * **Growth**: directions are only ever appended, one at a time, from a
//!   covariance accumulator that runs alongside the existing directions.
//! * **Read-only slope**: the equivalent ordinary-regression slope can be
//!   reconstructed from `beta`, `U` and `P` without touching the field.
//!
//! ## Key concepts
//!
//! * **Projection** `s_k = U_k · r_k`, `r_{k+1} = r_k - s_k P_k`, `r_0 = x - mean_x`.
//! * **Regression** `beta_k = SSYres_k / SSs2_k`, `P_k = SSXres_k / SSs2_k`.
//! * **Cross-validation error**: residuals computed with the coefficients
//!   from before the update, accumulated per stage.
//!
//! ## Invariants
//!
//! * `n_reg()` never decreases and never exceeds the input dimensionality.
//! * Every per-direction vector has exactly `n_reg()` entries.
//!
//! ## Non-goals
//!
//! * This module does not decide when fields are created or removed.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// Internal dependencies
use crate::algorithms::metric::adapt_metric;
use crate::math::distance::DistanceMetric;
use crate::math::kernel::Kernel;
use crate::math::linalg::{axpy, dot, norm_sq};
use crate::math::stats::WeightedStats;
use crate::primitives::params::Hyperparameters;

/// Effective samples (per input dimension) after which a field is trustworthy.
const TRUSTWORTHY_SAMPLES_PER_DIM: f64 = 2.0;

/// Effective samples the newest direction needs before another may be grown.
const DIRECTION_WARMUP: f64 = 20.0;

/// Additive floor on mean squared errors when comparing stages.
const MSE_FLOOR: f64 = 1e-10;

// ============================================================================
// Outputs
// ============================================================================

/// Local prediction of a single field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalPrediction<T> {
    /// `beta0 + Σ beta_k s_k`.
    pub value: T,

    /// `Σ s_k² / SSs2_k`, the field's leverage per unit activation.
    pub leverage: T,
}

/// Summary of one incremental update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldUpdate<T> {
    /// Residual of the pre-update coefficients (after all stages).
    pub e_cv: T,

    /// Residual of the post-update coefficients.
    pub e: T,

    /// Whether a new PLS direction was appended.
    pub added_direction: bool,
}

// ============================================================================
// Receptive Field
// ============================================================================

/// A local linear expert with an adaptive Gaussian-like activation region.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReceptiveField<T> {
    pub(crate) center: Vec<T>,
    pub(crate) metric: DistanceMetric<T>,

    // Learning rates of the metric factor and their meta-learning state.
    pub(crate) alpha: Vec<T>,
    pub(crate) meta_b: Vec<T>,
    pub(crate) meta_h: Vec<T>,

    // PLS model.
    pub(crate) u: Vec<Vec<T>>,
    pub(crate) p: Vec<Vec<T>>,
    pub(crate) beta: Vec<T>,
    pub(crate) beta0: T,

    // Per-direction sufficient statistics.
    pub(crate) ss_s2: Vec<T>,
    pub(crate) ss_yres: Vec<T>,
    pub(crate) ss_xres: Vec<Vec<T>>,
    pub(crate) sx_res_y_res: Vec<Vec<T>>,
    pub(crate) n_data: Vec<T>,
    pub(crate) sum_w: Vec<T>,
    pub(crate) sum_e_cv2: Vec<T>,
    pub(crate) n_dofs: Vec<T>,
    pub(crate) cost_h: Vec<T>,
    pub(crate) cost_r: Vec<T>,

    // Covariance accumulator of the next direction.
    pub(crate) candidate: Vec<T>,

    pub(crate) sum_e2: T,
    pub(crate) sum_e_cv2_intercept: T,
    pub(crate) weight_sum: T,
    pub(crate) samples: T,
    pub(crate) stats: WeightedStats<T>,
    pub(crate) lambda: T,
    pub(crate) trustworthy: bool,

    pub(crate) slope: Vec<T>,
    pub(crate) slope_ready: bool,
}

impl<T: Float> ReceptiveField<T> {
    /// Create a field centered at `x` whose intercept is `y`.
    ///
    /// The creating sample counts as one unit-weight observation of the
    /// intercept model; the field starts without PLS directions.
    pub fn new(x: &[T], y: T, metric: DistanceMetric<T>, params: &Hyperparameters<T>) -> Self {
        let n = x.len();
        debug_assert_eq!(metric.dim(), n);
        Self {
            center: x.to_vec(),
            metric,
            alpha: vec![params.init_alpha; n * n],
            meta_b: vec![params.init_alpha.ln(); n * n],
            meta_h: vec![T::zero(); n * n],
            u: Vec::new(),
            p: Vec::new(),
            beta: Vec::new(),
            beta0: y,
            ss_s2: Vec::new(),
            ss_yres: Vec::new(),
            ss_xres: Vec::new(),
            sx_res_y_res: Vec::new(),
            n_data: Vec::new(),
            sum_w: Vec::new(),
            sum_e_cv2: Vec::new(),
            n_dofs: Vec::new(),
            cost_h: Vec::new(),
            cost_r: Vec::new(),
            candidate: vec![T::zero(); n],
            sum_e2: T::zero(),
            sum_e_cv2_intercept: T::zero(),
            weight_sum: T::one(),
            samples: T::one(),
            stats: WeightedStats::seeded(x),
            lambda: params.init_lambda,
            trustworthy: false,
            slope: vec![T::zero(); n],
            slope_ready: false,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Input dimensionality.
    #[inline]
    pub fn n_in(&self) -> usize {
        self.center.len()
    }

    /// Number of PLS directions.
    #[inline]
    pub fn n_reg(&self) -> usize {
        self.beta.len()
    }

    /// Center of the field.
    #[inline]
    pub fn center(&self) -> &[T] {
        &self.center
    }

    /// Distance metric of the field.
    #[inline]
    pub fn metric(&self) -> &DistanceMetric<T> {
        &self.metric
    }

    /// Intercept.
    #[inline]
    pub fn beta0(&self) -> T {
        self.beta0
    }

    /// PLS regression coefficients.
    #[inline]
    pub fn beta(&self) -> &[T] {
        &self.beta
    }

    /// Decayed count of samples the field was updated with.
    #[inline]
    pub fn effective_samples(&self) -> T {
        self.samples
    }

    /// Whether the field has seen enough data to be relied upon.
    #[inline]
    pub fn is_trustworthy(&self) -> bool {
        self.trustworthy
    }

    /// Current forgetting factor.
    #[inline]
    pub fn lambda(&self) -> T {
        self.lambda
    }

    /// Reset every metric learning rate to `alpha` and clear the meta state.
    pub fn reset_learning_rates(&mut self, alpha: T) {
        self.alpha.fill(alpha);
        self.meta_b.fill(alpha.ln());
        self.meta_h.fill(T::zero());
    }

    // ========================================================================
    // Activation and Prediction
    // ========================================================================

    /// Activation of the field for input `x`.
    #[inline]
    pub fn activation(&self, x: &[T], kernel: Kernel) -> T {
        let dx: Vec<T> = x.iter().zip(&self.center).map(|(&a, &c)| a - c).collect();
        kernel.weight(self.metric.quadratic_form(&dx))
    }

    /// Projections of a centered input onto the current directions.
    fn projections(&self, xmz: &[T]) -> Vec<T> {
        let mut r = xmz.to_vec();
        let mut s = Vec::with_capacity(self.n_reg());
        for (u, p) in self.u.iter().zip(&self.p) {
            let sk = dot(u, &r);
            axpy(-sk, p, &mut r);
            s.push(sk);
        }
        s
    }

    /// Projections together with the residual entering every stage.
    ///
    /// `residuals` has `n_reg() + 1` rows; the last row is the input residual
    /// left after all directions.
    fn projections_with_residuals(&self, xmz: &[T]) -> (Vec<T>, Vec<Vec<T>>) {
        let mut r = xmz.to_vec();
        let mut s = Vec::with_capacity(self.n_reg());
        let mut residuals = Vec::with_capacity(self.n_reg() + 1);
        for (u, p) in self.u.iter().zip(&self.p) {
            let sk = dot(u, &r);
            residuals.push(r.clone());
            axpy(-sk, p, &mut r);
            s.push(sk);
        }
        residuals.push(r);
        (s, residuals)
    }

    /// Local linear prediction for input `x`.
    pub fn predict_local(&self, x: &[T]) -> LocalPrediction<T> {
        let xmz: Vec<T> = x
            .iter()
            .zip(self.stats.mean())
            .map(|(&a, &m)| a - m)
            .collect();
        let s = self.projections(&xmz);
        let mut value = self.beta0;
        let mut leverage = T::zero();
        for (k, &sk) in s.iter().enumerate() {
            value = value + self.beta[k] * sk;
            leverage = leverage + sk * sk / self.ss_s2[k];
        }
        LocalPrediction { value, leverage }
    }

    /// Noise variance estimate of the local model.
    pub fn noise_variance(&self) -> T {
        let dofs = self.n_dofs.iter().fold(T::zero(), |acc, &v| acc + v);
        let denom = self.weight_sum - dofs;
        if denom > T::epsilon() {
            self.sum_e2 / denom
        } else {
            T::zero()
        }
    }

    // ========================================================================
    // Slope
    // ========================================================================

    /// Slope of the local model as an ordinary linear regression.
    ///
    /// Uses the cached value when it is current, otherwise back-projects
    /// `beta` through the directions and loadings.
    pub fn slope(&self) -> Vec<T> {
        if self.slope_ready {
            return self.slope.clone();
        }
        self.reconstruct_slope()
    }

    /// Back-projection `Σ_k beta_k (I - U_0 P_0ᵀ) ... (I - U_{k-1} P_{k-1}ᵀ) U_k`.
    pub fn reconstruct_slope(&self) -> Vec<T> {
        let n = self.n_in();
        let mut slope = vec![T::zero(); n];
        let mut t = vec![T::zero(); n];
        for k in 0..self.n_reg() {
            for (ti, &ui) in t.iter_mut().zip(&self.u[k]) {
                *ti = self.beta[k] * ui;
            }
            for j in (0..k).rev() {
                let dp = dot(&t, &self.p[j]);
                axpy(-dp, &self.u[j], &mut t);
            }
            axpy(T::one(), &t, &mut slope);
        }
        slope
    }

    /// Store the reconstructed slope so later reads can skip the back-projection.
    pub fn cache_slope(&mut self) {
        if !self.slope_ready {
            self.slope = self.reconstruct_slope();
            self.slope_ready = true;
        }
    }

    // ========================================================================
    // Incremental Update
    // ========================================================================

    /// Fold the sample `(x, y)` with activation `w` into the field.
    ///
    /// Runs the PLS update, the distance metric adaptation (when enabled),
    /// the direction growth check and the forgetting-factor annealing.
    pub fn update(&mut self, x: &[T], y: T, w: T, params: &Hyperparameters<T>) -> FieldUpdate<T> {
        let one = T::one();
        let lambda = self.lambda;
        let k = self.n_reg();

        // Means and intercept with fading memory.
        let prior = lambda * self.weight_sum;
        self.stats.update(x, w, prior);
        self.beta0 = (prior * self.beta0 + w * y) / (prior + w);
        self.weight_sum = prior + w;
        self.samples = lambda * self.samples + one;

        let xmz: Vec<T> = x
            .iter()
            .zip(self.stats.mean())
            .map(|(&a, &m)| a - m)
            .collect();
        let ymz = y - self.beta0;

        // Stage targets and cross-validation residuals from the old coefficients.
        let (s_old, residuals) = self.projections_with_residuals(&xmz);
        let mut targets = Vec::with_capacity(k + 1);
        let mut e_cv = Vec::with_capacity(k);
        let mut res = ymz;
        for j in 0..k {
            targets.push(res);
            res = res - self.beta[j] * s_old[j];
            e_cv.push(res);
        }
        targets.push(res);
        let e_cv_last = res;

        // Directions follow the slowly forgotten input/output covariance.
        let lambda_slow = one - (one - lambda) / T::from(10.0).unwrap();
        for j in 0..k {
            for (acc, &r) in self.sx_res_y_res[j].iter_mut().zip(&residuals[j]) {
                *acc = lambda_slow * *acc + w * targets[j] * r;
            }
            let norm = norm_sq(&self.sx_res_y_res[j]).sqrt();
            if norm > T::epsilon() {
                for (uj, &a) in self.u[j].iter_mut().zip(&self.sx_res_y_res[j]) {
                    *uj = a / norm;
                }
            }
        }

        // Regression on the refreshed projections.
        let (s, residuals) = self.projections_with_residuals(&xmz);
        for j in 0..k {
            self.ss_s2[j] = lambda * self.ss_s2[j] + w * s[j] * s[j];
            self.ss_yres[j] = lambda * self.ss_yres[j] + w * targets[j] * s[j];
            for (acc, &r) in self.ss_xres[j].iter_mut().zip(&residuals[j]) {
                *acc = lambda * *acc + w * s[j] * r;
            }
            self.beta[j] = self.ss_yres[j] / self.ss_s2[j];
            let ss = self.ss_s2[j];
            for (pj, &a) in self.p[j].iter_mut().zip(&self.ss_xres[j]) {
                *pj = a / ss;
            }
        }
        for (acc, &r) in self.candidate.iter_mut().zip(&residuals[k]) {
            *acc = lambda_slow * *acc + w * targets[k] * r;
        }

        // Residual of the updated model.
        let (s_post, residuals_post) = self.projections_with_residuals(&xmz);
        let e = s_post
            .iter()
            .zip(&self.beta)
            .fold(ymz, |acc, (&sk, &bk)| acc - bk * sk);

        for j in 0..k {
            self.sum_w[j] = lambda * self.sum_w[j] + w;
            self.n_data[j] = lambda * self.n_data[j] + one;
            self.sum_e_cv2[j] = lambda * self.sum_e_cv2[j] + w * e_cv[j] * e_cv[j];
            self.n_dofs[j] = lambda * self.n_dofs[j] + w * w * s_post[j] * s_post[j] / self.ss_s2[j];
        }
        self.sum_e_cv2_intercept = lambda * self.sum_e_cv2_intercept + w * ymz * ymz;
        self.sum_e2 = lambda * self.sum_e2 + w * e * e;

        if params.update_d {
            let dx: Vec<T> = x.iter().zip(&self.center).map(|(&a, &c)| a - c).collect();
            adapt_metric(self, &dx, w, e_cv_last, e, &s_post, params);
        }

        let added_direction = if self.should_add_direction(params) {
            self.add_direction(&residuals_post[k], e, w, params);
            true
        } else {
            false
        };

        let threshold = T::from(TRUSTWORTHY_SAMPLES_PER_DIM * self.n_in() as f64).unwrap();
        self.trustworthy = self.samples > threshold;
        self.lambda = params.anneal(lambda);
        self.slope_ready = false;

        FieldUpdate {
            e_cv: e_cv_last,
            e,
            added_direction,
        }
    }

    /// Mean squared cross-validation error after `stages` directions.
    fn stage_mse(&self, stages: usize) -> T {
        let floor = T::from(MSE_FLOOR).unwrap();
        if stages == 0 {
            self.sum_e_cv2_intercept / self.weight_sum + floor
        } else {
            self.sum_e_cv2[stages - 1] / self.sum_w[stages - 1] + floor
        }
    }

    /// Growth rule for PLS directions.
    ///
    /// The first direction is grown as soon as the residual covariance is
    /// non-degenerate. Further directions require the newest one to be warmed
    /// up and to have cut the cross-validation error by more than the
    /// `add_threshold` ratio.
    fn should_add_direction(&self, params: &Hyperparameters<T>) -> bool {
        let k = self.n_reg();
        if k >= self.n_in() || norm_sq(&self.candidate) <= T::epsilon() {
            return false;
        }
        if k == 0 {
            return true;
        }
        self.n_data[k - 1] > T::from(DIRECTION_WARMUP).unwrap()
            && self.stage_mse(k) / self.stage_mse(k - 1) < params.add_threshold
    }

    /// Append a direction seeded from the candidate covariance.
    fn add_direction(&mut self, residual: &[T], target: T, w: T, params: &Hyperparameters<T>) {
        let n = self.n_in();
        let norm = norm_sq(&self.candidate).sqrt();
        let u: Vec<T> = self.candidate.iter().map(|&c| c / norm).collect();
        let s = dot(&u, residual);

        let ss_s2 = params.init_s2 + w * s * s;
        let ss_yres = w * target * s;
        let mut ss_xres: Vec<T> = u.iter().map(|&ui| params.init_s2 * ui).collect();
        axpy(w * s, residual, &mut ss_xres);
        let p: Vec<T> = ss_xres.iter().map(|&a| a / ss_s2).collect();

        self.sx_res_y_res
            .push(core::mem::replace(&mut self.candidate, vec![T::zero(); n]));
        self.u.push(u);
        self.p.push(p);
        self.beta.push(ss_yres / ss_s2);
        self.ss_s2.push(ss_s2);
        self.ss_yres.push(ss_yres);
        self.ss_xres.push(ss_xres);
        self.n_data.push(T::one());
        self.sum_w.push(w);
        self.sum_e_cv2.push(w * target * target);
        self.n_dofs.push(w * w * s * s / ss_s2);
        self.cost_h.push(T::zero());
        self.cost_r.push(T::zero());

        debug!(n_reg = self.n_reg(), "added PLS direction");
    }
}
