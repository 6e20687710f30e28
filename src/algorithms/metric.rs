//! Distance metric adaptation of receptive fields.
//!
//! ## Purpose
//!
//! This module performs one stochastic gradient step on the upper-triangular
//! factor `M` of a receptive field's distance metric `D = MᵀM`, balancing the
//! field's leave-one-out prediction error against a smoothness penalty.
//!
//! ## Design notes
//!
//! * **Factor only**: `D` is rebuilt from `M` after the step.
//! * **Cost**: `J = E / W + penalty * Σ D_ij²`, with `E` the weighted
//!   cross-validation error, `W` the field's weight sum and the PLS leverage
//!   `h = w Σ s_k² / SSs2_k` folded into the incremental statistics `H`, `r`.
//! * **Meta learning**: each element of `M` keeps a log learning rate `b`
//!   adapted with an IDBD-style rule scaled by `meta_rate`.
//! * **Transient damping**: steps shrink when the current error is far above
//!   the field's average error.
//! * **Rejected steps**: a step larger than a tenth of `max|M|`, or one that
//!   would push a diagonal element of `M` to zero, is dropped and that
//!   element's learning rate halved.
//!
//! ## Invariants
//!
//! * The diagonal of `M` stays strictly positive, so `D` stays positive-definite.
//! * With `diag_only`, off-diagonal elements of `M` are never changed.
//!
//! ## Non-goals
//!
//! * This module does not update the regression itself.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;
use tracing::trace;

// Internal dependencies
use crate::algorithms::receptive_field::ReceptiveField;
use crate::math::distance::DistanceMetric;
use crate::math::kernel::Kernel;
use crate::primitives::params::Hyperparameters;

const EPS: f64 = 1e-10;

/// Largest accepted step, relative to the largest element of `M`.
const MAX_RELATIVE_STEP: f64 = 0.1;

/// Bound on a single change of a log learning rate.
const MAX_META_STEP: f64 = 0.1;

/// Bound on the log learning rates.
const MAX_LOG_ALPHA: f64 = 10.0;

/// Upper bound on the PLS leverage used in the cost statistics.
const MAX_LEVERAGE: f64 = 0.99;

// ============================================================================
// Derivatives
// ============================================================================

/// Derivatives of activation and penalty with respect to the elements of `M`.
///
/// All matrices are `n * n` row-major; only entries `(a, b)` with `a <= b`
/// (or `a == b` for `diag_only`) are populated.
#[derive(Debug, Clone)]
pub struct MetricDerivatives<T> {
    /// `dw/dM`.
    pub dw_dm: Vec<T>,
    /// `dJ2/dM` of the smoothness penalty.
    pub dj2_dm: Vec<T>,
    /// `d²w/dM²` (diagonal of the Hessian, meta learning only).
    pub dww_dmdm: Vec<T>,
    /// `d²J2/dM²` (diagonal of the Hessian, meta learning only).
    pub dj2j2_dmdm: Vec<T>,
}

/// Whether element `(a, b)` of `M` takes part in adaptation.
#[inline]
fn is_adapted(a: usize, b: usize, diag_only: bool) -> bool {
    if diag_only { a == b } else { a <= b }
}

/// Compute the derivatives of the activation `w` (at offset `dx`) and of the
/// smoothness penalty with respect to every adapted element of `M`.
pub fn metric_derivatives<T: Float>(
    metric: &DistanceMetric<T>,
    dx: &[T],
    w: T,
    kernel: Kernel,
    penalty: T,
    diag_only: bool,
    second_order: bool,
) -> MetricDerivatives<T> {
    let n = metric.dim();
    let m = metric.m();
    let d = metric.d();
    let two = T::from(2.0).unwrap();
    let dw_dq = kernel.dw_dq(w);

    let mut out = MetricDerivatives {
        dw_dm: vec![T::zero(); n * n],
        dj2_dm: vec![T::zero(); n * n],
        dww_dmdm: vec![T::zero(); n * n],
        dj2j2_dmdm: vec![T::zero(); n * n],
    };

    for a in 0..n {
        for b in a..n {
            if !is_adapted(a, b, diag_only) {
                continue;
            }
            let mut dq = T::zero();
            let mut sum_aux = T::zero();
            let mut sum_aux1 = T::zero();

            // Row a of dD/dM_ab is M[a][i] for i != b and 2 M[a][b] on the diagonal.
            // The off-diagonals of M enter here even when only the diagonal adapts.
            for i in a..n {
                if i == b {
                    let aux = two * m[a * n + i];
                    dq = dq + dx[i] * dx[b] * aux;
                    sum_aux = sum_aux + d[i * n + b] * aux;
                    sum_aux1 = sum_aux1 + aux * aux;
                } else {
                    let aux = m[a * n + i];
                    dq = dq + two * dx[i] * dx[b] * aux;
                    sum_aux = sum_aux + two * d[i * n + b] * aux;
                    sum_aux1 = sum_aux1 + two * aux * aux;
                }
            }

            let idx = a * n + b;
            let dw_dm = dw_dq * dq;
            out.dw_dm[idx] = dw_dm;
            out.dj2_dm[idx] = two * penalty * sum_aux;
            if second_order {
                out.dj2j2_dmdm[idx] = two * penalty * (two * d[b * n + b] + sum_aux1);
                out.dww_dmdm[idx] = kernel.curvature(w, dw_dm, dx[b] * dx[b]);
            }
        }
    }
    out
}

// ============================================================================
// Metric Step
// ============================================================================

/// Outcome of one adaptation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricStep {
    /// Number of elements of `M` that were changed.
    pub accepted: usize,
    /// Number of elements whose step was rejected.
    pub rejected: usize,
}

/// One gradient step on the distance metric of `rf`.
///
/// `dx` is the offset of the sample from the field's center, `e_cv` and `e`
/// the pre- and post-update residuals, and `s` the post-update projections.
pub fn adapt_metric<T: Float>(
    rf: &mut ReceptiveField<T>,
    dx: &[T],
    w: T,
    e_cv: T,
    e: T,
    s: &[T],
    params: &Hyperparameters<T>,
) -> MetricStep {
    let one = T::one();
    let two = T::from(2.0).unwrap();
    let eps = T::from(EPS).unwrap();
    let n = dx.len();
    let k = s.len();
    let lambda = rf.lambda;
    let meta = params.use_meta;

    let big_w = rf.weight_sum;
    if !(big_w > T::zero()) || !(w > T::zero()) {
        return MetricStep::default();
    }
    let big_e = if k > 0 {
        rf.sum_e_cv2[k - 1]
    } else {
        rf.sum_e_cv2_intercept
    };
    let e_cv2 = e_cv * e_cv;
    let e2 = e * e;

    // Damp steps right after a change of regime.
    let transient = ((rf.sum_e2 / (big_w + eps)) / (e2 + eps)).powi(4).min(one);

    // Leverage-weighted terms of the cross-validation cost.
    let ps: Vec<T> = s.iter().zip(&rf.ss_s2).map(|(&sk, &ss)| sk / ss).collect();
    let h = s
        .iter()
        .zip(&ps)
        .fold(T::zero(), |acc, (&sk, &pk)| acc + w * sk * pk)
        .min(T::from(MAX_LEVERAGE).unwrap());
    let mut sum_pse_h = T::zero();
    let mut sum_ps2_r = T::zero();
    for j in 0..k {
        sum_pse_h = sum_pse_h + ps[j] * e * rf.cost_h[j];
        sum_ps2_r = sum_ps2_r + ps[j] * ps[j] * rf.cost_r[j];
    }
    let dj1_dw = -big_e / (big_w * big_w) + (e_cv2 - two * sum_pse_h - two * sum_ps2_r) / big_w;

    let dj1_dj1_dw = if meta {
        let s_pse = s
            .iter()
            .zip(&ps)
            .fold(T::zero(), |acc, (&sk, &pk)| acc + sk * pk * e);
        let mut term = T::zero();
        for j in 0..k {
            term = term + (-(ps[j] * e) / big_w - two * ps[j] * s_pse) * rf.cost_h[j];
        }
        -e_cv2 / (big_w * big_w) - two / big_w * term + two / big_w * e2 * h / w
            - (e_cv2 - two * sum_pse_h) / (big_w * big_w)
            + two * big_e / (big_w * big_w * big_w)
    } else {
        T::zero()
    };

    for j in 0..k {
        rf.cost_h[j] = lambda * rf.cost_h[j] + (w / (one - h)) * s[j] * e_cv * transient;
        rf.cost_r[j] =
            lambda * rf.cost_r[j] + (w * w * e_cv2 / (one - h)) * s[j] * s[j] * transient;
    }

    let derivs = metric_derivatives(
        &rf.metric,
        dx,
        w,
        params.kernel,
        params.penalty,
        params.diag_only,
        meta,
    );

    let n_in = T::from(n).unwrap();
    let w_over_w = w / big_w;
    let mut dj_dm = vec![T::zero(); n * n];
    for a in 0..n {
        for b in a..n {
            if is_adapted(a, b, params.diag_only) {
                let idx = a * n + b;
                dj_dm[idx] = derivs.dw_dm[idx] * dj1_dw / n_in + w_over_w * derivs.dj2_dm[idx];
            }
        }
    }

    if meta {
        let max_step = T::from(MAX_META_STEP).unwrap();
        let max_b = T::from(MAX_LOG_ALPHA).unwrap();
        for a in 0..n {
            for b in a..n {
                if !is_adapted(a, b, params.diag_only) {
                    continue;
                }
                let idx = a * n + b;
                let djj = (derivs.dww_dmdm[idx] * dj1_dw
                    + derivs.dw_dm[idx] * derivs.dw_dm[idx] * dj1_dj1_dw)
                    / n_in
                    + w_over_w * derivs.dj2j2_dmdm[idx];
                let step = (params.meta_rate * transient * dj_dm[idx] * rf.meta_h[idx])
                    .max(-max_step)
                    .min(max_step);
                if !step.is_finite() || !djj.is_finite() {
                    continue;
                }
                rf.meta_b[idx] = (rf.meta_b[idx] - step).max(-max_b).min(max_b);
                rf.alpha[idx] = rf.meta_b[idx].exp();
                let decay = (one - rf.alpha[idx] * djj * transient).max(T::zero());
                rf.meta_h[idx] = rf.meta_h[idx] * decay - rf.alpha[idx] * dj_dm[idx] * transient;
            }
        }
    }

    let max_m = rf.metric.max_abs_factor();
    let limit = T::from(MAX_RELATIVE_STEP).unwrap() * max_m;
    let mut step = MetricStep::default();
    {
        let m = rf.metric.m_mut();
        for a in 0..n {
            for b in a..n {
                if !is_adapted(a, b, params.diag_only) {
                    continue;
                }
                let idx = a * n + b;
                let delta = rf.alpha[idx] * dj_dm[idx] * transient;
                if delta == T::zero() {
                    continue;
                }
                let updated = m[idx] - delta;
                let collapses = a == b && !(updated > eps * max_m);
                if !delta.is_finite() || delta.abs() > limit || collapses {
                    rf.alpha[idx] = rf.alpha[idx] / two;
                    rf.meta_b[idx] = rf.alpha[idx].ln();
                    step.rejected += 1;
                    continue;
                }
                m[idx] = updated;
                step.accepted += 1;
            }
        }
    }
    rf.metric.rebuild();

    if step.rejected > 0 {
        trace!(rejected = step.rejected, "reduced metric learning rate");
    }
    step
}
