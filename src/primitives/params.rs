//! Hyperparameters shared by every receptive field of a model.
//!
//! ## Purpose
//!
//! This module holds the scalar and boolean settings that steer the
//! incremental PLS update, the distance metric adaptation and the field
//! manager. The model owns one instance and lends it to its submodels.
//!
//! ## Invariants
//!
//! * Forgetting factors lie in (0, 1].
//! * `w_gen` lies in (0, 1]; `w_prune` in (0, 1] (1 disables pruning).
//! * `init_s2`, `init_alpha`, `meta_rate` and `add_threshold` are strictly
//!   positive; `penalty` is non-negative.

// External dependencies
use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// Internal dependencies
use crate::math::kernel::Kernel;

/// Activation below which a field is neither updated nor counted in the
/// update-time prediction.
pub const ACTIVATION_FLOOR: f64 = 0.001;

/// Global LWPR hyperparameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hyperparameters<T> {
    /// Activation threshold below which a new field is created.
    pub w_gen: T,

    /// Activation threshold above which two overlapping fields trigger pruning.
    pub w_prune: T,

    /// Smoothness penalty on the distance metric.
    pub penalty: T,

    /// Initial forgetting factor.
    pub init_lambda: T,

    /// Annealing rate of the forgetting factor.
    pub tau_lambda: T,

    /// Final forgetting factor.
    pub final_lambda: T,

    /// Prior added to each new projection's `SSs2` accumulator.
    pub init_s2: T,

    /// Initial learning rate of every metric element.
    pub init_alpha: T,

    /// Cross-validation error ratio below which a new PLS direction is grown.
    pub add_threshold: T,

    /// Learning rate of the second-order (meta) step-size adaptation.
    pub meta_rate: T,

    /// Whether distance metrics are adapted at all.
    pub update_d: bool,

    /// Whether only the diagonal of the metric factor is adapted.
    pub diag_only: bool,

    /// Whether per-element learning rates are adapted.
    pub use_meta: bool,

    /// Activation kernel.
    pub kernel: Kernel,
}

impl<T: Float> Default for Hyperparameters<T> {
    fn default() -> Self {
        Self {
            w_gen: T::from(0.1).unwrap(),
            w_prune: T::one(),
            penalty: T::from(1e-6).unwrap(),
            init_lambda: T::from(0.999).unwrap(),
            tau_lambda: T::from(0.9999).unwrap(),
            final_lambda: T::from(0.99999).unwrap(),
            init_s2: T::from(1e-10).unwrap(),
            init_alpha: T::from(50.0).unwrap(),
            add_threshold: T::from(0.5).unwrap(),
            meta_rate: T::from(250.0).unwrap(),
            update_d: true,
            diag_only: true,
            use_meta: false,
            kernel: Kernel::Gaussian,
        }
    }
}

impl<T: Float> Hyperparameters<T> {
    /// Activation floor converted to `T`.
    #[inline]
    pub fn activation_floor() -> T {
        T::from(ACTIVATION_FLOOR).unwrap()
    }

    /// One annealing step of a forgetting factor towards `final_lambda`.
    #[inline]
    pub fn anneal(&self, lambda: T) -> T {
        self.tau_lambda * lambda + self.final_lambda * (T::one() - self.tau_lambda)
    }
}
