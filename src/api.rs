//! High-level API for LWPR.
//!
//! ## Purpose
//!
//! This module provides the primary user-facing entry point for LWPR. It
//! implements a fluent builder for configuring every hyperparameter of a
//! model before its first update.
//!
//! ## Design notes
//!
//! * **Ergonomic**: Fluent builder with sensible defaults for all parameters.
//! * **Validated**: Everything is validated when `.build()` is called.
//! * **Type-Safe**: Generic over `Float` types for flexible precision.
//!
//! ### Configuration Flow
//!
//! 1. Create a [`LwprBuilder`] via `Lwpr::builder(n_in, n_out)`.
//! 2. Chain configuration methods (`.w_gen()`, `.init_d_spherical()`, etc.).
//! 3. Call `.build()` to obtain a ready-to-train [`Lwpr`] model.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// Internal dependencies
use crate::engine::validator::Validator;
use crate::math::linalg::FloatLinalg;

// Publicly re-exported types
pub use crate::engine::model::Lwpr;
pub use crate::engine::output::{JacobianOutput, Prediction};
pub use crate::evaluation::inspection::ReceptiveFieldView;
pub use crate::math::distance::InitialMetric;
pub use crate::math::kernel::Kernel;
pub use crate::primitives::errors::LwprError;
pub use crate::primitives::params::Hyperparameters;

impl<T: FloatLinalg> Lwpr<T> {
    /// Start configuring a model with `n_in` inputs and `n_out` outputs.
    pub fn builder(n_in: usize, n_out: usize) -> LwprBuilder<T> {
        LwprBuilder::new(n_in, n_out)
    }
}

/// Fluent builder for configuring an LWPR model.
#[derive(Debug, Clone)]
pub struct LwprBuilder<T: FloatLinalg> {
    /// Input dimensionality.
    pub n_in: usize,

    /// Output dimensionality.
    pub n_out: usize,

    /// Activation below which a new field is created.
    pub w_gen: Option<T>,

    /// Activation above which overlapping fields are pruned.
    pub w_prune: Option<T>,

    /// Smoothness penalty on distance metrics.
    pub penalty: Option<T>,

    /// Initial forgetting factor.
    pub init_lambda: Option<T>,

    /// Forgetting factor annealing rate.
    pub tau_lambda: Option<T>,

    /// Final forgetting factor.
    pub final_lambda: Option<T>,

    /// Prior of new projections' `SSs2`.
    pub init_s2: Option<T>,

    /// Initial learning rate of metric elements.
    pub init_alpha: Option<T>,

    /// Meta learning rate.
    pub meta_rate: Option<T>,

    /// Error ratio below which a new PLS direction is grown.
    pub add_threshold: Option<T>,

    /// Adapt distance metrics.
    pub update_d: Option<bool>,

    /// Adapt only the metric diagonal.
    pub diag_only: Option<bool>,

    /// Meta-learn learning rates.
    pub use_meta: Option<bool>,

    /// Activation kernel.
    pub kernel: Option<Kernel>,

    /// Initial metric of new fields.
    pub init_metric: Option<InitialMetric<T>>,

    /// Input normalization scales.
    pub norm_in: Option<Vec<T>>,

    /// Output normalization scales.
    pub norm_out: Option<Vec<T>>,

    /// Tracks if any parameter was set multiple times (for validation).
    #[doc(hidden)]
    pub duplicate_param: Option<&'static str>,
}

impl<T: FloatLinalg> LwprBuilder<T> {
    /// Create a new builder with default settings.
    pub fn new(n_in: usize, n_out: usize) -> Self {
        Self {
            n_in,
            n_out,
            w_gen: None,
            w_prune: None,
            penalty: None,
            init_lambda: None,
            tau_lambda: None,
            final_lambda: None,
            init_s2: None,
            init_alpha: None,
            meta_rate: None,
            add_threshold: None,
            update_d: None,
            diag_only: None,
            use_meta: None,
            kernel: None,
            init_metric: None,
            norm_in: None,
            norm_out: None,
            duplicate_param: None,
        }
    }

    /// Set the activation threshold below which a new field is created.
    pub fn w_gen(mut self, w_gen: T) -> Self {
        if self.w_gen.is_some() {
            self.duplicate_param = Some("w_gen");
        }
        self.w_gen = Some(w_gen);
        self
    }

    /// Set the activation threshold above which overlapping fields are pruned.
    pub fn w_prune(mut self, w_prune: T) -> Self {
        if self.w_prune.is_some() {
            self.duplicate_param = Some("w_prune");
        }
        self.w_prune = Some(w_prune);
        self
    }

    /// Set the smoothness penalty on distance metrics.
    pub fn penalty(mut self, penalty: T) -> Self {
        if self.penalty.is_some() {
            self.duplicate_param = Some("penalty");
        }
        self.penalty = Some(penalty);
        self
    }

    /// Set the initial forgetting factor.
    pub fn init_lambda(mut self, lambda: T) -> Self {
        if self.init_lambda.is_some() {
            self.duplicate_param = Some("init_lambda");
        }
        self.init_lambda = Some(lambda);
        self
    }

    /// Set the forgetting factor annealing rate.
    pub fn tau_lambda(mut self, tau: T) -> Self {
        if self.tau_lambda.is_some() {
            self.duplicate_param = Some("tau_lambda");
        }
        self.tau_lambda = Some(tau);
        self
    }

    /// Set the final forgetting factor.
    pub fn final_lambda(mut self, lambda: T) -> Self {
        if self.final_lambda.is_some() {
            self.duplicate_param = Some("final_lambda");
        }
        self.final_lambda = Some(lambda);
        self
    }

    /// Set the prior of new projections' `SSs2` accumulators.
    pub fn init_s2(mut self, init_s2: T) -> Self {
        if self.init_s2.is_some() {
            self.duplicate_param = Some("init_s2");
        }
        self.init_s2 = Some(init_s2);
        self
    }

    /// Set the initial learning rate of metric elements.
    pub fn init_alpha(mut self, alpha: T) -> Self {
        if self.init_alpha.is_some() {
            self.duplicate_param = Some("init_alpha");
        }
        self.init_alpha = Some(alpha);
        self
    }

    /// Set the meta learning rate.
    pub fn meta_rate(mut self, rate: T) -> Self {
        if self.meta_rate.is_some() {
            self.duplicate_param = Some("meta_rate");
        }
        self.meta_rate = Some(rate);
        self
    }

    /// Set the error ratio below which a new PLS direction is grown.
    pub fn add_threshold(mut self, threshold: T) -> Self {
        if self.add_threshold.is_some() {
            self.duplicate_param = Some("add_threshold");
        }
        self.add_threshold = Some(threshold);
        self
    }

    /// Enable or disable distance metric adaptation.
    pub fn update_d(mut self, update_d: bool) -> Self {
        if self.update_d.is_some() {
            self.duplicate_param = Some("update_d");
        }
        self.update_d = Some(update_d);
        self
    }

    /// Restrict metric adaptation to the diagonal.
    pub fn diag_only(mut self, diag_only: bool) -> Self {
        if self.diag_only.is_some() {
            self.duplicate_param = Some("diag_only");
        }
        self.diag_only = Some(diag_only);
        self
    }

    /// Enable or disable meta learning of learning rates.
    pub fn use_meta(mut self, use_meta: bool) -> Self {
        if self.use_meta.is_some() {
            self.duplicate_param = Some("use_meta");
        }
        self.use_meta = Some(use_meta);
        self
    }

    /// Set the activation kernel.
    pub fn kernel(mut self, kernel: Kernel) -> Self {
        if self.kernel.is_some() {
            self.duplicate_param = Some("kernel");
        }
        self.kernel = Some(kernel);
        self
    }

    /// Set the initial metric of new fields.
    pub fn init_metric(mut self, spec: InitialMetric<T>) -> Self {
        if self.init_metric.is_some() {
            self.duplicate_param = Some("init_metric");
        }
        self.init_metric = Some(spec);
        self
    }

    /// Set a spherical initial metric `delta * I`.
    pub fn init_d_spherical(self, delta: T) -> Self {
        self.init_metric(InitialMetric::Spherical(delta))
    }

    /// Set a diagonal initial metric.
    pub fn init_d_diagonal(self, diag: &[T]) -> Self {
        self.init_metric(InitialMetric::Diagonal(diag.to_vec()))
    }

    /// Set a full initial metric (row-major).
    pub fn init_d_full(self, d: &[T]) -> Self {
        self.init_metric(InitialMetric::Full(d.to_vec()))
    }

    /// Set the input normalization scales.
    pub fn norm_in(mut self, norm: &[T]) -> Self {
        if self.norm_in.is_some() {
            self.duplicate_param = Some("norm_in");
        }
        self.norm_in = Some(norm.to_vec());
        self
    }

    /// Set the output normalization scales.
    pub fn norm_out(mut self, norm: &[T]) -> Self {
        if self.norm_out.is_some() {
            self.duplicate_param = Some("norm_out");
        }
        self.norm_out = Some(norm.to_vec());
        self
    }

    /// Validate the configuration and create the model.
    pub fn build(self) -> Result<Lwpr<T>, LwprError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;

        let mut model = Lwpr::new(self.n_in, self.n_out)?;

        let defaults = model.params().clone();
        let params = Hyperparameters {
            w_gen: self.w_gen.unwrap_or(defaults.w_gen),
            w_prune: self.w_prune.unwrap_or(defaults.w_prune),
            penalty: self.penalty.unwrap_or(defaults.penalty),
            init_lambda: self.init_lambda.unwrap_or(defaults.init_lambda),
            tau_lambda: self.tau_lambda.unwrap_or(defaults.tau_lambda),
            final_lambda: self.final_lambda.unwrap_or(defaults.final_lambda),
            init_s2: self.init_s2.unwrap_or(defaults.init_s2),
            init_alpha: self.init_alpha.unwrap_or(defaults.init_alpha),
            add_threshold: self.add_threshold.unwrap_or(defaults.add_threshold),
            meta_rate: self.meta_rate.unwrap_or(defaults.meta_rate),
            update_d: self.update_d.unwrap_or(defaults.update_d),
            diag_only: self.diag_only.unwrap_or(defaults.diag_only),
            use_meta: self.use_meta.unwrap_or(defaults.use_meta),
            kernel: self.kernel.unwrap_or(defaults.kernel),
        };
        model.set_params(params)?;

        if let Some(spec) = &self.init_metric {
            model.set_init_metric(spec)?;
        }
        if let Some(norm) = &self.norm_in {
            model.set_norm_in(norm)?;
        }
        if let Some(norm) = &self.norm_out {
            model.set_norm_out(norm)?;
        }
        Ok(model)
    }
}
