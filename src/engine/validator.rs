//! Validation of samples and hyperparameters.
//!
//! ## Purpose
//!
//! This module checks everything a caller can hand to the model (sample
//! vectors, query vectors, hyperparameter values, normalization scales) before
//! any state is mutated.
//!
//! ## Design notes
//!
//! * **Fail-Fast**: Validation stops at the first error encountered.
//! * **Efficiency**: Dimension checks run before finiteness scans.
//! * **Generics**: Validation is generic over `Float` types.
//!
//! ## Invariants
//!
//! * Validation logic is deterministic and side-effect free.
//!
//! ## Non-goals
//!
//! * This module does not correct or clamp invalid values.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::format;

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::primitives::errors::LwprError;
use crate::primitives::params::Hyperparameters;

// ============================================================================
// Validator
// ============================================================================

/// Validation utility for LWPR samples and configuration.
///
/// All methods return `Result<(), LwprError>` and fail fast upon identifying
/// the first violation.
pub struct Validator;

impl Validator {
    // ========================================================================
    // Sample Validation
    // ========================================================================

    /// Validate an input vector against the configured input dimensionality.
    pub fn validate_input<T: Float>(x: &[T], n_in: usize) -> Result<(), LwprError> {
        if x.len() != n_in {
            return Err(LwprError::BadInputDim {
                expected: n_in,
                got: x.len(),
            });
        }
        Self::validate_finite(x, "x")
    }

    /// Validate an output vector against the configured output dimensionality.
    pub fn validate_output<T: Float>(y: &[T], n_out: usize) -> Result<(), LwprError> {
        if y.len() != n_out {
            return Err(LwprError::BadOutputDim {
                expected: n_out,
                got: y.len(),
            });
        }
        Self::validate_finite(y, "y")
    }

    /// Validate that every element of `values` is finite.
    pub fn validate_finite<T: Float>(values: &[T], name: &str) -> Result<(), LwprError> {
        for (i, &val) in values.iter().enumerate() {
            if !val.is_finite() {
                return Err(LwprError::InvalidNumericValue(format!(
                    "{}[{}]={}",
                    name,
                    i,
                    val.to_f64().unwrap_or(f64::NAN)
                )));
            }
        }
        Ok(())
    }

    /// Validate an activation cutoff (finite and non-negative).
    pub fn validate_cutoff<T: Float>(cutoff: T) -> Result<(), LwprError> {
        if !cutoff.is_finite() || cutoff < T::zero() {
            return Err(invalid("cutoff", cutoff));
        }
        Ok(())
    }

    // ========================================================================
    // Parameter Validation
    // ========================================================================

    /// Validate a model dimensionality (must be at least one).
    pub fn validate_dimension(dim: usize, name: &'static str) -> Result<(), LwprError> {
        if dim == 0 {
            return Err(LwprError::InvalidParameter {
                parameter: name,
                value: 0.0,
            });
        }
        Ok(())
    }

    /// Validate a value in the half-open unit interval (0, 1].
    pub fn validate_unit_interval<T: Float>(val: T, name: &'static str) -> Result<(), LwprError> {
        if !val.is_finite() || val <= T::zero() || val > T::one() {
            return Err(invalid(name, val));
        }
        Ok(())
    }

    /// Validate a strictly positive, finite value.
    pub fn validate_positive<T: Float>(val: T, name: &'static str) -> Result<(), LwprError> {
        if !val.is_finite() || val <= T::zero() {
            return Err(invalid(name, val));
        }
        Ok(())
    }

    /// Validate a non-negative, finite value.
    pub fn validate_non_negative<T: Float>(val: T, name: &'static str) -> Result<(), LwprError> {
        if !val.is_finite() || val < T::zero() {
            return Err(invalid(name, val));
        }
        Ok(())
    }

    /// Validate a normalization vector: correct length and strictly positive.
    pub fn validate_norm<T: Float>(
        norm: &[T],
        expected: usize,
        name: &'static str,
    ) -> Result<(), LwprError> {
        if norm.len() != expected {
            return Err(if name == "norm_out" {
                LwprError::BadOutputDim {
                    expected,
                    got: norm.len(),
                }
            } else {
                LwprError::BadInputDim {
                    expected,
                    got: norm.len(),
                }
            });
        }
        for &v in norm {
            Self::validate_positive(v, name)?;
        }
        Ok(())
    }

    /// Validate every hyperparameter.
    pub fn validate_hyperparameters<T: Float>(params: &Hyperparameters<T>) -> Result<(), LwprError> {
        Self::validate_unit_interval(params.w_gen, "w_gen")?;
        Self::validate_unit_interval(params.w_prune, "w_prune")?;
        Self::validate_non_negative(params.penalty, "penalty")?;
        Self::validate_unit_interval(params.init_lambda, "init_lambda")?;
        Self::validate_unit_interval(params.tau_lambda, "tau_lambda")?;
        Self::validate_unit_interval(params.final_lambda, "final_lambda")?;
        Self::validate_positive(params.init_s2, "init_s2")?;
        Self::validate_positive(params.init_alpha, "init_alpha")?;
        Self::validate_positive(params.meta_rate, "meta_rate")?;
        Self::validate_positive(params.add_threshold, "add_threshold")?;
        Ok(())
    }

    /// Validate that no parameter was configured more than once.
    pub fn validate_no_duplicates(duplicate: Option<&'static str>) -> Result<(), LwprError> {
        if let Some(parameter) = duplicate {
            return Err(LwprError::DuplicateParameter { parameter });
        }
        Ok(())
    }
}

fn invalid<T: Float>(parameter: &'static str, value: T) -> LwprError {
    LwprError::InvalidParameter {
        parameter,
        value: value.to_f64().unwrap_or(f64::NAN),
    }
}
