//! Error types for LWPR operations.
//!
//! ## Purpose
//!
//! This module defines the single error type returned by every fallible LWPR
//! operation: construction, configuration, training, prediction and inspection.
//!
//! ## Design notes
//!
//! * **Fail before mutation**: every variant is raised while checking a
//!   precondition, before the model is touched.
//! * **no_std friendly**: `Display` is hand-written; `std::error::Error` is only
//!   implemented with the `std` feature.
//!
//! ## Non-goals
//!
//! * This module does not perform any recovery or retry.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::{collections::TryReserveError, string::String};
#[cfg(feature = "std")]
use std::{collections::TryReserveError, string::String};

// External dependencies
use core::fmt;

/// Errors produced by the LWPR model and its configuration layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LwprError {
    /// Storage for a new model or receptive field could not be allocated.
    OutOfMemory,

    /// An input vector does not match the model's input dimensionality.
    BadInputDim {
        /// Configured input dimensionality.
        expected: usize,
        /// Length that was passed.
        got: usize,
    },

    /// An output vector does not match the model's output dimensionality.
    BadOutputDim {
        /// Configured output dimensionality.
        expected: usize,
        /// Length that was passed.
        got: usize,
    },

    /// The requested initial distance metric is not symmetric positive-definite.
    BadInitD,

    /// An unrecognised kernel name was requested.
    UnknownKernel(String),

    /// A persistence collaborator failed to read or write a model.
    IoError(String),

    /// An inspection request addressed an output dimension or field that does not exist.
    OutOfRange {
        /// What was being indexed ("output dimension" or "receptive field").
        what: &'static str,
        /// Requested index.
        index: usize,
        /// Number of available entries.
        len: usize,
    },

    /// A hyperparameter was set to a value outside its admissible range.
    InvalidParameter {
        /// Parameter name.
        parameter: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// A sample contained a NaN or infinite value.
    InvalidNumericValue(String),

    /// A builder parameter was configured more than once.
    DuplicateParameter {
        /// Parameter name.
        parameter: &'static str,
    },
}

impl fmt::Display for LwprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "Insufficient memory to allocate storage"),
            Self::BadInputDim { expected, got } => write!(
                f,
                "Input dimensionality does not match: expected {}, got {}",
                expected, got
            ),
            Self::BadOutputDim { expected, got } => write!(
                f,
                "Output dimensionality does not match: expected {}, got {}",
                expected, got
            ),
            Self::BadInitD => write!(
                f,
                "Invalid initial distance metric (not positive definite)"
            ),
            Self::UnknownKernel(name) => write!(f, "Unknown kernel: '{}'", name),
            Self::IoError(msg) => write!(f, "I/O error: {}", msg),
            Self::OutOfRange { what, index, len } => {
                write!(f, "Index {} out of range for {} (len {})", index, what, len)
            }
            Self::InvalidParameter { parameter, value } => {
                write!(f, "Invalid value for {}: {}", parameter, value)
            }
            Self::InvalidNumericValue(msg) => write!(f, "Invalid numeric value: {}", msg),
            Self::DuplicateParameter { parameter } => write!(
                f,
                "Parameter '{}' was set multiple times. Each parameter can only be configured once.",
                parameter
            ),
        }
    }
}

impl From<TryReserveError> for LwprError {
    fn from(_: TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LwprError {}
