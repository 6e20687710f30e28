//! Layer 1: Primitives
//!
//! # Purpose
//!
//! Fundamental types shared by every other layer: the error taxonomy and the
//! model-wide hyperparameters.

/// Error types.
pub mod errors;

/// Model-wide hyperparameters.
pub mod params;
