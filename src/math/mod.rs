//! Layer 2: Math
//!
//! # Purpose
//!
//! This layer provides pure mathematical building blocks used throughout LWPR:
//! - Activation kernels and their derivatives
//! - Positive-definite distance metrics kept in factored form
//! - Running (weighted) statistics
//! - The nalgebra-backed linear algebra bridge
//!
//! These are reusable mathematical building blocks with no algorithm-specific logic.
//!
//! # Architecture
//!
//! ```text
//! Layer 6: API
//!   ↓
//! Layer 5: Engine
//!   ↓
//! Layer 4: Evaluation
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math ← You are here
//!   ↓
//! Layer 1: Primitives
//! ```

/// Activation kernels.
pub mod kernel;

/// Distance metrics `D = MᵀM`.
pub mod distance;

/// Running mean and variance trackers.
pub mod stats;

/// Linear algebra backend (nalgebra) and vector kernels.
pub mod linalg;
