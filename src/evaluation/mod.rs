//! Layer 4: Evaluation
//!
//! # Purpose
//!
//! This layer provides read-only views of trained state:
//! - Per-field inspection (directions, coefficients, metric, VIP scores)
//!
//! # Architecture
//!
//! ```text
//! Layer 6: API
//!   ↓
//! Layer 5: Engine
//!   ↓
//! Layer 4: Evaluation ← You are here
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Read-only receptive field views.
pub mod inspection;
