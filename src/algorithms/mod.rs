//! Layer 3: Algorithms
//!
//! # Purpose
//!
//! This layer contains the learning rules of a single receptive field:
//! - Activation, local prediction and the incremental PLS update
//! - Gradient and meta-learning steps on the distance metric
//!
//! Nothing here knows about other fields or about output dimensions.
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
//! Layer 3: Algorithms ← You are here
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Receptive fields and incremental PLS.
pub mod receptive_field;

/// Distance metric adaptation.
pub mod metric;
