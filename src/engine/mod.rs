//! Layer 5: Engine
//!
//! # Purpose
//!
//! This layer orchestrates learning and prediction:
//! - The per-output field manager (evaluate, update, add, prune, blend)
//! - The model aggregating one field manager per output
//! - Input and parameter validation
//! - Prediction output types
//!
//! # Architecture
//!
//! ```text
//! Layer 6: API
//!   ↓
//! Layer 5: Engine ← You are here
//!   ↓
//! Layer 4: Evaluation
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Field manager of one output dimension.
pub mod submodel;

/// The LWPR model.
pub mod model;

/// Validation of samples and hyperparameters.
pub mod validator;

/// Prediction outputs.
pub mod output;
