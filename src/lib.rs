//! # LWPR — Locally Weighted Projection Regression for Rust
//!
//! An incremental, online, non-linear function approximator. LWPR learns from
//! a stream of input/output pairs, one sample at a time, and represents the
//! function as a blend of local linear models ("receptive fields") that grow,
//! move, reshape and disappear as data arrives.
//!
//! ## What is LWPR?
//!
//! Every receptive field covers a region of input space through a kernel
//! activation `w = K((x - c)ᵀ D (x - c))` and fits a local linear model with
//! incremental partial least squares (PLS), so that high-dimensional inputs
//! with a low-dimensional local structure stay cheap to learn. The distance
//! metric `D` of each field is itself adapted online by gradient descent on a
//! leave-one-out error, and the prediction is the activation-weighted average
//! of the local models.
//!
//! **Key properties:**
//! - Constant-time updates per sample (proportional to the active fields)
//! - No stored training data: every statistic is a fading-memory running sum
//! - Copes with non-stationary functions through forgetting factors
//! - Provides confidence bounds and analytic Jacobians
//!
//! **Common applications:**
//! - Learning inverse dynamics and kinematics in robot control loops
//! - Sensor fusion and online calibration
//! - Any regression problem where data arrives sequentially
//!
//! ## Quick Start
//!
//! ### Typical Use
//!
//! ```rust
//! use lwpr_rs::prelude::*;
//!
//! let mut model = Lwpr::<f64>::builder(1, 1)
//!     .init_d_spherical(10.0)
//!     .w_gen(0.2)
//!     .build()?;
//!
//! for i in 0..2000 {
//!     let x = -1.0 + 2.0 * ((i * 7919) % 2000) as f64 / 2000.0;
//!     model.update(&[x], &[2.0 * x])?;
//! }
//!
//! let y = model.predict(&[0.5], 0.001)?;
//! println!("f(0.5) = {:.3} using {} fields", y[0], model.num_rfs(0)?);
//! # Ok::<(), LwprError>(())
//! ```
//!
//! ### Confidence and Jacobian
//!
//! ```rust
//! use lwpr_rs::prelude::*;
//!
//! let mut model = Lwpr::<f64>::builder(2, 1)
//!     .init_d_spherical(4.0)
//!     .build()?;
//!
//! for i in 0..500 {
//!     let a = (i % 25) as f64 / 25.0;
//!     let b = (i / 25) as f64 / 20.0;
//!     model.update(&[a, b], &[a + 0.5 * b])?;
//! }
//!
//! let out = model.predict_with_confidence(&[0.4, 0.4], 0.001)?;
//! println!("{}", out);
//!
//! let jac = model.predict_jacobian(&[0.4, 0.4], 0.001)?;
//! println!("dy/dx = {:?}", jac.gradient(0));
//! # Ok::<(), LwprError>(())
//! ```
//!
//! ### Result and Error Handling
//!
//! Every fallible operation returns `Result<_, LwprError>`, and a failed call
//! never leaves the model partially updated:
//!
//! ```rust
//! use lwpr_rs::prelude::*;
//!
//! let mut model = Lwpr::<f64>::new(2, 1)?;
//! match model.update(&[1.0], &[0.0]) {
//!     Err(LwprError::BadInputDim { expected, got }) => {
//!         assert_eq!((expected, got), (2, 1));
//!     }
//!     other => panic!("unexpected: {:?}", other),
//! }
//! assert_eq!(model.n_data(), 0);
//! # Ok::<(), LwprError>(())
//! ```
//!
//! ## Minimal Usage (no_std / Embedded)
//!
//! The crate supports `no_std` environments with an allocator. Disable the
//! default features in `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! lwpr-rs = { version = "0.1", default-features = false }
//! ```
//!
//! ## Parameters
//!
//! | Parameter         | Default        | Range        | Description                                         |
//! |-------------------|----------------|--------------|-----------------------------------------------------|
//! | **w_gen**         | 0.1            | (0, 1]       | Create a field when no activation reaches this      |
//! | **w_prune**       | 1.0            | (0, 1]       | Prune when two activations exceed this (1 = never)  |
//! | **penalty**       | 1e-6           | [0, ∞)       | Smoothness penalty on distance metrics              |
//! | **init_lambda**   | 0.999          | (0, 1]       | Initial forgetting factor                           |
//! | **tau_lambda**    | 0.9999         | (0, 1]       | Annealing rate of the forgetting factor             |
//! | **final_lambda**  | 0.99999        | (0, 1]       | Final forgetting factor                             |
//! | **init_s2**       | 1e-10          | (0, ∞)       | Prior of new projections' variance accumulators     |
//! | **init_alpha**    | 50             | (0, ∞)       | Initial metric learning rate                        |
//! | **add_threshold** | 0.5            | (0, ∞)       | Error ratio below which a PLS direction is grown    |
//! | **meta_rate**     | 250            | (0, ∞)       | Learning rate of the learning rates                 |
//! | **update_d**      | true           | bool         | Adapt distance metrics                              |
//! | **diag_only**     | true           | bool         | Adapt only the metric diagonal                      |
//! | **use_meta**      | false          | bool         | Meta-learn per-element learning rates               |
//! | **kernel**        | Gaussian       | enum         | `Gaussian` or `BiSquare`                            |
//! | **init_metric**   | Spherical(25)  | SPD matrix   | Distance metric of new fields                       |
//! | **norm_in**       | 1              | (0, ∞)       | Per-input normalization scale                       |
//! | **norm_out**      | 1              | (0, ∞)       | Per-output normalization scale                      |
//!
//! Every parameter can also be read and changed on a trained model through
//! its getters and `set_*` methods, with the same validation.
//!
//! ### Kernels
//!
//! ```rust
//! use lwpr_rs::prelude::*;
//!
//! let model = Lwpr::<f64>::builder(3, 1).kernel(BiSquare).build()?;
//! assert_eq!(model.kernel(), Kernel::BiSquare);
//! # Ok::<(), LwprError>(())
//! ```
//!
//! ### Inspection
//!
//! ```rust
//! use lwpr_rs::prelude::*;
//!
//! let mut model = Lwpr::<f64>::new(1, 1)?;
//! for i in 0..100 {
//!     let x = i as f64 / 100.0;
//!     model.update(&[x], &[x * x])?;
//! }
//! for idx in 0..model.num_rfs(0)? {
//!     let rf = model.receptive_field(0, idx)?;
//!     println!("center {:?} n_reg {} vip {:?}", rf.center(), rf.n_reg(), rf.vip());
//! }
//! # Ok::<(), LwprError>(())
//! ```
//!
//! ## References
//!
//! - Vijayakumar, S., D'Souza, A. & Schaal, S. (2005). "Incremental Online Learning in High Dimensions"
//! - Schaal, S. & Atkeson, C. G. (1998). "Constructive Incremental Learning from Only Local Information"
//!
//! ## License
//!
//! See the repository for license information and contribution guidelines.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]

#[cfg(not(feature = "std"))]
#[macro_use]
extern crate alloc;

// ============================================================================
// Internal Modules
// ============================================================================

// Layer 1: Primitives - errors and hyperparameters.
mod primitives;

// Layer 2: Math - pure mathematical functions.
//
// Contains activation kernels, factored distance metrics, running statistics
// and the nalgebra linear algebra bridge.
mod math;

// Layer 3: Algorithms - the learning rules of one receptive field.
//
// Contains the incremental PLS update and the distance metric adaptation.
mod algorithms;

// Layer 4: Evaluation - read-only views of trained state.
mod evaluation;

// Layer 5: Engine - orchestration.
//
// Contains the per-output field manager, the model, validation and the
// prediction outputs.
mod engine;

// High-level fluent API for LWPR.
//
// Provides the `LwprBuilder` for configuring models.
mod api;

// ============================================================================
// Prelude
// ============================================================================

/// Standard LWPR prelude.
///
/// This module is intended to be wildcard-imported for convenient access
/// to the most commonly used types:
///
/// ```
/// use lwpr_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::api::{
        Hyperparameters, InitialMetric, JacobianOutput, Kernel,
        Kernel::{BiSquare, Gaussian},
        Lwpr, LwprBuilder, LwprError, Prediction, ReceptiveFieldView,
    };
}

// ============================================================================
// Testing re-exports
// ============================================================================

/// Internal modules for development and testing.
///
/// This module re-exports internal modules for development and testing purposes.
/// It is only available with the `dev` feature enabled.
///
/// **Warning**: These are internal implementation details and may change without notice.
/// Do not use in production code.
#[cfg(feature = "dev")]
pub mod internals {
    /// Internal primitive types and utilities.
    pub mod primitives {
        pub use crate::primitives::*;
    }
    /// Internal math functions.
    pub mod math {
        pub use crate::math::*;
    }
    /// Internal core algorithms.
    pub mod algorithms {
        pub use crate::algorithms::*;
    }
    /// Internal execution engine.
    pub mod engine {
        pub use crate::engine::*;
    }
    /// Internal evaluation and inspection.
    pub mod evaluation {
        pub use crate::evaluation::*;
    }
    /// Internal API.
    pub mod api {
        pub use crate::api::*;
    }
}
