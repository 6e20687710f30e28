//! Activation kernels for receptive fields.
//!
//! ## Purpose
//!
//! This module maps the quadratic distance `q = (x - c)ᵀ D (x - c)` of a sample
//! from a receptive field's center to an activation weight in `[0, 1]`, and
//! provides the derivatives the metric adaptation and the Jacobian need.
//!
//! ## Design notes
//!
//! * **Closed set**: the kernel is a two-variant enum chosen once at
//!   configuration time.
//! * **Derivatives in terms of w**: both kernels allow `dw/dq` to be written
//!   as a function of the activation itself, so callers never keep `q` around.
//!
//! ## Key concepts
//!
//! * **Gaussian**: `w = exp(-q / 2)`, infinite support.
//! * **BiSquare**: `w = (1 - q)²` for `q < 1`, zero otherwise.
//!
//! ## Invariants
//!
//! * `weight(q)` lies in `[0, 1]` for every `q >= 0`.
//! * `weight(0) == 1`.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::string::ToString;
#[cfg(feature = "std")]
use std::string::ToString;

// External dependencies
use core::fmt;
use core::str::FromStr;
use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// Internal dependencies
use crate::primitives::errors::LwprError;

// ============================================================================
// Kernel
// ============================================================================

/// Kernel mapping a quadratic distance to an activation weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Kernel {
    /// Gaussian kernel `exp(-q / 2)` (default).
    #[default]
    Gaussian,

    /// Bounded-support bi-square kernel `(1 - q)²` for `q < 1`.
    BiSquare,
}

impl Kernel {
    /// Activation weight for the quadratic distance `q`.
    #[inline]
    pub fn weight<T: Float>(&self, q: T) -> T {
        match self {
            Kernel::Gaussian => (-T::from(0.5).unwrap() * q).exp(),
            Kernel::BiSquare => {
                if q < T::one() {
                    let t = T::one() - q;
                    t * t
                } else {
                    T::zero()
                }
            }
        }
    }

    /// Derivative `dw/dq` expressed through the activation `w`.
    #[inline]
    pub fn dw_dq<T: Float>(&self, w: T) -> T {
        match self {
            Kernel::Gaussian => -T::from(0.5).unwrap() * w,
            Kernel::BiSquare => -T::from(2.0).unwrap() * w.sqrt(),
        }
    }

    /// Second-order term of `w` with respect to one metric factor element.
    ///
    /// `dw_dm` is the first derivative for that element and `dx_sq` the squared
    /// offset along the element's column, so that `d²q/dM² = 2 dx_sq`. Only
    /// used by meta learning.
    #[inline]
    pub fn curvature<T: Float>(&self, w: T, dw_dm: T, dx_sq: T) -> T {
        if w <= T::zero() {
            return T::zero();
        }
        match self {
            Kernel::Gaussian => dw_dm * dw_dm / w - w * dx_sq,
            Kernel::BiSquare => {
                dw_dm * dw_dm / (T::from(2.0).unwrap() * w)
                    - T::from(4.0).unwrap() * w.sqrt() * dx_sq
            }
        }
    }

    /// Canonical name of the kernel.
    pub const fn name(&self) -> &'static str {
        match self {
            Kernel::Gaussian => "Gaussian",
            Kernel::BiSquare => "BiSquare",
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kernel {
    type Err = LwprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Gaussian" => Ok(Kernel::Gaussian),
            "BiSquare" => Ok(Kernel::BiSquare),
            other => Err(LwprError::UnknownKernel(other.to_string())),
        }
    }
}
