//! Distance metrics of receptive fields.
//!
//! ## Purpose
//!
//! This module stores a receptive field's positive-definite distance metric
//! `D` together with the upper-triangular factor `M` it is derived from, and
//! evaluates the quadratic distance `(x - c)ᵀ D (x - c)`.
//!
//! ## Design notes
//!
//! * **Factor first**: adaptation only ever touches `M`; `D` is rebuilt as
//!   `MᵀM`, so it cannot lose symmetry or definiteness through round-off.
//! * **Row-major**: both matrices are `n * n` row-major slices; the lower
//!   triangle of `M` is kept at zero.
//!
//! ## Invariants
//!
//! * `D == MᵀM` after every mutation made through this type.
//! * The diagonal of `M` is strictly positive, hence `D` is positive-definite.
//!
//! ## Non-goals
//!
//! * This module does not decide how `M` is adapted (see `algorithms::metric`).

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// Internal dependencies
use crate::math::linalg::FloatLinalg;
use crate::primitives::errors::LwprError;

// ============================================================================
// Distance Metric
// ============================================================================

/// Positive-definite distance metric `D = MᵀM`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DistanceMetric<T> {
    dim: usize,
    d: Vec<T>,
    m: Vec<T>,
}

impl<T: Float> DistanceMetric<T> {
    /// Spherical metric `delta * I`.
    pub fn spherical(delta: T, dim: usize) -> Result<Self, LwprError> {
        if !(delta > T::zero()) || !delta.is_finite() || dim == 0 {
            return Err(LwprError::BadInitD);
        }
        let root = delta.sqrt();
        let mut m = vec![T::zero(); dim * dim];
        for i in 0..dim {
            m[i * dim + i] = root;
        }
        Ok(Self::from_factor_unchecked(m, dim))
    }

    /// Diagonal metric with the given (strictly positive) diagonal.
    pub fn diagonal(diag: &[T]) -> Result<Self, LwprError> {
        let dim = diag.len();
        if dim == 0 || diag.iter().any(|&v| !(v > T::zero()) || !v.is_finite()) {
            return Err(LwprError::BadInitD);
        }
        let mut m = vec![T::zero(); dim * dim];
        for (i, &v) in diag.iter().enumerate() {
            m[i * dim + i] = v.sqrt();
        }
        Ok(Self::from_factor_unchecked(m, dim))
    }

    /// Build from an upper-triangular factor whose diagonal is already known
    /// to be positive.
    pub(crate) fn from_factor_unchecked(m: Vec<T>, dim: usize) -> Self {
        debug_assert_eq!(m.len(), dim * dim);
        let mut metric = Self {
            dim,
            d: vec![T::zero(); dim * dim],
            m,
        };
        metric.rebuild();
        metric
    }

    /// Input dimensionality.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The metric `D` (row-major).
    #[inline]
    pub fn d(&self) -> &[T] {
        &self.d
    }

    /// The upper-triangular factor `M` (row-major).
    #[inline]
    pub fn m(&self) -> &[T] {
        &self.m
    }

    /// Mutable access to `M`; callers must call [`rebuild`](Self::rebuild) afterwards.
    #[inline]
    pub(crate) fn m_mut(&mut self) -> &mut [T] {
        &mut self.m
    }

    /// Recompute `D = MᵀM` from the factor.
    pub fn rebuild(&mut self) {
        let n = self.dim;
        for i in 0..n {
            for j in i..n {
                // Only rows k <= min(i, j) of an upper-triangular M contribute.
                let mut sum = T::zero();
                for k in 0..=i {
                    sum = sum + self.m[k * n + i] * self.m[k * n + j];
                }
                self.d[i * n + j] = sum;
                self.d[j * n + i] = sum;
            }
        }
    }

    /// Quadratic distance `dxᵀ D dx` for an offset `dx = x - c`.
    #[inline]
    pub fn quadratic_form(&self, dx: &[T]) -> T {
        debug_assert_eq!(dx.len(), self.dim);
        let n = self.dim;
        let mut q = T::zero();
        for i in 0..n {
            let row = &self.d[i * n..(i + 1) * n];
            let mut acc = T::zero();
            for (j, &dj) in dx.iter().enumerate() {
                acc = acc + row[j] * dj;
            }
            q = q + dx[i] * acc;
        }
        q
    }

    /// Gradient of the quadratic distance with respect to `x`: `2 D dx`.
    pub fn quadratic_form_gradient(&self, dx: &[T], out: &mut [T]) {
        let n = self.dim;
        let two = T::from(2.0).unwrap();
        for (i, o) in out.iter_mut().enumerate().take(n) {
            let row = &self.d[i * n..(i + 1) * n];
            let mut acc = T::zero();
            for (j, &dj) in dx.iter().enumerate() {
                acc = acc + row[j] * dj;
            }
            *o = two * acc;
        }
    }

    /// Largest absolute entry of the factor.
    pub fn max_abs_factor(&self) -> T {
        self.m.iter().fold(T::zero(), |acc, &v| acc.max(v.abs()))
    }
}

impl<T: FloatLinalg> DistanceMetric<T> {
    /// Full metric from a row-major `dim * dim` matrix.
    ///
    /// Fails with [`LwprError::BadInitD`] unless the matrix is symmetric
    /// positive-definite.
    pub fn full(d: &[T], dim: usize) -> Result<Self, LwprError> {
        if dim == 0 || d.len() != dim * dim {
            return Err(LwprError::BadInitD);
        }
        let m = T::cholesky_upper(d, dim).ok_or(LwprError::BadInitD)?;
        Ok(Self::from_factor_unchecked(m, dim))
    }

    /// Smallest eigenvalue of `D`.
    pub fn min_eigenvalue(&self) -> T {
        T::symmetric_eigenvalues(&self.d, self.dim)
            .into_iter()
            .fold(T::infinity(), T::min)
    }
}

// ============================================================================
// Initial Metric
// ============================================================================

/// Specification of the metric every new receptive field starts with.
#[derive(Debug, Clone, PartialEq)]
pub enum InitialMetric<T> {
    /// `delta * I`.
    Spherical(T),

    /// Diagonal matrix with the given entries.
    Diagonal(Vec<T>),

    /// Full row-major `n * n` matrix.
    Full(Vec<T>),
}

impl<T: FloatLinalg> InitialMetric<T> {
    /// Validate the specification for `dim` inputs and build the metric.
    pub fn build(&self, dim: usize) -> Result<DistanceMetric<T>, LwprError> {
        match self {
            InitialMetric::Spherical(delta) => DistanceMetric::spherical(*delta, dim),
            InitialMetric::Diagonal(diag) => {
                if diag.len() != dim {
                    return Err(LwprError::BadInputDim {
                        expected: dim,
                        got: diag.len(),
                    });
                }
                DistanceMetric::diagonal(diag)
            }
            InitialMetric::Full(d) => {
                if d.len() != dim * dim {
                    return Err(LwprError::BadInputDim {
                        expected: dim * dim,
                        got: d.len(),
                    });
                }
                DistanceMetric::full(d, dim)
            }
        }
    }
}
