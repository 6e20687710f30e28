//! Linear algebra backend abstraction for LWPR.
//!
//! ## Purpose
//!
//! This module provides the dense factorizations LWPR needs (Cholesky of an
//! initial distance metric, eigenvalues of a metric for diagnostics) through a
//! trait that bridges generic `Float` code to the nalgebra backend, plus a few
//! small vector kernels used by the incremental updates.
//!
//! ## Design notes
//!
//! * Matrices are exchanged as row-major slices of length `n * n`.
//! * The Cholesky factor is returned in the upper-triangular form `M` with
//!   `A = MᵀM`, which is the parameterization the metric adaptation works on.
//! * Generic over `FloatLinalg` types (f32 and f64) which delegate to nalgebra.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use core::fmt::Debug;
use num_traits::Float;

// ============================================================================
// FloatLinalg Trait
// ============================================================================

/// Helper trait to bridge generic Float types to the nalgebra backend.
pub trait FloatLinalg: Float + Debug + 'static {
    /// Upper-triangular factor `M` of a symmetric positive-definite matrix,
    /// so that `a = MᵀM`. Returns `None` if `a` is not symmetric
    /// positive-definite.
    fn cholesky_upper(a: &[Self], n: usize) -> Option<Vec<Self>>;

    /// Eigenvalues of a symmetric matrix, in no particular order.
    fn symmetric_eigenvalues(a: &[Self], n: usize) -> Vec<Self>;
}

impl FloatLinalg for f64 {
    #[inline]
    fn cholesky_upper(a: &[Self], n: usize) -> Option<Vec<Self>> {
        nalgebra_backend::cholesky_upper_f64(a, n)
    }
    #[inline]
    fn symmetric_eigenvalues(a: &[Self], n: usize) -> Vec<Self> {
        nalgebra_backend::symmetric_eigenvalues_f64(a, n)
    }
}

impl FloatLinalg for f32 {
    #[inline]
    fn cholesky_upper(a: &[Self], n: usize) -> Option<Vec<Self>> {
        nalgebra_backend::cholesky_upper_f32(a, n)
    }
    #[inline]
    fn symmetric_eigenvalues(a: &[Self], n: usize) -> Vec<Self> {
        nalgebra_backend::symmetric_eigenvalues_f32(a, n)
    }
}

// ============================================================================
// Vector Kernels
// ============================================================================

/// Dot product of two equally long slices.
#[inline]
pub fn dot<T: Float>(a: &[T], b: &[T]) -> T {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .fold(T::zero(), |acc, (&ai, &bi)| acc + ai * bi)
}

/// `y += alpha * x`.
#[inline]
pub fn axpy<T: Float>(alpha: T, x: &[T], y: &mut [T]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, &xi) in y.iter_mut().zip(x.iter()) {
        *yi = *yi + alpha * xi;
    }
}

/// Squared Euclidean norm.
#[inline]
pub fn norm_sq<T: Float>(a: &[T]) -> T {
    dot(a, a)
}

/// Symmetry check with a tolerance relative to the largest entry.
pub fn is_symmetric<T: Float>(a: &[T], n: usize) -> bool {
    let scale = a.iter().fold(T::zero(), |m, &v| m.max(v.abs()));
    let tol = scale * T::epsilon() * T::from(n.max(1) * 16).unwrap();
    for i in 0..n {
        for j in (i + 1)..n {
            if (a[i * n + j] - a[j * n + i]).abs() > tol {
                return false;
            }
        }
    }
    true
}

// ============================================================================
// Nalgebra Backend Implementation
// ============================================================================

/// Nalgebra-based linear algebra operations.
pub mod nalgebra_backend {
    use super::*;
    use nalgebra::DMatrix;

    /// Upper Cholesky factor using f64 precision.
    pub fn cholesky_upper_f64(a: &[f64], n: usize) -> Option<Vec<f64>> {
        if a.len() != n * n || !is_symmetric(a, n) || a.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let matrix = DMatrix::from_row_slice(n, n, a);
        let l = matrix.cholesky()?.unpack();
        // M = Lᵀ, stored row-major: M[i][j] = L[j][i].
        let mut m = vec![0.0; n * n];
        for i in 0..n {
            for j in i..n {
                m[i * n + j] = l[(j, i)];
            }
        }
        if (0..n).any(|i| m[i * n + i] <= 0.0) {
            return None;
        }
        Some(m)
    }

    /// Symmetric eigenvalues using f64 precision.
    pub fn symmetric_eigenvalues_f64(a: &[f64], n: usize) -> Vec<f64> {
        let matrix = DMatrix::from_row_slice(n, n, a);
        matrix.symmetric_eigenvalues().as_slice().to_vec()
    }

    /// Upper Cholesky factor using f32 precision.
    pub fn cholesky_upper_f32(a: &[f32], n: usize) -> Option<Vec<f32>> {
        if a.len() != n * n || !is_symmetric(a, n) || a.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let matrix = DMatrix::from_row_slice(n, n, a);
        let l = matrix.cholesky()?.unpack();
        let mut m = vec![0.0; n * n];
        for i in 0..n {
            for j in i..n {
                m[i * n + j] = l[(j, i)];
            }
        }
        if (0..n).any(|i| m[i * n + i] <= 0.0) {
            return None;
        }
        Some(m)
    }

    /// Symmetric eigenvalues using f32 precision.
    pub fn symmetric_eigenvalues_f32(a: &[f32], n: usize) -> Vec<f32> {
        let matrix = DMatrix::from_row_slice(n, n, a);
        matrix.symmetric_eigenvalues().as_slice().to_vec()
    }
}
