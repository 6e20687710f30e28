#![cfg(feature = "dev")]

use approx::assert_relative_eq;
use lwpr_rs::internals::math::kernel::Kernel;
use lwpr_rs::internals::primitives::errors::LwprError;
use std::str::FromStr;

// ============================================================================
// Weight Tests
// ============================================================================

#[test]
fn test_gaussian_weight() {
    let k = Kernel::Gaussian;
    assert_relative_eq!(k.weight(0.0f64), 1.0);
    assert_relative_eq!(k.weight(2.0f64), (-1.0f64).exp());
    assert!(k.weight(100.0f64) > 0.0);
    assert!(k.weight(100.0f64) < 1e-20);
}

#[test]
fn test_bisquare_weight() {
    let k = Kernel::BiSquare;
    assert_relative_eq!(k.weight(0.0f64), 1.0);
    assert_relative_eq!(k.weight(0.5f64), 0.25);
    assert_eq!(k.weight(1.0f64), 0.0);
    assert_eq!(k.weight(3.0f64), 0.0);
}

#[test]
fn test_weights_in_unit_interval() {
    for k in [Kernel::Gaussian, Kernel::BiSquare] {
        for i in 0..100 {
            let q = i as f64 * 0.05;
            let w = k.weight(q);
            assert!((0.0..=1.0).contains(&w), "{} at q={} gave {}", k, q, w);
        }
    }
}

#[test]
fn test_f32_weight() {
    assert_relative_eq!(Kernel::Gaussian.weight(1.0f32), (-0.5f32).exp());
}

// ============================================================================
// Derivative Tests
// ============================================================================

#[test]
fn test_dw_dq_matches_finite_difference() {
    let h = 1e-6;
    for k in [Kernel::Gaussian, Kernel::BiSquare] {
        for &q in &[0.1f64, 0.3, 0.7] {
            let numeric = (k.weight(q + h) - k.weight(q - h)) / (2.0 * h);
            let analytic = k.dw_dq(k.weight(q));
            assert_relative_eq!(analytic, numeric, epsilon = 1e-6, max_relative = 1e-5);
        }
    }
}

#[test]
fn test_curvature_zero_for_inactive() {
    assert_eq!(Kernel::Gaussian.curvature(0.0f64, 1.0, 1.0), 0.0);
    assert_eq!(Kernel::BiSquare.curvature(0.0f64, 1.0, 1.0), 0.0);
}

// ============================================================================
// Naming Tests
// ============================================================================

#[test]
fn test_kernel_names_round_trip() {
    for k in [Kernel::Gaussian, Kernel::BiSquare] {
        assert_eq!(Kernel::from_str(k.name()).unwrap(), k);
        assert_eq!(format!("{}", k), k.name());
    }
}

#[test]
fn test_unknown_kernel() {
    assert_eq!(
        Kernel::from_str("Tricube"),
        Err(LwprError::UnknownKernel("Tricube".to_string()))
    );
    assert!("gaussian".parse::<Kernel>().is_err());
}

#[test]
fn test_default_kernel() {
    assert_eq!(Kernel::default(), Kernel::Gaussian);
}
