#![cfg(feature = "dev")]

use approx::assert_relative_eq;
use lwpr_rs::internals::algorithms::metric::metric_derivatives;
use lwpr_rs::internals::algorithms::receptive_field::ReceptiveField;
use lwpr_rs::internals::math::distance::DistanceMetric;
use lwpr_rs::internals::math::kernel::Kernel;
use lwpr_rs::internals::primitives::params::Hyperparameters;
use rand::prelude::*;
use rand_distr::Uniform;

/// `(D, w)` for an explicit upper-triangular factor.
fn weight_from_factor(m: &[f64], n: usize, dx: &[f64], kernel: Kernel) -> (Vec<f64>, f64) {
    let mut d = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            d[i * n + j] = (0..n).map(|k| m[k * n + i] * m[k * n + j]).sum();
        }
    }
    let mut q = 0.0;
    for i in 0..n {
        for j in 0..n {
            q += dx[i] * d[i * n + j] * dx[j];
        }
    }
    (d, kernel.weight(q))
}

/// Central second difference of `f` along element `idx` of the factor `m`.
fn second_difference(m: &[f64], idx: usize, h: f64, f: impl Fn(&[f64]) -> f64) -> f64 {
    let mut plus = m.to_vec();
    let mut minus = m.to_vec();
    plus[idx] += h;
    minus[idx] -= h;
    (f(&plus) - 2.0 * f(m) + f(&minus)) / (h * h)
}

/// Smoothness penalty `penalty * sum(D_ij²)` for an explicit factor.
fn penalty_cost(m: &[f64], n: usize, penalty: f64) -> f64 {
    let (d, _) = weight_from_factor(m, n, &vec![0.0; n], Kernel::Gaussian);
    penalty * d.iter().map(|v| v * v).sum::<f64>()
}

// ============================================================================
// Derivative Tests
// ============================================================================

#[test]
fn test_dw_dm_matches_finite_difference() {
    let metric = DistanceMetric::full(&[4.0f64, 1.0, 1.0, 3.0], 2).unwrap();
    let dx = [0.3, -0.2];
    let n = 2;

    for kernel in [Kernel::Gaussian, Kernel::BiSquare] {
        let (_, w) = weight_from_factor(metric.m(), n, &dx, kernel);
        let derivs = metric_derivatives(&metric, &dx, w, kernel, 0.0, false, false);

        let h = 1e-7;
        for (a, b) in [(0, 0), (0, 1), (1, 1)] {
            let mut plus = metric.m().to_vec();
            let mut minus = metric.m().to_vec();
            plus[a * n + b] += h;
            minus[a * n + b] -= h;
            let numeric = (weight_from_factor(&plus, n, &dx, kernel).1
                - weight_from_factor(&minus, n, &dx, kernel).1)
                / (2.0 * h);
            assert_relative_eq!(derivs.dw_dm[a * n + b], numeric, epsilon = 1e-6);
        }
        // Lower triangle is never adapted.
        assert_eq!(derivs.dw_dm[n], 0.0);
    }
}

#[test]
fn test_penalty_gradient_matches_finite_difference() {
    let metric = DistanceMetric::full(&[2.0f64, 0.5, 0.5, 1.0], 2).unwrap();
    let dx = [0.1, 0.1];
    let n = 2;
    let penalty = 1.0;
    let w = Kernel::Gaussian.weight(metric.quadratic_form(&dx));
    let derivs = metric_derivatives(&metric, &dx, w, Kernel::Gaussian, penalty, false, false);

    let cost = |m: &[f64]| -> f64 {
        let (d, _) = weight_from_factor(m, n, &dx, Kernel::Gaussian);
        penalty * d.iter().map(|v| v * v).sum::<f64>()
    };

    let h = 1e-6;
    for (a, b) in [(0, 0), (0, 1), (1, 1)] {
        let mut plus = metric.m().to_vec();
        let mut minus = metric.m().to_vec();
        plus[a * n + b] += h;
        minus[a * n + b] -= h;
        let numeric = (cost(&plus) - cost(&minus)) / (2.0 * h);
        assert_relative_eq!(derivs.dj2_dm[a * n + b], numeric, epsilon = 1e-5);
    }
}

#[test]
fn test_activation_curvature_matches_finite_difference() {
    let metric = DistanceMetric::full(&[4.0f64, 1.0, 1.0, 3.0], 2).unwrap();
    let dx = [0.2, -0.1];
    let n = 2;

    for kernel in [Kernel::Gaussian, Kernel::BiSquare] {
        let (_, w) = weight_from_factor(metric.m(), n, &dx, kernel);
        assert!(w > 0.0);
        let derivs = metric_derivatives(&metric, &dx, w, kernel, 0.0, false, true);

        for (a, b) in [(0, 0), (0, 1), (1, 1)] {
            let idx = a * n + b;
            let numeric = second_difference(metric.m(), idx, 1e-4, |m| {
                weight_from_factor(m, n, &dx, kernel).1
            });
            assert_relative_eq!(derivs.dww_dmdm[idx], numeric, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_penalty_curvature_matches_finite_difference() {
    let metric = DistanceMetric::full(&[4.0f64, 1.0, 1.0, 3.0], 2).unwrap();
    let dx = [0.2, -0.1];
    let n = 2;
    let penalty = 1.0;
    let w = Kernel::Gaussian.weight(metric.quadratic_form(&dx));
    let derivs = metric_derivatives(&metric, &dx, w, Kernel::Gaussian, penalty, false, true);

    for (a, b) in [(0, 0), (0, 1), (1, 1)] {
        let idx = a * n + b;
        let numeric = second_difference(metric.m(), idx, 1e-4, |m| penalty_cost(m, n, penalty));
        assert_relative_eq!(derivs.dj2j2_dmdm[idx], numeric, max_relative = 1e-6);
    }
}

#[test]
fn test_diag_only_derivatives_with_full_metric() {
    let metric = DistanceMetric::full(&[4.0f64, 1.5, 1.5, 3.0], 2).unwrap();
    assert!(metric.m()[1] != 0.0);
    let dx = [0.3, -0.4];
    let n = 2;
    let penalty = 0.5;

    for kernel in [Kernel::Gaussian, Kernel::BiSquare] {
        let (_, w) = weight_from_factor(metric.m(), n, &dx, kernel);
        assert!(w > 0.0);
        let derivs = metric_derivatives(&metric, &dx, w, kernel, penalty, true, true);

        let h = 1e-7;
        for idx in [0, 3] {
            let mut plus = metric.m().to_vec();
            let mut minus = metric.m().to_vec();
            plus[idx] += h;
            minus[idx] -= h;
            let dw = (weight_from_factor(&plus, n, &dx, kernel).1
                - weight_from_factor(&minus, n, &dx, kernel).1)
                / (2.0 * h);
            assert_relative_eq!(derivs.dw_dm[idx], dw, epsilon = 1e-6);

            let dj2 = (penalty_cost(&plus, n, penalty) - penalty_cost(&minus, n, penalty)) / (2.0 * h);
            assert_relative_eq!(derivs.dj2_dm[idx], dj2, epsilon = 1e-5);

            let dww = second_difference(metric.m(), idx, 1e-4, |m| {
                weight_from_factor(m, n, &dx, kernel).1
            });
            assert_relative_eq!(derivs.dww_dmdm[idx], dww, epsilon = 1e-5);
        }

        // Off-diagonal elements are not adapted.
        for idx in [1, 2] {
            assert_eq!(derivs.dw_dm[idx], 0.0);
            assert_eq!(derivs.dj2_dm[idx], 0.0);
            assert_eq!(derivs.dww_dmdm[idx], 0.0);
            assert_eq!(derivs.dj2j2_dmdm[idx], 0.0);
        }
    }
}

#[test]
fn test_diag_only_derivatives() {
    let metric = DistanceMetric::spherical(4.0f64, 2).unwrap();
    let dx = [1.0, 0.5];
    let w = Kernel::Gaussian.weight(metric.quadratic_form(&dx));
    let derivs = metric_derivatives(&metric, &dx, w, Kernel::Gaussian, 0.0, true, false);

    // dq/dM00 = 2 M00 dx0² = 4, dw/dq = -w / 2
    assert_relative_eq!(derivs.dw_dm[0], -2.0 * w, epsilon = 1e-12);
    // dq/dM11 = 2 M11 dx1² = 1
    assert_relative_eq!(derivs.dw_dm[3], -0.5 * w, epsilon = 1e-12);
    assert_eq!(derivs.dw_dm[1], 0.0);
}

// ============================================================================
// Adaptation Tests
// ============================================================================

fn train_field(params: &Hyperparameters<f64>, metric: DistanceMetric<f64>, seed: u64) -> Vec<ReceptiveField<f64>> {
    let mut rf = ReceptiveField::new(&[0.0, 0.0], 0.0, metric, params);
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Uniform::new(-1.0f64, 1.0).unwrap();
    let mut snapshots = Vec::new();
    for i in 0..1500 {
        let x = [dist.sample(&mut rng), dist.sample(&mut rng)];
        let y = (3.0 * x[0]).sin() * x[1] + 0.2 * x[0];
        let w = rf.activation(&x, params.kernel);
        if w > 0.001 {
            rf.update(&x, y, w, params);
        }
        if i % 100 == 0 {
            snapshots.push(rf.clone());
        }
    }
    snapshots.push(rf);
    snapshots
}

#[test]
fn test_metric_stays_positive_definite() {
    for (diag_only, use_meta, kernel) in [
        (true, false, Kernel::Gaussian),
        (false, false, Kernel::Gaussian),
        (false, true, Kernel::Gaussian),
        (false, false, Kernel::BiSquare),
        (false, true, Kernel::BiSquare),
    ] {
        let params = Hyperparameters {
            diag_only,
            use_meta,
            kernel,
            ..Hyperparameters::default()
        };
        let metric = DistanceMetric::spherical(2.0, 2).unwrap();
        for rf in train_field(&params, metric, 13) {
            let d = rf.metric().d();
            let m = rf.metric().m();
            assert!(d.iter().all(|v| v.is_finite()));
            assert!(m[0] > 0.0 && m[3] > 0.0);
            assert!(rf.metric().min_eigenvalue() > 0.0);
            assert!(DistanceMetric::full(d, 2).is_ok());
            assert_relative_eq!(d[1], d[2], epsilon = 1e-12);
        }
    }
}

#[test]
fn test_diag_only_keeps_off_diagonal() {
    let params = Hyperparameters::<f64>::default();
    assert!(params.diag_only);
    let metric = DistanceMetric::spherical(2.0, 2).unwrap();
    let rf = train_field(&params, metric, 17).pop().unwrap();
    assert_eq!(rf.metric().m()[1], 0.0);
    assert_eq!(rf.metric().m()[2], 0.0);
}

#[test]
fn test_diag_only_with_full_initial_metric() {
    let params = Hyperparameters::<f64>::default();
    assert!(params.diag_only);
    let metric = DistanceMetric::full(&[2.0, 0.5, 0.5, 1.0], 2).unwrap();
    let initial = metric.m()[1];
    assert!(initial != 0.0);

    for rf in train_field(&params, metric.clone(), 29) {
        let m = rf.metric().m();
        let d = rf.metric().d();
        assert_eq!(m[1], initial);
        assert_eq!(m[2], 0.0);
        assert!(m[0] > 0.0 && m[3] > 0.0);
        assert!(d.iter().all(|v| v.is_finite()));
        assert!(rf.metric().min_eigenvalue() > 0.0);
    }
    let last = train_field(&params, metric.clone(), 29).pop().unwrap();
    assert_ne!(last.metric().m(), metric.m());
}

#[test]
fn test_frozen_metric_is_untouched() {
    let params = Hyperparameters {
        update_d: false,
        ..Hyperparameters::<f64>::default()
    };
    let metric = DistanceMetric::full(&[2.0, 0.3, 0.3, 1.0], 2).unwrap();
    let rf = train_field(&params, metric.clone(), 19).pop().unwrap();
    assert_eq!(rf.metric(), &metric);
}

#[test]
fn test_adaptation_changes_metric() {
    let params = Hyperparameters::<f64>::default();
    let metric = DistanceMetric::spherical(2.0, 2).unwrap();
    let rf = train_field(&params, metric.clone(), 23).pop().unwrap();
    assert_ne!(rf.metric().m(), metric.m());
}
