#![cfg(feature = "dev")]

use approx::assert_relative_eq;
use lwpr_rs::internals::algorithms::receptive_field::ReceptiveField;
use lwpr_rs::internals::engine::submodel::{Structural, SubModel};
use lwpr_rs::internals::math::distance::DistanceMetric;
use lwpr_rs::internals::math::kernel::Kernel;
use lwpr_rs::internals::primitives::errors::LwprError;
use lwpr_rs::internals::primitives::params::Hyperparameters;

fn params() -> Hyperparameters<f64> {
    Hyperparameters {
        update_d: false,
        ..Hyperparameters::default()
    }
}

fn metric(delta: f64) -> DistanceMetric<f64> {
    DistanceMetric::spherical(delta, 1).unwrap()
}

/// Run one full evaluate/apply cycle.
fn step(sub: &mut SubModel<f64>, x: f64, y: f64, params: &Hyperparameters<f64>) -> Structural {
    let eval = sub.evaluate(&[x], params).unwrap();
    sub.apply(&eval, &[x], y, params, &metric(4.0))
}

// ============================================================================
// Growth Tests
// ============================================================================

#[test]
fn test_first_sample_creates_field() {
    let p = params();
    let mut sub = SubModel::new();

    let eval = sub.evaluate(&[0.5], &p).unwrap();
    assert!(eval.weights.is_empty());
    assert!(eval.add);
    assert_eq!(eval.prediction, 0.0);

    let change = sub.apply(&eval, &[0.5], 2.0, &p, &metric(4.0));
    assert_eq!(change, Structural::Added(0));
    assert_eq!(sub.num_rfs(), 1);

    let rf = sub.field(0).unwrap();
    assert_eq!(rf.center(), &[0.5]);
    assert_eq!(rf.beta0(), 2.0);
    assert_eq!(rf.n_reg(), 0);
}

#[test]
fn test_nearby_sample_updates_existing_field() {
    let p = params();
    let mut sub = SubModel::new();
    step(&mut sub, 0.0, 1.0, &p);

    let eval = sub.evaluate(&[0.1], &p).unwrap();
    assert!(!eval.add);
    assert_relative_eq!(eval.weights[0], (-0.5 * 4.0 * 0.01f64).exp(), epsilon = 1e-12);
    assert_relative_eq!(eval.prediction, 1.0, epsilon = 1e-12);

    let change = sub.apply(&eval, &[0.1], 2.0, &p, &metric(4.0));
    assert_eq!(change, Structural::Unchanged);
    assert_eq!(sub.num_rfs(), 1);
    assert_eq!(sub.field(0).unwrap().n_reg(), 1);
}

#[test]
fn test_distant_sample_creates_second_field() {
    let p = params();
    let mut sub = SubModel::new();
    step(&mut sub, 0.0, 1.0, &p);

    // w = exp(-0.5 * 4 * 9) is far below w_gen.
    assert_eq!(step(&mut sub, 3.0, -1.0, &p), Structural::Added(1));
    assert_eq!(sub.num_rfs(), 2);
    assert_eq!(sub.field(1).unwrap().center(), &[3.0]);
    // The creating sample is not folded into the new field.
    assert_eq!(sub.field(1).unwrap().n_reg(), 0);
}

#[test]
fn test_add_field_rejects_other_dimensionality() {
    let p = params();
    let mut sub = SubModel::new();
    assert_eq!(
        sub.add_field(ReceptiveField::new(&[0.0], 0.0, metric(4.0), &p)),
        Ok(0)
    );

    let planar = DistanceMetric::spherical(4.0, 2).unwrap();
    assert_eq!(
        sub.add_field(ReceptiveField::new(&[0.0, 0.0], 0.0, planar, &p)),
        Err(LwprError::BadInputDim {
            expected: 1,
            got: 2
        })
    );
    assert_eq!(sub.num_rfs(), 1);
}

#[test]
fn test_evaluate_does_not_mutate() {
    let p = params();
    let mut sub = SubModel::new();
    step(&mut sub, 0.0, 1.0, &p);
    step(&mut sub, 0.2, 1.2, &p);

    let before = sub.clone();
    let _ = sub.evaluate(&[5.0], &p).unwrap();
    assert_eq!(sub, before);
}

// ============================================================================
// Pruning Tests
// ============================================================================

#[test]
fn test_prunes_less_trained_overlapping_field() {
    let p = Hyperparameters {
        w_prune: 0.9,
        ..params()
    };
    let mut sub = SubModel::new();

    let mut trained = ReceptiveField::new(&[0.0], 0.0, metric(4.0), &p);
    for i in 0..50 {
        let x = (i as f64 - 25.0) / 100.0;
        let w = trained.activation(&[x], p.kernel);
        trained.update(&[x], x, w, &p);
    }
    let trained_samples = trained.effective_samples();
    sub.add_field(trained).unwrap();
    sub.add_field(ReceptiveField::new(&[0.0], 0.0, metric(4.0), &p))
        .unwrap();

    assert_eq!(step(&mut sub, 0.0, 0.0, &p), Structural::Pruned(1));
    assert_eq!(sub.num_rfs(), 1);
    assert!(sub.field(0).unwrap().effective_samples() > trained_samples * 0.9);
}

#[test]
fn test_prune_tie_removes_later_field() {
    let p = Hyperparameters {
        w_prune: 0.9,
        ..params()
    };
    let mut sub = SubModel::new();
    sub.add_field(ReceptiveField::new(&[0.0], 0.0, metric(4.0), &p))
        .unwrap();
    sub.add_field(ReceptiveField::new(&[0.0], 0.0, metric(4.0), &p))
        .unwrap();
    sub.add_field(ReceptiveField::new(&[5.0], 0.0, metric(4.0), &p))
        .unwrap();

    assert_eq!(step(&mut sub, 0.0, 0.0, &p), Structural::Pruned(1));
    assert_eq!(sub.num_rfs(), 2);
    // swap_remove moves the last field into the freed slot.
    assert_eq!(sub.field(1).unwrap().center(), &[5.0]);
}

#[test]
fn test_default_w_prune_never_prunes() {
    let p = params();
    let mut sub = SubModel::new();
    sub.add_field(ReceptiveField::new(&[0.0], 0.0, metric(4.0), &p))
        .unwrap();
    sub.add_field(ReceptiveField::new(&[0.0], 0.0, metric(4.0), &p))
        .unwrap();

    assert_eq!(step(&mut sub, 0.0, 0.0, &p), Structural::Unchanged);
    assert_eq!(sub.num_rfs(), 2);
}

#[test]
fn test_add_excludes_prune() {
    let p = Hyperparameters {
        w_prune: 0.0001,
        w_gen: 0.5,
        ..params()
    };
    let mut sub = SubModel::new();
    sub.add_field(ReceptiveField::new(&[0.0], 0.0, metric(4.0), &p))
        .unwrap();
    sub.add_field(ReceptiveField::new(&[0.1], 0.0, metric(4.0), &p))
        .unwrap();

    // Both weights are below w_gen but above w_prune.
    assert_eq!(step(&mut sub, 1.0, 0.0, &p), Structural::Added(2));
    assert_eq!(sub.num_rfs(), 3);
}

// ============================================================================
// Prediction Tests
// ============================================================================

#[test]
fn test_predict_without_fields() {
    let sub = SubModel::<f64>::new();
    let blend = sub.predict(&[0.0], 0.001, Kernel::Gaussian);
    assert_eq!(blend.value, 0.0);
    assert_eq!(blend.confidence, 0.0);
    assert_eq!(blend.max_activation, 0.0);

    let mut g = [1.0];
    assert_eq!(sub.jacobian(&[0.0], 0.001, Kernel::Gaussian, &mut g), 0.0);
    assert_eq!(g, [0.0]);
}

#[test]
fn test_predict_blends_constant_fields() {
    let p = params();
    let mut sub = SubModel::new();
    sub.add_field(ReceptiveField::new(&[0.0], 1.0, metric(4.0), &p))
        .unwrap();
    sub.add_field(ReceptiveField::new(&[1.0], 3.0, metric(4.0), &p))
        .unwrap();

    // Equidistant query: equal weights.
    let blend = sub.predict(&[0.5], 0.0, Kernel::Gaussian);
    assert_relative_eq!(blend.value, 2.0, epsilon = 1e-12);
    assert_relative_eq!(blend.max_activation, (-0.5f64).exp(), epsilon = 1e-12);

    // No noise yet: only the spread of the local values remains.
    let w = (-0.5f64).exp();
    let expected = (w * 1.0 + w * 9.0 - 2.0 * w * 4.0).sqrt() / (2.0 * w);
    assert_relative_eq!(blend.confidence, expected, epsilon = 1e-12);
}

#[test]
fn test_cutoff_excludes_weak_fields() {
    let p = params();
    let mut sub = SubModel::new();
    sub.add_field(ReceptiveField::new(&[0.0], 1.0, metric(4.0), &p))
        .unwrap();
    sub.add_field(ReceptiveField::new(&[2.0], 5.0, metric(4.0), &p))
        .unwrap();

    let blend = sub.predict(&[0.1], 0.01, Kernel::Gaussian);
    assert_relative_eq!(blend.value, 1.0, epsilon = 1e-12);

    let all = sub.predict(&[0.1], 0.0, Kernel::Gaussian);
    assert!(all.value > 1.0);
}
