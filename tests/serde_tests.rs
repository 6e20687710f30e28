#![cfg(all(feature = "dev", feature = "serde"))]

use approx::assert_relative_eq;
use lwpr_rs::prelude::*;
use rand::prelude::*;
use rand_distr::Uniform;

fn trained_model() -> Lwpr<f64> {
    let mut model = Lwpr::builder(2, 1)
        .init_d_spherical(4.0)
        .norm_in(&[1.0, 2.0])
        .use_meta(true)
        .build()
        .unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let dist = Uniform::new(-1.0f64, 1.0).unwrap();
    for _ in 0..300 {
        let x = [dist.sample(&mut rng), dist.sample(&mut rng)];
        model.update(&x, &[x[0].sin() * x[1]]).unwrap();
    }
    model
}

#[test]
fn test_model_round_trip() {
    let model = trained_model();
    let json = serde_json::to_string(&model).unwrap();
    let restored: Lwpr<f64> = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.n_in(), model.n_in());
    assert_eq!(restored.n_data(), model.n_data());
    assert_eq!(restored.num_rfs(0).unwrap(), model.num_rfs(0).unwrap());
    assert_eq!(restored.params().kernel, model.params().kernel);

    for q in [[0.0, 0.0], [0.5, -0.5], [-0.3, 0.8]] {
        let a = model.predict_with_confidence(&q, 0.001).unwrap();
        let b = restored.predict_with_confidence(&q, 0.001).unwrap();
        assert_relative_eq!(a.values[0], b.values[0], epsilon = 1e-10);
        assert_relative_eq!(a.confidence[0], b.confidence[0], epsilon = 1e-10);
    }
}

#[test]
fn test_restored_model_keeps_learning() {
    let model = trained_model();
    let json = serde_json::to_string(&model).unwrap();
    let mut restored: Lwpr<f64> = serde_json::from_str(&json).unwrap();

    restored.update(&[0.2, 0.2], &[0.1]).unwrap();
    assert_eq!(restored.n_data(), model.n_data() + 1);
}

#[test]
fn test_kernel_and_params_serialize() {
    let params = Hyperparameters::<f64> {
        kernel: Kernel::BiSquare,
        ..Hyperparameters::default()
    };
    let json = serde_json::to_string(&params).unwrap();
    let back: Hyperparameters<f64> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, params);
}
