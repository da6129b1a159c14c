use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use gradnet::{Matrix, OptimizerConfig, Regressor, TrainConfig};

/// Noisy samples of y = sin(3x) on [-1, 1], fitted by a small MLP with
/// mini-batches on two worker threads.
fn main() -> gradnet::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let xs: Vec<f64> = (0..256).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let ys: Vec<f64> = xs
        .iter()
        .map(|x| (3.0 * x).sin() + rng.gen_range(-0.05..0.05))
        .collect();

    let config = TrainConfig {
        batch_size: Some(32),
        threads: Some(2),
        patience: Some((25, 1e-5)),
        ..TrainConfig::new(OptimizerConfig::adam(0.01), 400)
    };
    let mut model = Regressor::new(1, &[16, 16], config);
    let trained = model.fit(&Matrix::row(&xs), &ys)?;
    println!(
        "stopped after {} epochs, best epoch {} with training loss {:.5}",
        trained.history.len(),
        trained.best_epoch,
        trained.history[trained.best_epoch - 1].training_loss
    );

    let probes = [-0.9, -0.5, 0.0, 0.5, 0.9];
    let predicted = model.predict(&Matrix::row(&probes))?;
    for (x, y) in probes.iter().zip(predicted) {
        println!("x = {x:+.2}  predicted {y:+.4}  actual {:+.4}", (3.0 * x).sin());
    }
    Ok(())
}
