// Trains a network described by JSON files, or a built-in linear
// regression when none are given.
//
//   gradnet [SPEC.json [CONFIG.json]]
//
// Progress is logged; set RUST_LOG=debug for per-epoch detail.
use std::process::ExitCode;

use log::{error, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use gradnet::train::LoggingListener;
use gradnet::{ActivationFunction, Dataset, Matrix, NetworkSpec, OptimizerConfig, TrainConfig};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let spec = match args.first() {
        Some(path) => match NetworkSpec::load_json(path) {
            Ok(spec) => spec,
            Err(e) => {
                error!("cannot read network spec {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => NetworkSpec::new("linear", 2).dense(1, ActivationFunction::Identity),
    };
    let config = match args.get(1) {
        Some(path) => match TrainConfig::load_json(path) {
            Ok(config) => config,
            Err(e) => {
                error!("cannot read training config {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => TrainConfig::new(OptimizerConfig::Sgd { learning_rate: 0.1 }, 200),
    };

    match run(&spec, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Fits `spec` to y = 2·x1 + 3·x2 + ... over random inputs in [-1, 1].
fn run(spec: &NetworkSpec, config: &TrainConfig) -> gradnet::Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let samples = 200;
    let features = Matrix::from_fn(spec.input_size, samples, |_, _| rng.gen_range(-1.0..1.0));
    let labels = Matrix::from_fn(spec.output_size(), samples, |_, c| {
        (0..spec.input_size).map(|r| (r + 2) as f64 * features.value_at(r, c)).sum()
    });
    let split = Dataset::new(features, labels)?.split(&[0.8], &mut rng)?;

    let mut trainer = config
        .trainer_builder(spec)?
        .validation(split[1].clone())
        .listener(LoggingListener)
        .build()?;
    let trained = trainer.train(&split[0])?;

    info!(
        "`{}`: best epoch {} of {}, score {:.6}",
        spec.name,
        trained.best_epoch,
        trained.history.len(),
        trained.best_score
    );
    for (i, layer) in trained.network.layers().iter().enumerate() {
        info!("layer {i} weights: {:?}", layer.weights().data);
    }
    Ok(())
}
