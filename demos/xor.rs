use gradnet::{
    ActivationFunction, Dataset, EpochOutcome, LossType, NetworkSpec, OptimizerConfig, TrainConfig,
};

fn main() -> gradnet::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let spec = NetworkSpec::new("xor", 2)
        .dense(4, ActivationFunction::Tanh)
        .dense(1, ActivationFunction::Sigmoid)
        .loss(LossType::BinaryCrossEntropy);

    let inputs = vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ];
    let expected_outputs = vec![
        vec![1.0],
        vec![0.0],
        vec![1.0],
        vec![0.0],
    ];
    let data = Dataset::from_samples(&inputs, &expected_outputs)?;

    let config = TrainConfig {
        score_threshold: Some(-0.01),
        ..TrainConfig::new(OptimizerConfig::adam(0.05), 2000)
    };
    let mut trainer = config
        .trainer_builder(&spec)?
        .listener(|o: &EpochOutcome| {
            if o.epoch % 200 == 0 {
                println!("Epoch {}: loss = {:.6}", o.epoch, o.training_loss);
            }
        })
        .build()?;
    let trained = trainer.train(&data)?;

    println!("best epoch {} (loss {:.6})", trained.best_epoch, -trained.best_score);
    for input in &inputs {
        let output = trained.network.predict_sample(input)?;
        println!("Input: {:?} -> Output: {:.4}", input, output[0]);
    }
    Ok(())
}
