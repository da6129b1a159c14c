use std::sync::Arc;

use log::{debug, trace};
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::data::dataset::Dataset;
use crate::error::{NnError, Result};
use crate::layers::update::LayerUpdate;

/// Loss and per-layer gradients from one forward/backward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingResult {
    pub loss: f64,
    /// One update per layer, in declaration order.
    pub updates: Vec<LayerUpdate>,
}

impl TrainingResult {
    /// Mean loss, and per layer the mean of each named gradient.
    ///
    /// Summing before dividing makes the result independent of the order
    /// the results arrived in.
    pub fn aggregate(results: Vec<TrainingResult>) -> Result<TrainingResult> {
        let count = results.len();
        if count == 0 {
            return Err(NnError::EmptyAggregation);
        }

        let layers = results[0].updates.len();
        if results.iter().any(|r| r.updates.len() != layers) {
            return Err(NnError::DimensionMismatch(
                "training results disagree on the number of layers".to_string(),
            ));
        }

        let loss = results.iter().map(|r| r.loss).sum::<f64>() / count as f64;
        let updates = (0..layers)
            .map(|i| {
                let per_batch: Vec<LayerUpdate> =
                    results.iter().map(|r| r.updates[i].clone()).collect();
                LayerUpdate::aggregate(&per_batch)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TrainingResult { loss, updates })
    }
}

/// One forward/backward pass over a batch. The generator drives any
/// stochastic layers for that batch only.
pub type StepFn<'a> = dyn Fn(&Dataset, &mut ChaCha8Rng) -> TrainingResult + Sync + 'a;

/// Decides how an epoch's dataset is cut up and processed.
pub trait BatchExecutor: Send {
    fn execute(&mut self, dataset: &Dataset, step: &StepFn<'_>) -> Result<TrainingResult>;
}

/// The whole dataset as a single batch, on the calling thread.
#[derive(Debug, Clone)]
pub struct FullBatch {
    rng: ChaCha8Rng,
}

impl FullBatch {
    pub fn new(seed: u64) -> FullBatch {
        FullBatch { rng: ChaCha8Rng::seed_from_u64(seed) }
    }
}

impl BatchExecutor for FullBatch {
    fn execute(&mut self, dataset: &Dataset, step: &StepFn<'_>) -> Result<TrainingResult> {
        if dataset.is_empty() {
            return Err(NnError::EmptyAggregation);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.rng.next_u64());
        Ok(step(dataset, &mut rng))
    }
}

/// Shuffled mini-batches processed in parallel.
///
/// The shuffle and the per-batch seeds are drawn sequentially from the
/// executor's generator before anything is dispatched. Batches then only
/// read the shared parameters, and results are collected in batch order,
/// so a run is reproducible regardless of thread scheduling.
pub struct MiniBatch {
    batch_size: usize,
    rng: ChaCha8Rng,
    pool: Option<Arc<ThreadPool>>,
}

impl MiniBatch {
    /// Uses rayon's global pool.
    pub fn new(batch_size: usize, seed: u64) -> Result<MiniBatch> {
        if batch_size == 0 {
            return Err(NnError::InvalidConfig("batch size must be at least 1".to_string()));
        }
        Ok(MiniBatch { batch_size, rng: ChaCha8Rng::seed_from_u64(seed), pool: None })
    }

    /// Runs batches on a dedicated pool instead of the global one.
    pub fn with_pool(mut self, pool: Arc<ThreadPool>) -> MiniBatch {
        self.pool = Some(pool);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl BatchExecutor for MiniBatch {
    fn execute(&mut self, dataset: &Dataset, step: &StepFn<'_>) -> Result<TrainingResult> {
        let mut indices: Vec<usize> = (0..dataset.len()).collect();
        indices.shuffle(&mut self.rng);

        let rng = &mut self.rng;
        let chunks: Vec<(Vec<usize>, u64)> = indices
            .chunks(self.batch_size)
            .map(|chunk| (chunk.to_vec(), rng.next_u64()))
            .collect();
        debug!("dispatching {} mini-batches of up to {}", chunks.len(), self.batch_size);

        let run = || {
            chunks
                .par_iter()
                .map(|(chunk, seed)| {
                    let batch = dataset.select(chunk);
                    let mut batch_rng = ChaCha8Rng::seed_from_u64(*seed);
                    let result = step(&batch, &mut batch_rng);
                    trace!("mini-batch of {} samples: loss {:.6}", chunk.len(), result.loss);
                    result
                })
                .collect::<Vec<_>>()
        };
        let results = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };

        TrainingResult::aggregate(results)
    }
}
