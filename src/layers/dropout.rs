use rand::{Rng, RngCore};

use crate::error::{NnError, Result};
use crate::layers::dense::Layer;
use crate::layers::trainer::{Backward, BackwardFn, ForwardPass, LayerTrainer};
use crate::layers::update::LayerUpdate;
use crate::math::matrix::Matrix;

/// Inverted dropout. Zeroes each activation with probability `rate` and
/// scales survivors by 1/(1-rate), so inference needs no rescaling.
///
/// Has no parameters and no inference form: it is left out when the
/// trained network is materialised.
#[derive(Debug, Clone)]
pub struct DropoutTrainer {
    size: usize,
    rate: f64,
}

impl DropoutTrainer {
    pub fn new(size: usize, rate: f64) -> Result<DropoutTrainer> {
        if !(rate.is_finite() && (0.0..1.0).contains(&rate)) {
            return Err(NnError::InvalidConfig(format!(
                "dropout rate must be in [0, 1), got {rate}"
            )));
        }
        Ok(DropoutTrainer { size, rate })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    fn draw_mask(&self, rows: usize, cols: usize, rng: &mut dyn RngCore) -> Matrix {
        let scale = 1.0 / (1.0 - self.rate);
        let mut mask = Matrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                if rng.gen::<f64>() >= self.rate {
                    mask.data[i][j] = scale;
                }
            }
        }
        mask
    }
}

impl LayerTrainer for DropoutTrainer {
    fn input_size(&self) -> usize {
        self.size
    }

    fn output_size(&self) -> usize {
        self.size
    }

    fn forward(&self, input: &Matrix, rng: &mut dyn RngCore) -> ForwardPass {
        let mask = self.draw_mask(input.rows, input.cols, rng);
        let output = input.hadamard(&mask);

        let backward: BackwardFn = Box::new(move |output_gradient: &Matrix| Backward {
            input_gradient: output_gradient.hadamard(&mask),
            update: LayerUpdate::new(),
        });

        ForwardPass { output, backward }
    }

    fn infer(&self, input: &Matrix) -> Matrix {
        input.clone()
    }

    fn apply_updates(&mut self, _update: &LayerUpdate) -> Result<()> {
        Ok(())
    }

    fn is_inference(&self) -> bool {
        false
    }

    fn create_layer(&self) -> Result<Layer> {
        Err(NnError::Unsupported(
            "dropout has no inference-time layer".to_string(),
        ))
    }
}
