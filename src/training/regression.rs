//! SuperKnob regression
//!
//! Fits a linear 1 → K mapping from one knob position to K target knob
//! values with plain full-batch gradient descent. Samples are visited in
//! insertion order and the weights start at zero, so two trainers fed the
//! same data produce bit-identical fits.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{MagicKnobError, Result};

/// Default learning rate
pub const DEFAULT_LEARNING_RATE: f32 = 0.5;

/// How often training progress is logged
const LOG_INTERVAL: usize = 10_000;

/// One recorded (input, outputs) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub input: f32,
    pub outputs: Vec<f32>,
}

/// Outcome of a training run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingReport {
    pub iterations: usize,
    pub mse: f32,
}

/// Trainable 1 → K linear mapping plus its sample set
#[derive(Debug, Clone)]
pub struct RegressionModel {
    num_outputs: usize,
    learning_rate: f32,
    weights: Vec<f32>,
    biases: Vec<f32>,
    samples: Vec<TrainingSample>,
    trained: bool,
}

impl RegressionModel {
    /// Create a fresh, untrained model with `num_outputs` outputs
    pub fn new(num_outputs: usize) -> Self {
        Self::with_learning_rate(num_outputs, DEFAULT_LEARNING_RATE)
    }

    pub fn with_learning_rate(num_outputs: usize, learning_rate: f32) -> Self {
        Self {
            num_outputs,
            learning_rate,
            weights: vec![0.0; num_outputs],
            biases: vec![0.0; num_outputs],
            samples: Vec::new(),
            trained: false,
        }
    }

    /// Append a training pair; duplicates are kept
    pub fn add_sample(&mut self, input: f32, outputs: &[f32]) -> Result<()> {
        if outputs.len() != self.num_outputs {
            return Err(MagicKnobError::OutputWidthMismatch {
                expected: self.num_outputs,
                found: outputs.len(),
            });
        }
        self.samples.push(TrainingSample {
            input,
            outputs: outputs.to_vec(),
        });
        Ok(())
    }

    /// Run exactly `iterations` gradient-descent steps over all samples
    ///
    /// Continues from the current weights. Descent runs on the
    /// standardised input `(x - mean) / std`, so the step size does not
    /// depend on the input range. A run that ends in non-finite weights
    /// fails with `TrainingFailed` and restores the previous fit.
    pub fn train(&mut self, iterations: usize) -> Result<TrainingReport> {
        if self.samples.is_empty() {
            return Err(MagicKnobError::NoTrainingData);
        }

        info!(
            "Training SuperKnob on {} sample(s) for {} iteration(s)",
            self.samples.len(),
            iterations
        );

        let (mean, scale) = self.input_stats();
        let n = self.samples.len() as f32;
        let inputs: Vec<f32> = self.samples.iter().map(|s| (s.input - mean) / scale).collect();

        // Parameters of y = a * x' + c in the standardised space
        let mut slopes: Vec<f32> = self.weights.iter().map(|w| w * scale).collect();
        let mut offsets: Vec<f32> = self
            .weights
            .iter()
            .zip(&self.biases)
            .map(|(w, b)| b + w * mean)
            .collect();

        let mut grad_a = vec![0.0_f32; self.num_outputs];
        let mut grad_c = vec![0.0_f32; self.num_outputs];

        for step in 0..iterations {
            grad_a.iter_mut().for_each(|g| *g = 0.0);
            grad_c.iter_mut().for_each(|g| *g = 0.0);

            for (sample, &x) in self.samples.iter().zip(&inputs) {
                for k in 0..self.num_outputs {
                    let error = slopes[k] * x + offsets[k] - sample.outputs[k];
                    grad_a[k] += 2.0 * error * x / n;
                    grad_c[k] += 2.0 * error / n;
                }
            }

            for k in 0..self.num_outputs {
                slopes[k] -= self.learning_rate * grad_a[k];
                offsets[k] -= self.learning_rate * grad_c[k];
            }

            if (step + 1) % LOG_INTERVAL == 0 {
                debug!("Iteration {}: slopes = {:?}", step + 1, slopes);
            }
        }

        let weights: Vec<f32> = slopes.iter().map(|a| a / scale).collect();
        let biases: Vec<f32> = offsets
            .iter()
            .zip(&weights)
            .map(|(c, w)| c - w * mean)
            .collect();

        if weights.iter().chain(&biases).any(|v| !v.is_finite()) {
            warn!("Training diverged, keeping the previous SuperKnob mapping");
            return Err(MagicKnobError::TrainingFailed {
                reason: "weights became non-finite".to_string(),
            });
        }

        self.weights = weights;
        self.biases = biases;
        self.trained = true;
        let report = TrainingReport {
            iterations,
            mse: self.mse(),
        };
        info!("Training finished: mse = {:.6}", report.mse);
        Ok(report)
    }

    /// Mean and standard deviation of the inputs (std 1 when they are all equal)
    fn input_stats(&self) -> (f32, f32) {
        let n = self.samples.len() as f64;
        let mean = self.samples.iter().map(|s| s.input as f64).sum::<f64>() / n;
        let var = self
            .samples
            .iter()
            .map(|s| (s.input as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        let std = var.sqrt();
        let scale = if std > f64::EPSILON && std.is_finite() { std } else { 1.0 };
        (mean as f32, scale as f32)
    }

    /// Map a knob position to K outputs
    pub fn forward(&self, input: f32) -> Result<Vec<f32>> {
        if !self.trained {
            return Err(MagicKnobError::NotTrained);
        }
        Ok(self.predict(input))
    }

    /// Mean squared error over all samples and outputs (0 when empty)
    pub fn mse(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: f32 = self
            .samples
            .iter()
            .map(|s| {
                self.predict(s.input)
                    .iter()
                    .zip(&s.outputs)
                    .map(|(p, t)| (p - t) * (p - t))
                    .sum::<f32>()
            })
            .sum();
        total / (self.samples.len() * self.num_outputs) as f32
    }

    /// Discard samples and weights, back to the fresh state
    pub fn reset(&mut self) {
        *self = Self::with_learning_rate(self.num_outputs, self.learning_rate);
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    pub fn samples(&self) -> &[TrainingSample] {
        &self.samples
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    fn predict(&self, input: f32) -> Vec<f32> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(w, b)| w * input + b)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fitted_line() -> RegressionModel {
        let mut model = RegressionModel::new(2);
        // dist = x, lpf = 1 - x
        for x in [0.0_f32, 0.25, 0.5, 0.75, 1.0] {
            model.add_sample(x, &[x, 1.0 - x]).unwrap();
        }
        model
    }

    #[test]
    fn test_forward_before_training_fails() {
        let model = fitted_line();
        assert_eq!(model.forward(0.5).unwrap_err().error_code(), "NOT_TRAINED");
    }

    #[test]
    fn test_train_without_samples_is_a_no_op() {
        let mut model = RegressionModel::new(2);
        let err = model.train(100).unwrap_err();
        assert_eq!(err.error_code(), "NO_TRAINING_DATA");
        assert!(!model.is_trained());
    }

    #[test]
    fn test_output_width_is_checked() {
        let mut model = RegressionModel::new(2);
        let err = model.add_sample(0.5, &[0.1]).unwrap_err();
        assert_eq!(err.error_code(), "OUTPUT_WIDTH_MISMATCH");
        assert!(model.samples().is_empty());
    }

    #[test]
    fn test_fits_linear_targets() {
        let mut model = fitted_line();
        let report = model.train(5_000).unwrap();

        assert!(model.is_trained());
        assert!(report.mse < 1e-8, "mse was {}", report.mse);

        let out = model.forward(0.3).unwrap();
        assert_relative_eq!(out[0], 0.3, epsilon = 1e-3);
        assert_relative_eq!(out[1], 0.7, epsilon = 1e-3);
    }

    #[test]
    fn test_second_run_is_no_worse() {
        let mut model = RegressionModel::with_learning_rate(2, 0.05);
        for x in [0.0_f32, 0.25, 0.5, 0.75, 1.0] {
            model.add_sample(x, &[x, 1.0 - x]).unwrap();
        }
        let first = model.train(50).unwrap();
        let second = model.train(50).unwrap();
        assert!(second.mse <= first.mse);
    }

    #[test]
    fn test_training_is_deterministic() {
        let mut a = fitted_line();
        let mut b = fitted_line();
        a.train(1_000).unwrap();
        b.train(1_000).unwrap();

        assert_eq!(a.weights(), b.weights());
        assert_eq!(a.biases(), b.biases());
    }

    #[test]
    fn test_single_sample_fits_constant() {
        let mut model = RegressionModel::new(2);
        model.add_sample(0.4, &[0.9, 0.1]).unwrap();
        model.train(2_000).unwrap();

        let out = model.forward(0.4).unwrap();
        assert_relative_eq!(out[0], 0.9, epsilon = 1e-4);
        assert_relative_eq!(out[1], 0.1, epsilon = 1e-4);
    }

    #[test]
    fn test_reset_discards_everything() {
        let mut model = fitted_line();
        model.train(10).unwrap();
        model.reset();

        assert!(!model.is_trained());
        assert!(model.samples().is_empty());
        assert!(model.weights().iter().all(|&w| w == 0.0));
        assert_eq!(model.forward(0.1).unwrap_err().error_code(), "NOT_TRAINED");
    }

    #[test]
    fn test_wide_input_range_converges() {
        let mut model = RegressionModel::new(2);
        for x in [0.0_f32, 1.0, 2.0, 3.0, 4.0] {
            model.add_sample(x, &[0.1 * x, 1.0 - 0.1 * x]).unwrap();
        }

        let first = model.train(100).unwrap();
        let second = model.train(100).unwrap();
        assert!(first.mse.is_finite() && first.mse < 1e-8, "mse was {}", first.mse);
        assert!(second.mse <= first.mse + 1e-9);

        let out = model.forward(2.5).unwrap();
        assert_relative_eq!(out[0], 0.25, epsilon = 1e-4);
        assert_relative_eq!(out[1], 0.75, epsilon = 1e-4);
    }

    #[test]
    fn test_large_inputs_stay_finite() {
        let mut model = RegressionModel::new(2);
        for x in [-500.0_f32, 0.0, 250.0, 1000.0] {
            model.add_sample(x, &[0.0, 1.0]).unwrap();
        }
        model.train(1_000).unwrap();
        assert!(model.weights().iter().chain(model.biases()).all(|v| v.is_finite()));
    }

    #[test]
    fn test_divergence_keeps_previous_fit() {
        let mut model = RegressionModel::with_learning_rate(2, 5.0);
        for x in [0.0_f32, 1.0, 2.0] {
            model.add_sample(x, &[x, -x]).unwrap();
        }

        let err = model.train(2_000).unwrap_err();
        assert_eq!(err.error_code(), "TRAINING_FAILED");
        assert!(!model.is_trained());
        assert!(model.weights().iter().all(|&w| w == 0.0));
        assert!(model.biases().iter().all(|&b| b == 0.0));
    }
}
