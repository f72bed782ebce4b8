//! Background training
//!
//! Moves a snapshot of the regression model to a worker thread so a long
//! run does not block the control thread. There is no cancellation; the
//! run always completes.

use std::thread::{self, JoinHandle};

use tracing::info;

use crate::error::{MagicKnobError, Result};
use crate::training::regression::{RegressionModel, TrainingReport};

/// A training run in flight on its own thread
#[derive(Debug)]
pub struct TrainingJob {
    handle: JoinHandle<(RegressionModel, Result<TrainingReport>)>,
}

impl TrainingJob {
    /// Start training `model` for `iterations` steps
    pub fn spawn(mut model: RegressionModel, iterations: usize) -> Result<Self> {
        let handle = thread::Builder::new()
            .name("superknob-training".to_string())
            .spawn(move || {
                let result = model.train(iterations);
                (model, result)
            })?;
        info!("Started background training ({} iterations)", iterations);
        Ok(Self { handle })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the run completes and return the fitted model
    pub fn join(self) -> Result<(RegressionModel, TrainingReport)> {
        let (model, result) = self.handle.join().map_err(|_| MagicKnobError::TrainingFailed {
            reason: "training thread panicked".to_string(),
        })?;
        result.map(|report| (model, report))
    }
}
