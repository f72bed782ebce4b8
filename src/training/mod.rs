//! SuperKnob trainer
//!
//! Learns a mapping from one "super" knob to the dist and lpf knobs from
//! user-recorded examples. Runs at control rate only.

mod job;
mod regression;

pub use job::TrainingJob;
pub use regression::{RegressionModel, TrainingReport, TrainingSample, DEFAULT_LEARNING_RATE};
