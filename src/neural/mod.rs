//! Neural inference core
//!
//! This module provides:
//! - `WeightSet` loading from JSON `state_dict` exports
//! - `LstmEngine`, the fixed-topology per-sample evaluator
//! - `ModelBank` discovery and cycling per knob
//! - `ModelSlot` lock-free publication of new weights

mod bank;
mod lstm;
mod slot;
mod weights;

pub use bank::{KnobId, ModelBank, ModelFileName, NUM_NAME_FIELDS};
pub use lstm::LstmEngine;
pub use slot::{ModelSlot, RetiredWeights};
pub use weights::{WeightSet, DENSE_PREFIX, LSTM_PREFIX, NUM_GATES};

/// Network inputs: the audio sample and one control value
pub const INPUT_SIZE: usize = 2;

/// Network outputs: one audio sample
pub const OUTPUT_SIZE: usize = 1;

/// Hidden width the plugin is compiled with
pub const HIDDEN_SIZE: usize = 16;

/// The engine type used by the audio processor
pub type Engine = LstmEngine<HIDDEN_SIZE>;
