//! MagicKnob - real-time neural audio effects
//!
//! Each audio sample, together with a knob value, runs through a small
//! LSTM network: first a distortion model, then a low-pass filter model.
//!
//! # Architecture
//!
//! - [`neural`]: weight files, the fixed-topology LSTM engine, model banks
//!   and the lock-free slot that hands weights to the audio thread
//! - [`engine`]: the block processor that runs on the audio thread, plus
//!   buffers and WAV I/O for offline work
//! - [`training`]: the SuperKnob regression that maps one knob to both
//! - [`control`]: the control-thread API that ties it all together

pub mod cli;
pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod neural;
pub mod training;

pub use config::Config;
pub use control::ControlPlane;
pub use engine::{BlockProcessor, ControlValues, SharedParams};
pub use error::{MagicKnobError, Result};
pub use neural::{KnobId, WeightSet};
