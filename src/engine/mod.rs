//! Audio Engine Module
//!
//! - Real-time block processing through the dist and lpf stages
//! - Knob values shared with the control thread
//! - Audio buffers and WAV file I/O for offline rendering

pub mod buffer;
pub mod io;
pub mod params;
pub mod processor;

pub use buffer::{AudioBuffer, DEFAULT_SAMPLE_RATE};
pub use io::{export_wav, import_wav, BitDepth};
pub use params::{ControlValues, SharedParams};
pub use processor::BlockProcessor;
