//! CLI Module
//!
//! Offline front end: inspect model banks, render WAV files through the
//! pipeline and fit SuperKnob mappings.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// MagicKnob - neural distortion and filter models driven by two knobs
#[derive(Parser, Debug)]
#[command(name = "magicknob")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Model directory (overrides the config)
    #[arg(short, long, global = true)]
    pub model_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the dist and lpf models found in the model directory
    #[command(name = "models")]
    Models,

    /// Run a WAV file through the dist and lpf models
    #[command(name = "render")]
    Render {
        /// Input WAV file
        input: PathBuf,

        /// Output WAV file
        output: PathBuf,

        /// Dist knob value
        #[arg(long, default_value_t = 0.5)]
        dist: f32,

        /// Lpf knob value
        #[arg(long, default_value_t = 0.5)]
        lpf: f32,

        /// Position of the dist model in the bank
        #[arg(long, default_value_t = 0)]
        dist_model: usize,

        /// Position of the lpf model in the bank
        #[arg(long, default_value_t = 0)]
        lpf_model: usize,

        /// Output bit depth (16, 24 or 32)
        #[arg(long, default_value_t = 24)]
        bit_depth: u16,

        /// Copy the input unprocessed
        #[arg(long)]
        bypass: bool,
    },

    /// Fit a SuperKnob mapping from a JSON list of samples
    #[command(name = "fit")]
    Fit {
        /// JSON file: [{"input": 0.0, "outputs": [dist, lpf]}, ...]
        samples: PathBuf,

        /// Gradient-descent iterations (defaults to the config value)
        #[arg(short, long)]
        iterations: Option<usize>,

        /// Number of evenly spaced knob positions to print
        #[arg(long, default_value_t = 11)]
        steps: usize,
    },
}
