//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::Config;
use crate::control::ControlPlane;
use crate::engine::{export_wav, import_wav, BitDepth};
use crate::error::{MagicKnobError, Result};
use crate::neural::{KnobId, ModelBank};
use crate::training::TrainingSample;

/// Knob and model choices for one offline render
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub dist: f32,
    pub lpf: f32,
    pub dist_model: usize,
    pub lpf_model: usize,
    pub bit_depth: u16,
    pub bypass: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            dist: 0.5,
            lpf: 0.5,
            dist_model: 0,
            lpf_model: 0,
            bit_depth: 24,
            bypass: false,
        }
    }
}

/// Print both model banks.
pub fn list_models(config: &Config) -> Result<()> {
    for knob in KnobId::ALL {
        let bank = ModelBank::discover(&config.model_dir, knob)?;
        println!("{} ({} model(s)):", knob, bank.len());
        for (i, entry) in bank.entries().iter().enumerate() {
            println!("  [{}] {:<24} {}", i, entry.label(), entry.file_name());
        }
    }
    Ok(())
}

/// Render `input` through the pipeline into `output`.
pub fn render(config: &Config, input: &Path, output: &Path, settings: RenderSettings) -> Result<()> {
    let depth = BitDepth::from_bits(settings.bit_depth).ok_or_else(|| {
        MagicKnobError::InvalidConfig {
            reason: format!("unsupported bit depth {}", settings.bit_depth),
        }
    })?;

    let mut buffer = import_wav(input)?;
    info!(
        "Rendering {} ({} ch, {} Hz, {:.2}s)",
        input.display(),
        buffer.channels(),
        buffer.sample_rate,
        buffer.duration_secs()
    );

    let config = Config {
        num_channels: buffer.channels(),
        ..config.clone()
    };
    let mut plane = ControlPlane::discover(&config)?;
    select_model(&mut plane, KnobId::Dist, settings.dist_model)?;
    select_model(&mut plane, KnobId::Lpf, settings.lpf_model)?;

    plane.set_control_value(KnobId::Dist, settings.dist);
    plane.set_control_value(KnobId::Lpf, settings.lpf);
    plane.set_enabled(!settings.bypass);

    let mut processor = plane.processor();
    let num_channels = buffer.channels();
    let len = buffer.len();

    let mut start = 0;
    while start < len {
        let end = (start + config.block_size).min(len);
        let mut block: Vec<&mut [f32]> = buffer
            .samples
            .iter_mut()
            .map(|channel| &mut channel[start..end])
            .collect();
        processor.process(&mut block, num_channels);
        start = end;
    }

    if !buffer.is_finite() {
        return Err(MagicKnobError::InvalidAudio {
            reason: "model produced non-finite samples".to_string(),
        });
    }

    export_wav(&buffer, output, depth)?;
    println!("Rendered {} -> {}", input.display(), output.display());
    for knob in KnobId::ALL {
        match plane.current_model_label(knob) {
            Ok(label) => println!("  {}: {} @ {:.2}", knob, label, plane.control_value(knob)),
            Err(_) => println!("  {}: passthrough", knob),
        }
    }
    Ok(())
}

/// Cycle `knob` to position `index`; an empty bank leaves the stage as a
/// passthrough.
fn select_model(plane: &mut ControlPlane, knob: KnobId, index: usize) -> Result<()> {
    let bank = plane.bank(knob);
    if bank.is_empty() {
        info!("No {} models in {}, stage bypassed", knob, bank.directory().display());
        return Ok(());
    }
    if index >= bank.len() {
        return Err(MagicKnobError::InvalidConfig {
            reason: format!("{} model index {} out of range (0..{})", knob, index, bank.len()),
        });
    }
    for _ in 0..=index {
        plane.cycle_model(knob)?;
    }
    Ok(())
}

/// Train a SuperKnob mapping from a sample file and print it.
pub fn fit(config: &Config, samples_path: &Path, iterations: Option<usize>, steps: usize) -> Result<()> {
    config.validate()?;
    let content = fs::read_to_string(samples_path).map_err(|e| MagicKnobError::FileUnreadable {
        path: samples_path.display().to_string(),
        source: e,
    })?;
    let samples: Vec<TrainingSample> = serde_json::from_str(&content)?;

    let mut plane = ControlPlane::with_banks(
        ModelBank::from_entries(&config.model_dir, KnobId::Dist, Vec::new()),
        ModelBank::from_entries(&config.model_dir, KnobId::Lpf, Vec::new()),
        config,
    );
    for sample in &samples {
        plane.add_training_sample(sample.input, &sample.outputs)?;
    }

    let report = match iterations {
        Some(n) => plane.train_regression(n)?,
        None => plane.train_regression_default()?,
    };
    println!(
        "Fitted {} sample(s) in {} iteration(s), mse = {:.6}",
        samples.len(),
        report.iterations,
        report.mse
    );

    let model = plane.regression();
    println!("  dist = {:.4} * x + {:.4}", model.weights()[0], model.biases()[0]);
    println!("  lpf  = {:.4} * x + {:.4}", model.weights()[1], model.biases()[1]);

    let steps = steps.max(2);
    println!("{:>8} {:>8} {:>8}", "knob", "dist", "lpf");
    for i in 0..steps {
        let x = i as f32 / (steps - 1) as f32;
        let controls = plane.set_superknob(x)?;
        println!("{:>8.3} {:>8.3} {:>8.3}", x, controls.dist, controls.lpf);
    }
    Ok(())
}
