//! Control plane
//!
//! Everything the GUI (or any other control surface) needs: knob values,
//! the processing switch, model cycling and the SuperKnob trainer. Lives on
//! the control thread and talks to the audio thread only through
//! [`SharedParams`] and the two [`ModelSlot`]s.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::engine::{BlockProcessor, ControlValues, SharedParams};
use crate::error::{MagicKnobError, Result};
use crate::neural::{KnobId, ModelBank, ModelSlot, RetiredWeights, HIDDEN_SIZE};
use crate::training::{RegressionModel, TrainingJob, TrainingReport};

/// Range every knob is clamped to when driven by the SuperKnob
pub const KNOB_RANGE: (f32, f32) = (0.0, 1.0);

/// Control-thread owner of banks, slots and the SuperKnob trainer
#[derive(Debug)]
pub struct ControlPlane {
    params: Arc<SharedParams>,
    dist_bank: ModelBank,
    lpf_bank: ModelBank,
    dist_slot: Arc<ModelSlot>,
    lpf_slot: Arc<ModelSlot>,
    retired: RetiredWeights,
    trainer: RegressionModel,
    training: Option<TrainingJob>,
    num_channels: usize,
    default_iterations: usize,
}

impl ControlPlane {
    /// Discover both banks in `config.model_dir`
    pub fn discover(config: &Config) -> Result<Self> {
        config.validate()?;
        let dir: &Path = &config.model_dir;
        let dist_bank = ModelBank::discover(dir, KnobId::Dist)?;
        let lpf_bank = ModelBank::discover(dir, KnobId::Lpf)?;
        Ok(Self::with_banks(dist_bank, lpf_bank, config))
    }

    pub fn with_banks(dist_bank: ModelBank, lpf_bank: ModelBank, config: &Config) -> Self {
        Self {
            params: Arc::new(SharedParams::new()),
            dist_bank,
            lpf_bank,
            dist_slot: Arc::new(ModelSlot::new()),
            lpf_slot: Arc::new(ModelSlot::new()),
            retired: RetiredWeights::new(),
            trainer: RegressionModel::with_learning_rate(
                KnobId::ALL.len(),
                config.trainer.learning_rate,
            ),
            training: None,
            num_channels: config.num_channels,
            default_iterations: config.trainer.default_iterations,
        }
    }

    /// Build a processor wired to this control plane
    ///
    /// Move the result to the audio thread.
    pub fn processor(&self) -> BlockProcessor {
        BlockProcessor::new(
            self.num_channels,
            Arc::clone(&self.params),
            Arc::clone(&self.dist_slot),
            Arc::clone(&self.lpf_slot),
        )
    }

    /// Load the first model of every bank that has none yet
    ///
    /// Empty banks or broken files are logged and leave that stage as a
    /// passthrough.
    pub fn prepare_to_play(&mut self) {
        for knob in KnobId::ALL {
            if self.bank(knob).current_index().is_some() {
                continue;
            }
            if let Err(e) = self.cycle_model(knob) {
                warn!("No {} model loaded: {}", knob, e);
            }
        }
    }

    // ========================================================================
    // Knobs
    // ========================================================================

    pub fn set_control_value(&self, knob: KnobId, value: f32) {
        self.params.set_control_value(knob, value);
    }

    pub fn control_value(&self, knob: KnobId) -> f32 {
        self.params.control_value(knob)
    }

    pub fn controls(&self) -> ControlValues {
        self.params.controls()
    }

    /// Flip processing on or off; returns the new state
    pub fn toggle_enabled(&self) -> bool {
        self.params.toggle_enabled()
    }

    pub fn enabled(&self) -> bool {
        self.params.enabled()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.params.set_enabled(enabled);
    }

    /// XY pad: horizontal drives lpf, vertical drives dist
    pub fn set_xy(&self, x: f32, y: f32) {
        self.params.set_control_value(KnobId::Lpf, x);
        self.params.set_control_value(KnobId::Dist, y);
    }

    // ========================================================================
    // Models
    // ========================================================================

    /// Advance `knob` to its next model and hand it to the audio thread
    ///
    /// Returns the new model's label. On error the bank and the running
    /// model are unchanged.
    pub fn cycle_model(&mut self, knob: KnobId) -> Result<String> {
        let weights = match knob {
            KnobId::Dist => self.dist_bank.cycle_next(HIDDEN_SIZE)?,
            KnobId::Lpf => self.lpf_bank.cycle_next(HIDDEN_SIZE)?,
        };

        if let Some(previous) = self.slot(knob).publish(weights) {
            self.retired.retire(previous);
        }

        let label = self.current_model_label(knob)?.to_string();
        info!("{} model is now {}", knob, label);
        Ok(label)
    }

    pub fn current_model_label(&self, knob: KnobId) -> Result<&str> {
        self.bank(knob).current_label()
    }

    pub fn bank(&self, knob: KnobId) -> &ModelBank {
        match knob {
            KnobId::Dist => &self.dist_bank,
            KnobId::Lpf => &self.lpf_bank,
        }
    }

    fn slot(&self, knob: KnobId) -> &ModelSlot {
        match knob {
            KnobId::Dist => self.dist_slot.as_ref(),
            KnobId::Lpf => self.lpf_slot.as_ref(),
        }
    }

    /// Free retired weight sets the audio thread has let go of
    ///
    /// Call periodically from the control thread (e.g. a GUI timer).
    pub fn release_retired(&mut self) {
        self.retired.collect();
    }

    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }

    // ========================================================================
    // SuperKnob
    // ========================================================================

    pub fn add_training_sample(&mut self, input: f32, outputs: &[f32]) -> Result<()> {
        self.ensure_idle()?;
        self.trainer.add_sample(input, outputs)
    }

    /// Record the current dist and lpf knob values as the target for
    /// `superknob`
    pub fn capture_training_sample(&mut self, superknob: f32) -> Result<()> {
        let controls = self.controls();
        self.add_training_sample(superknob, &[controls.dist, controls.lpf])
    }

    /// Train synchronously on the control thread
    pub fn train_regression(&mut self, iterations: usize) -> Result<TrainingReport> {
        self.ensure_idle()?;
        self.trainer.train(iterations)
    }

    /// Train with the configured default iteration count
    pub fn train_regression_default(&mut self) -> Result<TrainingReport> {
        self.train_regression(self.default_iterations)
    }

    pub fn reset_regression(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.trainer.reset();
        info!("SuperKnob training data cleared");
        Ok(())
    }

    pub fn regression_forward(&self, input: f32) -> Result<Vec<f32>> {
        self.trainer.forward(input)
    }

    /// Move the knobs to where the trained mapping puts `value`
    pub fn set_superknob(&self, value: f32) -> Result<ControlValues> {
        let outputs = self.trainer.forward(value)?;
        let controls = ControlValues::new(knob_clamp(outputs[0]), knob_clamp(outputs[1]));

        self.params.set_control_value(KnobId::Dist, controls.dist);
        self.params.set_control_value(KnobId::Lpf, controls.lpf);
        Ok(controls)
    }

    pub fn regression(&self) -> &RegressionModel {
        &self.trainer
    }

    /// Train a snapshot of the current trainer on a worker thread
    pub fn start_background_training(&mut self, iterations: usize) -> Result<()> {
        self.ensure_idle()?;
        if self.trainer.samples().is_empty() {
            return Err(MagicKnobError::NoTrainingData);
        }
        self.training = Some(TrainingJob::spawn(self.trainer.clone(), iterations)?);
        Ok(())
    }

    /// Install the result of a finished background run
    ///
    /// Returns `Ok(None)` while nothing has finished.
    pub fn poll_training(&mut self) -> Result<Option<TrainingReport>> {
        match self.training.take() {
            Some(job) if job.is_finished() => {
                let (model, report) = job.join()?;
                self.trainer = model;
                Ok(Some(report))
            }
            running => {
                self.training = running;
                Ok(None)
            }
        }
    }

    pub fn is_training(&self) -> bool {
        self.training.is_some()
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_training() {
            return Err(MagicKnobError::TrainingInProgress);
        }
        Ok(())
    }
}

/// Clamp to [`KNOB_RANGE`]; NaN maps to the bottom of the range
fn knob_clamp(value: f32) -> f32 {
    let (lo, hi) = KNOB_RANGE;
    if value.is_nan() {
        lo
    } else {
        value.clamp(lo, hi)
    }
}
