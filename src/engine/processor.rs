//! Audio block processor
//!
//! Runs every input sample through the dist engine and then the lpf
//! engine, one engine pair per channel. Everything here executes on the
//! audio thread: no allocation, locks, logging or I/O after construction.

use std::sync::Arc;

use crate::engine::params::{ControlValues, SharedParams};
use crate::neural::{Engine, KnobId, ModelSlot, WeightSet};

// ============================================================================
// Stage
// ============================================================================

/// One effect stage: a model slot plus one engine per channel
#[derive(Debug)]
struct Stage {
    slot: Arc<ModelSlot>,
    seen_generation: u64,
    engines: Vec<Option<Engine>>,
}

impl Stage {
    fn new(slot: Arc<ModelSlot>, num_channels: usize) -> Self {
        Self {
            slot,
            seen_generation: 0,
            engines: (0..num_channels).map(|_| None).collect(),
        }
    }

    /// Pick up newly published weights, if any
    fn sync(&mut self) {
        let generation = self.slot.generation();
        if generation == self.seen_generation {
            return;
        }
        self.seen_generation = generation;

        let Some(weights) = self.slot.load() else {
            return;
        };
        for engine in &mut self.engines {
            install(engine, &weights);
        }
    }

    #[inline]
    fn forward(&mut self, channel: usize, sample: f32, control: f32) -> f32 {
        match self.engines.get_mut(channel) {
            Some(Some(engine)) => engine.forward(sample, control),
            _ => sample,
        }
    }

    fn reset(&mut self) {
        self.engines.iter_mut().flatten().for_each(Engine::reset);
    }

    fn has_model(&self) -> bool {
        self.engines.iter().any(Option::is_some)
    }
}

fn install(engine: &mut Option<Engine>, weights: &Arc<WeightSet>) {
    match engine {
        Some(active) if Arc::ptr_eq(active.weights(), weights) => {}
        // A mismatched set keeps the previous model running
        Some(active) => {
            let _ = active.install_weights(Arc::clone(weights));
        }
        None => {
            if let Ok(fresh) = Engine::new(Arc::clone(weights)) {
                *engine = Some(fresh);
            }
        }
    }
}

// ============================================================================
// Block Processor
// ============================================================================

/// Owns every inference engine; lives on the audio thread
#[derive(Debug)]
pub struct BlockProcessor {
    params: Arc<SharedParams>,
    dist: Stage,
    lpf: Stage,
    num_channels: usize,
}

impl BlockProcessor {
    /// Create a processor for up to `num_channels` input channels
    ///
    /// Channels beyond `num_channels` pass through unprocessed.
    pub fn new(
        num_channels: usize,
        params: Arc<SharedParams>,
        dist_slot: Arc<ModelSlot>,
        lpf_slot: Arc<ModelSlot>,
    ) -> Self {
        Self {
            params,
            dist: Stage::new(dist_slot, num_channels),
            lpf: Stage::new(lpf_slot, num_channels),
            num_channels,
        }
    }

    /// Process one host block in place using the shared knob values
    pub fn process<C: AsMut<[f32]>>(&mut self, channels: &mut [C], num_input_channels: usize) {
        let controls = self.params.controls();
        let enabled = self.params.enabled();
        self.process_block(channels, num_input_channels, controls, enabled);
    }

    /// Process one host block in place
    ///
    /// Published models are picked up here, before the first sample, so a
    /// block never mixes two weight sets. Channels at or above
    /// `num_input_channels` are output-only and get cleared.
    pub fn process_block<C: AsMut<[f32]>>(
        &mut self,
        channels: &mut [C],
        num_input_channels: usize,
        controls: ControlValues,
        enabled: bool,
    ) {
        self.dist.sync();
        self.lpf.sync();

        for (ch, channel) in channels.iter_mut().enumerate() {
            let samples = channel.as_mut();

            if ch >= num_input_channels {
                samples.fill(0.0);
                continue;
            }
            if !enabled {
                continue;
            }

            for x in samples.iter_mut() {
                let y = self.dist.forward(ch, *x, controls.dist);
                *x = self.lpf.forward(ch, y, controls.lpf);
            }
        }
    }

    /// Zero the recurrent state of every engine
    pub fn reset(&mut self) {
        self.dist.reset();
        self.lpf.reset();
    }

    /// Whether the stage has picked up a model yet
    pub fn has_model(&self, knob: KnobId) -> bool {
        match knob {
            KnobId::Dist => self.dist.has_model(),
            KnobId::Lpf => self.lpf.has_model(),
        }
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn params(&self) -> &Arc<SharedParams> {
        &self.params
    }
}
