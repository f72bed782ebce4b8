//! Knob values shared between the control and audio threads

use std::sync::atomic::{AtomicBool, Ordering};

use atomic_float::AtomicF32;

use crate::neural::KnobId;

/// Snapshot of both knob values for one block
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlValues {
    pub dist: f32,
    pub lpf: f32,
}

impl ControlValues {
    pub fn new(dist: f32, lpf: f32) -> Self {
        Self { dist, lpf }
    }

    pub fn get(&self, knob: KnobId) -> f32 {
        match knob {
            KnobId::Dist => self.dist,
            KnobId::Lpf => self.lpf,
        }
    }
}

/// Lock-free knob values and the processing switch
///
/// Written by the control thread, read once per block by the audio thread.
#[derive(Debug)]
pub struct SharedParams {
    dist: AtomicF32,
    lpf: AtomicF32,
    enabled: AtomicBool,
}

impl SharedParams {
    /// Knobs at 0.0, processing enabled
    pub fn new() -> Self {
        Self {
            dist: AtomicF32::new(0.0),
            lpf: AtomicF32::new(0.0),
            enabled: AtomicBool::new(true),
        }
    }

    fn knob(&self, knob: KnobId) -> &AtomicF32 {
        match knob {
            KnobId::Dist => &self.dist,
            KnobId::Lpf => &self.lpf,
        }
    }

    #[inline]
    pub fn control_value(&self, knob: KnobId) -> f32 {
        self.knob(knob).load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_control_value(&self, knob: KnobId, value: f32) {
        self.knob(knob).store(value, Ordering::Release);
    }

    /// Both knob values
    #[inline]
    pub fn controls(&self) -> ControlValues {
        ControlValues {
            dist: self.control_value(KnobId::Dist),
            lpf: self.control_value(KnobId::Lpf),
        }
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Flip the switch and return the new state
    pub fn toggle_enabled(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::AcqRel)
    }
}

impl Default for SharedParams {
    fn default() -> Self {
        Self::new()
    }
}
