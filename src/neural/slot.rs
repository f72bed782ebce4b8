//! Lock-free model hand-off
//!
//! The control thread publishes a fully loaded `WeightSet` with one atomic
//! pointer swap; the audio thread notices the new generation at a block
//! boundary and clones the `Arc`. Retired sets are parked in a
//! [`RetiredWeights`] list on the control side so the last reference is
//! always dropped there, never on the audio thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::debug;

use crate::neural::weights::WeightSet;

/// Single-writer publication point for one effect stage's weights
#[derive(Debug, Default)]
pub struct ModelSlot {
    weights: ArcSwapOption<WeightSet>,
    generation: AtomicU64,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish new weights and return the ones they replace
    pub fn publish(&self, weights: Arc<WeightSet>) -> Option<Arc<WeightSet>> {
        let previous = self.weights.swap(Some(weights));
        self.generation.fetch_add(1, Ordering::Release);
        previous
    }

    /// Currently published weights, if any
    ///
    /// Lock-free and allocation-free: only bumps a reference count.
    #[inline]
    pub fn load(&self) -> Option<Arc<WeightSet>> {
        self.weights.load_full()
    }

    /// Incremented on every publish; 0 means nothing was published yet
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

/// Weight sets that may still be referenced by the audio thread
#[derive(Debug, Default)]
pub struct RetiredWeights {
    pending: Vec<Arc<WeightSet>>,
}

impl RetiredWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a replaced set until nobody else holds it
    pub fn retire(&mut self, weights: Arc<WeightSet>) {
        self.pending.push(weights);
        self.collect();
    }

    /// Drop every parked set this list holds the last reference to
    pub fn collect(&mut self) {
        let before = self.pending.len();
        self.pending.retain(|w| Arc::strong_count(w) > 1);
        let freed = before - self.pending.len();
        if freed > 0 {
            debug!("Released {} retired weight set(s)", freed);
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn constant(bias: f32) -> Arc<WeightSet> {
        let dict = json!({
            "lstm.weight_ih_l0": [[0.0, 0.0], [0.0, 0.0], [0.0, 0.0], [0.0, 0.0]],
            "lstm.weight_hh_l0": [[0.0], [0.0], [0.0], [0.0]],
            "lstm.bias_ih_l0": [0.0, 0.0, 0.0, 0.0],
            "lstm.bias_hh_l0": [0.0, 0.0, 0.0, 0.0],
            "dense.weight": [[0.0]],
            "dense.bias": [bias],
        });
        Arc::new(WeightSet::from_state_dict(&dict, 1, "constant").unwrap())
    }

    #[test]
    fn test_slot_starts_empty() {
        let slot = ModelSlot::new();
        assert!(slot.load().is_none());
        assert_eq!(slot.generation(), 0);
    }

    #[test]
    fn test_publish_bumps_generation_and_returns_previous() {
        let slot = ModelSlot::new();
        assert!(slot.publish(constant(1.0)).is_none());
        assert_eq!(slot.generation(), 1);

        let previous = slot.publish(constant(2.0)).unwrap();
        assert_eq!(previous.dense_bias(), 1.0);
        assert_eq!(slot.generation(), 2);
        assert_eq!(slot.load().unwrap().dense_bias(), 2.0);
    }

    #[test]
    fn test_retired_weights_wait_for_readers() {
        let mut retired = RetiredWeights::new();
        let weights = constant(1.0);
        let reader = weights.clone();

        retired.retire(weights);
        assert_eq!(retired.len(), 1, "reader still holds a reference");

        drop(reader);
        retired.collect();
        assert!(retired.is_empty());
    }
}
