//! Fixed-topology inference engine
//!
//! Two inputs (sample, control) → LSTM(`H`) → Dense(`H` → 1). The hidden
//! width is a const generic so the recurrent state lives in fixed arrays
//! and `forward` never touches the heap.

use std::sync::Arc;

use crate::error::{MagicKnobError, Result};
use crate::neural::weights::WeightSet;
use crate::neural::INPUT_SIZE;

#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Stateful LSTM + dense evaluator for one channel of one effect stage
#[derive(Debug, Clone)]
pub struct LstmEngine<const H: usize> {
    weights: Arc<WeightSet>,
    hidden: [f32; H],
    cell: [f32; H],
    next_hidden: [f32; H],
}

impl<const H: usize> LstmEngine<H> {
    /// Create an engine with zeroed state
    ///
    /// Fails with `TopologyMismatch` when the weights were built for a
    /// different hidden width.
    pub fn new(weights: Arc<WeightSet>) -> Result<Self> {
        check_hidden_size::<H>(&weights)?;
        Ok(Self {
            weights,
            hidden: [0.0; H],
            cell: [0.0; H],
            next_hidden: [0.0; H],
        })
    }

    /// Replace the active weights and reset the recurrent state
    ///
    /// On error the previous weights and state are left as they were.
    pub fn install_weights(&mut self, weights: Arc<WeightSet>) -> Result<()> {
        check_hidden_size::<H>(&weights)?;
        self.weights = weights;
        self.reset();
        Ok(())
    }

    /// Zero hidden and cell state
    pub fn reset(&mut self) {
        self.hidden = [0.0; H];
        self.cell = [0.0; H];
    }

    /// Advance the recurrence by one step and return the dense output
    #[inline]
    pub fn forward(&mut self, sample: f32, control: f32) -> f32 {
        let w = &*self.weights;
        let w_ih = w.input_weights();
        let w_hh = w.recurrent_weights();
        let bias = w.gate_bias();

        for unit in 0..H {
            let mut gates = [0.0_f32; 4];
            for (gate, pre) in gates.iter_mut().enumerate() {
                let row = gate * H + unit;
                let ih = &w_ih[row * INPUT_SIZE..(row + 1) * INPUT_SIZE];
                let hh = &w_hh[row * H..(row + 1) * H];

                let mut acc = bias[row] + ih[0] * sample + ih[1] * control;
                for (weight, h) in hh.iter().zip(self.hidden.iter()) {
                    acc += weight * h;
                }
                *pre = acc;
            }

            let input_gate = sigmoid(gates[0]);
            let forget_gate = sigmoid(gates[1]);
            let cell_candidate = gates[2].tanh();
            let output_gate = sigmoid(gates[3]);

            let cell = forget_gate * self.cell[unit] + input_gate * cell_candidate;
            self.cell[unit] = cell;
            self.next_hidden[unit] = output_gate * cell.tanh();
        }

        self.hidden = self.next_hidden;

        let mut out = w.dense_bias();
        for (weight, h) in w.dense_weights().iter().zip(self.hidden.iter()) {
            out += weight * h;
        }
        out
    }

    /// Current hidden state
    pub fn hidden_state(&self) -> &[f32; H] {
        &self.hidden
    }

    /// Current cell state
    pub fn cell_state(&self) -> &[f32; H] {
        &self.cell
    }

    /// The weights this engine evaluates
    pub fn weights(&self) -> &Arc<WeightSet> {
        &self.weights
    }
}

fn check_hidden_size<const H: usize>(weights: &WeightSet) -> Result<()> {
    if weights.hidden_size() == H {
        Ok(())
    } else {
        Err(MagicKnobError::TopologyMismatch {
            what: "hidden size",
            expected: H,
            found: weights.hidden_size(),
        })
    }
}
