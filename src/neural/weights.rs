//! Model Weight Store
//!
//! Loads the tensors of one LSTM layer and one dense layer from a JSON
//! `state_dict` export. The layer names are fixed: the recurrent layer
//! must be called `lstm` and the output layer `dense`.

use std::fs;
use std::path::Path;

use serde_json::{json, Map, Value};

use crate::error::{MagicKnobError, Result};
use crate::neural::{INPUT_SIZE, OUTPUT_SIZE};

// ============================================================================
// Constants
// ============================================================================

/// Key prefix of the recurrent layer tensors
pub const LSTM_PREFIX: &str = "lstm.";

/// Key prefix of the dense layer tensors
pub const DENSE_PREFIX: &str = "dense.";

/// Number of LSTM gates (input, forget, cell, output)
pub const NUM_GATES: usize = 4;

// ============================================================================
// Weight Set
// ============================================================================

/// Immutable weights for one LSTM + dense network
///
/// All matrices are stored row-major and flattened. Gate rows follow the
/// PyTorch order: input, forget, cell, output.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSet {
    name: String,
    hidden_size: usize,
    /// `4H x INPUT_SIZE`
    input_weights: Vec<f32>,
    /// `4H x H`
    recurrent_weights: Vec<f32>,
    /// `4H`, input and recurrent biases summed
    gate_bias: Vec<f32>,
    /// `H`
    dense_weights: Vec<f32>,
    dense_bias: f32,
}

impl WeightSet {
    /// Load a weight file and validate it against the compiled hidden size
    pub fn load(path: &Path, hidden_size: usize) -> Result<Self> {
        let path_str = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|source| MagicKnobError::FileUnreadable {
            path: path_str.clone(),
            source,
        })?;

        let value: Value =
            serde_json::from_str(&text).map_err(|e| MagicKnobError::MalformedWeightFile {
                path: path_str.clone(),
                reason: e.to_string(),
            })?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        match Self::from_state_dict(&value, hidden_size, name) {
            Err(MagicKnobError::MalformedWeightFile { reason, .. }) => {
                Err(MagicKnobError::MalformedWeightFile {
                    path: path_str,
                    reason,
                })
            }
            other => other,
        }
    }

    /// Build a weight set from an in-memory `state_dict` JSON object
    pub fn from_state_dict(value: &Value, hidden_size: usize, name: impl Into<String>) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| malformed("top level is not a JSON object"))?;

        let weight_ih = matrix(map, &format!("{LSTM_PREFIX}weight_ih_l0"))?;
        let weight_hh = matrix(map, &format!("{LSTM_PREFIX}weight_hh_l0"))?;
        let bias_ih = vector(map, &format!("{LSTM_PREFIX}bias_ih_l0"))?;
        let bias_hh = vector(map, &format!("{LSTM_PREFIX}bias_hh_l0"))?;
        let dense_weight = matrix(map, &format!("{DENSE_PREFIX}weight"))?;
        let dense_bias = vector(map, &format!("{DENSE_PREFIX}bias"))?;

        if weight_ih.rows % NUM_GATES != 0 {
            return Err(malformed(&format!(
                "{LSTM_PREFIX}weight_ih_l0 has {} rows, not a multiple of {NUM_GATES}",
                weight_ih.rows
            )));
        }

        let inferred = weight_ih.rows / NUM_GATES;
        check_dim("hidden size", hidden_size, inferred)?;
        check_dim("input size", INPUT_SIZE, weight_ih.cols)?;
        check_dim("recurrent rows", NUM_GATES * hidden_size, weight_hh.rows)?;
        check_dim("recurrent columns", hidden_size, weight_hh.cols)?;
        check_dim("input bias length", NUM_GATES * hidden_size, bias_ih.len())?;
        check_dim("recurrent bias length", NUM_GATES * hidden_size, bias_hh.len())?;
        check_dim("output size", OUTPUT_SIZE, dense_weight.rows)?;
        check_dim("dense columns", hidden_size, dense_weight.cols)?;
        check_dim("dense bias length", OUTPUT_SIZE, dense_bias.len())?;

        let gate_bias = bias_ih.iter().zip(&bias_hh).map(|(a, b)| a + b).collect();

        Ok(Self {
            name: name.into(),
            hidden_size,
            input_weights: weight_ih.data,
            recurrent_weights: weight_hh.data,
            gate_bias,
            dense_weights: dense_weight.data,
            dense_bias: dense_bias[0],
        })
    }

    /// Serialize back into the `state_dict` layout
    ///
    /// The combined gate bias is written to `bias_ih_l0`; `bias_hh_l0` is zero.
    pub fn to_state_dict(&self) -> Value {
        let h = self.hidden_size;
        let rows = |data: &[f32], cols: usize| -> Vec<Vec<f32>> {
            data.chunks(cols).map(|row| row.to_vec()).collect()
        };

        let mut map = Map::new();
        map.insert(
            format!("{LSTM_PREFIX}weight_ih_l0"),
            json!(rows(&self.input_weights, INPUT_SIZE)),
        );
        map.insert(
            format!("{LSTM_PREFIX}weight_hh_l0"),
            json!(rows(&self.recurrent_weights, h)),
        );
        map.insert(format!("{LSTM_PREFIX}bias_ih_l0"), json!(self.gate_bias));
        map.insert(
            format!("{LSTM_PREFIX}bias_hh_l0"),
            json!(vec![0.0_f32; NUM_GATES * h]),
        );
        map.insert(format!("{DENSE_PREFIX}weight"), json!([self.dense_weights]));
        map.insert(format!("{DENSE_PREFIX}bias"), json!([self.dense_bias]));
        Value::Object(map)
    }

    /// Display name, usually the file stem the set was loaded from
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    #[inline]
    pub fn input_weights(&self) -> &[f32] {
        &self.input_weights
    }

    #[inline]
    pub fn recurrent_weights(&self) -> &[f32] {
        &self.recurrent_weights
    }

    #[inline]
    pub fn gate_bias(&self) -> &[f32] {
        &self.gate_bias
    }

    #[inline]
    pub fn dense_weights(&self) -> &[f32] {
        &self.dense_weights
    }

    #[inline]
    pub fn dense_bias(&self) -> f32 {
        self.dense_bias
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

fn malformed(reason: &str) -> MagicKnobError {
    MagicKnobError::MalformedWeightFile {
        path: String::new(),
        reason: reason.to_string(),
    }
}

fn check_dim(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(MagicKnobError::TopologyMismatch {
            what,
            expected,
            found,
        })
    }
}

fn numbers(value: &Value, key: &str) -> Result<Vec<f32>> {
    let items = value
        .as_array()
        .ok_or_else(|| malformed(&format!("'{key}' is not an array")))?;

    items
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|x| x as f32)
                .ok_or_else(|| malformed(&format!("'{key}' contains a non-numeric entry")))
        })
        .collect()
}

fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a Value> {
    map.get(key)
        .ok_or_else(|| malformed(&format!("missing key '{key}'")))
}

fn vector(map: &Map<String, Value>, key: &str) -> Result<Vec<f32>> {
    numbers(lookup(map, key)?, key)
}

fn matrix(map: &Map<String, Value>, key: &str) -> Result<Matrix> {
    let rows = lookup(map, key)?
        .as_array()
        .ok_or_else(|| malformed(&format!("'{key}' is not an array of rows")))?;

    let mut data = Vec::new();
    let mut cols = None;
    for row in rows {
        let row = numbers(row, key)?;
        match cols {
            None => cols = Some(row.len()),
            Some(c) if c != row.len() => {
                return Err(malformed(&format!("'{key}' has rows of different lengths")))
            }
            Some(_) => {}
        }
        data.extend(row);
    }

    Ok(Matrix {
        rows: rows.len(),
        cols: cols.unwrap_or(0),
        data,
    })
}
