//! Shared fixtures: model files written into temporary directories

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use magicknob::neural::HIDDEN_SIZE;

/// State dict whose output is `bias` for every input
pub fn constant_state_dict(hidden: usize, bias: f32) -> Value {
    let gates = 4 * hidden;
    json!({
        "lstm.weight_ih_l0": vec![vec![0.0_f32; 2]; gates],
        "lstm.weight_hh_l0": vec![vec![0.0_f32; hidden]; gates],
        "lstm.bias_ih_l0": vec![0.0_f32; gates],
        "lstm.bias_hh_l0": vec![0.0_f32; gates],
        "dense.weight": [vec![0.0_f32; hidden]],
        "dense.bias": [bias],
    })
}

/// Which network input a fixture model listens to
pub const SAMPLE_INPUT: usize = 0;
pub const CONTROL_INPUT: usize = 1;

/// State dict whose output is approximately `tanh(tanh(v))`, where `v` is
/// the sample or the control value depending on `input`
///
/// Unit 0 has its input and output gates saturated open and its forget
/// gate saturated shut, so its cell holds `tanh(v)` for the current step
/// only. The other units stay at zero.
pub fn tanh_state_dict(hidden: usize, input: usize) -> Value {
    let gates = 4 * hidden;
    let mut w_ih = vec![vec![0.0_f32; 2]; gates];
    let mut bias = vec![0.0_f32; gates];

    bias[0] = 20.0;
    bias[hidden] = -20.0;
    w_ih[2 * hidden][input] = 1.0;
    bias[3 * hidden] = 20.0;

    let mut dense = vec![0.0_f32; hidden];
    dense[0] = 1.0;

    json!({
        "lstm.weight_ih_l0": w_ih,
        "lstm.weight_hh_l0": vec![vec![0.0_f32; hidden]; gates],
        "lstm.bias_ih_l0": bias,
        "lstm.bias_hh_l0": vec![0.0_f32; gates],
        "dense.weight": [dense],
        "dense.bias": [0.0],
    })
}

pub fn write_json(dir: &Path, file_name: &str, value: &Value) -> PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path
}

/// Write a constant model named `exp_v1_lstm16_{kind}_{label}.json`
pub fn write_constant_model(dir: &Path, kind: &str, label: &str, bias: f32) -> PathBuf {
    let name = format!("exp_v1_lstm16_{}_{}.json", kind, label);
    write_json(dir, &name, &constant_state_dict(HIDDEN_SIZE, bias))
}

pub fn write_tanh_model(dir: &Path, kind: &str, label: &str, input: usize) -> PathBuf {
    let name = format!("exp_v1_lstm16_{}_{}.json", kind, label);
    write_json(dir, &name, &tanh_state_dict(HIDDEN_SIZE, input))
}

pub fn tanh2(x: f32) -> f32 {
    x.tanh().tanh()
}

/// One block of `len` samples on each of `channels` channels, all `value`
pub fn block(channels: usize, len: usize, value: f32) -> Vec<Vec<f32>> {
    vec![vec![value; len]; channels]
}
