//! Inference Benchmarks
//!
//! Per-sample LSTM cost and full-block processing cost.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use magicknob::engine::{AudioBuffer, BlockProcessor, ControlValues, SharedParams};
use magicknob::neural::{Engine, ModelSlot, WeightSet, HIDDEN_SIZE};

fn bench_weights() -> Arc<WeightSet> {
    let gates = 4 * HIDDEN_SIZE;
    let val = |i: usize| ((i as f32) * 0.13).sin() * 0.4;

    let dict = json!({
        "lstm.weight_ih_l0": (0..gates).map(|r| vec![val(r), val(r + 5)]).collect::<Vec<_>>(),
        "lstm.weight_hh_l0": (0..gates)
            .map(|r| (0..HIDDEN_SIZE).map(|c| val(r * HIDDEN_SIZE + c)).collect::<Vec<_>>())
            .collect::<Vec<_>>(),
        "lstm.bias_ih_l0": (0..gates).map(val).collect::<Vec<_>>(),
        "lstm.bias_hh_l0": vec![0.0_f32; gates],
        "dense.weight": [(0..HIDDEN_SIZE).map(val).collect::<Vec<_>>()],
        "dense.bias": [0.0],
    });
    Arc::new(WeightSet::from_state_dict(&dict, HIDDEN_SIZE, "bench").unwrap())
}

fn benchmark_forward(c: &mut Criterion) {
    let mut engine = Engine::new(bench_weights()).unwrap();

    c.bench_function("lstm16_forward", |b| {
        b.iter(|| engine.forward(black_box(0.25), black_box(0.5)))
    });
}

fn benchmark_process_block(c: &mut Criterion) {
    let dist = Arc::new(ModelSlot::new());
    let lpf = Arc::new(ModelSlot::new());
    dist.publish(bench_weights());
    lpf.publish(bench_weights());

    let mut processor = BlockProcessor::new(2, Arc::new(SharedParams::new()), dist, lpf);
    let tone = AudioBuffer::sine_wave(440.0, 512.0 / 44100.0, 44100);
    let mut buffer = vec![tone.samples[0].clone(), tone.samples[0].clone()];
    let controls = ControlValues::new(0.5, 0.5);

    c.bench_function("process_block_512_stereo", |b| {
        b.iter(|| processor.process_block(black_box(&mut buffer), 2, controls, true))
    });
}

criterion_group!(benches, benchmark_forward, benchmark_process_block);
criterion_main!(benches);
