//! Block processor integration tests
//!
//! End-to-end behaviour of the dist → lpf pipeline with models loaded
//! from disk through the control plane.

mod common;

use std::path::Path;

use approx::assert_relative_eq;
use tempfile::tempdir;

use common::{
    block, tanh2, write_constant_model, write_tanh_model, CONTROL_INPUT, SAMPLE_INPUT,
};
use magicknob::engine::{AudioBuffer, ControlValues};
use magicknob::{Config, ControlPlane, KnobId};

fn loaded_plane(dir: &Path, num_channels: usize) -> ControlPlane {
    let config = Config {
        model_dir: dir.to_path_buf(),
        num_channels,
        ..Config::default()
    };
    let mut plane = ControlPlane::discover(&config).unwrap();
    plane.prepare_to_play();
    plane
}

#[test]
fn test_dist_output_feeds_lpf() {
    let dir = tempdir().unwrap();
    write_constant_model(dir.path(), "dist", "half", 0.5);
    write_tanh_model(dir.path(), "lpf2", "soft", SAMPLE_INPUT);

    let plane = loaded_plane(dir.path(), 1);
    let mut processor = plane.processor();

    let mut buffer = vec![AudioBuffer::sine_wave(440.0, 0.01, 44100).samples.remove(0)];
    processor.process(&mut buffer, 1);

    for &y in &buffer[0] {
        assert_relative_eq!(y, tanh2(0.5), epsilon = 1e-5);
    }
}

#[test]
fn test_lpf_is_last_stage() {
    let dir = tempdir().unwrap();
    write_tanh_model(dir.path(), "dist", "soft", SAMPLE_INPUT);
    write_constant_model(dir.path(), "lpf2", "flat", 0.3);

    let plane = loaded_plane(dir.path(), 1);
    let mut processor = plane.processor();

    let mut buffer = block(1, 64, 0.8);
    processor.process(&mut buffer, 1);
    assert!(buffer[0].iter().all(|&y| (y - 0.3).abs() < 1e-6));
}

#[test]
fn test_knob_value_reaches_model() {
    let dir = tempdir().unwrap();
    write_tanh_model(dir.path(), "dist", "knob", CONTROL_INPUT);

    let plane = loaded_plane(dir.path(), 1);
    let mut processor = plane.processor();

    for value in [0.0_f32, 0.25, 1.0] {
        plane.set_control_value(KnobId::Dist, value);
        let mut buffer = block(1, 16, 0.9);
        processor.process(&mut buffer, 1);
        assert_relative_eq!(buffer[0][15], tanh2(value), epsilon = 1e-5);
    }
}

#[test]
fn test_disabled_is_identity_with_models_loaded() {
    let dir = tempdir().unwrap();
    write_constant_model(dir.path(), "dist", "loud", 0.9);
    write_tanh_model(dir.path(), "lpf2", "soft", SAMPLE_INPUT);

    let plane = loaded_plane(dir.path(), 2);
    let mut processor = plane.processor();
    assert!(!plane.toggle_enabled());

    let tone = AudioBuffer::sine_wave(220.0, 0.05, 44100);
    let mut buffer = vec![tone.samples[0].clone(), tone.samples[0].clone()];
    processor.process(&mut buffer, 2);

    assert_eq!(buffer[0], tone.samples[0]);
    assert_eq!(buffer[1], tone.samples[0]);
}

#[test]
fn test_output_only_channels_are_silenced() {
    let dir = tempdir().unwrap();
    write_constant_model(dir.path(), "dist", "loud", 0.9);

    let plane = loaded_plane(dir.path(), 2);
    let mut processor = plane.processor();

    let mut buffer = vec![vec![0.1; 32], vec![0.2; 32], vec![0.5; 32], vec![-0.5; 32]];
    processor.process(&mut buffer, 2);

    assert!(buffer[0].iter().all(|&y| (y - 0.9).abs() < 1e-6));
    assert!(buffer[1].iter().all(|&y| (y - 0.9).abs() < 1e-6));
    assert!(buffer[2].iter().all(|&y| y == 0.0));
    assert!(buffer[3].iter().all(|&y| y == 0.0));
}

#[test]
fn test_channels_are_processed_independently() {
    let dir = tempdir().unwrap();
    write_tanh_model(dir.path(), "dist", "soft", SAMPLE_INPUT);

    let plane = loaded_plane(dir.path(), 2);
    let mut processor = plane.processor();

    let mut buffer = vec![vec![0.3; 8], vec![-0.7; 8]];
    processor.process_block(&mut buffer, 2, ControlValues::default(), true);

    assert_relative_eq!(buffer[0][7], tanh2(0.3), epsilon = 1e-5);
    assert_relative_eq!(buffer[1][7], tanh2(-0.7), epsilon = 1e-5);
}

#[test]
fn test_block_size_does_not_change_output() {
    let dir = tempdir().unwrap();
    write_tanh_model(dir.path(), "dist", "soft", SAMPLE_INPUT);
    write_tanh_model(dir.path(), "lpf2", "soft", SAMPLE_INPUT);

    let plane = loaded_plane(dir.path(), 1);
    let tone = AudioBuffer::sine_wave(440.0, 0.02, 44100).samples.remove(0);

    let mut whole = vec![tone.clone()];
    plane.processor().process(&mut whole, 1);

    let mut processor = plane.processor();
    let mut chunked = tone.clone();
    for chunk in chunked.chunks_mut(37) {
        let mut block = [chunk];
        processor.process(&mut block, 1);
    }

    assert_eq!(whole[0], chunked);
}
