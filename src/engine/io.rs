//! WAV file I/O for offline rendering
//!
//! Reads integer or float WAV files into an `AudioBuffer` at their native
//! sample rate. The networks are sample-rate dependent, so no resampling
//! happens here.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::engine::buffer::AudioBuffer;
use crate::error::{MagicKnobError, Result};

/// Output sample encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    Int16,
    #[default]
    Int24,
    Float32,
}

impl BitDepth {
    /// Parse a bit depth given in bits (16, 24 or 32)
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            16 => Some(BitDepth::Int16),
            24 => Some(BitDepth::Int24),
            32 => Some(BitDepth::Float32),
            _ => None,
        }
    }

    fn spec(&self, channels: u16, sample_rate: u32) -> WavSpec {
        let (bits_per_sample, sample_format) = match self {
            BitDepth::Int16 => (16, SampleFormat::Int),
            BitDepth::Int24 => (24, SampleFormat::Int),
            BitDepth::Float32 => (32, SampleFormat::Float),
        };
        WavSpec {
            channels,
            sample_rate,
            bits_per_sample,
            sample_format,
        }
    }
}

/// Read a WAV file into a buffer
pub fn import_wav(path: &Path) -> Result<AudioBuffer> {
    let read_err = |source| MagicKnobError::AudioReadError {
        path: path.display().to_string(),
        source,
    };

    let reader = WavReader::open(path).map_err(read_err)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)
        .map_err(read_err)?;

    if interleaved.is_empty() {
        return Err(MagicKnobError::InvalidAudio {
            reason: format!("{} contains no samples", path.display()),
        });
    }

    AudioBuffer::from_interleaved(&interleaved, channels, spec.sample_rate)
}

/// Write a buffer to a WAV file at its own sample rate
pub fn export_wav(buffer: &AudioBuffer, path: &Path, depth: BitDepth) -> Result<()> {
    let write_err = |source| MagicKnobError::AudioWriteError {
        path: path.display().to_string(),
        source,
    };

    let spec = depth.spec(buffer.channels() as u16, buffer.sample_rate);
    let mut writer = WavWriter::create(path, spec).map_err(write_err)?;

    for sample in buffer.to_interleaved() {
        match depth {
            BitDepth::Int16 => {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled).map_err(write_err)?;
            }
            BitDepth::Int24 => {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled).map_err(write_err)?;
            }
            BitDepth::Float32 => writer.write_sample(sample).map_err(write_err)?,
        }
    }

    writer.finalize().map_err(write_err)
}

fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> std::result::Result<Vec<f32>, hound::Error> {
    match sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect(),
        SampleFormat::Int => {
            let scale = match bits_per_sample {
                8 => 128.0,
                16 => 32768.0,
                24 => 8388608.0,
                32 => 2147483648.0,
                _ => return Err(hound::Error::Unsupported),
            };
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect()
        }
    }
}
