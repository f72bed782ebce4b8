//! Audio Buffer
//!
//! Non-interleaved f32 buffer used by offline rendering and tests. The
//! real-time path never needs this type: `BlockProcessor` works on any
//! slice of writable channels.

use crate::error::{MagicKnobError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Sample rate the bundled models were trained at
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

// ============================================================================
// Audio Buffer
// ============================================================================

/// Non-interleaved 32-bit float audio
///
/// # Example
/// ```
/// use magicknob::engine::AudioBuffer;
///
/// let buffer = AudioBuffer::new(2, 512);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.len(), 512);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a silent buffer
    pub fn new(num_channels: usize, num_samples: usize) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; num_channels],
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    /// Wrap per-channel sample vectors
    ///
    /// Fails if the channels have different lengths.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if let Some(first) = samples.first() {
            if samples.iter().any(|ch| ch.len() != first.len()) {
                return Err(MagicKnobError::InvalidAudio {
                    reason: "channels have different lengths".to_string(),
                });
            }
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a buffer from interleaved sample data (L, R, L, R, ...)
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(MagicKnobError::InvalidAudio {
                reason: "channel count must be at least 1".to_string(),
            });
        }

        if interleaved.len() % channels != 0 {
            return Err(MagicKnobError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    channels
                ),
            });
        }

        let num_samples = interleaved.len() / channels;
        let mut samples = vec![Vec::with_capacity(num_samples); channels];

        for frame in interleaved.chunks_exact(channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert to interleaved order (L, R, L, R, ...)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut interleaved = Vec::with_capacity(self.channels() * self.len());

        for sample_idx in 0..self.len() {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }

        interleaved
    }

    /// Mono sine wave, handy for tests and benchmarks
    pub fn sine_wave(frequency: f32, duration_secs: f32, sample_rate: u32) -> Self {
        let num_samples = (duration_secs * sample_rate as f32) as usize;
        let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
        let samples = (0..num_samples)
            .map(|i| (angular_freq * i as f32).sin())
            .collect();

        Self {
            samples: vec![samples],
            sample_rate,
        }
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }

    /// Sample-for-sample bit equality with another buffer
    pub fn is_identical_to(&self, other: &AudioBuffer) -> bool {
        self.channels() == other.channels()
            && self.samples.iter().zip(&other.samples).all(|(a, b)| {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_silent() {
        let buffer = AudioBuffer::new(3, 64);
        assert_eq!(buffer.channels(), 3);
        assert_eq!(buffer.len(), 64);
        assert_eq!(buffer.sample_rate, DEFAULT_SAMPLE_RATE);
        assert!(buffer.samples.iter().flatten().all(|&s| s == 0.0));
    }

    #[test]
    fn test_buffer_from_interleaved_stereo() {
        let buffer = AudioBuffer::from_interleaved(&[0.1, 0.2, 0.3, 0.4], 2, 44100).unwrap();
        assert_eq!(buffer.channel(0), &[0.1, 0.3]);
        assert_eq!(buffer.channel(1), &[0.2, 0.4]);
        assert_eq!(buffer.to_interleaved(), vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_buffer_from_interleaved_invalid() {
        assert!(AudioBuffer::from_interleaved(&[0.1, 0.2, 0.3], 2, 44100).is_err());
        assert!(AudioBuffer::from_interleaved(&[0.1], 0, 44100).is_err());
    }

    #[test]
    fn test_from_channels_rejects_ragged() {
        let err = AudioBuffer::from_channels(vec![vec![0.0; 4], vec![0.0; 3]], 44100).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AUDIO");
    }

    #[test]
    fn test_sine_wave_duration() {
        let buffer = AudioBuffer::sine_wave(440.0, 0.5, 48000);
        assert_eq!(buffer.len(), 24000);
        assert!((buffer.duration_secs() - 0.5).abs() < 1e-9);
        assert!(buffer.is_finite());
    }

    #[test]
    fn test_is_identical_to() {
        let a = AudioBuffer::sine_wave(440.0, 0.01, 48000);
        let mut b = a.clone();
        assert!(a.is_identical_to(&b));

        b.channel_mut(0)[3] += 1e-3;
        assert!(!a.is_identical_to(&b));
    }
}
