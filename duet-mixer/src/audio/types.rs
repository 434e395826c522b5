//! Core audio types for the mixing engine
//!
//! The engine is mono throughout. Stereo only exists as the final composed
//! pair produced by [`crate::audio::encoder::StereoBuffer`].

/// Mono floating-point waveform tagged with its sample rate
///
/// Samples are nominally in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl WaveBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Buffer of `len` zero samples
    pub fn silence(len: usize, sample_rate: u32) -> Self {
        Self::new(vec![0.0; len], sample_rate)
    }

    /// Convert signed 16-bit little-endian PCM bytes to floats
    ///
    /// Each sample maps to `s / 32768`, clamped to `[-1.0, 1.0]`. A trailing
    /// odd byte is ignored.
    pub fn from_pcm16_le(bytes: &[u8], sample_rate: u32) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| {
                let value = i16::from_le_bytes([pair[0], pair[1]]);
                (value as f32 / 32768.0).clamp(-1.0, 1.0)
            })
            .collect();
        Self::new(samples, sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Peak absolute amplitude (0.0 for an empty buffer)
    pub fn peak(&self) -> f32 {
        peak(&self.samples)
    }
}

/// Peak absolute amplitude of a sample slice
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}
