//! Audio test file generation and inspection

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;

/// Write a mono 16-bit WAV holding a constant amplitude
///
/// # Arguments
/// * `path` - Output file path
/// * `seconds` - Duration
/// * `sample_rate` - Rate in Hz
/// * `amplitude` - Constant sample value, 0.0-1.0
pub fn generate_constant_wav(
    path: &Path,
    seconds: f64,
    sample_rate: u32,
    amplitude: f32,
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    let frames = (seconds * sample_rate as f64).round() as usize;
    let value = (amplitude * i16::MAX as f32) as i16;
    for _ in 0..frames {
        writer.write_sample(value)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Decoded contents of an output WAV file
#[derive(Debug)]
pub struct WavContents {
    pub spec: WavSpec,
    /// Interleaved samples scaled to [-1, 1]
    pub samples: Vec<f32>,
}

impl WavContents {
    /// Samples of one channel
    pub fn channel(&self, index: usize) -> Vec<f32> {
        let channels = self.spec.channels as usize;
        self.samples
            .iter()
            .skip(index)
            .step_by(channels)
            .copied()
            .collect()
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.spec.channels as usize
    }
}

/// Read a 16-bit PCM or 32-bit float WAV file
pub fn read_wav(path: &Path) -> WavContents {
    let mut reader = WavReader::open(path).unwrap();
    let spec = reader.spec();
    let samples = match spec.sample_format {
        SampleFormat::Int => reader
            .samples::<i16>()
            .map(|s| s.unwrap() as f32 / i16::MAX as f32)
            .collect(),
        SampleFormat::Float => reader.samples::<f32>().map(|s| s.unwrap()).collect(),
    };
    WavContents { spec, samples }
}
