//! Sample-rate conversion for segment audio
//!
//! Every segment is brought to the project's target rate before it reaches
//! the timeline. The default converter is linear interpolation; a septic
//! polynomial converter (rubato) is available for higher quality.
//!
//! Both converters produce `max(1, round(len × dst / src))` samples, and an
//! empty input always yields a single zero sample so that downstream
//! fixed-length operations never see an empty buffer.

use crate::audio::types::WaveBuffer;
use crate::config::ResamplerKind;
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::{debug, warn};

/// Stateless sample-rate converter
pub struct Resampler;

impl Resampler {
    /// Convert a buffer to `target_rate`
    ///
    /// If the buffer is already at `target_rate` it is handed back unchanged
    /// (no copy). An empty buffer becomes one zero sample at `target_rate`.
    pub fn resample(buffer: WaveBuffer, target_rate: u32, kind: ResamplerKind) -> WaveBuffer {
        if buffer.is_empty() {
            return WaveBuffer::silence(1, target_rate);
        }

        let source_rate = buffer.sample_rate();
        if source_rate == target_rate {
            return buffer;
        }

        let samples = match kind {
            ResamplerKind::Linear => Self::linear(buffer.samples(), source_rate, target_rate),
            ResamplerKind::Polynomial => {
                match Self::polynomial(buffer.samples(), source_rate, target_rate) {
                    Ok(samples) => samples,
                    Err(e) => {
                        warn!("Polynomial resampling failed ({}), using linear", e);
                        Self::linear(buffer.samples(), source_rate, target_rate)
                    }
                }
            }
        };

        debug!(
            "Resampled {} samples at {}Hz to {} samples at {}Hz",
            buffer.len(),
            source_rate,
            samples.len(),
            target_rate
        );

        WaveBuffer::new(samples, target_rate)
    }

    /// Output length for a conversion: `max(1, round(len × dst / src))`
    pub fn output_len(input_len: usize, source_rate: u32, target_rate: u32) -> usize {
        let scaled = input_len as f64 * target_rate as f64 / source_rate as f64;
        (scaled.round() as usize).max(1)
    }

    /// Linear interpolation converter
    ///
    /// Output index `i` reads source position `i × (src_len - 1) / (dst_len - 1)`,
    /// interpolating between the bracketing samples with the upper index
    /// clamped to the last source sample.
    pub fn linear(input: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
        if input.is_empty() {
            return vec![0.0];
        }
        if source_rate == target_rate {
            return input.to_vec();
        }

        let src_len = input.len();
        let dst_len = Self::output_len(src_len, source_rate, target_rate);
        let factor = if dst_len > 1 {
            (src_len - 1) as f64 / (dst_len - 1) as f64
        } else {
            0.0
        };

        (0..dst_len)
            .map(|i| {
                let position = i as f64 * factor;
                let i0 = (position.floor() as usize).min(src_len - 1);
                let i1 = (i0 + 1).min(src_len - 1);
                let t = (position - i0 as f64) as f32;
                input[i0] * (1.0 - t) + input[i1] * t
            })
            .collect()
    }

    /// Polynomial converter using rubato's `FastFixedIn`
    ///
    /// The whole segment is processed as one chunk. The resampler's output
    /// delay is dropped and the result is padded or cut to the same length
    /// the linear converter would produce.
    fn polynomial(
        input: &[f32],
        source_rate: u32,
        target_rate: u32,
    ) -> Result<Vec<f32>, String> {
        let expected_len = Self::output_len(input.len(), source_rate, target_rate);

        let mut resampler = FastFixedIn::<f32>::new(
            target_rate as f64 / source_rate as f64,
            1.0,
            PolynomialDegree::Septic,
            input.len(),
            1,
        )
        .map_err(|e| format!("Failed to create resampler: {}", e))?;

        let delay = resampler.output_delay();
        let planar_input = vec![input.to_vec()];
        let mut planar_output = resampler
            .process(&planar_input, None)
            .map_err(|e| format!("Resampling failed: {}", e))?;

        let mut output = planar_output.pop().unwrap_or_default();
        if delay < output.len() {
            output.drain(..delay);
        } else {
            output.clear();
        }
        output.resize(expected_len, 0.0);
        Ok(output)
    }
}
