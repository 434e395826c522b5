//! Whole-track peak normalization

use crate::audio::types::WaveBuffer;
use crate::config::SILENCE_THRESHOLD;
use tracing::debug;

/// Scale a finished track so its peak equals `ceiling`
///
/// Tracks whose peak is below [`SILENCE_THRESHOLD`] are left untouched.
/// After scaling every sample is clamped to `[-1.0, 1.0]`.
///
/// # Returns
/// The gain applied, or `None` for a silent track
pub fn normalize(buffer: &mut WaveBuffer, ceiling: f32) -> Option<f32> {
    let peak = buffer.peak();
    if peak < SILENCE_THRESHOLD {
        debug!("Track is silent (peak {:e}), normalization skipped", peak);
        return None;
    }

    let gain = ceiling / peak;
    for sample in buffer.samples_mut() {
        *sample = (*sample * gain).clamp(-1.0, 1.0);
    }

    debug!("Normalized track: peak {:.4} -> {:.4} (gain {:.4})", peak, ceiling, gain);
    Some(gain)
}
