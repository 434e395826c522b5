//! Edge fades and splice blending
//!
//! Segments are faded at their edges before placement so that hard cuts in
//! the original recording or the synthesized speech do not click. Where a
//! placement lands on existing content, the leading window is blended from
//! the existing signal to the incoming one.
//!
//! With [`FadeCurve::Linear`] the edge gain at sample `k` of a `W` sample
//! window is exactly `k / W`, and the blend is
//! `existing × (1 - k/C) + incoming × (k/C)`.

use crate::timeline::policy::PlacementPolicy;
use duet_common::FadeCurve;

/// Apply edge fades in place
///
/// # Arguments
/// * `samples` - Segment audio
/// * `window` - Fade length in samples (0 disables fading)
/// * `curve` - Gain curve
/// * `fade_head` - Also ramp in the first `window` samples
pub fn fade_edges(samples: &mut [f32], window: usize, curve: FadeCurve, fade_head: bool) {
    let len = samples.len();
    if window == 0 || len == 0 {
        return;
    }

    for k in 0..window.min(len) {
        let gain = curve.calculate_fade_in(k as f32 / window as f32);
        if fade_head {
            samples[k] *= gain;
        }
        samples[len - 1 - k] *= gain;
    }
}

/// Combine `incoming` into `dest` according to the placement policy
///
/// Both slices are aligned at their first sample; only the overlapping
/// prefix is touched.
pub fn blend(
    dest: &mut [f32],
    incoming: &[f32],
    placement: PlacementPolicy,
    window: usize,
    curve: FadeCurve,
) {
    match placement {
        PlacementPolicy::Overwrite => {
            let n = dest.len().min(incoming.len());
            dest[..n].copy_from_slice(&incoming[..n]);
        }
        PlacementPolicy::Additive => accumulate(dest, incoming),
        PlacementPolicy::Crossfade => crossfade(dest, incoming, window, curve),
    }
}

/// Blend the first `window` samples, then accumulate
///
/// A zero window degenerates to plain accumulation.
pub fn crossfade(dest: &mut [f32], incoming: &[f32], window: usize, curve: FadeCurve) {
    for (k, (out, sample)) in dest.iter_mut().zip(incoming).enumerate() {
        if k < window {
            let t = k as f32 / window as f32;
            *out = *out * curve.calculate_fade_out(t) + sample * curve.calculate_fade_in(t);
        } else {
            *out += sample;
        }
    }
}

fn accumulate(dest: &mut [f32], incoming: &[f32]) {
    for (out, sample) in dest.iter_mut().zip(incoming) {
        *out += sample;
    }
}
