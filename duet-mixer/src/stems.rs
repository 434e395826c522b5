//! Per-speaker stems of the original recording
//!
//! Each diarized speaker gets a full-length mono track at the recording's
//! native rate: the channel-averaged original inside that speaker's
//! utterances, silence everywhere else, then peak-normalized.

use crate::audio::decoder::DecodedRecording;
use crate::audio::types::WaveBuffer;
use crate::timeline::normalize;
use duet_common::CaptionList;
use tracing::debug;

/// Render one stem per speaker, in order of first appearance
pub fn render_stems(
    recording: &DecodedRecording,
    captions: &CaptionList,
    ceiling: f32,
) -> Vec<(String, WaveBuffer)> {
    let mixed = recording.mixdown();
    let rate = recording.sample_rate() as f64;
    let total = mixed.len();

    captions
        .speakers()
        .into_iter()
        .map(|speaker| {
            let mut samples = vec![0.0f32; total];
            for caption in captions.iter().filter(|c| c.speaker == speaker) {
                let start = ((caption.start * rate).floor().max(0.0) as usize).min(total);
                let end = ((caption.end * rate).floor().max(0.0) as usize).min(total);
                if start < end {
                    samples[start..end].copy_from_slice(&mixed.samples()[start..end]);
                }
            }

            let mut stem = WaveBuffer::new(samples, recording.sample_rate());
            normalize(&mut stem, ceiling);
            debug!("Rendered stem for {} ({} samples)", speaker, stem.len());
            (speaker.to_string(), stem)
        })
        .collect()
}
