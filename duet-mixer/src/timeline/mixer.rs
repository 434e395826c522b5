//! Per-speaker timeline accumulation
//!
//! A [`Timeline`] holds one fixed-length mono track per speaker. Its length
//! is decided once, from the latest caption end, and never changes: writes
//! running past the end are clamped rather than growing the track.
//!
//! **Placement order per segment:**
//! 1. Edge fade (head and tail, or tail only for natural-length segments)
//! 2. Blend into existing content according to [`PlacementPolicy`]
//!
//! Speakers are independent; within one speaker, segments are expected in
//! caption order.

use crate::audio::types::WaveBuffer;
use crate::error::{Error, Result};
use crate::timeline::policy::{PlacementPolicy, TimelinePolicy};
use crate::timeline::smoothing;
use duet_common::FadeCurve;
use tracing::{debug, warn};

/// Smoothing parameters applied on every placement
#[derive(Debug, Clone, Copy)]
pub struct PlacementSettings {
    pub policy: TimelinePolicy,
    /// Edge fade window (samples)
    pub fade_samples: usize,
    /// Crossfade window (samples)
    pub crossfade_samples: usize,
    pub curve: FadeCurve,
}

#[derive(Debug)]
struct Track {
    speaker: String,
    samples: Vec<f32>,
}

/// Fixed-length per-speaker sample buffers at the target rate
#[derive(Debug)]
pub struct Timeline {
    tracks: Vec<Track>,
    len: usize,
    sample_rate: u32,
    settings: PlacementSettings,
}

impl Timeline {
    /// Create silent tracks for `speakers`, each exactly `len` samples long
    pub fn new<S: AsRef<str>>(
        speakers: &[S],
        len: usize,
        sample_rate: u32,
        settings: PlacementSettings,
    ) -> Self {
        let tracks = speakers
            .iter()
            .map(|s| Track {
                speaker: s.as_ref().to_string(),
                samples: vec![0.0; len],
            })
            .collect();

        debug!(
            "Timeline created: {} speakers, {} samples at {}Hz",
            speakers.len(),
            len,
            sample_rate
        );

        Self {
            tracks,
            len,
            sample_rate,
            settings,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples of one speaker's track
    #[cfg(test)]
    fn track(&self, speaker: &str) -> Option<&[f32]> {
        self.tracks
            .iter()
            .find(|t| t.speaker == speaker)
            .map(|t| t.samples.as_slice())
    }

    /// Place a resolved segment at an absolute sample offset
    ///
    /// # Arguments
    /// * `speaker` - Track to write into
    /// * `start_sample` - `floor(start_sec × rate)`
    /// * `segment` - Segment audio at the timeline's rate
    ///
    /// # Returns
    /// Number of samples written. Placements reaching past the end are
    /// truncated; a start at or beyond the end writes nothing.
    ///
    /// # Errors
    /// `Input` if the speaker has no track or the segment is at a different rate.
    pub fn place(&mut self, speaker: &str, start_sample: usize, segment: WaveBuffer) -> Result<usize> {
        if segment.sample_rate() != self.sample_rate {
            return Err(Error::Input(format!(
                "Segment at {}Hz placed on {}Hz timeline",
                segment.sample_rate(),
                self.sample_rate
            )));
        }

        let settings = self.settings;
        let len = self.len;
        let track = self
            .tracks
            .iter_mut()
            .find(|t| t.speaker == speaker)
            .ok_or_else(|| Error::Input(format!("Unknown speaker '{}'", speaker)))?;

        let mut samples = segment.into_samples();
        smoothing::fade_edges(
            &mut samples,
            settings.fade_samples,
            settings.curve,
            settings.policy.fades_head(),
        );

        if start_sample >= len {
            warn!(
                "Segment for {} starts at sample {} beyond timeline end {}, skipped",
                speaker, start_sample, len
            );
            return Ok(0);
        }

        let end = start_sample.saturating_add(samples.len()).min(len);
        let written = end - start_sample;
        if written < samples.len() {
            debug!(
                "Segment for {} truncated at timeline end ({} of {} samples)",
                speaker,
                written,
                samples.len()
            );
        }

        let window = match settings.policy.placement {
            PlacementPolicy::Crossfade => settings.crossfade_samples,
            _ => 0,
        };
        smoothing::blend(
            &mut track.samples[start_sample..end],
            &samples[..written],
            settings.policy.placement,
            window,
            settings.curve,
        );

        Ok(written)
    }

    /// Consume the timeline into per-speaker buffers in track order
    pub fn into_tracks(self) -> Vec<(String, WaveBuffer)> {
        let rate = self.sample_rate;
        self.tracks
            .into_iter()
            .map(|t| (t.speaker, WaveBuffer::new(t.samples, rate)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::policy::DurationPolicy;

    fn settings(placement: PlacementPolicy, fade: usize, crossfade: usize) -> PlacementSettings {
        PlacementSettings {
            policy: TimelinePolicy::new(DurationPolicy::Fixed, placement),
            fade_samples: fade,
            crossfade_samples: crossfade,
            curve: FadeCurve::Linear,
        }
    }

    #[test]
    fn test_place_at_offset() {
        let mut timeline = Timeline::new(&["a", "b"], 10, 10, settings(PlacementPolicy::Additive, 0, 0));
        let written = timeline.place("a", 3, WaveBuffer::new(vec![0.5; 4], 10)).unwrap();
        assert_eq!(written, 4);

        let track = timeline.track("a").unwrap();
        assert_eq!(&track[..3], &[0.0; 3]);
        assert_eq!(&track[3..7], &[0.5; 4]);
        assert_eq!(&track[7..], &[0.0; 3]);
        assert!(timeline.track("b").unwrap().iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_past_end_is_clamped() {
        let mut timeline = Timeline::new(&["a"], 10, 10, settings(PlacementPolicy::Additive, 0, 0));
        let written = timeline.place("a", 8, WaveBuffer::new(vec![0.5; 5], 10)).unwrap();
        assert_eq!(written, 2);
        assert_eq!(timeline.len(), 10);

        let written = timeline.place("a", 10, WaveBuffer::new(vec![0.5; 5], 10)).unwrap();
        assert_eq!(written, 0);
        assert_eq!(timeline.track("a").unwrap().len(), 10);
    }

    #[test]
    fn test_edge_fade_applied_before_write() {
        let mut timeline = Timeline::new(&["a"], 8, 10, settings(PlacementPolicy::Additive, 2, 0));
        timeline.place("a", 0, WaveBuffer::new(vec![1.0; 8], 10)).unwrap();
        let track = timeline.track("a").unwrap();
        assert_eq!(track, &[0.0, 0.5, 1.0, 1.0, 1.0, 1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_crossfade_over_existing_content() {
        let mut timeline = Timeline::new(&["a"], 6, 10, settings(PlacementPolicy::Crossfade, 0, 4));
        timeline.place("a", 0, WaveBuffer::new(vec![1.0; 6], 10)).unwrap();
        timeline.place("a", 0, WaveBuffer::new(vec![0.0; 6], 10)).unwrap();
        let track = timeline.track("a").unwrap();
        assert_eq!(&track[..4], &[1.0, 0.75, 0.5, 0.25]);
        assert_eq!(&track[4..], &[1.0, 1.0]);
    }

    #[test]
    fn test_crossfade_onto_silence_equals_ramp() {
        let mut timeline = Timeline::new(&["a"], 4, 10, settings(PlacementPolicy::Crossfade, 0, 2));
        timeline.place("a", 0, WaveBuffer::new(vec![1.0; 4], 10)).unwrap();
        assert_eq!(timeline.track("a").unwrap(), &[0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_unknown_speaker_rejected() {
        let mut timeline = Timeline::new(&["a"], 4, 10, settings(PlacementPolicy::Additive, 0, 0));
        let err = timeline.place("z", 0, WaveBuffer::new(vec![1.0], 10)).unwrap_err();
        assert_eq!(err.tag(), "InputError");
    }

    #[test]
    fn test_rate_mismatch_rejected() {
        let mut timeline = Timeline::new(&["a"], 4, 10, settings(PlacementPolicy::Additive, 0, 0));
        assert!(timeline.place("a", 0, WaveBuffer::new(vec![1.0], 20)).is_err());
    }

    #[test]
    fn test_into_tracks_keeps_order() {
        let timeline = Timeline::new(&["speaker0", "speaker1"], 3, 10, settings(PlacementPolicy::Additive, 0, 0));
        let tracks = timeline.into_tracks();
        assert_eq!(tracks[0].0, "speaker0");
        assert_eq!(tracks[1].0, "speaker1");
        assert_eq!(tracks[1].1.len(), 3);
    }
}
