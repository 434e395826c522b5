//! Segment source resolution
//!
//! Turns one caption into audio ready for placement: either a slice of the
//! original recording (speaker has no voice) or synthesized speech (speaker
//! has a voice). Either way the result is brought to the target rate and,
//! under the fixed-duration policy, conformed to the caption window.

use crate::audio::decoder::DecodedRecording;
use crate::audio::resampler::Resampler;
use crate::audio::types::WaveBuffer;
use crate::config::MixConfig;
use crate::error::{Error, Result};
use crate::providers::SpeechSynthesizer;
use crate::timeline::conform::{caption_len, conform};
use crate::timeline::policy::DurationPolicy;
use duet_common::Caption;
use std::sync::Arc;
use tracing::debug;

/// Where a segment's audio comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentSource<'a> {
    /// Slice of the original recording
    Original,
    /// Synthesized with the given voice
    Synthesized { voice: &'a str },
}

impl<'a> SegmentSource<'a> {
    /// Pick the source for a speaker's voice assignment
    pub fn for_voice(voice: Option<&'a str>) -> Self {
        match voice.map(str::trim).filter(|v| !v.is_empty()) {
            Some(voice) => SegmentSource::Synthesized { voice },
            None => SegmentSource::Original,
        }
    }
}

/// Resolves captions to target-rate segment audio
///
/// Holds shared, read-only handles only, so one resolver can serve many
/// concurrent synthesis requests.
pub struct SegmentResolver {
    config: MixConfig,
    recording: Option<Arc<DecodedRecording>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

impl SegmentResolver {
    pub fn new(
        config: MixConfig,
        recording: Option<Arc<DecodedRecording>>,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    ) -> Self {
        Self {
            config,
            recording,
            synthesizer,
        }
    }

    /// Resolve one caption
    ///
    /// Sample work (extraction, resampling, conforming) runs on a blocking
    /// worker thread.
    ///
    /// # Errors
    /// - `MissingSource` when original audio is required but no recording was decoded
    /// - `Config` when synthesis is required but no synthesizer is configured
    /// - `ExternalService` from the synthesizer, or when it returns audio at
    ///   a rate other than its native rate
    pub async fn resolve(&self, caption: &Caption, source: SegmentSource<'_>) -> Result<WaveBuffer> {
        match source {
            SegmentSource::Original => self.resolve_original(caption).await,
            SegmentSource::Synthesized { voice } => self.resolve_synthesized(caption, voice).await,
        }
    }

    /// Extract, resample and conform a slice of the original recording
    pub async fn resolve_original(&self, caption: &Caption) -> Result<WaveBuffer> {
        let recording = self.recording.clone().ok_or_else(|| {
            Error::MissingSource(format!(
                "Original recording required for {} at {:.3}s but none was provided",
                caption.speaker, caption.start
            ))
        })?;

        let config = self.config.clone();
        let caption = caption.clone();
        run_blocking(move || {
            let extracted = recording.extract_mono(caption.start, caption.end);
            debug!(
                speaker = %caption.speaker,
                start = caption.start,
                samples = extracted.len(),
                "Extracted original segment"
            );
            finish(extracted, &caption, &config)
        })
        .await
    }

    /// Synthesize, resample and conform a caption's transcript
    ///
    /// A blank transcript is silence and never reaches the provider.
    pub async fn resolve_synthesized(&self, caption: &Caption, voice: &str) -> Result<WaveBuffer> {
        if caption.is_blank() {
            debug!(speaker = %caption.speaker, start = caption.start, "Blank transcript, using silence");
            let silence = WaveBuffer::silence(1, self.config.target_sample_rate);
            return Ok(finish(silence, caption, &self.config));
        }

        let synthesizer = self.synthesizer.as_ref().ok_or_else(|| {
            Error::Config(format!(
                "Voice '{}' assigned to {} but no speech synthesizer is configured",
                voice, caption.speaker
            ))
        })?;

        let synthesized = synthesizer.synthesize(&caption.text, voice).await?;
        let native_rate = synthesizer.native_sample_rate();
        if synthesized.sample_rate() != native_rate {
            return Err(Error::ExternalService(format!(
                "Synthesizer returned {}Hz audio for voice '{}', expected {}Hz",
                synthesized.sample_rate(),
                voice,
                native_rate
            )));
        }
        debug!(
            speaker = %caption.speaker,
            voice = voice,
            samples = synthesized.len(),
            "Synthesized segment"
        );

        let config = self.config.clone();
        let caption = caption.clone();
        run_blocking(move || finish(synthesized, &caption, &config)).await
    }
}

/// Bring a segment to the target rate, then conform it under the fixed policy
fn finish(buffer: WaveBuffer, caption: &Caption, config: &MixConfig) -> WaveBuffer {
    let rate = config.target_sample_rate;
    let resampled = Resampler::resample(buffer, rate, config.resampler);
    match config.policy.duration {
        DurationPolicy::Fixed => conform(resampled, caption_len(caption.start, caption.end, rate)),
        DurationPolicy::Natural => resampled,
    }
}

async fn run_blocking<F>(work: F) -> Result<WaveBuffer>
where
    F: FnOnce() -> WaveBuffer + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::Input(format!("Segment task failed: {}", e)))
}
