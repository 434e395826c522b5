//! Generate operation: captions in, per-speaker and stereo tracks out
//!
//! **Phases:**
//! 1. PLANNING: pick a source (original or synthesis) for every caption
//! 2. DECODING: decode the original recording once, if any caption needs it
//! 3. RESOLVING: extract and synthesize segments, bounded concurrency
//! 4. MIXING: place segments on the fixed-length timeline in caption order
//! 5. RENDERING: normalize, compose stereo, encode WAV and SRT
//! 6. PUBLISHING: move finished artifacts into the output folder
//!
//! Phases 1 to 5 (and the staging half of 6) run under an optional deadline
//! and a cancellation token. Either one firing drops every in-flight
//! synthesis request, stops blocking work at its next checkpoint and fails
//! the operation. Staged files are committed only after that bounded part
//! has succeeded.

use crate::audio::decoder::DecodedRecording;
use crate::audio::encoder::{self, StereoBuffer};
use crate::audio::types::WaveBuffer;
use crate::config::MixConfig;
use crate::error::{Error, Result};
use crate::providers::SpeechSynthesizer;
use crate::publish::{self, Artifact, StagedArtifacts};
use crate::resolver::{SegmentResolver, SegmentSource};
use crate::timeline::conform::{start_sample, timeline_len};
use crate::timeline::{normalize, PlacementSettings, Timeline};
use duet_common::subtitles::render_srt;
use duet_common::{Caption, CaptionList, SpeakerRoster};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// File name of the stereo mix
pub const COMBINED_WAV: &str = "combined.wav";

/// File name of the subtitle track
pub const COMBINED_SRT: &str = "combined.srt";

/// Inputs of one generate operation
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub captions: CaptionList,
    /// Original recording; required when any speaker has no voice
    pub recording: Option<PathBuf>,
    pub roster: SpeakerRoster,
    pub out_dir: PathBuf,
}

/// Summary of a finished generate operation
#[derive(Debug, Clone)]
pub struct GenerateReport {
    /// Published files in output order
    pub files: Vec<PathBuf>,
    /// Length of every track in samples
    pub timeline_samples: usize,
    pub sample_rate: u32,
    /// Segments taken from the original recording
    pub extracted: usize,
    /// Segments produced by synthesis (blank transcripts included)
    pub synthesized: usize,
}

struct PlannedSegment<'a> {
    caption: &'a Caption,
    /// Timeline track receiving the segment
    track: &'a str,
    source: SegmentSource<'a>,
}

/// Timeline assembly engine for the generate operation
pub struct Generator {
    config: MixConfig,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

impl Generator {
    /// Create a generator
    ///
    /// `synthesizer` may be `None` when no speaker is re-voiced.
    pub fn new(config: MixConfig, synthesizer: Option<Arc<dyn SpeechSynthesizer>>) -> Self {
        Self {
            config,
            synthesizer,
        }
    }

    /// Run a complete generate operation
    ///
    /// # Errors
    /// - `Input` / `Config` for invalid captions or parameters
    /// - `MissingSource` if original audio is needed but unavailable
    /// - `ExternalService` on synthesis failure, deadline expiry or cancellation
    /// - `Encode` if artifacts cannot be serialized or written
    pub async fn generate(
        &self,
        request: GenerateRequest,
        cancel_token: &CancellationToken,
    ) -> Result<GenerateReport> {
        self.config.validate()?;
        let start_time = Instant::now();

        let (mut report, staged) = run_bounded(
            |scope| self.run(request, scope),
            self.config.deadline(),
            cancel_token,
        )
        .await?;

        // Phase 6: PUBLISHING
        report.files = staged.commit()?;

        info!(
            duration_ms = start_time.elapsed().as_millis() as u64,
            files = report.files.len(),
            "Generate operation completed"
        );
        Ok(report)
    }

    async fn run(
        &self,
        request: GenerateRequest,
        scope: CancellationToken,
    ) -> Result<(GenerateReport, StagedArtifacts)> {
        let GenerateRequest {
            captions,
            recording,
            roster,
            out_dir,
        } = request;
        let rate = self.config.target_sample_rate;

        info!(
            captions = captions.len(),
            out_dir = %out_dir.display(),
            "Starting generate operation"
        );

        // Phase 1: PLANNING
        let plan = plan_segments(&captions, &roster);
        let extracted = plan
            .iter()
            .filter(|s| s.source == SegmentSource::Original)
            .count();
        let synthesized = plan.len() - extracted;
        debug!("Planned {} original and {} synthesized segments", extracted, synthesized);

        // Phase 2: DECODING
        let decoded = if extracted > 0 {
            let path = recording.ok_or_else(|| {
                Error::MissingSource(
                    "Original recording required for speakers without a voice".to_string(),
                )
            })?;
            Some(decode_recording(path).await?)
        } else {
            None
        };

        // Phase 3: RESOLVING
        let resolver = SegmentResolver::new(self.config.clone(), decoded, self.synthesizer.clone());
        let segments = self.resolve_all(&resolver, &plan).await?;

        // Phase 4: MIXING
        let timeline_samples = timeline_len(captions.max_end(), rate);
        let mut timeline = Timeline::new(
            roster.speakers(),
            timeline_samples,
            rate,
            PlacementSettings {
                policy: self.config.policy,
                fade_samples: self.config.fade_samples(),
                crossfade_samples: self.config.crossfade_samples(),
                curve: self.config.fade_curve,
            },
        );
        for (segment, buffer) in plan.iter().zip(segments) {
            timeline.place(
                segment.track,
                start_sample(segment.caption.start, rate),
                buffer,
            )?;
        }
        info!(
            "Timeline assembled: {} samples ({:.2}s) at {}Hz",
            timeline_samples,
            timeline_samples as f64 / rate as f64,
            rate
        );

        // Phase 5: RENDERING, then staging
        let config = self.config.clone();
        let staged = tokio::task::spawn_blocking(move || {
            let artifacts = render_artifacts(timeline, &captions, &roster, &config)?;
            publish::stage(&out_dir, &artifacts, &scope)
        })
        .await
        .map_err(|e| Error::Encode(format!("Render task failed: {}", e)))??;

        let report = GenerateReport {
            files: Vec::new(),
            timeline_samples,
            sample_rate: rate,
            extracted,
            synthesized,
        };
        Ok((report, staged))
    }

    /// Resolve every planned segment, returning buffers in plan order
    ///
    /// Extraction from the original and synthesis run side by side in two
    /// streams: synthesis with at most `synthesis_concurrency` requests in
    /// flight, extraction with one blocking task per available core. The
    /// first failure returns immediately, dropping the rest.
    async fn resolve_all(
        &self,
        resolver: &SegmentResolver,
        plan: &[PlannedSegment<'_>],
    ) -> Result<Vec<WaveBuffer>> {
        let (original, synthesis): (Vec<_>, Vec<_>) = plan
            .iter()
            .enumerate()
            .partition(|(_, segment)| segment.source == SegmentSource::Original);

        let extraction_limit = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        let (extracted, synthesized) = tokio::try_join!(
            resolve_group(resolver, original, extraction_limit),
            resolve_group(resolver, synthesis, self.config.synthesis_concurrency),
        )?;

        let mut resolved: Vec<Option<WaveBuffer>> = vec![None; plan.len()];
        for (index, buffer) in extracted.into_iter().chain(synthesized) {
            resolved[index] = Some(buffer);
        }

        resolved
            .into_iter()
            .enumerate()
            .map(|(index, buffer)| {
                buffer.ok_or_else(|| Error::Input(format!("Segment {} was not resolved", index)))
            })
            .collect()
    }
}

/// Resolve one group of segments with at most `limit` in flight
async fn resolve_group(
    resolver: &SegmentResolver,
    group: Vec<(usize, &PlannedSegment<'_>)>,
    limit: usize,
) -> Result<Vec<(usize, WaveBuffer)>> {
    stream::iter(group)
        .map(|(index, segment)| async move {
            resolver
                .resolve(segment.caption, segment.source)
                .await
                .map(|buffer| (index, buffer))
        })
        .buffer_unordered(limit.max(1))
        .try_collect()
        .await
}

/// Pick a track and a source for every caption
///
/// Speakers outside the roster share the last roster track. Their source
/// still follows their own voice assignment.
fn plan_segments<'a>(captions: &'a CaptionList, roster: &'a SpeakerRoster) -> Vec<PlannedSegment<'a>> {
    let speakers = roster.speakers();
    captions
        .iter()
        .filter_map(|caption| {
            let track = match speakers.iter().find(|s| **s == caption.speaker) {
                Some(known) => known.as_str(),
                None => {
                    let fallback = speakers.last()?;
                    warn!(
                        "Caption at {:.3}s has unknown speaker '{}', placed on {}",
                        caption.start, caption.speaker, fallback
                    );
                    fallback.as_str()
                }
            };
            Some(PlannedSegment {
                caption,
                track,
                source: SegmentSource::for_voice(roster.voice_for(&caption.speaker)),
            })
        })
        .collect()
}

fn render_artifacts(
    timeline: Timeline,
    captions: &CaptionList,
    roster: &SpeakerRoster,
    config: &MixConfig,
) -> Result<Vec<Artifact>> {
    let mut tracks = timeline.into_tracks();
    for (speaker, track) in tracks.iter_mut() {
        if normalize(track, config.normalize_ceiling).is_none() {
            debug!("Track {} is silent", speaker);
        }
    }

    let mut artifacts = Vec::with_capacity(tracks.len() + 2);
    for (speaker, track) in &tracks {
        artifacts.push(Artifact::new(
            format!("{}.wav", speaker),
            encoder::encode_mono(track, config.sample_format)?,
        ));
    }

    let stereo = match tracks.as_slice() {
        [(_, left), (_, right), ..] => StereoBuffer::compose(left, right)?,
        _ => {
            return Err(Error::Input(
                "Two speaker tracks are required for the stereo mix".to_string(),
            ))
        }
    };
    artifacts.push(Artifact::new(
        COMBINED_WAV,
        encoder::encode_stereo(&stereo, config.sample_format)?,
    ));
    artifacts.push(Artifact::new(COMBINED_SRT, render_srt(captions, roster)));

    Ok(artifacts)
}

/// Decode the original recording on a blocking worker thread
pub async fn decode_recording(path: PathBuf) -> Result<Arc<DecodedRecording>> {
    let recording = tokio::task::spawn_blocking(move || DecodedRecording::decode_file(&path))
        .await
        .map_err(|e| Error::MissingSource(format!("Decoder task failed: {}", e)))??;
    Ok(Arc::new(recording))
}

/// Read a caption document for a generate request
pub fn load_captions(path: &Path) -> Result<CaptionList> {
    CaptionList::load(path).map_err(Error::from)
}

/// Run `work` under an optional deadline and a cancellation token
///
/// `work` receives a child token scoped to this call. The scope is
/// cancelled whenever this call returns or is dropped, so blocking tasks
/// holding it stop at their next check even though their futures are gone.
/// Expiry and cancellation both surface as `ExternalService` errors; the
/// future is dropped, which aborts any requests it has in flight.
pub async fn run_bounded<W, F, T>(
    work: W,
    deadline: Option<Duration>,
    cancel_token: &CancellationToken,
) -> Result<T>
where
    W: FnOnce(CancellationToken) -> F,
    F: Future<Output = Result<T>>,
{
    let scope = cancel_token.child_token();
    let _scope_guard = scope.clone().drop_guard();
    let work = work(scope);

    let bounded = async {
        match deadline {
            Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| {
                Error::ExternalService(format!("Operation exceeded deadline of {}s", limit.as_secs_f64()))
            })?,
            None => work.await,
        }
    };

    tokio::select! {
        _ = cancel_token.cancelled() => {
            warn!("Operation cancelled");
            Err(Error::ExternalService("Operation cancelled".to_string()))
        }
        result = bounded => result,
    }
}
