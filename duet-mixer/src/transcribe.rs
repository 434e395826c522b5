//! Transcribe operation: recording in, caption handoff document out
//!
//! Sends the recording to the diarizing transcriber and publishes:
//! - `captions.xml` (handoff document, speakers labelled `speaker{N}`)
//! - `captions.srt` (empty placeholder, filled by a later generate)
//! - `original_uploaded.<ext>` (byte-for-byte copy of the recording)
//! - `speaker{N}.wav` stems, when requested

use crate::audio::encoder;
use crate::config::SampleFormat;
use crate::error::{Error, Result};
use crate::pipeline::{decode_recording, run_bounded};
use crate::providers::{mime_type_for, Transcriber};
use crate::publish::{self, Artifact, StagedArtifacts};
use crate::stems::render_stems;
use duet_common::CaptionList;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// File name of the caption handoff document
pub const CAPTIONS_XML: &str = "captions.xml";

/// File name of the subtitle placeholder
pub const CAPTIONS_SRT: &str = "captions.srt";

/// Options of one transcribe operation
#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    /// Also write per-speaker stems of the original recording
    pub export_stems: bool,
    pub sample_format: SampleFormat,
    pub normalize_ceiling: f32,
    pub deadline: Option<Duration>,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            export_stems: false,
            sample_format: SampleFormat::Pcm16,
            normalize_ceiling: 0.98,
            deadline: None,
        }
    }
}

/// Summary of a finished transcribe operation
#[derive(Debug, Clone)]
pub struct TranscribeReport {
    pub files: Vec<PathBuf>,
    pub captions: CaptionList,
}

/// Transcribe `input` and publish the results into `out_dir`
///
/// # Errors
/// - `MissingSource` if the recording cannot be read (or decoded for stems)
/// - `ExternalService` on transcription failure, deadline or cancellation
/// - `Input` if no utterances were detected
/// - `Encode` if artifacts cannot be written
pub async fn transcribe(
    input: &Path,
    out_dir: &Path,
    transcriber: Arc<dyn Transcriber>,
    options: &TranscribeOptions,
    cancel_token: &CancellationToken,
) -> Result<TranscribeReport> {
    let (captions, staged) = run_bounded(
        |scope| run(input, out_dir, transcriber, options, scope),
        options.deadline,
        cancel_token,
    )
    .await?;

    let files = staged.commit()?;
    Ok(TranscribeReport { files, captions })
}

async fn run(
    input: &Path,
    out_dir: &Path,
    transcriber: Arc<dyn Transcriber>,
    options: &TranscribeOptions,
    scope: CancellationToken,
) -> Result<(CaptionList, StagedArtifacts)> {
    info!(input = %input.display(), "Starting transcribe operation");

    let audio = tokio::fs::read(input).await.map_err(|e| {
        Error::MissingSource(format!("Recording {} unavailable: {}", input.display(), e))
    })?;

    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "wav".to_string());

    let captions = transcriber
        .transcribe(audio.clone(), mime_type_for(&extension))
        .await?;
    if captions.is_empty() {
        return Err(Error::Input("No utterances detected".to_string()));
    }
    let captions = CaptionList::new(captions)?;
    info!(
        captions = captions.len(),
        speakers = captions.speakers().len(),
        "Transcription complete"
    );

    let mut artifacts = vec![
        Artifact::new(CAPTIONS_XML, captions.to_xml()),
        Artifact::new(CAPTIONS_SRT, Vec::new()),
        Artifact::new(format!("original_uploaded.{}", extension), audio),
    ];

    let recording = if options.export_stems {
        Some(decode_recording(input.to_path_buf()).await?)
    } else {
        None
    };

    let out = out_dir.to_path_buf();
    let stem_captions = captions.clone();
    let (ceiling, sample_format) = (options.normalize_ceiling, options.sample_format);
    let staged = tokio::task::spawn_blocking(move || {
        if let Some(recording) = recording {
            for (speaker, stem) in render_stems(&recording, &stem_captions, ceiling) {
                artifacts.push(Artifact::new(
                    format!("{}.wav", speaker),
                    encoder::encode_mono(&stem, sample_format)?,
                ));
            }
        }
        publish::stage(&out, &artifacts, &scope)
    })
    .await
    .map_err(|e| Error::Encode(format!("Publish task failed: {}", e)))??;

    Ok((captions, staged))
}
