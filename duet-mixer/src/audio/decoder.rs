//! Original recording decoder using symphonia
//!
//! The source recording is decoded exactly once per operation into planar
//! f32 channels. The resulting [`DecodedRecording`] is immutable and is
//! shared by reference across every extraction of that operation.

use crate::audio::types::WaveBuffer;
use crate::error::{Error, Result};
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Fully decoded source recording (planar, native sample rate)
#[derive(Debug, Clone)]
pub struct DecodedRecording {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl DecodedRecording {
    /// Build from planar channel data; all channels must share one length
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
        }
    }

    /// Decode an entire audio file
    ///
    /// # Errors
    /// `MissingSource` if the file is absent, has no audio track, or cannot
    /// be probed or decoded at all. Individual corrupt packets are skipped.
    pub fn decode_file(path: &Path) -> Result<Self> {
        debug!("Decoding original recording: {}", path.display());

        let file = std::fs::File::open(path).map_err(|e| {
            Error::MissingSource(format!(
                "Original recording {} unavailable: {}",
                path.display(),
                e
            ))
        })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| {
                Error::MissingSource(format!("Failed to probe {}: {}", path.display(), e))
            })?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| {
                Error::MissingSource(format!("No audio track found in {}", path.display()))
            })?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| Error::MissingSource("Sample rate not found".to_string()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| Error::MissingSource(format!("Failed to create decoder: {}", e)))?;

        let mut channels: Vec<Vec<f32>> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    warn!("Decoder reset required, stopping at current position");
                    break;
                }
                Err(e) => {
                    warn!("Error reading packet: {}", e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let mut buf: AudioBuffer<f32> = decoded.make_equivalent();
                    decoded.convert(&mut buf);

                    let count = buf.spec().channels.count();
                    if channels.len() < count {
                        channels.resize(count, Vec::new());
                    }
                    for (ch, channel) in channels.iter_mut().enumerate().take(count) {
                        channel.extend_from_slice(buf.chan(ch));
                    }
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping corrupt packet: {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(Error::MissingSource(format!(
                        "Failed to decode {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }

        if channels.is_empty() || channels[0].is_empty() {
            return Err(Error::MissingSource(format!(
                "No audio decoded from {}",
                path.display()
            )));
        }

        let recording = Self::from_channels(channels, sample_rate);
        debug!(
            "Decoded {} frames, {} channels at {}Hz ({:.2}s)",
            recording.frames(),
            recording.channel_count(),
            recording.sample_rate,
            recording.duration_secs()
        );
        Ok(recording)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.channels.iter().map(Vec::len).min().unwrap_or(0)
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Mono mixdown of `[start_sec, end_sec)` at the native rate
    ///
    /// Sample bounds are `floor(t × rate)`, clamped to the recording. The
    /// result always has at least one sample; a range wholly outside the
    /// recording yields a single zero sample.
    pub fn extract_mono(&self, start_sec: f64, end_sec: f64) -> WaveBuffer {
        let frames = self.frames();
        let rate = self.sample_rate as f64;
        let start = ((start_sec * rate).floor().max(0.0) as usize).min(frames);
        let end = ((end_sec * rate).floor().max(0.0) as usize).min(frames);

        let mut out = vec![0.0f32; end.saturating_sub(start).max(1)];
        self.mix_into(start, end, &mut out);
        WaveBuffer::new(out, self.sample_rate)
    }

    /// Mono mixdown of the whole recording
    pub fn mixdown(&self) -> WaveBuffer {
        let frames = self.frames();
        let mut out = vec![0.0f32; frames];
        self.mix_into(0, frames, &mut out);
        WaveBuffer::new(out, self.sample_rate)
    }

    fn mix_into(&self, start: usize, end: usize, out: &mut [f32]) {
        if start >= end || self.channels.is_empty() {
            return;
        }
        let count = self.channels.len() as f32;
        for channel in &self.channels {
            for (dst, src) in out.iter_mut().zip(&channel[start..end]) {
                *dst += src / count;
            }
        }
    }
}
