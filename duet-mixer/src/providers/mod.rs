//! External speech services
//!
//! The mixing engine only sees these two traits. Concrete clients talk to
//! Azure text-to-speech and Deepgram pre-recorded transcription; tests plug
//! in scripted implementations.

pub mod azure;
pub mod deepgram;

use crate::audio::types::WaveBuffer;
use crate::error::Result;
use async_trait::async_trait;
use duet_common::Caption;

pub use azure::AzureSynthesizer;
pub use deepgram::DeepgramTranscriber;

/// Text-to-speech provider
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Rate of the mono waveforms returned by [`synthesize`](Self::synthesize)
    fn native_sample_rate(&self) -> u32;

    /// Render `text` with `voice`
    ///
    /// # Errors
    /// `ExternalService` carrying the provider's message verbatim.
    async fn synthesize(&self, text: &str, voice: &str) -> Result<WaveBuffer>;
}

/// Diarizing speech-to-text provider
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a recording into speaker-labelled captions, in time order
    ///
    /// # Arguments
    /// * `audio` - Encoded recording bytes
    /// * `mime_type` - Content type of `audio` (e.g. `audio/wav`)
    async fn transcribe(&self, audio: Vec<u8>, mime_type: &str) -> Result<Vec<Caption>>;
}

/// Guess an upload content type from a file extension
pub fn mime_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "ogg" | "oga" => "audio/ogg",
        "m4a" | "mp4" | "aac" => "audio/mp4",
        "webm" => "audio/webm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for("WAV"), "audio/wav");
        assert_eq!(mime_type_for("mp3"), "audio/mpeg");
        assert_eq!(mime_type_for("xyz"), "application/octet-stream");
    }
}
