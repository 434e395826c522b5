//! Deepgram pre-recorded transcription client
//!
//! Uploads the whole recording in one request with diarization and
//! utterance segmentation enabled. Each returned utterance becomes one
//! caption labelled `speaker{N}` after Deepgram's numeric speaker index.

use crate::config::DeepgramConfig;
use crate::error::{Error, Result};
use crate::providers::Transcriber;
use async_trait::async_trait;
use duet_common::Caption;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_BASE_URL: &str = "https://api.deepgram.com";
const USER_AGENT: &str = "duet/0.1.0";

#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: Option<ListenResults>,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    #[serde(default)]
    utterances: Vec<Utterance>,
}

/// One diarized utterance as returned by the listen endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Utterance {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub speaker: u32,
}

impl Utterance {
    pub fn into_caption(self) -> Caption {
        Caption::new(format!("speaker{}", self.speaker), self.start, self.end, self.transcript)
    }
}

/// Deepgram API client
pub struct DeepgramTranscriber {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl DeepgramTranscriber {
    /// Build a client from configuration
    ///
    /// # Errors
    /// `Config` if no API key is configured.
    pub fn new(config: &DeepgramConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("Missing Deepgram API key".to_string()))?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            model: config.model.clone(),
        })
    }

    fn listen_url(&self) -> String {
        format!("{}/v1/listen", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Transcriber for DeepgramTranscriber {
    async fn transcribe(&self, audio: Vec<u8>, mime_type: &str) -> Result<Vec<Caption>> {
        info!(bytes = audio.len(), model = %self.model, "Uploading recording to Deepgram");

        let response = self
            .http_client
            .post(self.listen_url())
            .query(&[
                ("model", self.model.as_str()),
                ("diarize", "true"),
                ("punctuate", "true"),
                ("utterances", "true"),
            ])
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", mime_type)
            .body(audio)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ExternalService(format!(
                "Deepgram request failed ({}): {}",
                status, body
            )));
        }

        let body: ListenResponse = response
            .json()
            .await
            .map_err(|e| Error::ExternalService(format!("Invalid Deepgram response: {}", e)))?;

        let utterances = body.results.map(|r| r.utterances).unwrap_or_default();
        debug!("Deepgram returned {} utterances", utterances.len());
        Ok(utterances_to_captions(utterances))
    }
}

/// Convert utterances to captions, dropping ones with unusable timing
pub fn utterances_to_captions(utterances: Vec<Utterance>) -> Vec<Caption> {
    utterances
        .into_iter()
        .filter(|u| {
            let usable = u.start.is_finite() && u.end.is_finite() && u.start >= 0.0 && u.end > u.start;
            if !usable {
                warn!("Dropping utterance with invalid timing {}..{}", u.start, u.end);
            }
            usable
        })
        .map(Utterance::into_caption)
        .collect()
}
