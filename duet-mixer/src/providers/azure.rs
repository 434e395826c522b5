//! Azure text-to-speech REST client
//!
//! Requests raw 24 kHz 16-bit mono PCM so the response body can be converted
//! straight into a [`WaveBuffer`] without a container parser.

use crate::audio::types::WaveBuffer;
use crate::config::AzureConfig;
use crate::error::{Error, Result};
use crate::providers::SpeechSynthesizer;
use async_trait::async_trait;
use quick_xml::escape::escape;
use std::time::Duration;
use tracing::debug;

const OUTPUT_FORMAT: &str = "raw-24khz-16bit-mono-pcm";
const USER_AGENT: &str = "duet/0.1.0";

/// Azure Speech synthesis client
pub struct AzureSynthesizer {
    http_client: reqwest::Client,
    endpoint: String,
    key: String,
    native_sample_rate: u32,
}

impl AzureSynthesizer {
    /// Build a client from configuration
    ///
    /// # Errors
    /// `Config` if the key or region (or explicit endpoint) is missing.
    pub fn new(config: &AzureConfig) -> Result<Self> {
        let key = config
            .key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("Missing Azure speech key".to_string()))?;

        let endpoint = match (&config.endpoint, &config.region) {
            (Some(endpoint), _) => endpoint.clone(),
            (None, Some(region)) if !region.trim().is_empty() => format!(
                "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
                region.trim()
            ),
            _ => return Err(Error::Config("Missing Azure speech region".to_string())),
        };

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint,
            key,
            native_sample_rate: config.native_sample_rate,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for AzureSynthesizer {
    fn native_sample_rate(&self) -> u32 {
        self.native_sample_rate
    }

    async fn synthesize(&self, text: &str, voice: &str) -> Result<WaveBuffer> {
        if text.trim().is_empty() {
            return Ok(WaveBuffer::silence(1, self.native_sample_rate));
        }

        debug!(voice = voice, chars = text.len(), "Requesting Azure synthesis");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .body(build_ssml(text, voice))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ExternalService(format!(
                "Azure TTS failed ({}): {}",
                status, body
            )));
        }

        let bytes = response.bytes().await?;
        let buffer = WaveBuffer::from_pcm16_le(&bytes, self.native_sample_rate);
        debug!(samples = buffer.len(), "Azure synthesis complete");

        if buffer.is_empty() {
            return Ok(WaveBuffer::silence(1, self.native_sample_rate));
        }
        Ok(buffer)
    }
}

/// SSML document for one utterance
///
/// The `xml:lang` attribute is taken from the voice name's locale prefix
/// (`en-US-JennyNeural` -> `en-US`), defaulting to `en-US`.
pub fn build_ssml(text: &str, voice: &str) -> String {
    format!(
        "<speak version=\"1.0\" xmlns=\"http://www.w3.org/2001/10/synthesis\" xml:lang=\"{}\"><voice name=\"{}\">{}</voice></speak>",
        voice_locale(voice),
        escape(voice),
        escape(text)
    )
}

fn voice_locale(voice: &str) -> String {
    let mut parts = voice.split('-');
    match (parts.next(), parts.next()) {
        (Some(lang), Some(region))
            if lang.len() == 2
                && region.len() == 2
                && lang.chars().all(|c| c.is_ascii_alphabetic())
                && region.chars().all(|c| c.is_ascii_alphabetic()) =>
        {
            format!("{}-{}", lang, region)
        }
        _ => "en-US".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssml_escapes_text() {
        let ssml = build_ssml("Fish & <chips>", "en-GB-RyanNeural");
        assert!(ssml.contains("xml:lang=\"en-GB\""));
        assert!(ssml.contains("<voice name=\"en-GB-RyanNeural\">"));
        assert!(ssml.contains("Fish &amp; &lt;chips&gt;"));
    }

    #[test]
    fn test_locale_fallback() {
        assert_eq!(voice_locale("custom"), "en-US");
        assert_eq!(voice_locale("zh-CN-XiaoxiaoNeural"), "zh-CN");
    }

    #[test]
    fn test_requires_credentials() {
        let err = AzureSynthesizer::new(&AzureConfig::default()).err().unwrap();
        assert!(matches!(err, Error::Config(_)));

        let config = AzureConfig {
            key: Some("k".to_string()),
            ..AzureConfig::default()
        };
        assert!(AzureSynthesizer::new(&config).is_err());

        let config = AzureConfig {
            key: Some("k".to_string()),
            region: Some("eastus".to_string()),
            ..AzureConfig::default()
        };
        let client = AzureSynthesizer::new(&config).unwrap();
        assert_eq!(
            client.endpoint,
            "https://eastus.tts.speech.microsoft.com/cognitiveservices/v1"
        );
        assert_eq!(client.native_sample_rate(), 24000);
    }

    #[tokio::test]
    async fn test_blank_text_skips_request() {
        let config = AzureConfig {
            key: Some("k".to_string()),
            endpoint: Some("http://127.0.0.1:9/unreachable".to_string()),
            ..AzureConfig::default()
        };
        let client = AzureSynthesizer::new(&config).unwrap();
        let buffer = client.synthesize("   ", "en-US-JennyNeural").await.unwrap();
        assert_eq!(buffer.samples(), &[0.0]);
    }
}
