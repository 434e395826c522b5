//! Scripted in-memory transcriber

use async_trait::async_trait;
use duet_common::Caption;
use duet_mixer::providers::Transcriber;
use duet_mixer::{Error, Result};
use std::sync::Mutex;

/// Returns a fixed caption list, or a fixed provider error
pub struct MockTranscriber {
    response: std::result::Result<Vec<Caption>, String>,
    mime_types: Mutex<Vec<String>>,
}

impl MockTranscriber {
    pub fn returning(captions: Vec<Caption>) -> Self {
        Self {
            response: Ok(captions),
            mime_types: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            mime_types: Mutex::new(Vec::new()),
        }
    }

    /// Content types of every upload received
    pub fn mime_types(&self) -> Vec<String> {
        self.mime_types.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, _audio: Vec<u8>, mime_type: &str) -> Result<Vec<Caption>> {
        self.mime_types.lock().unwrap().push(mime_type.to_string());
        match &self.response {
            Ok(captions) => Ok(captions.clone()),
            Err(message) => Err(Error::ExternalService(message.clone())),
        }
    }
}
