//! Scripted in-memory speech synthesizer

use async_trait::async_trait;
use duet_mixer::audio::WaveBuffer;
use duet_mixer::providers::SpeechSynthesizer;
use duet_mixer::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Returns a constant tone for every request
///
/// Optionally fails on texts containing a marker, or stalls before answering.
pub struct MockSynthesizer {
    native_rate: u32,
    seconds: f64,
    amplitude: f32,
    fail_on: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<(String, String)>>,
}

impl MockSynthesizer {
    /// Half-second tone at 24 kHz
    pub fn new() -> Self {
        Self {
            native_rate: 24000,
            seconds: 0.5,
            amplitude: 0.5,
            fail_on: None,
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.seconds = seconds;
        self
    }

    /// Fail any request whose text contains `marker`
    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_on = Some(marker.to_string());
        self
    }

    /// Sleep before answering each request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of requests observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// (text, voice) of every request received
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    fn native_sample_rate(&self) -> u32 {
        self.native_rate
    }

    async fn synthesize(&self, text: &str, voice: &str) -> Result<WaveBuffer> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((text.to_string(), voice.to_string()));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(marker) = &self.fail_on {
            if text.contains(marker.as_str()) {
                return Err(Error::ExternalService(format!("Voice '{}' not found", voice)));
            }
        }

        let len = (self.seconds * self.native_rate as f64).round() as usize;
        Ok(WaveBuffer::new(vec![self.amplitude; len], self.native_rate))
    }
}
