//! Speaker roster: display names and voice assignments
//!
//! A speaker with a voice assigned is re-voiced through synthesis; a speaker
//! without one replays the original recording for its segments.

use std::collections::HashMap;

/// Diarization labels of the two output channels (left, right)
pub const DEFAULT_SPEAKERS: [&str; 2] = ["speaker0", "speaker1"];

/// Per-speaker display names and voice assignments
#[derive(Debug, Clone)]
pub struct SpeakerRoster {
    /// Speaker labels in channel order
    order: Vec<String>,
    names: HashMap<String, String>,
    voices: HashMap<String, String>,
}

impl Default for SpeakerRoster {
    fn default() -> Self {
        Self {
            order: DEFAULT_SPEAKERS.iter().map(|s| s.to_string()).collect(),
            names: HashMap::new(),
            voices: HashMap::new(),
        }
    }
}

impl SpeakerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the display name used in subtitles; blank names are ignored
    pub fn with_name(mut self, speaker: &str, name: Option<&str>) -> Self {
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            self.names.insert(speaker.to_string(), name.to_string());
        }
        self
    }

    /// Assign a synthesis voice; blank voices leave the speaker on original audio
    pub fn with_voice(mut self, speaker: &str, voice: Option<&str>) -> Self {
        match voice.map(str::trim).filter(|v| !v.is_empty()) {
            Some(voice) => {
                self.voices.insert(speaker.to_string(), voice.to_string());
            }
            None => {
                self.voices.remove(speaker);
            }
        }
        self
    }

    /// Speaker labels in output channel order
    pub fn speakers(&self) -> &[String] {
        &self.order
    }

    /// Voice assigned to a speaker, if any
    pub fn voice_for(&self, speaker: &str) -> Option<&str> {
        self.voices.get(speaker).map(String::as_str)
    }

    /// Name shown in subtitles
    ///
    /// Falls back to `Speaker N` for `speakerN` labels and to the raw label otherwise.
    pub fn display_name(&self, speaker: &str) -> String {
        if let Some(name) = self.names.get(speaker) {
            return name.clone();
        }
        match speaker.strip_prefix("speaker") {
            Some(index) if !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()) => {
                format!("Speaker {}", index)
            }
            _ => speaker.to_string(),
        }
    }
}
