//! Caption handoff document
//!
//! The caption list is the only contract between the diarization stage and
//! the mixing engine. It is stored as a small XML document:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <captions>
//!   <caption speaker="speaker0" start="0.08" end="1.52">Hello there.</caption>
//! </captions>
//! ```
//!
//! Times are decimal seconds. Caption text is XML-escaped (`& < > " '`).
//! A loaded [`CaptionList`] is always non-empty and every caption satisfies
//! `0 <= start < end`.

use crate::error::{Error, Result};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

const CAPTION_TAG: &[u8] = b"caption";

/// One timestamped utterance attributed to one speaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    /// Speaker label as produced by diarization (e.g. `speaker0`)
    pub speaker: String,

    /// Start time in seconds
    pub start: f64,

    /// End time in seconds
    pub end: f64,

    /// Transcript text (unescaped, trimmed)
    pub text: String,
}

impl Caption {
    pub fn new(speaker: impl Into<String>, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            start,
            end,
            text: text.into(),
        }
    }

    /// True when the transcript has no speakable content
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn validate(&self, index: usize) -> Result<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(Error::InvalidInput(format!(
                "Caption {} has non-finite timing (start={}, end={})",
                index + 1,
                self.start,
                self.end
            )));
        }
        if self.start < 0.0 {
            return Err(Error::InvalidInput(format!(
                "Caption {} starts before zero ({}s)",
                index + 1,
                self.start
            )));
        }
        if self.end <= self.start {
            return Err(Error::InvalidInput(format!(
                "Caption {} ends at or before its start (start={}s, end={}s)",
                index + 1,
                self.start,
                self.end
            )));
        }
        Ok(())
    }
}

/// Validated, ordered list of captions
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionList {
    captions: Vec<Caption>,
}

impl CaptionList {
    /// Build a caption list, validating timing of every entry
    ///
    /// # Errors
    /// - `InvalidInput` if the list is empty
    /// - `InvalidInput` if any caption has `start < 0` or `end <= start`
    pub fn new(captions: Vec<Caption>) -> Result<Self> {
        if captions.is_empty() {
            return Err(Error::InvalidInput("No captions found".to_string()));
        }

        for (index, caption) in captions.iter().enumerate() {
            caption.validate(index)?;
        }

        // Same-speaker ordering is assumed by the mixer; report it but keep caption order.
        let mut last_start: HashMap<&str, f64> = HashMap::new();
        for caption in &captions {
            if let Some(prev) = last_start.insert(caption.speaker.as_str(), caption.start) {
                if caption.start < prev {
                    warn!(
                        speaker = %caption.speaker,
                        start = caption.start,
                        previous_start = prev,
                        "Captions for speaker are not in chronological order"
                    );
                }
            }
        }

        Ok(Self { captions })
    }

    /// Load and validate a caption handoff file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "Caption file not found: {}",
                path.display()
            )));
        }

        let xml = std::fs::read_to_string(path)?;
        let list = Self::parse(&xml)?;
        debug!(
            "Loaded {} captions from {}",
            list.len(),
            path.display()
        );
        Ok(list)
    }

    /// Parse a caption handoff document
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut captions = Vec::new();
        let mut pending: Option<Caption> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(element)) if element.name().as_ref() == CAPTION_TAG => {
                    pending = Some(caption_from_attributes(&element)?);
                }
                Ok(Event::Empty(element)) if element.name().as_ref() == CAPTION_TAG => {
                    captions.push(caption_from_attributes(&element)?);
                }
                Ok(Event::Text(text)) => {
                    if let Some(caption) = pending.as_mut() {
                        let unescaped = text.unescape().map_err(|e| {
                            Error::InvalidInput(format!("Invalid caption text: {}", e))
                        })?;
                        caption.text.push_str(&unescaped);
                    }
                }
                Ok(Event::CData(data)) => {
                    if let Some(caption) = pending.as_mut() {
                        caption.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Ok(Event::End(element)) if element.name().as_ref() == CAPTION_TAG => {
                    if let Some(mut caption) = pending.take() {
                        caption.text = caption.text.trim().to_string();
                        captions.push(caption);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::InvalidInput(format!(
                        "Malformed caption XML at byte {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                Ok(_) => {}
            }
        }

        Self::new(captions)
    }

    /// Serialize captions to the handoff document format
    pub fn to_xml(&self) -> String {
        render_xml(&self.captions)
    }

    pub fn captions(&self) -> &[Caption] {
        &self.captions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Caption> {
        self.captions.iter()
    }

    pub fn len(&self) -> usize {
        self.captions.len()
    }

    /// Always false for a constructed list; provided for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }

    /// Latest caption end time in seconds
    pub fn max_end(&self) -> f64 {
        self.captions
            .iter()
            .map(|c| c.end)
            .fold(0.0, f64::max)
    }

    /// Speaker labels in order of first appearance
    pub fn speakers(&self) -> Vec<&str> {
        let mut speakers: Vec<&str> = Vec::new();
        for caption in &self.captions {
            if !speakers.contains(&caption.speaker.as_str()) {
                speakers.push(caption.speaker.as_str());
            }
        }
        speakers
    }
}

impl<'a> IntoIterator for &'a CaptionList {
    type Item = &'a Caption;
    type IntoIter = std::slice::Iter<'a, Caption>;

    fn into_iter(self) -> Self::IntoIter {
        self.captions.iter()
    }
}

/// Render captions as a handoff document
///
/// Accepts any slice (including an empty one) so producers can write the
/// document before a validated list exists.
pub fn render_xml(captions: &[Caption]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<captions>\n");
    for caption in captions {
        xml.push_str(&format!(
            "  <caption speaker=\"{}\" start=\"{}\" end=\"{}\">{}</caption>\n",
            escape(caption.speaker.as_str()),
            caption.start,
            caption.end,
            escape(caption.text.as_str())
        ));
    }
    xml.push_str("</captions>\n");
    xml
}

fn caption_from_attributes(element: &BytesStart<'_>) -> Result<Caption> {
    let mut speaker = None;
    let mut start = None;
    let mut end = None;

    for attribute in element.attributes() {
        let attribute = attribute
            .map_err(|e| Error::InvalidInput(format!("Invalid caption attribute: {}", e)))?;
        let value = attribute
            .unescape_value()
            .map_err(|e| Error::InvalidInput(format!("Invalid caption attribute value: {}", e)))?;

        match attribute.key.as_ref() {
            b"speaker" => speaker = Some(value.into_owned()),
            b"start" => start = Some(parse_seconds("start", &value)?),
            b"end" => end = Some(parse_seconds("end", &value)?),
            _ => {}
        }
    }

    let speaker = speaker
        .ok_or_else(|| Error::InvalidInput("Caption is missing 'speaker' attribute".to_string()))?;
    let start = start
        .ok_or_else(|| Error::InvalidInput("Caption is missing 'start' attribute".to_string()))?;
    let end =
        end.ok_or_else(|| Error::InvalidInput("Caption is missing 'end' attribute".to_string()))?;

    Ok(Caption::new(speaker, start, end, String::new()))
}

fn parse_seconds(name: &str, value: &str) -> Result<f64> {
    value.trim().parse::<f64>().map_err(|_| {
        Error::InvalidInput(format!("Caption '{}' is not a number: '{}'", name, value))
    })
}
