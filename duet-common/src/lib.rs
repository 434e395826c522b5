//! # Duet Common Library
//!
//! Shared code for the Duet dialogue reconstruction tools:
//! - Caption handoff document (read and write)
//! - Speaker roster (display names and voice assignments)
//! - Subtitle rendering
//! - Configuration file discovery
//! - Fade curve definitions and calculations

pub mod captions;
pub mod config;
pub mod error;
pub mod fade_curves;
pub mod speakers;
pub mod subtitles;

pub use captions::{Caption, CaptionList};
pub use error::{Error, Result};
pub use fade_curves::FadeCurve;
pub use speakers::SpeakerRoster;
