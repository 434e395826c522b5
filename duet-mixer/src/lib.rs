//! # duet-mixer
//!
//! Dialogue timeline reconstruction engine. Places original recorded speech
//! and synthesized speech onto per-speaker timelines anchored to diarized
//! timestamps, then emits per-speaker tracks, a stereo mix and subtitles.
//!
//! **Operations:**
//! - [`pipeline::Generator::generate`]: captions + recording + voices → tracks
//! - [`transcribe::transcribe`]: recording → caption handoff document (+ stems)

pub mod audio;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod providers;
pub mod publish;
pub mod resolver;
pub mod stems;
pub mod timeline;
pub mod transcribe;

pub use config::{MixConfig, TomlConfig};
pub use error::{Error, Result};
pub use pipeline::{GenerateReport, GenerateRequest, Generator};
