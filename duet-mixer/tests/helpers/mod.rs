//! Test helper modules for duet-mixer integration tests
//!
//! - audio_generator: deterministic WAV recordings written with hound
//! - mock_synthesizer: scripted in-memory speech synthesizer
//! - mock_transcriber: scripted in-memory transcriber

#![allow(dead_code)]

pub mod audio_generator;
pub mod mock_synthesizer;
pub mod mock_transcriber;

pub use audio_generator::{generate_constant_wav, read_wav, WavContents};
pub use mock_synthesizer::MockSynthesizer;
pub use mock_transcriber::MockTranscriber;
