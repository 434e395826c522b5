//! Audio primitives: buffers, decoding, resampling and WAV encoding

pub mod decoder;
pub mod encoder;
pub mod resampler;
pub mod types;

pub use decoder::DecodedRecording;
pub use encoder::StereoBuffer;
pub use resampler::Resampler;
pub use types::WaveBuffer;
