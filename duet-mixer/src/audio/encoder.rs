//! WAV serialization of finished tracks
//!
//! Tracks are encoded to in-memory WAV containers with hound; writing them
//! to disk is left to the publishing step. Mono files hold one speaker; the
//! stereo file carries the first speaker on the left and the second on the
//! right.

use crate::audio::types::WaveBuffer;
use crate::config::SampleFormat;
use crate::error::{Error, Result};
use hound::{WavSpec, WavWriter};
use std::io::Cursor;
use tracing::debug;

/// Two mono tracks of equal length forming a stereo pair
#[derive(Debug, Clone, PartialEq)]
pub struct StereoBuffer {
    left: Vec<f32>,
    right: Vec<f32>,
    sample_rate: u32,
}

impl StereoBuffer {
    /// Pair two tracks, zero-padding the shorter one to the longer length
    ///
    /// # Errors
    /// `Encode` if the two tracks are at different sample rates.
    pub fn compose(left: &WaveBuffer, right: &WaveBuffer) -> Result<Self> {
        if left.sample_rate() != right.sample_rate() {
            return Err(Error::Encode(format!(
                "Cannot compose {}Hz and {}Hz tracks",
                left.sample_rate(),
                right.sample_rate()
            )));
        }

        let len = left.len().max(right.len());
        let mut l = left.samples().to_vec();
        let mut r = right.samples().to_vec();
        l.resize(len, 0.0);
        r.resize(len, 0.0);

        Ok(Self {
            left: l,
            right: r,
            sample_rate: left.sample_rate(),
        })
    }

    pub fn left(&self) -> &[f32] {
        &self.left
    }

    pub fn right(&self) -> &[f32] {
        &self.right
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

/// Encode planar channels into WAV bytes
///
/// All channels are written with the length of the longest one; an empty
/// input is encoded as a single zero frame.
///
/// # Arguments
/// * `channels` - One slice per channel (1 = mono, 2 = stereo)
/// * `sample_rate` - Output rate (Hz)
/// * `format` - 16-bit PCM or 32-bit float
pub fn encode_wav(channels: &[&[f32]], sample_rate: u32, format: SampleFormat) -> Result<Vec<u8>> {
    if channels.is_empty() {
        return Err(Error::Encode("No channels to encode".to_string()));
    }

    let spec = match format {
        SampleFormat::Pcm16 => WavSpec {
            channels: channels.len() as u16,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        },
        SampleFormat::Float32 => WavSpec {
            channels: channels.len() as u16,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        },
    };

    let frames = channels.iter().map(|c| c.len()).max().unwrap_or(0).max(1);

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for i in 0..frames {
            for channel in channels {
                let sample = channel.get(i).copied().unwrap_or(0.0);
                match format {
                    SampleFormat::Pcm16 => writer.write_sample(to_pcm16(sample))?,
                    SampleFormat::Float32 => writer.write_sample(sample)?,
                }
            }
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

/// Encode a mono track
pub fn encode_mono(buffer: &WaveBuffer, format: SampleFormat) -> Result<Vec<u8>> {
    let bytes = encode_wav(&[buffer.samples()], buffer.sample_rate(), format)?;
    debug!("Encoded mono track: {} samples, {} bytes", buffer.len(), bytes.len());
    Ok(bytes)
}

/// Encode a stereo pair (left channel first)
pub fn encode_stereo(buffer: &StereoBuffer, format: SampleFormat) -> Result<Vec<u8>> {
    let bytes = encode_wav(&[buffer.left(), buffer.right()], buffer.sample_rate(), format)?;
    debug!("Encoded stereo track: {} frames, {} bytes", buffer.len(), bytes.len());
    Ok(bytes)
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_back(bytes: Vec<u8>) -> (WavSpec, Vec<i32>) {
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        let samples = reader.samples::<i32>().map(|s| s.unwrap()).collect();
        (spec, samples)
    }

    #[test]
    fn test_compose_pads_shorter_channel() {
        let left = WaveBuffer::new(vec![0.1, 0.2, 0.3], 22050);
        let right = WaveBuffer::new(vec![0.4], 22050);
        let stereo = StereoBuffer::compose(&left, &right).unwrap();
        assert_eq!(stereo.len(), 3);
        assert_eq!(stereo.right(), &[0.4, 0.0, 0.0]);
        assert_eq!(stereo.left(), left.samples());
    }

    #[test]
    fn test_compose_rejects_rate_mismatch() {
        let err = StereoBuffer::compose(&WaveBuffer::silence(1, 22050), &WaveBuffer::silence(1, 24000))
            .unwrap_err();
        assert_eq!(err.tag(), "EncodeError");
    }

    #[test]
    fn test_pcm16_mono() {
        let channel: &[f32] = &[0.0, 1.0, -1.0, 2.0];
        let bytes = encode_wav(&[channel], 22050, SampleFormat::Pcm16).unwrap();
        let (spec, samples) = read_back(bytes);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(samples, vec![0, 32767, -32767, 32767]);
    }

    #[test]
    fn test_stereo_interleaving() {
        let left: &[f32] = &[1.0, 1.0];
        let right: &[f32] = &[0.0, 0.0];
        let bytes = encode_wav(&[left, right], 8000, SampleFormat::Pcm16).unwrap();
        let (spec, samples) = read_back(bytes);
        assert_eq!(spec.channels, 2);
        assert_eq!(samples, vec![32767, 0, 32767, 0]);
    }

    #[test]
    fn test_encode_stereo_pair() {
        let stereo = StereoBuffer::compose(
            &WaveBuffer::new(vec![0.5, 0.5], 22050),
            &WaveBuffer::new(vec![-0.5], 22050),
        )
        .unwrap();
        let (spec, samples) = read_back(encode_stereo(&stereo, SampleFormat::Pcm16).unwrap());
        assert_eq!(spec.channels, 2);
        assert_eq!(samples.len(), 4);
        assert!(samples[0] > 0 && samples[1] < 0);
        assert_eq!(samples[3], 0);
    }

    #[test]
    fn test_empty_channel_encodes_one_sample() {
        let empty: &[f32] = &[];
        let bytes = encode_wav(&[empty], 22050, SampleFormat::Float32).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_format, hound::SampleFormat::Float);
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0.0]);
    }
}
