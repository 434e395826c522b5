//! Duration conforming

use crate::audio::types::WaveBuffer;

/// Pad or truncate a buffer to exactly `target_len` samples
///
/// Longer buffers keep their prefix, shorter ones are zero-padded at the tail.
pub fn conform(buffer: WaveBuffer, target_len: usize) -> WaveBuffer {
    if buffer.len() == target_len {
        return buffer;
    }
    let rate = buffer.sample_rate();
    let mut samples = buffer.into_samples();
    samples.resize(target_len, 0.0);
    WaveBuffer::new(samples, rate)
}

/// Sample length of a caption window: `max(1, round(max(0.001, end - start) × rate))`
pub fn caption_len(start_sec: f64, end_sec: f64, sample_rate: u32) -> usize {
    let duration = (end_sec - start_sec).max(0.001);
    ((duration * sample_rate as f64).round() as usize).max(1)
}

/// Absolute timeline offset of a caption start: `floor(start × rate)`
pub fn start_sample(start_sec: f64, sample_rate: u32) -> usize {
    (start_sec * sample_rate as f64).floor().max(0.0) as usize
}

/// Fixed timeline length: `max(1, ceil(max_end × rate))`
pub fn timeline_len(max_end_sec: f64, sample_rate: u32) -> usize {
    ((max_end_sec * sample_rate as f64).ceil().max(0.0) as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_to_prefix() {
        let out = conform(WaveBuffer::new(vec![0.1, 0.2, 0.3, 0.4], 10), 2);
        assert_eq!(out.samples(), &[0.1, 0.2]);
    }

    #[test]
    fn test_pads_with_zeros() {
        let out = conform(WaveBuffer::new(vec![0.5], 10), 3);
        assert_eq!(out.samples(), &[0.5, 0.0, 0.0]);
        assert_eq!(out.sample_rate(), 10);
    }

    #[test]
    fn test_equal_length_unchanged() {
        let input = WaveBuffer::new(vec![0.5, -0.5], 10);
        assert_eq!(conform(input.clone(), 2), input);
    }

    #[test]
    fn test_caption_len() {
        assert_eq!(caption_len(0.0, 1.0, 22050), 22050);
        assert_eq!(caption_len(1.0, 1.0, 22050), 22);
        assert_eq!(caption_len(0.0, 0.00001, 100), 1);
    }

    #[test]
    fn test_timeline_len() {
        assert_eq!(timeline_len(2.0, 22050), 44100);
        assert_eq!(timeline_len(0.0, 22050), 1);
        assert_eq!(timeline_len(1.00001, 10), 11);
    }

    #[test]
    fn test_start_sample_floors() {
        assert_eq!(start_sample(1.0, 22050), 22050);
        assert_eq!(start_sample(0.99999, 10), 9);
    }
}
