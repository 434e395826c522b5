//! SubRip subtitle rendering
//!
//! One block per caption, in caption order, using the caption's original
//! timestamps:
//!
//! ```text
//! 1
//! 00:00:00,080 --> 00:00:01,520
//! Alice: Hello there.
//!
//! ```

use crate::captions::Caption;
use crate::speakers::SpeakerRoster;
use std::fmt::Write;

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`)
///
/// Rounds to the nearest millisecond. Negative input is treated as zero.
///
/// # Examples
///
/// ```
/// use duet_common::subtitles::format_srt_time;
///
/// assert_eq!(format_srt_time(0.0), "00:00:00,000");
/// assert_eq!(format_srt_time(1.5), "00:00:01,500");
/// assert_eq!(format_srt_time(3723.0456), "01:02:03,046");
/// ```
pub fn format_srt_time(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Render the subtitle track for a caption sequence
pub fn render_srt<'a, I>(captions: I, roster: &SpeakerRoster) -> String
where
    I: IntoIterator<Item = &'a Caption>,
{
    let mut srt = String::new();
    for (index, caption) in captions.into_iter().enumerate() {
        // Writing to a String cannot fail
        let _ = write!(
            srt,
            "{}\n{} --> {}\n{}: {}\n\n",
            index + 1,
            format_srt_time(caption.start),
            format_srt_time(caption.end),
            roster.display_name(&caption.speaker),
            caption.text
        );
    }
    srt
}
