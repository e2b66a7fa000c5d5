//! Narration to time-coded caption tracks.

pub mod cue;
pub mod format;

pub use cue::{CaptionCue, CueKind, SubtitleOptions, compile_script};
pub use format::{SubtitleFormat, serialize, write_subtitles};
