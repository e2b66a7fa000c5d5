use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::fs::write_atomic;
use crate::subtitle::cue::{CaptionCue, CueKind};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    #[default]
    Srt,
    Vtt,
    Ass,
}

impl SubtitleFormat {
    /// Like [`FromStr`], but unknown names fall back to SRT with a warning.
    pub fn parse_lenient(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(format = name, "unknown subtitle format; writing srt");
            Self::Srt
        })
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
            Self::Ass => "ass",
        }
    }

    /// Format implied by a file extension, if any.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()?.to_str()?.parse().ok()
    }
}

impl FromStr for SubtitleFormat {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            "vtt" | "webvtt" => Ok(Self::Vtt),
            "ass" | "ssa" => Ok(Self::Ass),
            other => Err(ReelError::validation(format!(
                "unknown subtitle format '{other}'"
            ))),
        }
    }
}

pub fn serialize(cues: &[CaptionCue], format: SubtitleFormat) -> String {
    match format {
        SubtitleFormat::Srt => to_srt(cues),
        SubtitleFormat::Vtt => to_vtt(cues),
        SubtitleFormat::Ass => to_ass(cues),
    }
}

pub fn write_subtitles(path: &Path, cues: &[CaptionCue], format: SubtitleFormat) -> ReelResult<()> {
    write_atomic(path, serialize(cues, format).as_bytes())
}

fn to_srt(cues: &[CaptionCue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            clock_ms(cue.start_ms, ','),
            clock_ms(cue.end_ms, ','),
            cue.text
        );
    }
    out
}

fn to_vtt(cues: &[CaptionCue]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for cue in cues {
        let _ = write!(
            out,
            "{} --> {}\n{}\n\n",
            clock_ms(cue.start_ms, '.'),
            clock_ms(cue.end_ms, '.'),
            cue.text
        );
    }
    out
}

const ASS_HEADER: &str = "[Script Info]
ScriptType: v4.00+
PlayResX: 1920
PlayResY: 1080
WrapStyle: 0
ScaledBorderAndShadow: yes

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Default,Arial,48,&H00FFFFFF,&H000000FF,&H00000000,&H80000000,0,0,0,0,100,100,0,0,1,2,1,2,40,40,60,1
Style: Title,Arial,64,&H00FFFFFF,&H000000FF,&H00000000,&H80000000,-1,0,0,0,100,100,0,0,1,3,1,8,40,40,60,1

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
";

fn to_ass(cues: &[CaptionCue]) -> String {
    let mut out = String::from(ASS_HEADER);
    for cue in cues {
        let style = match cue.kind {
            CueKind::Title => "Title",
            CueKind::Narration => "Default",
        };
        let _ = writeln!(
            out,
            "Dialogue: 0,{},{},{style},,0,0,0,,{}",
            clock_cs(cue.start_ms),
            clock_cs(cue.end_ms),
            ass_escape(&cue.text)
        );
    }
    out
}

/// `HH:MM:SS<sep>mmm`
fn clock_ms(ms: u64, sep: char) -> String {
    let (h, m, s) = hms(ms / 1000);
    format!("{h:02}:{m:02}:{s:02}{sep}{:03}", ms % 1000)
}

/// `H:MM:SS.cc`, truncated to centiseconds.
fn clock_cs(ms: u64) -> String {
    let (h, m, s) = hms(ms / 1000);
    format!("{h}:{m:02}:{s:02}.{:02}", (ms % 1000) / 10)
}

fn hms(total_secs: u64) -> (u64, u64, u64) {
    (total_secs / 3600, (total_secs % 3600) / 60, total_secs % 60)
}

fn ass_escape(text: &str) -> String {
    text.replace('\n', "\\N").replace('{', "\\{").replace('}', "\\}")
}

#[cfg(test)]
#[path = "../../tests/unit/subtitle/format.rs"]
mod tests;
