use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::fs::{unit_tag, write_atomic};
use crate::stage::process::{ProcessSpec, is_on_path, run_process, run_process_output};
use crate::stage::runner::{Stage, StageOptions};

pub const MIN_VOLUME: f64 = 0.0;
pub const MAX_VOLUME: f64 = 2.0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

impl EncoderConfig {
    fn command(&self) -> ProcessSpec {
        ProcessSpec::new(self.ffmpeg.as_str()).args(["-y", "-loglevel", "error"])
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    is_on_path("ffmpeg") && is_on_path("ffprobe")
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MediaInfo {
    pub duration_sec: f64,
    pub has_video: bool,
    pub has_audio: bool,
}

pub fn read_media_info(
    ffprobe: &str,
    source_path: &Path,
    timeout: Option<Duration>,
) -> ReelResult<MediaInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let spec = ProcessSpec::new(ffprobe)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path.as_os_str());
    let stdout = run_process_output(&spec, timeout).map_err(|e| {
        anyhow::anyhow!("ffprobe failed for '{}': {}", source_path.display(), e.cause())
    })?;

    let parsed: ProbeOut = serde_json::from_slice(&stdout)
        .map_err(|e| ReelError::serde(format!("ffprobe json parse failed: {e}")))?;
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);
    let has = |kind: &str| {
        parsed
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some(kind))
    };

    Ok(MediaInfo {
        duration_sec,
        has_video: has("video"),
        has_audio: has("audio"),
    })
}

/// Probe every input in order, e.g. ahead of a cross-fading [`ConcatStage`].
pub fn read_clip_info(
    encoder: &EncoderConfig,
    inputs: &[PathBuf],
    timeout: Option<Duration>,
) -> ReelResult<Vec<MediaInfo>> {
    inputs
        .iter()
        .map(|p| read_media_info(&encoder.ffprobe, p, timeout))
        .collect()
}

fn require_inputs<'p>(inputs: impl IntoIterator<Item = &'p Path>) -> ReelResult<()> {
    for p in inputs {
        if !p.is_file() {
            return Err(ReelError::validation(format!(
                "input file not found: '{}'",
                p.display()
            )));
        }
    }
    Ok(())
}

/// Lays a narration track over a rendered video. Video is stream-copied; audio is re-encoded
/// to AAC and the result is cut to the shorter input.
#[derive(Clone, Debug)]
pub struct MuxStage<'a> {
    pub encoder: &'a EncoderConfig,
    pub video: PathBuf,
    pub audio: PathBuf,
    pub volume: f64,
    pub output: PathBuf,
}

impl MuxStage<'_> {
    pub fn validate(&self) -> ReelResult<()> {
        if !(MIN_VOLUME..=MAX_VOLUME).contains(&self.volume) {
            return Err(ReelError::validation(format!(
                "volume must be between {MIN_VOLUME} and {MAX_VOLUME}, got {}",
                self.volume
            )));
        }
        require_inputs([self.video.as_path(), self.audio.as_path()])
    }

    pub fn command(&self, output: &Path) -> ProcessSpec {
        let mut spec = self
            .encoder
            .command()
            .arg("-i")
            .arg(self.video.as_os_str())
            .arg("-i")
            .arg(self.audio.as_os_str())
            .args(["-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a", "aac"]);
        if self.volume != 1.0 {
            spec = spec.args(["-af".to_string(), format!("volume={}", self.volume)]);
        }
        spec.arg("-shortest").arg(output.as_os_str())
    }
}

impl Stage for MuxStage<'_> {
    fn name(&self) -> &str {
        "mux"
    }

    fn output_path(&self) -> &Path {
        &self.output
    }

    fn produce(&self, partial: &Path, opts: &StageOptions) -> ReelResult<()> {
        self.validate()?;
        run_process(&self.command(partial), opts.timeout)
    }
}

/// Joins clips end to end, optionally cross-fading between consecutive clips.
///
/// Cross-fading needs each input's duration and audio layout up front in `clips` (see
/// [`read_clip_info`]); the stage itself runs a single ffmpeg.
#[derive(Clone, Debug)]
pub struct ConcatStage<'a> {
    pub encoder: &'a EncoderConfig,
    pub inputs: Vec<PathBuf>,
    pub clips: Vec<MediaInfo>,
    pub transition_secs: f64,
    pub output: PathBuf,
}

impl ConcatStage<'_> {
    /// Concat demuxer list file for this output; distinct outputs never share one.
    pub fn list_path(&self) -> PathBuf {
        let stem = self
            .output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "concat".to_string());
        let tag = unit_tag(&self.output.to_string_lossy());
        self.output.with_file_name(format!(".{stem}.{tag}.concat.txt"))
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.inputs.is_empty() {
            return Err(ReelError::validation("concat needs at least one input"));
        }
        if !(self.transition_secs.is_finite() && self.transition_secs >= 0.0) {
            return Err(ReelError::validation("transition must be a non-negative duration"));
        }
        if self.uses_crossfade() && self.clips.len() != self.inputs.len() {
            return Err(ReelError::validation(format!(
                "cross-fade needs media info for all {} inputs, got {}",
                self.inputs.len(),
                self.clips.len()
            )));
        }
        require_inputs(self.inputs.iter().map(PathBuf::as_path))
    }

    pub fn uses_crossfade(&self) -> bool {
        self.transition_secs > 0.0 && self.inputs.len() > 1
    }

    fn concat_copy(&self, partial: &Path, opts: &StageOptions) -> ReelResult<()> {
        let list = self.list_path();
        let mut body = String::new();
        for input in &self.inputs {
            let abs = std::path::absolute(input)
                .with_context(|| format!("resolve '{}'", input.display()))?;
            body.push_str(&concat_list_entry(&abs));
        }
        write_atomic(&list, body.as_bytes())?;

        let spec = self
            .encoder
            .command()
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(list.as_os_str())
            .args(["-c", "copy"])
            .arg(partial.as_os_str());
        let res = run_process(&spec, opts.timeout);
        let _ = std::fs::remove_file(&list);
        res
    }

    pub fn crossfade_command(&self, output: &Path) -> ReelResult<ProcessSpec> {
        let durations: Vec<f64> = self.clips.iter().map(|c| c.duration_sec).collect();
        let with_audio = self.clips.iter().all(|c| c.has_audio);
        let graph = xfade_graph(&durations, self.transition_secs, with_audio)?;

        let mut spec = self.encoder.command();
        for input in &self.inputs {
            spec = spec.arg("-i").arg(input.as_os_str());
        }
        spec = spec
            .arg("-filter_complex")
            .arg(graph.filter)
            .args(["-map".to_string(), graph.video_label]);
        spec = match graph.audio_label {
            Some(label) => spec.args(["-map".to_string(), label, "-c:a".into(), "aac".into()]),
            None => spec.arg("-an"),
        };
        Ok(spec
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p", "-movflags", "+faststart"])
            .arg(output.as_os_str()))
    }
}

impl Stage for ConcatStage<'_> {
    fn name(&self) -> &str {
        "concat"
    }

    fn output_path(&self) -> &Path {
        &self.output
    }

    fn produce(&self, partial: &Path, opts: &StageOptions) -> ReelResult<()> {
        self.validate()?;
        if self.uses_crossfade() {
            run_process(&self.crossfade_command(partial)?, opts.timeout)
        } else {
            self.concat_copy(partial, opts)
        }
    }
}

/// One `file '...'` line, with single quotes escaped the way the concat demuxer expects.
pub fn concat_list_entry(path: &Path) -> String {
    format!("file '{}'\n", path.to_string_lossy().replace('\'', r"'\''"))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterGraph {
    pub filter: String,
    pub video_label: String,
    pub audio_label: Option<String>,
}

/// Chain `xfade` (and `acrossfade` when every clip has audio) across all clips.
///
/// Clip *i* starts fading in at the summed length of the clips before it, minus one transition
/// per preceding join.
pub fn xfade_graph(durations: &[f64], transition: f64, with_audio: bool) -> ReelResult<FilterGraph> {
    if durations.len() < 2 {
        return Err(ReelError::validation("cross-fade needs at least two clips"));
    }
    if let Some((i, d)) = durations
        .iter()
        .enumerate()
        .find(|(_, d)| **d <= transition)
    {
        return Err(ReelError::validation(format!(
            "clip {} lasts {d:.3}s, not longer than the {transition:.3}s transition",
            i + 1
        )));
    }

    let mut parts = Vec::new();
    let mut elapsed = 0.0;
    let mut video = "[0:v]".to_string();
    let mut audio = "[0:a]".to_string();
    for i in 1..durations.len() {
        elapsed += durations[i - 1];
        let offset = elapsed - transition * i as f64;
        let v_out = format!("[v{i}]");
        parts.push(format!(
            "{video}[{i}:v]xfade=transition=fade:duration={transition:.3}:offset={offset:.3}{v_out}"
        ));
        video = v_out;
        if with_audio {
            let a_out = format!("[a{i}]");
            parts.push(format!("{audio}[{i}:a]acrossfade=d={transition:.3}{a_out}"));
            audio = a_out;
        }
    }

    Ok(FilterGraph {
        filter: parts.join(";"),
        video_label: video,
        audio_label: with_audio.then_some(audio),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
