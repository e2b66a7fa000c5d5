//! One script end to end: subtitles, manifest, per-scene renders, concatenation and optional
//! narration.

use std::path::{Path, PathBuf};

use crate::batch::orchestrator::Unit;
use crate::encode::ffmpeg::{
    ConcatStage, EncoderConfig, MAX_VOLUME, MIN_VOLUME, MuxStage, read_clip_info,
};
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};
use crate::narration::backend::{MAX_SPEED, MIN_SPEED, NarrationBackend, NarrationRequest};
use crate::narration::stage::NarrationStage;
use crate::script::model::Script;
use crate::stage::render::{RenderStage, RendererConfig};
use crate::stage::result::StageResult;
use crate::stage::runner::{StageOptions, run_stage};
use crate::subtitle::cue::{SubtitleOptions, compile_script};
use crate::subtitle::format::{SubtitleFormat, write_subtitles};
use crate::timeline::manifest::{RenderManifest, scene_file_stem};
use crate::timeline::schedule::TimelineOptions;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Narration settings for a pipeline run. The backend is chosen by the caller.
pub struct NarrationOptions {
    pub backend: Box<dyn NarrationBackend>,
    pub voice: String,
    pub speed: f64,
    pub volume: f64,
}

pub struct PipelineOptions {
    pub fps: Fps,
    pub canvas: Canvas,
    pub timeline: TimelineOptions,
    pub subtitles: SubtitleOptions,
    pub subtitle_format: SubtitleFormat,
    pub renderer: RendererConfig,
    pub encoder: EncoderConfig,
    pub stage: StageOptions,
    /// Cross-fade between scenes, in seconds; 0 joins them with a stream copy.
    pub transition_secs: f64,
    pub narration: Option<NarrationOptions>,
    /// Keep the unit's work directory after a successful run.
    pub keep_work: bool,
}

impl PipelineOptions {
    pub fn new(fps: Fps) -> Self {
        Self {
            fps,
            canvas: Canvas::default(),
            timeline: TimelineOptions::default(),
            subtitles: SubtitleOptions::default(),
            subtitle_format: SubtitleFormat::default(),
            renderer: RendererConfig::default(),
            encoder: EncoderConfig::default(),
            stage: StageOptions::default(),
            transition_secs: 0.0,
            narration: None,
            keep_work: false,
        }
    }

    /// Reject settings that would only fail after every scene has been rendered.
    pub fn validate(&self) -> ReelResult<()> {
        self.timeline.validate()?;
        if !(self.transition_secs.is_finite() && self.transition_secs >= 0.0) {
            return Err(ReelError::validation("transition must be a non-negative duration"));
        }
        if let Some(n) = &self.narration {
            if !(MIN_SPEED..=MAX_SPEED).contains(&n.speed) {
                return Err(ReelError::validation(format!(
                    "speed must be between {MIN_SPEED} and {MAX_SPEED}, got {}",
                    n.speed
                )));
            }
            if !(MIN_VOLUME..=MAX_VOLUME).contains(&n.volume) {
                return Err(ReelError::validation(format!(
                    "volume must be between {MIN_VOLUME} and {MAX_VOLUME}, got {}",
                    n.volume
                )));
            }
        }
        Ok(())
    }
}

/// Artifacts a unit writes besides its video.
pub fn subtitle_path(unit: &Unit, format: SubtitleFormat) -> PathBuf {
    unit.output_path.with_extension(format.extension())
}

/// Run every stage for `unit`. The first failing stage ends the unit and its error, prefixed
/// with the stage name, becomes the result.
pub fn run_unit(unit: &Unit, opts: &PipelineOptions) -> StageResult {
    let _span = tracing::info_span!("unit", id = %unit.id).entered();

    if let Err(e) = opts.validate() {
        return StageResult::failure(&unit.id, &unit.output_path, e.cause()).context("options");
    }

    let script = match Script::from_path(&unit.script_path) {
        Ok(s) => s,
        Err(e) => {
            return StageResult::failure(&unit.id, &unit.output_path, e.cause()).context("script");
        }
    };

    let fail = |stage: &str, e: ReelError| {
        StageResult::failure(&unit.id, &unit.output_path, e.cause()).context(stage)
    };

    let subs = subtitle_path(unit, opts.subtitle_format);
    let cues = compile_script(&script, &opts.subtitles);
    if let Err(e) = write_subtitles(&subs, &cues, opts.subtitle_format) {
        return fail("subtitles", e);
    }

    let manifest_path = unit.work_dir.join(MANIFEST_FILE_NAME);
    let props = match write_manifest(&script, &manifest_path, &unit.work_dir, opts) {
        Ok(props) => props,
        Err(e) => return fail("manifest", e),
    };

    let mut clips = Vec::with_capacity(script.scenes.len());
    for ((index, scene), props) in script.scenes.iter().enumerate().zip(props) {
        let clip = unit
            .work_dir
            .join("scenes")
            .join(format!("{}.mp4", scene_file_stem(index, &scene.id)));
        let stage = RenderStage {
            renderer: &opts.renderer,
            composition: scene.id.clone(),
            manifest: manifest_path.clone(),
            props,
            output: clip.clone(),
        };
        let res = run_stage(&unit.id, &stage, &opts.stage);
        if !res.succeeded {
            return retarget(res, unit).context(&format!("render scene '{}'", scene.id));
        }
        clips.push(clip);
    }

    let narration = opts
        .narration
        .as_ref()
        .and_then(|n| script.narration_text().map(|text| (n, text)));

    let video = if narration.is_some() {
        unit.work_dir.join("video.mp4")
    } else {
        unit.output_path.clone()
    };
    let mut concat = ConcatStage {
        encoder: &opts.encoder,
        inputs: clips,
        clips: Vec::new(),
        transition_secs: opts.transition_secs,
        output: video.clone(),
    };
    if concat.uses_crossfade() {
        match read_clip_info(&opts.encoder, &concat.inputs, opts.stage.timeout) {
            Ok(infos) => concat.clips = infos,
            Err(e) => return fail("clip info", e),
        }
    }
    let mut result = run_stage(&unit.id, &concat, &opts.stage);
    if !result.succeeded {
        return retarget(result, unit).context("concat");
    }

    if let Some((n, text)) = narration {
        let audio = unit.work_dir.join("narration.mp3");
        let stage = NarrationStage {
            backend: n.backend.as_ref(),
            request: NarrationRequest::new(text)
                .with_voice(n.voice.clone())
                .with_speed(n.speed),
            output: audio.clone(),
        };
        let res = run_stage(&unit.id, &stage, &opts.stage);
        if !res.succeeded {
            return retarget(res, unit).context("narration");
        }

        let mux = MuxStage {
            encoder: &opts.encoder,
            video,
            audio,
            volume: n.volume,
            output: unit.output_path.clone(),
        };
        result = run_stage(&unit.id, &mux, &opts.stage);
        if !result.succeeded {
            return result.context("mux");
        }
    }

    if !opts.keep_work
        && let Err(e) = std::fs::remove_dir_all(&unit.work_dir)
    {
        tracing::debug!(dir = %unit.work_dir.display(), error = %e, "could not remove work dir");
    }
    result
}

/// Write the manifest and one props file per scene; returns the props paths in scene order.
fn write_manifest(
    script: &Script,
    path: &Path,
    work_dir: &Path,
    opts: &PipelineOptions,
) -> ReelResult<Vec<PathBuf>> {
    let manifest = RenderManifest::build(script, opts.fps, opts.canvas, &opts.timeline)?;
    manifest.write(path)?;
    manifest.write_props(&work_dir.join("props"))
}

/// Failures of intermediate stages are reported against the unit's final output.
fn retarget(mut res: StageResult, unit: &Unit) -> StageResult {
    res.output_path = unit.output_path.clone();
    res
}

#[cfg(test)]
#[path = "../../tests/unit/batch/pipeline.rs"]
mod tests;
