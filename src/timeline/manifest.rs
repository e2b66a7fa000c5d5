//! Composition descriptions handed to the external rendering engine.
//!
//! One composition per scene. Each carries the frame count computed by the timeline compiler and
//! the animation parameters the engine needs to reproduce the same per-frame schedule.

use std::path::{Path, PathBuf};

use crate::animation::spring::Spring;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::fs::write_atomic;
use crate::script::model::{Element, Script};
use crate::timeline::schedule::{TimelineOptions, compile_scene};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderManifest {
    pub compositions: Vec<Composition>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    pub id: String,
    pub component: String,
    pub duration_in_frames: u64,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub default_props: CompositionProps,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionProps {
    pub title: String,
    pub elements: Vec<Element>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voiceover: Option<String>,
    pub animation: AnimationProps,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationProps {
    pub scene_fade_frames: u64,
    pub element_fade_frames: u64,
    pub stagger_frames: u64,
    pub scene_spring: Spring,
    pub element_spring: Spring,
    pub min_scale: f64,
}

impl From<&TimelineOptions> for AnimationProps {
    fn from(o: &TimelineOptions) -> Self {
        Self {
            scene_fade_frames: o.scene_fade_frames,
            element_fade_frames: o.element_fade_frames,
            stagger_frames: o.stagger_frames,
            scene_spring: o.scene_spring,
            element_spring: o.element_spring,
            min_scale: o.min_scale,
        }
    }
}

impl RenderManifest {
    /// Describe every scene of `script` at the given frame rate and canvas.
    pub fn build(
        script: &Script,
        fps: Fps,
        canvas: Canvas,
        opts: &TimelineOptions,
    ) -> ReelResult<Self> {
        let animation = AnimationProps::from(opts);
        let compositions = script
            .scenes
            .iter()
            .enumerate()
            .map(|(index, scene)| {
                let schedule = compile_scene(scene, fps, opts)?;
                Ok(Composition {
                    id: scene.id.clone(),
                    component: format!("Scene{}", index + 1),
                    // Renderers reject empty compositions; sub-frame scenes still get one frame.
                    duration_in_frames: schedule.total_frames().max(1),
                    fps: fps.as_f64(),
                    width: canvas.width,
                    height: canvas.height,
                    default_props: CompositionProps {
                        title: scene.title.clone(),
                        elements: scene.elements.clone(),
                        voiceover: scene.narration().map(str::to_owned),
                        animation,
                    },
                })
            })
            .collect::<ReelResult<Vec<_>>>()?;

        Ok(Self { compositions })
    }

    pub fn total_frames(&self) -> u64 {
        self.compositions.iter().map(|c| c.duration_in_frames).sum()
    }

    pub fn to_json_pretty(&self) -> ReelResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ReelError::serde(e.to_string()))
    }

    pub fn write(&self, path: &Path) -> ReelResult<()> {
        let json = self.to_json_pretty()?;
        write_atomic(path, json.as_bytes())
    }

    /// Write each composition's `defaultProps` to its own JSON file in `dir`, in scene order.
    /// Renderers take these as input props.
    pub fn write_props(&self, dir: &Path) -> ReelResult<Vec<PathBuf>> {
        self.compositions
            .iter()
            .enumerate()
            .map(|(index, comp)| {
                let path = dir.join(format!("{}.json", scene_file_stem(index, &comp.id)));
                let json = serde_json::to_vec_pretty(&comp.default_props)
                    .map_err(|e| ReelError::serde(e.to_string()))?;
                write_atomic(&path, &json)?;
                Ok(path)
            })
            .collect()
    }
}

/// File stem for per-scene artifacts, e.g. `003-intro`. Ids are reduced to a flat, portable name.
pub fn scene_file_stem(index: usize, scene_id: &str) -> String {
    let safe: String = scene_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{:03}-{safe}", index + 1)
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/manifest.rs"]
mod tests;
