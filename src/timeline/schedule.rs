use crate::animation::ease::{Ease, Ramp};
use crate::animation::spring::Spring;
use crate::foundation::core::{Affine, Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::script::model::Scene;

/// Tuning for [`compile_scene`]. Presets mirror the two scene styles scripts are drawn in.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimelineOptions {
    /// Length of the scene-level fade-in, starting at frame 0.
    pub scene_fade_frames: u64,
    /// Length of each element's own fade-in, starting after its stagger delay.
    pub element_fade_frames: u64,
    /// Delay between consecutive elements entering.
    pub stagger_frames: u64,
    pub ease: Ease,
    pub scene_spring: Spring,
    pub element_spring: Spring,
    /// Floor applied to spring scale before it becomes a transform.
    pub min_scale: f64,
}

impl TimelineOptions {
    pub fn video_script() -> Self {
        Self {
            scene_fade_frames: 30,
            element_fade_frames: 20,
            stagger_frames: 5,
            ease: Ease::Linear,
            scene_spring: Spring::new(1.0, 100.0, 10.0),
            element_spring: Spring::new(1.0, 100.0, 15.0),
            min_scale: 0.1,
        }
    }

    pub fn whiteboard() -> Self {
        Self {
            stagger_frames: 10,
            element_spring: Spring::new(1.0, 200.0, 15.0),
            ..Self::video_script()
        }
    }

    pub fn with_stagger(mut self, frames: u64) -> Self {
        self.stagger_frames = frames;
        self
    }

    pub fn validate(&self) -> ReelResult<()> {
        self.scene_spring.validate()?;
        self.element_spring.validate()?;
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            return Err(ReelError::compilation("min_scale must be > 0"));
        }
        Ok(())
    }
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self::video_script()
    }
}

/// Opacity and raw spring scale of one animated node at one frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct AnimationState {
    pub opacity: f64,
    pub scale: f64,
}

impl AnimationState {
    pub fn applied_scale(self, min_scale: f64) -> f64 {
        self.scale.max(min_scale)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ElementFrame {
    pub index: usize,
    pub kind: String,
    #[serde(flatten)]
    pub state: AnimationState,
    /// Affine coefficients scaling the element about its own center; absent for no-op elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<[f64; 6]>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FrameState {
    pub frame: FrameIndex,
    pub scene: AnimationState,
    pub elements: Vec<ElementFrame>,
}

/// Per-frame animation schedule of one scene. Borrowed from the scene; recompute on demand.
#[derive(Clone, Debug)]
pub struct FrameSchedule<'a> {
    scene: &'a Scene,
    fps: Fps,
    total_frames: u64,
    opts: TimelineOptions,
}

pub fn compile_scene<'a>(
    scene: &'a Scene,
    fps: Fps,
    opts: &TimelineOptions,
) -> ReelResult<FrameSchedule<'a>> {
    opts.validate()?;
    if !(scene.duration_seconds.is_finite() && scene.duration_seconds > 0.0) {
        return Err(ReelError::compilation(format!(
            "scene '{}' has non-positive duration",
            scene.id
        )));
    }

    Ok(FrameSchedule {
        scene,
        fps,
        total_frames: fps.secs_to_frames_floor(scene.duration_seconds),
        opts: *opts,
    })
}

impl<'a> FrameSchedule<'a> {
    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn options(&self) -> &TimelineOptions {
        &self.opts
    }

    pub fn element_count(&self) -> usize {
        self.scene.elements.len()
    }

    pub fn element_delay(&self, index: usize) -> u64 {
        (index as u64).saturating_mul(self.opts.stagger_frames)
    }

    pub fn scene_state(&self, frame: FrameIndex) -> AnimationState {
        let fade = Ramp::new(0, self.opts.scene_fade_frames, self.opts.ease);
        AnimationState {
            opacity: fade.sample(frame.0),
            scale: self.spring_scale(&self.opts.scene_spring, frame.0 as i64),
        }
    }

    pub fn element_state(&self, index: usize, frame: FrameIndex) -> Option<AnimationState> {
        if index >= self.element_count() {
            return None;
        }
        let delay = self.element_delay(index);
        let fade = Ramp::new(delay, self.opts.element_fade_frames, self.opts.ease);
        let offset = frame.0 as i64 - delay as i64;
        Some(AnimationState {
            opacity: fade.sample(frame.0),
            scale: self.spring_scale(&self.opts.element_spring, offset),
        })
    }

    /// Scale about the element's bounding-box center, using the floored scale.
    pub fn element_transform(&self, index: usize, frame: FrameIndex) -> Option<Affine> {
        let bounds = self.scene.elements.get(index)?.bounds()?;
        let state = self.element_state(index, frame)?;
        let center = bounds.center().to_vec2();
        let s = state.applied_scale(self.opts.min_scale);
        Some(Affine::translate(center) * Affine::scale(s) * Affine::translate(-center))
    }

    pub fn state_at(&self, frame: FrameIndex) -> FrameState {
        let elements = self
            .scene
            .elements
            .iter()
            .enumerate()
            .filter_map(|(index, el)| {
                let state = self.element_state(index, frame)?;
                Some(ElementFrame {
                    index,
                    kind: el.kind().to_string(),
                    state,
                    transform: self
                        .element_transform(index, frame)
                        .map(|a| a.as_coeffs()),
                })
            })
            .collect();

        FrameState {
            frame,
            scene: self.scene_state(frame),
            elements,
        }
    }

    /// Every frame of the scene in order.
    pub fn sample_range(&self) -> impl Iterator<Item = FrameState> + '_ {
        (0..self.total_frames).map(|f| self.state_at(FrameIndex(f)))
    }

    /// First frame from which every opacity ramp in the scene reads exactly 1.
    pub fn settled_opacity_frame(&self) -> u64 {
        let last_element = self
            .element_count()
            .checked_sub(1)
            .map(|i| self.element_delay(i) + self.opts.element_fade_frames)
            .unwrap_or(0);
        self.opts.scene_fade_frames.max(last_element)
    }

    fn spring_scale(&self, spring: &Spring, frame_offset: i64) -> f64 {
        spring.sample_frame(frame_offset, self.fps).max(0.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/schedule.rs"]
mod tests;
