#![forbid(unsafe_code)]
//! Compile declarative video scripts into per-frame animation timelines, time-coded subtitle
//! tracks and a staged media pipeline driving external renderers, narration backends and
//! `ffmpeg`.
//!
//! The compilers ([`timeline`], [`subtitle`]) are pure. Everything that touches the outside
//! world goes through [`stage::run_stage`], which turns faults into [`StageResult`] values so a
//! batch keeps going when one unit fails.

pub mod animation;
pub mod batch;
pub mod encode;
pub mod foundation;
pub mod narration;
pub mod script;
pub mod stage;
pub mod subtitle;
pub mod timeline;

pub use animation::ease::{Ease, Ramp};
pub use animation::spring::Spring;
pub use batch::{
    BatchOptions, BatchReport, BatchSummary, PipelineOptions, Unit, discover_units, run_all,
    run_unit,
};
pub use foundation::core::{Canvas, Fps, FrameIndex};
pub use foundation::error::{ReelError, ReelResult};
pub use script::{Element, Scene, Script};
pub use stage::{StageOptions, StageResult, run_stage};
pub use subtitle::{CaptionCue, SubtitleFormat, SubtitleOptions};
pub use timeline::{FrameSchedule, RenderManifest, TimelineOptions, compile_scene};
