//! Scene timelines: per-frame animation schedules and the manifest handed to the renderer.

pub mod manifest;
pub mod schedule;

pub use manifest::RenderManifest;
pub use schedule::{FrameSchedule, TimelineOptions, compile_scene};
