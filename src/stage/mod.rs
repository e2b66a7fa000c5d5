//! Invoking external collaborators one unit at a time.
//!
//! A stage failure is reported as a [`StageResult`] and never aborts the caller.

pub mod process;
pub mod render;
pub mod result;
pub mod runner;

pub use process::{ProcessSpec, run_process, run_process_output};
pub use render::{RenderStage, RendererConfig};
pub use result::StageResult;
pub use runner::{Stage, StageOptions, run_stage};
