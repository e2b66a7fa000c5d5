//! Running many scripts through the media pipeline and reporting on the run.

pub mod orchestrator;
pub mod pipeline;
pub mod summary;

pub use orchestrator::{BatchOptions, BatchReport, Unit, discover_units, run_all};
pub use pipeline::{NarrationOptions, PipelineOptions, run_unit};
pub use summary::{BatchSummary, SUMMARY_FILE_NAME};
