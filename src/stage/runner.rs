use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::fs::{ensure_parent_dir, file_size, partial_path};
use crate::stage::result::StageResult;

/// One invocation of an external collaborator producing a single artifact.
pub trait Stage {
    /// Short name used in logs and error prefixes.
    fn name(&self) -> &str;

    /// Where the artifact lands on success.
    fn output_path(&self) -> &Path;

    /// Write the artifact to `partial`. Called at most once per [`run_stage`].
    fn produce(&self, partial: &Path, opts: &StageOptions) -> ReelResult<()>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageOptions {
    /// Per-invocation deadline for external processes; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl StageOptions {
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Run `stage` for `unit_id`, converting every failure into a failed [`StageResult`].
///
/// The stage writes into a scratch file unique to the unit; only a non-empty artifact is renamed
/// onto the final output path, so a failed run never leaves a truncated file behind.
pub fn run_stage(unit_id: &str, stage: &dyn Stage, opts: &StageOptions) -> StageResult {
    let output = stage.output_path();
    let partial = partial_path(output, unit_id);
    let _span = tracing::info_span!("stage", stage = stage.name(), unit = unit_id).entered();

    match attempt(unit_id, stage, output, &partial, opts) {
        Ok(size) => {
            tracing::info!(output = %output.display(), bytes = size, "stage succeeded");
            StageResult::success(unit_id, output, size)
        }
        Err(err) => {
            let _ = std::fs::remove_file(&partial);
            let cause = err.cause();
            tracing::warn!(error = %cause, "stage failed");
            StageResult::failure(unit_id, output, cause)
        }
    }
}

fn attempt(
    unit_id: &str,
    stage: &dyn Stage,
    output: &Path,
    partial: &Path,
    opts: &StageOptions,
) -> ReelResult<u64> {
    ensure_parent_dir(output)?;
    if partial.exists() {
        std::fs::remove_file(partial)
            .with_context(|| format!("failed to clear stale '{}'", partial.display()))?;
    }

    stage.produce(partial, opts)?;

    let size = match file_size(partial) {
        None => {
            return Err(ReelError::stage(
                unit_id,
                format!("{} reported success but wrote no output", stage.name()),
            ));
        }
        Some(0) => {
            return Err(ReelError::stage(
                unit_id,
                format!("{} produced an empty output", stage.name()),
            ));
        }
        Some(n) => n,
    };

    std::fs::rename(partial, output).with_context(|| {
        format!(
            "failed to move '{}' onto '{}'",
            partial.display(),
            output.display()
        )
    })?;
    Ok(size)
}

#[cfg(test)]
#[path = "../../tests/unit/stage/runner.rs"]
mod tests;
