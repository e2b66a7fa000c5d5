use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context as _;
use rayon::prelude::*;

use crate::batch::summary::{BatchSummary, SUMMARY_FILE_NAME};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::fs::unit_tag;
use crate::stage::result::StageResult;

/// One script to turn into one video.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unit {
    pub id: String,
    pub script_path: PathBuf,
    /// Scratch directory owned by this unit alone.
    pub work_dir: PathBuf,
    pub output_path: PathBuf,
}

impl Unit {
    pub fn new(script_path: &Path, out_dir: &Path) -> Self {
        let id = script_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "script".to_string());
        Self {
            work_dir: out_dir
                .join(".work")
                .join(format!("{id}-{}", &unit_tag(&script_path.to_string_lossy())[..8])),
            output_path: out_dir.join(format!("{id}.mp4")),
            script_path: script_path.to_path_buf(),
            id,
        }
    }
}

/// Script files in `dir`: every `*.json` except `package.json`, sorted by file name.
pub fn discover_units(dir: &Path, out_dir: &Path) -> ReelResult<Vec<Unit>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read script directory '{}'", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list '{}'", dir.display()))?
            .path();
        let is_script = path.is_file()
            && path.extension().is_some_and(|e| e == "json")
            && path.file_name().is_some_and(|n| n != "package.json");
        if is_script {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths.iter().map(|p| Unit::new(p, out_dir)).collect())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchOptions {
    /// Units in flight at once; 1 runs strictly in order on the calling thread.
    pub concurrency: usize,
    pub summary_path: Option<PathBuf>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            summary_path: None,
        }
    }
}

impl BatchOptions {
    pub fn with_summary_in(mut self, out_dir: &Path) -> Self {
        self.summary_path = Some(out_dir.join(SUMMARY_FILE_NAME));
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BatchReport {
    /// One result per unit, in submission order.
    pub results: Vec<StageResult>,
    pub summary: BatchSummary,
}

struct Progress<'a> {
    total: usize,
    slots: Vec<Option<StageResult>>,
    summary_path: Option<&'a Path>,
}

impl Progress<'_> {
    fn record(&mut self, index: usize, result: StageResult) {
        self.slots[index] = Some(result);
        let done: Vec<StageResult> = self.slots.iter().flatten().cloned().collect();
        let summary = BatchSummary::new(self.total, done, false);
        tracing::debug!(pending = summary.pending(), "unit finished");
        if let Some(path) = self.summary_path
            && let Err(e) = summary.write(path)
        {
            tracing::warn!(path = %path.display(), error = %e, "failed to update batch summary");
        }
    }
}

/// Run `job` once per unit. A failing or panicking unit is recorded and the batch moves on.
pub fn run_all<F>(units: &[Unit], opts: &BatchOptions, job: F) -> ReelResult<BatchReport>
where
    F: Fn(&Unit) -> StageResult + Sync,
{
    if opts.concurrency == 0 {
        return Err(ReelError::validation("batch concurrency must be >= 1"));
    }

    let progress = Mutex::new(Progress {
        total: units.len(),
        slots: vec![None; units.len()],
        summary_path: opts.summary_path.as_deref(),
    });
    let run_one = |index: usize, unit: &Unit| {
        tracing::info!(unit = %unit.id, n = index + 1, of = units.len(), "unit started");
        let result = isolate(unit, &job);
        if result.succeeded {
            tracing::info!(unit = %unit.id, bytes = result.size_bytes, "unit succeeded");
        } else {
            tracing::warn!(unit = %unit.id, error = ?result.error, "unit failed");
        }
        if let Ok(mut p) = progress.lock() {
            p.record(index, result);
        }
    };

    if opts.concurrency == 1 {
        for (index, unit) in units.iter().enumerate() {
            run_one(index, unit);
        }
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(opts.concurrency)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build batch thread pool: {e}"))?;
        pool.install(|| {
            units
                .par_iter()
                .enumerate()
                .for_each(|(index, unit)| run_one(index, unit));
        });
    }

    let progress = progress
        .into_inner()
        .map_err(|_| anyhow::anyhow!("batch progress lock poisoned"))?;
    let results: Vec<StageResult> = progress
        .slots
        .into_iter()
        .zip(units)
        .map(|(slot, unit)| {
            slot.unwrap_or_else(|| {
                StageResult::failure(&unit.id, &unit.output_path, "unit never reported a result")
            })
        })
        .collect();

    let summary = BatchSummary::new(units.len(), results.clone(), true);
    // The report is still returned so the caller can print it.
    if let Some(path) = &opts.summary_path
        && let Err(e) = summary.write(path)
    {
        tracing::error!(path = %path.display(), error = %e, "failed to write final batch summary");
    }
    tracing::info!(
        total = summary.total,
        success = summary.success,
        failed = summary.failed,
        "batch finished"
    );
    Ok(BatchReport { results, summary })
}

fn isolate<F>(unit: &Unit, job: &F) -> StageResult
where
    F: Fn(&Unit) -> StageResult,
{
    catch_unwind(AssertUnwindSafe(|| job(unit))).unwrap_or_else(|panic| {
        let msg = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        StageResult::failure(&unit.id, &unit.output_path, format!("panicked: {msg}"))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/batch/orchestrator.rs"]
mod tests;
