use std::path::Path;

use chrono::{DateTime, Utc};

use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::fs::write_atomic;
use crate::stage::result::StageResult;

pub const SUMMARY_FILE_NAME: &str = "batch-summary.json";

/// Run summary persisted next to the batch outputs.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub timestamp: DateTime<Utc>,
    /// Units submitted, including those not finished yet.
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    /// Combined size of the successful outputs.
    pub total_bytes: u64,
    /// False while the batch is still running.
    pub complete: bool,
    pub results: Vec<StageResult>,
}

impl BatchSummary {
    pub fn new(total: usize, results: Vec<StageResult>, complete: bool) -> Self {
        let success = results.iter().filter(|r| r.succeeded).count();
        let total_bytes = results
            .iter()
            .filter(|r| r.succeeded)
            .map(|r| r.size_bytes)
            .sum();
        Self {
            timestamp: Utc::now(),
            total,
            success,
            failed: results.len() - success,
            total_bytes,
            complete,
            results,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &StageResult> {
        self.results.iter().filter(|r| !r.succeeded)
    }

    pub fn pending(&self) -> usize {
        self.total.saturating_sub(self.results.len())
    }

    pub fn write(&self, path: &Path) -> ReelResult<()> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| ReelError::serde(e.to_string()))?;
        write_atomic(path, json.as_bytes())
    }

    pub fn load(path: &Path) -> ReelResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(anyhow::Error::from)?;
        serde_json::from_str(&raw).map_err(|e| ReelError::serde(e.to_string()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/batch/summary.rs"]
mod tests;
