use std::path::{Path, PathBuf};

/// Outcome of one stage for one unit of work. Failures are data, never panics or errors.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResult {
    pub unit_id: String,
    pub succeeded: bool,
    pub output_path: PathBuf,
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageResult {
    pub fn success(unit_id: impl Into<String>, output_path: &Path, size_bytes: u64) -> Self {
        Self {
            unit_id: unit_id.into(),
            succeeded: true,
            output_path: output_path.to_path_buf(),
            size_bytes,
            error: None,
        }
    }

    pub fn failure(
        unit_id: impl Into<String>,
        output_path: &Path,
        error: impl Into<String>,
    ) -> Self {
        Self {
            unit_id: unit_id.into(),
            succeeded: false,
            output_path: output_path.to_path_buf(),
            size_bytes: 0,
            error: Some(error.into()),
        }
    }

    /// Prefix the error with the stage that produced it.
    pub fn context(mut self, stage: &str) -> Self {
        if let Some(err) = self.error.take() {
            self.error = Some(format!("{stage}: {err}"));
        }
        self
    }
}
