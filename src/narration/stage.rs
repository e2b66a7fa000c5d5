use std::path::{Path, PathBuf};

use crate::foundation::error::ReelResult;
use crate::narration::backend::{NarrationBackend, NarrationRequest};
use crate::stage::runner::{Stage, StageOptions};

/// Synthesizes one narration track through a [`NarrationBackend`].
pub struct NarrationStage<'a> {
    pub backend: &'a dyn NarrationBackend,
    pub request: NarrationRequest,
    pub output: PathBuf,
}

impl Stage for NarrationStage<'_> {
    fn name(&self) -> &str {
        "narration"
    }

    fn output_path(&self) -> &Path {
        &self.output
    }

    fn produce(&self, partial: &Path, opts: &StageOptions) -> ReelResult<()> {
        self.request.validate()?;
        tracing::info!(
            backend = self.backend.name(),
            chars = self.request.text.chars().count(),
            voice = %self.request.voice,
            "synthesizing narration"
        );
        self.backend
            .synthesize(&self.request, partial, opts.timeout)
            .map_err(Into::into)
    }
}
