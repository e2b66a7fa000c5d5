use std::path::{Path, PathBuf};

use crate::foundation::error::{ReelError, ReelResult};
use crate::stage::process::{ProcessSpec, run_process};
use crate::stage::runner::{Stage, StageOptions};

/// Command line used when no renderer is configured.
pub const DEFAULT_RENDERER: &str =
    "npx remotion render {entry} {composition} {output} --props={props}";
pub const DEFAULT_ENTRY: &str = "src/index.ts";
/// Environment variable carrying the manifest path to the renderer process.
pub const MANIFEST_ENV: &str = "STORYREEL_MANIFEST";

/// How to invoke the external rendering engine.
///
/// Each template token may contain `{entry}`, `{composition}`, `{manifest}`, `{props}` and
/// `{output}` placeholders, substituted per invocation. `{props}` is a JSON file holding the
/// composition's input props.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RendererConfig {
    pub template: Vec<String>,
    pub entry: String,
    pub project_dir: Option<PathBuf>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_RENDERER.split_whitespace().map(str::to_owned).collect(),
            entry: DEFAULT_ENTRY.to_string(),
            project_dir: None,
        }
    }
}

impl RendererConfig {
    pub fn from_template(template: &str) -> ReelResult<Self> {
        let tokens: Vec<String> = template.split_whitespace().map(str::to_owned).collect();
        if tokens.is_empty() {
            return Err(ReelError::configuration("renderer command is empty"));
        }
        if !tokens.iter().any(|t| t.contains("{output}")) {
            return Err(ReelError::configuration(
                "renderer command must reference {output}",
            ));
        }
        Ok(Self {
            template: tokens,
            ..Self::default()
        })
    }

    pub fn with_project_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.project_dir = dir;
        self
    }

    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = entry.into();
        self
    }

    pub fn program(&self) -> Option<&str> {
        self.template.first().map(String::as_str)
    }

    pub fn process_for(
        &self,
        composition: &str,
        manifest: &Path,
        props: &Path,
        output: &Path,
    ) -> ReelResult<ProcessSpec> {
        let (program, rest) = self
            .template
            .split_first()
            .ok_or_else(|| ReelError::configuration("renderer command is empty"))?;
        let manifest_s = manifest.to_string_lossy();
        let props_s = props.to_string_lossy();
        let output_s = output.to_string_lossy();
        let fill = |token: &str| {
            token
                .replace("{entry}", &self.entry)
                .replace("{composition}", composition)
                .replace("{manifest}", &manifest_s)
                .replace("{props}", &props_s)
                .replace("{output}", &output_s)
        };

        let mut spec = ProcessSpec::new(fill(program))
            .args(rest.iter().map(|t| fill(t)))
            .env(MANIFEST_ENV, manifest_s.to_string());
        if let Some(dir) = &self.project_dir {
            spec = spec.current_dir(dir);
        }
        Ok(spec)
    }
}

/// Renders one scene composition to a video file.
#[derive(Clone, Debug)]
pub struct RenderStage<'a> {
    pub renderer: &'a RendererConfig,
    pub composition: String,
    pub manifest: PathBuf,
    pub props: PathBuf,
    pub output: PathBuf,
}

impl Stage for RenderStage<'_> {
    fn name(&self) -> &str {
        "render"
    }

    fn output_path(&self) -> &Path {
        &self.output
    }

    fn produce(&self, partial: &Path, opts: &StageOptions) -> ReelResult<()> {
        let spec = self
            .renderer
            .process_for(&self.composition, &self.manifest, &self.props, partial)?;
        tracing::info!(composition = %self.composition, "rendering");
        run_process(&spec, opts.timeout)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stage/render.rs"]
mod tests;
