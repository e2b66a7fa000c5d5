use std::path::Path;
use std::time::Duration;

use crate::foundation::error::{ReelError, ReelResult};
use crate::narration::config::{Engine, NarrationConfig};
use crate::narration::http::{AzureSpeech, ElevenLabs};
use crate::narration::local::{Gtts, Sag};

pub const MIN_SPEED: f64 = 0.5;
pub const MAX_SPEED: f64 = 2.0;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NarrationRequest {
    pub text: String,
    pub voice: String,
    pub speed: f64,
}

impl NarrationRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: "default".to_string(),
            speed: 1.0,
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.text.trim().is_empty() {
            return Err(ReelError::validation("narration text is empty"));
        }
        if !(MIN_SPEED..=MAX_SPEED).contains(&self.speed) {
            return Err(ReelError::validation(format!(
                "speed must be between {MIN_SPEED} and {MAX_SPEED}, got {}",
                self.speed
            )));
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NarrationError {
    #[error("{backend} requires {credential}; add it to the narration config")]
    MissingCredentials {
        backend: &'static str,
        credential: &'static str,
    },

    #[error("narration backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("upstream returned {status}: {message}")]
    UpstreamError { status: u16, message: String },
}

impl From<NarrationError> for ReelError {
    fn from(err: NarrationError) -> Self {
        match err {
            NarrationError::MissingCredentials { .. } => ReelError::configuration(err.to_string()),
            other => ReelError::Other(anyhow::Error::new(other)),
        }
    }
}

/// A text-to-speech collaborator. One call per request; writes audio bytes to `output`.
pub trait NarrationBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn synthesize(
        &self,
        request: &NarrationRequest,
        output: &Path,
        timeout: Option<Duration>,
    ) -> Result<(), NarrationError>;
}

/// Build the backend for `engine`, resolving `Auto` against `config`.
pub fn backend_for(engine: Engine, config: &NarrationConfig) -> Box<dyn NarrationBackend> {
    let selected = engine.select(config);
    tracing::debug!(requested = %engine, selected = %selected, "narration engine");
    match selected {
        Engine::ElevenLabs => Box::new(ElevenLabs::from_config(config)),
        Engine::Azure => Box::new(AzureSpeech::from_config(config)),
        Engine::Google => Box::new(Gtts),
        Engine::Sag | Engine::Auto => Box::new(Sag::from_config(config)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/narration/backend.rs"]
mod tests;
