use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};

pub const CONFIG_FILE_NAME: &str = "tts-config.json";

/// Credentials and voice aliases for the narration backends.
///
/// Loaded once by the caller and passed explicitly; nothing in the library reads it implicitly.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Azure Speech region, e.g. `westeurope`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Alias to backend voice id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub voices: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sag_path: Option<PathBuf>,
}

impl NarrationConfig {
    /// `<config dir>/storyreel/tts-config.json`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("storyreel").join(CONFIG_FILE_NAME))
    }

    pub fn load(path: &Path) -> ReelResult<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read narration config '{}'", path.display()))?;
        serde_json::from_str(&raw).map_err(|e| {
            ReelError::configuration(format!(
                "invalid narration config '{}': {e}",
                path.display()
            ))
        })
    }

    /// Load `path`, treating a missing file as an empty config.
    pub fn load_or_default(path: &Path) -> ReelResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no narration config; using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// Map a requested voice through the alias table, then the configured default.
    pub fn resolve_voice(&self, voice: &str) -> String {
        if let Some(id) = self.voices.get(voice) {
            return id.clone();
        }
        match (&self.default_voice, voice) {
            (Some(default), "" | "default") => default.clone(),
            _ => voice.to_string(),
        }
    }

    fn configured_engine(&self) -> Option<Engine> {
        self.engine.as_deref().and_then(|e| e.parse().ok())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    Auto,
    ElevenLabs,
    Google,
    Azure,
    Sag,
}

impl Engine {
    /// Resolve `Auto` against the configuration; explicit engines are returned as is.
    pub fn select(self, config: &NarrationConfig) -> Engine {
        if self != Engine::Auto {
            return self;
        }
        match config.configured_engine() {
            Some(Engine::ElevenLabs) if config.api_key().is_some() => Engine::ElevenLabs,
            Some(Engine::Azure) if config.api_key().is_some() => Engine::Azure,
            Some(Engine::Google) => Engine::Google,
            _ => Engine::Sag,
        }
    }
}

impl FromStr for Engine {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "elevenlabs" => Ok(Self::ElevenLabs),
            "google" | "gtts" => Ok(Self::Google),
            "azure" => Ok(Self::Azure),
            "sag" => Ok(Self::Sag),
            other => Err(ReelError::configuration(format!(
                "unknown narration engine '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::ElevenLabs => "elevenlabs",
            Self::Google => "google",
            Self::Azure => "azure",
            Self::Sag => "sag",
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/narration/config.rs"]
mod tests;
