//! Narration through locally installed tools.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::narration::backend::{NarrationBackend, NarrationError, NarrationRequest};
use crate::narration::config::NarrationConfig;
use crate::stage::process::{ProcessSpec, is_on_path, run_process};

const GTTS_SNIPPET: &str = "import sys\n\
from gtts import gTTS\n\
gTTS(text=sys.argv[1], lang=sys.argv[2], slow=sys.argv[3] == '1').save(sys.argv[4])\n";

/// Google Translate TTS via the python `gtts` package.
#[derive(Clone, Copy, Debug, Default)]
pub struct Gtts;

impl Gtts {
    /// `gtts` takes a language rather than a voice; anything that does not look like one reads
    /// as English.
    pub fn language(voice: &str) -> String {
        let v = voice.trim();
        let looks_like_lang = (2..=5).contains(&v.len())
            && v.chars().all(|c| c.is_ascii_alphabetic() || c == '-');
        if looks_like_lang {
            v.to_ascii_lowercase()
        } else {
            "en".to_string()
        }
    }
}

impl NarrationBackend for Gtts {
    fn name(&self) -> &'static str {
        "google"
    }

    fn synthesize(
        &self,
        request: &NarrationRequest,
        output: &Path,
        timeout: Option<Duration>,
    ) -> Result<(), NarrationError> {
        if !is_on_path("python3") {
            return Err(NarrationError::BackendUnavailable(
                "google narration needs python3 with the gtts package".into(),
            ));
        }
        let slow = if request.speed < 0.75 { "1" } else { "0" };
        let spec = ProcessSpec::new("python3")
            .args(["-c", GTTS_SNIPPET])
            .arg(request.text.as_str())
            .arg(Gtts::language(&request.voice))
            .arg(slow)
            .arg(output.as_os_str());
        run_process(&spec, timeout)
            .map_err(|e| NarrationError::BackendUnavailable(format!("gtts: {}", e.cause())))
    }
}

/// The `sag` command line synthesizer.
#[derive(Clone, Debug)]
pub struct Sag {
    explicit: Option<PathBuf>,
}

impl Sag {
    pub fn from_config(config: &NarrationConfig) -> Self {
        Self {
            explicit: config.sag_path.clone(),
        }
    }

    /// Configured path, then `~/.local/bin/sag`, then `sag` on `PATH`.
    pub fn locate(&self) -> Option<PathBuf> {
        if let Some(p) = &self.explicit {
            return p.is_file().then(|| p.clone());
        }
        let home_bin = dirs::home_dir().map(|h| h.join(".local").join("bin").join("sag"));
        if let Some(p) = home_bin.filter(|p| p.is_file()) {
            return Some(p);
        }
        which::which("sag").ok()
    }
}

impl NarrationBackend for Sag {
    fn name(&self) -> &'static str {
        "sag"
    }

    fn synthesize(
        &self,
        request: &NarrationRequest,
        output: &Path,
        timeout: Option<Duration>,
    ) -> Result<(), NarrationError> {
        let exe = self.locate().ok_or_else(|| {
            NarrationError::BackendUnavailable(
                "no narration engine available; configure tts-config.json or install sag".into(),
            )
        })?;
        let spec = ProcessSpec::new(exe.to_string_lossy())
            .arg(request.text.as_str())
            .arg("--output")
            .arg(output.as_os_str());
        run_process(&spec, timeout)
            .map_err(|e| NarrationError::BackendUnavailable(format!("sag: {}", e.cause())))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/narration/local.rs"]
mod tests;
