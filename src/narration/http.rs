//! Hosted text-to-speech APIs reached over HTTPS.

use std::path::Path;
use std::time::Duration;

use serde_json::json;

use crate::narration::backend::{NarrationBackend, NarrationError, NarrationRequest};
use crate::narration::config::NarrationConfig;

pub const ELEVENLABS_ENDPOINT: &str = "https://api.elevenlabs.io/v1/text-to-speech";
pub const ELEVENLABS_MODEL: &str = "eleven_multilingual_v2";
/// Voice used when neither the request nor the config names one.
pub const ELEVENLABS_FALLBACK_VOICE: &str = "21m00Tcm4TlvDq8ikWAM";

pub const AZURE_OUTPUT_FORMAT: &str = "audio-16khz-128kbitrate-mono-mp3";
pub const AZURE_FALLBACK_VOICE: &str = "en-US-JennyNeural";

const UPSTREAM_MESSAGE_LIMIT: usize = 300;

#[derive(Clone, Debug)]
pub struct ElevenLabs {
    api_key: Option<String>,
    config: NarrationConfig,
    endpoint: String,
}

impl ElevenLabs {
    pub fn from_config(config: &NarrationConfig) -> Self {
        Self {
            api_key: config.api_key().map(str::to_owned),
            config: config.clone(),
            endpoint: ELEVENLABS_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn voice_id(&self, voice: &str) -> String {
        match self.config.resolve_voice(voice).as_str() {
            "" | "default" => ELEVENLABS_FALLBACK_VOICE.to_string(),
            id => id.to_string(),
        }
    }
}

impl NarrationBackend for ElevenLabs {
    fn name(&self) -> &'static str {
        "elevenlabs"
    }

    fn synthesize(
        &self,
        request: &NarrationRequest,
        output: &Path,
        timeout: Option<Duration>,
    ) -> Result<(), NarrationError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(NarrationError::MissingCredentials {
                backend: "elevenlabs",
                credential: "apiKey",
            })?;

        let url = format!("{}/{}", self.endpoint, self.voice_id(&request.voice));
        let body = json!({
            "text": request.text,
            "model_id": ELEVENLABS_MODEL,
            "voice_settings": {
                "stability": 0.5,
                "similarity_boost": 0.75,
                "style": 0.5,
                "use_speaker_boost": true,
                // The API accepts a narrower speed range than requests do.
                "speed": request.speed.clamp(0.7, 1.2),
            },
        });

        let resp = client(timeout)?
            .post(&url)
            .header("xi-api-key", key)
            .header("accept", "audio/mpeg")
            .json(&body)
            .send()
            .map_err(|e| NarrationError::BackendUnavailable(format!("elevenlabs: {e}")))?;
        save_audio(resp, output)
    }
}

#[derive(Clone, Debug)]
pub struct AzureSpeech {
    api_key: Option<String>,
    region: Option<String>,
    config: NarrationConfig,
    endpoint: Option<String>,
}

impl AzureSpeech {
    pub fn from_config(config: &NarrationConfig) -> Self {
        Self {
            api_key: config.api_key().map(str::to_owned),
            region: config
                .region
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_owned),
            config: config.clone(),
            endpoint: None,
        }
    }

    /// Override the regional endpoint; the region is then no longer required.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    fn url(&self) -> Result<String, NarrationError> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.clone());
        }
        let region = self.region.as_deref().ok_or(NarrationError::MissingCredentials {
            backend: "azure",
            credential: "region",
        })?;
        Ok(format!(
            "https://{region}.tts.speech.microsoft.com/cognitiveservices/v1"
        ))
    }

    fn voice_name(&self, voice: &str) -> String {
        match self.config.resolve_voice(voice).as_str() {
            "" | "default" => AZURE_FALLBACK_VOICE.to_string(),
            name => name.to_string(),
        }
    }
}

impl NarrationBackend for AzureSpeech {
    fn name(&self) -> &'static str {
        "azure"
    }

    fn synthesize(
        &self,
        request: &NarrationRequest,
        output: &Path,
        timeout: Option<Duration>,
    ) -> Result<(), NarrationError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(NarrationError::MissingCredentials {
                backend: "azure",
                credential: "apiKey",
            })?;
        let url = self.url()?;
        let ssml = ssml(&request.text, &self.voice_name(&request.voice), request.speed);

        let resp = client(timeout)?
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", AZURE_OUTPUT_FORMAT)
            .header("User-Agent", concat!("storyreel/", env!("CARGO_PKG_VERSION")))
            .body(ssml)
            .send()
            .map_err(|e| NarrationError::BackendUnavailable(format!("azure: {e}")))?;
        save_audio(resp, output)
    }
}

/// SSML document for one utterance; `speed` becomes a relative prosody rate.
pub fn ssml(text: &str, voice: &str, speed: f64) -> String {
    let rate = ((speed - 1.0) * 100.0).round() as i64;
    let lang = voice.splitn(3, '-').take(2).collect::<Vec<_>>().join("-");
    let lang = if lang.len() == 5 { lang } else { "en-US".to_string() };
    format!(
        "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='{lang}'>\
         <voice name='{}'><prosody rate='{rate:+}%'>{}</prosody></voice></speak>",
        xml_escape(voice),
        xml_escape(text)
    )
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn client(timeout: Option<Duration>) -> Result<reqwest::blocking::Client, NarrationError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| NarrationError::BackendUnavailable(format!("http client: {e}")))
}

fn save_audio(resp: reqwest::blocking::Response, output: &Path) -> Result<(), NarrationError> {
    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().unwrap_or_default();
        let message: String = message.trim().chars().take(UPSTREAM_MESSAGE_LIMIT).collect();
        return Err(NarrationError::UpstreamError {
            status: status.as_u16(),
            message: if message.is_empty() {
                status.canonical_reason().unwrap_or("error").to_string()
            } else {
                message
            },
        });
    }

    let bytes = resp
        .bytes()
        .map_err(|e| NarrationError::BackendUnavailable(format!("reading audio: {e}")))?;
    std::fs::write(output, &bytes).map_err(|e| {
        NarrationError::BackendUnavailable(format!("writing '{}': {e}", output.display()))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/narration/http.rs"]
mod tests;
