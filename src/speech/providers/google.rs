//! Google Translate text-to-speech.
//!
//! One GET per phrase, answered with MP3 bytes:
//! `<base_url>?ie=UTF-8&client=tw-ob&tl=<lang>&q=<text>`.
//!
//! The dispatcher is synchronous, so the provider owns a private
//! current-thread runtime and blocks on it for each request.

use std::fs;
use std::path::Path;
use std::time::Duration;

use log::{debug, info, warn};

use crate::speech::{SpeechError, Synthesizer};

/// The endpoint only answers clients it recognises as media players.
pub const USER_AGENT: &str = "VLC/3.0.2 LibVLC/3.0.2";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Builds the HTTP client used for speech requests.
pub fn build_client() -> Result<reqwest::Client, SpeechError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| SpeechError::Setup(e.to_string()))
}

/// Fetches the spoken form of `text` and returns the audio bytes.
pub async fn fetch_speech(
    client: &reqwest::Client,
    base_url: &str,
    lang: &str,
    text: &str,
) -> Result<Vec<u8>, SpeechError> {
    info!("Speech request: lang={}, text_len={}", lang, text.len());

    let response = client
        .get(base_url)
        .query(&[("ie", "UTF-8"), ("client", "tw-ob"), ("tl", lang), ("q", text)])
        .send()
        .await
        .map_err(|e| SpeechError::Network(e.to_string()))?;

    debug!("Speech response status: {}", response.status());

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let err_body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        warn!("Speech service error: {} - {}", status, err_body);
        return Err(SpeechError::Api {
            status,
            message: err_body,
        });
    }

    let audio = response
        .bytes()
        .await
        .map_err(|e| SpeechError::Network(e.to_string()))?;
    debug!("Received {} bytes of audio", audio.len());
    Ok(audio.to_vec())
}

pub struct GoogleTts {
    base_url: String,
    lang: String,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl GoogleTts {
    /// # Arguments
    /// * `base_url` - Speech endpoint, without query string
    /// * `lang` - Language code sent as `tl`
    pub fn new(base_url: String, lang: String) -> Result<Self, SpeechError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SpeechError::Setup(format!("speech runtime: {e}")))?;

        Ok(Self {
            base_url,
            lang,
            client: build_client()?,
            runtime,
        })
    }
}

impl Synthesizer for GoogleTts {
    fn name(&self) -> &str {
        "google-translate"
    }

    fn synthesize(&self, text: &str, output: &Path) -> Result<(), SpeechError> {
        let audio = self.runtime.block_on(fetch_speech(
            &self.client,
            &self.base_url,
            &self.lang,
            text,
        ))?;
        fs::write(output, &audio).map_err(SpeechError::Io)?;
        info!("Wrote {} bytes of speech to {}", audio.len(), output.display());
        Ok(())
    }
}
