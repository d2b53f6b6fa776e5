//! Text-to-Speech
//!
//! Turns prompt text into PCM16 audio. The service only ever speaks eleven
//! distinct strings (nine questions, two closing lines), so synthesized clips
//! are cached and shared by every call.

use crate::audio_utils::OPENAI_SPEECH_PCM16_SAMPLE_RATE;
use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice},
};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// A clip of mono PCM16 little-endian audio.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub pcm16: Bytes,
    pub sample_rate: f64,
}

/// Defines the contract for any text-to-speech backend.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio>;
}

/// A `Synthesizer` backed by the OpenAI speech endpoint.
pub struct OpenAISynthesizer {
    client: Client<OpenAIConfig>,
    model: SpeechModel,
    voice: Voice,
}

impl OpenAISynthesizer {
    /// Creates a new synthesizer.
    ///
    /// # Arguments
    ///
    /// * `config` - OpenAI API configuration (API key, base URL, etc.).
    /// * `model` - Speech model identifier (e.g., "tts-1").
    /// * `voice` - Voice name (e.g., "alloy").
    pub fn new(config: OpenAIConfig, model: &str, voice: &str) -> Result<Self> {
        let model = match model {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        };
        let voice: Voice = serde_json::from_value(serde_json::Value::String(voice.to_string()))
            .with_context(|| format!("Unsupported TTS voice '{}'", voice))?;
        Ok(Self {
            client: Client::with_config(config),
            model,
            voice,
        })
    }
}

#[async_trait]
impl Synthesizer for OpenAISynthesizer {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio> {
        let request = CreateSpeechRequestArgs::default()
            .input(text)
            .model(self.model.clone())
            .voice(self.voice.clone())
            .response_format(SpeechResponseFormat::Pcm)
            .build()?;

        let response = self
            .client
            .audio()
            .speech(request)
            .await
            .context("Speech synthesis request failed")?;
        debug!(bytes = response.bytes.len(), "Synthesized prompt");

        Ok(SynthesizedAudio {
            pcm16: response.bytes,
            sample_rate: OPENAI_SPEECH_PCM16_SAMPLE_RATE,
        })
    }
}

/// Wraps a `Synthesizer` and remembers every clip it produced.
pub struct CachingSynthesizer<S> {
    inner: S,
    cache: RwLock<HashMap<String, SynthesizedAudio>>,
}

impl<S: Synthesizer> CachingSynthesizer<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Synthesizes every text up front so the first caller does not wait.
    pub async fn warm<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let mut count = 0;
        for text in texts {
            self.synthesize(text).await?;
            count += 1;
        }
        info!(count, "Speech cache warmed");
        Ok(())
    }
}

#[async_trait]
impl<S: Synthesizer> Synthesizer for CachingSynthesizer<S> {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio> {
        if let Some(clip) = self.cache.read().await.get(text) {
            return Ok(clip.clone());
        }
        let clip = self.inner.synthesize(text).await?;
        self.cache
            .write()
            .await
            .insert(text.to_string(), clip.clone());
        Ok(clip)
    }
}
