//! Manages real-time speech recognition connections for caller audio.

pub mod openai;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use silverline_core::speech::UtteranceEvent;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::warn;

/// A running recognition stream for one call.
///
/// Dropping the handle stops the background task.
pub struct TranscriptionHandle {
    audio_tx: mpsc::Sender<Bytes>,
    task: JoinHandle<()>,
}

impl TranscriptionHandle {
    pub fn new(audio_tx: mpsc::Sender<Bytes>, task: JoinHandle<()>) -> Self {
        Self { audio_tx, task }
    }

    /// Forwards a chunk of 8 kHz mu-law caller audio.
    pub async fn send_audio(&self, mulaw: Bytes) {
        if let Err(e) = self.audio_tx.send(mulaw).await {
            warn!("Failed to send audio to transcription task: {}", e);
        }
    }
}

impl Drop for TranscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Defines the contract for a streaming speech-to-text backend.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Opens a recognition stream. Each finished utterance is delivered on
    /// `events`; the channel closes when the stream ends.
    async fn start(&self, events: mpsc::Sender<UtteranceEvent>) -> Result<TranscriptionHandle>;
}
