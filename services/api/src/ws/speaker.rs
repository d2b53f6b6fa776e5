//! Speaks interview prompts to the caller over the Twilio media stream.

use super::{protocol::{MarkLabel, OutboundMedia, ServerMessage}, session::send_msg};
use crate::{audio_utils, tts::Synthesizer};
use anyhow::Result;
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use silverline_core::speech::SpeechOutput;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Mutex;
use tracing::debug;

/// Counts prompts whose playback Twilio has not yet confirmed.
#[derive(Debug, Default)]
pub struct PlaybackTracker {
    outstanding: AtomicUsize,
    sequence: AtomicUsize,
}

impl PlaybackTracker {
    /// Registers a new prompt and returns the mark label to send after it.
    pub fn begin(&self) -> String {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        format!("prompt-{}", seq)
    }

    /// Records an echoed mark and returns how many prompts are still playing.
    pub fn finish(&self) -> usize {
        let previous = self
            .outstanding
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_sub(1))
            })
            .unwrap_or(0);
        previous.saturating_sub(1)
    }

    pub fn is_playing(&self) -> bool {
        self.outstanding.load(Ordering::SeqCst) > 0
    }
}

/// A `SpeechOutput` that synthesizes text and streams it back into the call.
pub struct TwilioSpeaker {
    synthesizer: Arc<dyn Synthesizer>,
    socket_tx: Arc<Mutex<SplitSink<WebSocket, Message>>>,
    stream_sid: String,
    playback: Arc<PlaybackTracker>,
}

impl TwilioSpeaker {
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        socket_tx: Arc<Mutex<SplitSink<WebSocket, Message>>>,
        stream_sid: String,
        playback: Arc<PlaybackTracker>,
    ) -> Self {
        Self {
            synthesizer,
            socket_tx,
            stream_sid,
            playback,
        }
    }
}

#[async_trait]
impl SpeechOutput for TwilioSpeaker {
    async fn speak(&self, text: &str) -> Result<()> {
        let clip = self.synthesizer.synthesize(text).await?;
        let mulaw = audio_utils::pcm16_to_twilio_mulaw(&clip.pcm16, clip.sample_rate)?;
        let frames = audio_utils::encode_mulaw_frames(&mulaw);
        debug!(frames = frames.len(), text, "Streaming prompt to caller");

        // Hold the lock for the whole prompt so frames are never interleaved.
        let mut socket_tx = self.socket_tx.lock().await;
        for payload in frames {
            send_msg(
                &mut socket_tx,
                ServerMessage::Media {
                    stream_sid: self.stream_sid.clone(),
                    media: OutboundMedia { payload },
                },
            )
            .await?;
        }

        let name = self.playback.begin();
        send_msg(
            &mut socket_tx,
            ServerMessage::Mark {
                stream_sid: self.stream_sid.clone(),
                mark: MarkLabel { name },
            },
        )
        .await
    }
}
