//! Handles the real-time WebSocket connection to OpenAI for caller speech recognition.

use super::{TranscriptionHandle, Transcriber};
use crate::audio_utils::{self, StreamResampler};
use anyhow::{Context, Result, anyhow};
use async_openai::types::realtime::{
    self as oai_realtime, ClientEvent as OAIClientEvent, ServerEvent as OAIServerEvent,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use silverline_core::speech::UtteranceEvent;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, protocol::Message as WsMessage},
};
use tracing::{debug, error, info, warn};

/// A `Transcriber` backed by the OpenAI Realtime API.
///
/// The realtime session is configured to transcribe only: server-side voice
/// activity detection segments the caller's speech and no model response is
/// ever requested.
#[derive(Clone)]
pub struct OpenAIRealtimeTranscriber {
    api_key: String,
    model: String,
    transcription_model: String,
}

impl OpenAIRealtimeTranscriber {
    pub fn new(api_key: String, model: String, transcription_model: String) -> Self {
        Self {
            api_key,
            model,
            transcription_model,
        }
    }
}

#[async_trait]
impl Transcriber for OpenAIRealtimeTranscriber {
    async fn start(&self, events: mpsc::Sender<UtteranceEvent>) -> Result<TranscriptionHandle> {
        let (tx, rx) = mpsc::channel(128);
        let settings = self.clone();
        let task = tokio::spawn(async move {
            if let Err(e) = run(&settings, rx, events).await {
                error!(error = ?e, "Realtime transcription task failed");
            }
        });
        Ok(TranscriptionHandle::new(tx, task))
    }
}

/// Strips whitespace and the punctuation transcription models like to add
/// ("Satu." / "3!").
pub(crate) fn clean_transcript(transcript: &str) -> &str {
    transcript
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
}

/// Runs the main loop for the OpenAI Realtime API connection.
///
/// Caller audio arrives as 8 kHz mu-law and is upsampled to the 24 kHz PCM16
/// the API expects. Completed input transcriptions are forwarded as
/// utterance events.
async fn run(
    settings: &OpenAIRealtimeTranscriber,
    mut rx: mpsc::Receiver<Bytes>,
    events: mpsc::Sender<UtteranceEvent>,
) -> Result<()> {
    let url = format!("wss://api.openai.com/v1/realtime?model={}", settings.model);

    let mut request = url.into_client_request()?;
    request
        .headers_mut()
        .insert("Authorization", format!("Bearer {}", settings.api_key).parse()?);
    request
        .headers_mut()
        .insert("OpenAI-Beta", "realtime=v1".parse()?);

    let (ws_stream, _) = connect_async(request)
        .await
        .context("Failed to connect to OpenAI Realtime WebSocket")?;
    let (mut openai_tx, mut openai_rx) = ws_stream.split();
    info!("Connected to OpenAI Realtime API.");

    let session_config = oai_realtime::SessionResource {
        model: Some(settings.model.clone()),
        modalities: Some(vec!["text".to_string()]),
        input_audio_format: Some(oai_realtime::AudioFormat::PCM16),
        input_audio_transcription: Some(oai_realtime::AudioTranscription {
            model: Some(settings.transcription_model.clone()),
            ..Default::default()
        }),
        turn_detection: Some(oai_realtime::TurnDetection::ServerVAD {
            threshold: 0.5,
            prefix_padding_ms: 300,
            silence_duration_ms: 700,
            interrupt_response: Some(false),
            create_response: Some(false),
        }),
        ..Default::default()
    };
    let event = OAIClientEvent::SessionUpdate(oai_realtime::SessionUpdateEvent {
        session: session_config,
        event_id: None,
    });
    openai_tx
        .send(WsMessage::Text(serde_json::to_string(&event)?.into()))
        .await?;

    let mut upsampler = StreamResampler::new(
        audio_utils::TWILIO_MULAW_SAMPLE_RATE,
        audio_utils::OPENAI_REALTIME_API_PCM16_SAMPLE_RATE,
        audio_utils::TWILIO_FRAME_BYTES,
    )?;

    loop {
        tokio::select! {
            biased;
            // Caller audio from the media stream.
            maybe_audio = rx.recv() => {
                let Some(mulaw) = maybe_audio else {
                    info!("Audio channel closed. Ending transcription.");
                    break;
                };
                let pcm_f32 = audio_utils::convert_i16_to_f32(&audio_utils::decode_mulaw(&mulaw));
                let upsampled = upsampler.push(&pcm_f32)?;
                if upsampled.is_empty() {
                    continue;
                }
                let encoded_audio = audio_utils::encode_i16(&audio_utils::convert_f32_to_i16(&upsampled));
                let append_event = oai_realtime::InputAudioBufferAppendEvent { audio: encoded_audio, event_id: None };
                openai_tx.send(WsMessage::Text(serde_json::to_string(&OAIClientEvent::InputAudioBufferAppend(append_event))?.into())).await?;
            },
            // Events from the OpenAI server.
            msg_result = openai_rx.next() => {
                match msg_result {
                    Some(Ok(WsMessage::Text(text))) => {
                        let Ok(server_event) = serde_json::from_str::<OAIServerEvent>(&text) else {
                            debug!("Ignoring unrecognized realtime event");
                            continue;
                        };
                        match server_event {
                            OAIServerEvent::ConversationItemInputAudioTranscriptionCompleted(e) => {
                                let transcript = clean_transcript(&e.transcript);
                                debug!(transcript, "Caller utterance transcribed");
                                let event = if transcript.is_empty() {
                                    UtteranceEvent::silence()
                                } else {
                                    UtteranceEvent::recognized(transcript)
                                };
                                if events.send(event).await.is_err() {
                                    info!("Utterance receiver dropped. Ending transcription.");
                                    break;
                                }
                            }
                            OAIServerEvent::Error(e) => {
                                warn!(message = %e.error.message, "Realtime API reported an error");
                            }
                            _ => {}
                        }
                    }
                    Some(Ok(WsMessage::Close(close_frame))) => {
                        return Err(anyhow!("OpenAI closed the realtime connection: {:?}", close_frame));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e).context("Error reading from OpenAI WebSocket"),
                    None => return Err(anyhow!("OpenAI realtime stream ended unexpectedly")),
                }
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_transcript() {
        assert_eq!(clean_transcript("Satu."), "Satu");
        assert_eq!(clean_transcript("  3! "), "3");
        assert_eq!(clean_transcript("\"dua\""), "dua");
        assert_eq!(clean_transcript("..."), "");
        assert_eq!(clean_transcript("satu dua"), "satu dua");
    }
}
