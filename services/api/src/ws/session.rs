//! Manages the Twilio media stream lifecycle for one screening call.

use super::{
    protocol::{ServerMessage, TwilioMessage},
    speaker::{PlaybackTracker, TwilioSpeaker},
};
use crate::{audio_utils, state::AppState};
use anyhow::{Result, anyhow};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use bytes::Bytes;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use silverline_core::{
    driver::{Progress, SessionDriver},
    interview::InterviewSession,
};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{Instrument, debug, error, info, instrument, warn};

/// Axum handler to upgrade the Twilio media stream request to a WebSocket.
pub async fn stream_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Main handler for an individual media stream.
///
/// Waits for Twilio's `start` event to learn the stream and call identifiers,
/// then runs the interview for that call.
#[instrument(name = "ws_session", skip_all, fields(session_id))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let temp_id: u32 = rand::random();
    tracing::Span::current().record("session_id", &temp_id.to_string());
    info!("New media stream connection. Awaiting start...");

    let (socket_tx, mut socket_rx) = socket.split();
    let socket_tx_arc = Arc::new(Mutex::new(socket_tx));

    let (stream_sid, call_sid) = match await_stream_start(&mut socket_rx).await {
        Ok(Some(ids)) => ids,
        Ok(None) => {
            info!("Stream ended before it started.");
            return;
        }
        Err(e) => {
            error!("Media stream initialization failed: {:?}", e);
            return;
        }
    };

    let call_span = tracing::info_span!("call", %call_sid, %stream_sid);
    if let Err(e) = run_call_session(state, socket_tx_arc, socket_rx, stream_sid)
        .instrument(call_span)
        .await
    {
        error!(error = ?e, "Call session terminated with error.");
    }
}

/// Reads messages until Twilio sends `start`.
///
/// Returns `None` if the stream stops or closes first.
async fn await_stream_start(
    socket_rx: &mut SplitStream<WebSocket>,
) -> Result<Option<(String, String)>> {
    while let Some(msg_result) = socket_rx.next().await {
        match msg_result? {
            Message::Text(text) => match serde_json::from_str::<TwilioMessage>(&text)? {
                TwilioMessage::Connected { protocol } => {
                    debug!(?protocol, "Twilio connected");
                }
                TwilioMessage::Start { stream_sid, start } => {
                    info!(call_sid = %start.call_sid, "Media stream started");
                    return Ok(Some((stream_sid, start.call_sid)));
                }
                TwilioMessage::Stop => return Ok(None),
                other => warn!(?other, "Ignoring message received before start"),
            },
            Message::Close(_) => return Ok(None),
            Message::Binary(_) => return Err(anyhow!("Unexpected binary frame before start")),
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
    Ok(None)
}

/// The main event loop for an active call.
///
/// Caller audio is forwarded to the transcriber only while no prompt is
/// playing; recognized utterances drive the interview. The call ends when the
/// closing message has finished playing, or is abandoned on stop, close,
/// socket error, recognition failure or inactivity.
async fn run_call_session(
    state: Arc<AppState>,
    socket_tx: Arc<Mutex<SplitSink<WebSocket, Message>>>,
    mut socket_rx: SplitStream<WebSocket>,
    stream_sid: String,
) -> Result<()> {
    let playback = Arc::new(PlaybackTracker::default());
    let speaker = TwilioSpeaker::new(
        state.synthesizer.clone(),
        socket_tx.clone(),
        stream_sid,
        playback.clone(),
    );
    let mut driver = SessionDriver::new(
        InterviewSession::with_threshold(state.config.escalation_threshold),
        Arc::new(speaker),
        state.sink.clone(),
    );

    let (utterance_tx, mut utterance_rx) = mpsc::channel(16);
    let transcription = state.transcriber.start(utterance_tx).await?;
    driver.start().await?;

    let idle_timeout = state.config.idle_timeout;
    let mut finished = false;

    loop {
        tokio::select! {
            // Messages from Twilio.
            msg_result = socket_rx.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => match serde_json::from_str::<TwilioMessage>(&text) {
                        Ok(TwilioMessage::Media { media }) => {
                            if finished || playback.is_playing() {
                                continue;
                            }
                            match audio_utils::decode_payload(&media.payload) {
                                Ok(mulaw) => transcription.send_audio(Bytes::from(mulaw)).await,
                                Err(e) => warn!(error = ?e, "Dropping undecodable media payload"),
                            }
                        }
                        Ok(TwilioMessage::Mark { mark }) => {
                            let remaining = playback.finish();
                            debug!(mark = %mark.name, remaining, "Playback reached mark");
                            if finished && remaining == 0 {
                                info!("Closing message played. Ending call.");
                                break;
                            }
                        }
                        Ok(TwilioMessage::Stop) => {
                            info!("Twilio stopped the media stream.");
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "Ignoring malformed Twilio message"),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Twilio closed the WebSocket.");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("Error receiving from Twilio WebSocket: {:?}", e);
                        break;
                    }
                }
            },
            // Recognized caller speech.
            maybe_event = utterance_rx.recv() => {
                let Some(event) = maybe_event else {
                    warn!("Speech recognition ended. Abandoning call.");
                    break;
                };
                if finished || playback.is_playing() {
                    debug!("Ignoring utterance received while a prompt is playing");
                    continue;
                }
                if let Progress::Finished(_) = driver.on_utterance(event).await? {
                    finished = true;
                }
            },
            _ = tokio::time::sleep(idle_timeout) => {
                warn!(timeout_secs = idle_timeout.as_secs(), "No activity on the media stream. Abandoning call.");
                break;
            },
        }
    }

    drop(transcription);
    driver.abandon();
    if let Err(e) = socket_tx.lock().await.close().await {
        debug!("WebSocket already closed: {:?}", e);
    }
    info!("Media stream closed and call session terminated.");
    Ok(())
}

/// A helper function to serialize and send a `ServerMessage` to Twilio.
pub(crate) async fn send_msg(
    socket_tx: &mut SplitSink<WebSocket, Message>,
    msg: ServerMessage,
) -> Result<()> {
    let serialized = serde_json::to_string(&msg)?;
    socket_tx.send(Message::Text(serialized.into())).await?;
    Ok(())
}
