//! Defines the Twilio Media Streams message protocol between Twilio and the API server.

use serde::{Deserialize, Serialize};

/// Messages sent from Twilio to the server.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TwilioMessage {
    /// The WebSocket is open; always the first message.
    Connected {
        #[serde(default)]
        protocol: Option<String>,
    },
    /// Stream metadata. Sent once, before any media.
    Start {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        start: StreamStart,
    },
    /// A chunk of caller audio.
    Media { media: InboundMedia },
    /// Playback of a previously sent `mark` has reached that point.
    Mark { mark: MarkLabel },
    /// The stream has ended (caller hung up or the call moved on).
    Stop,
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreamStart {
    pub call_sid: String,
    #[serde(default)]
    pub account_sid: Option<String>,
    #[serde(default)]
    pub media_format: Option<MediaFormat>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaFormat {
    pub encoding: String,
    pub sample_rate: u32,
    pub channels: u16,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct InboundMedia {
    /// Base64 encoded 8 kHz mu-law audio.
    pub payload: String,
    #[serde(default)]
    pub track: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MarkLabel {
    pub name: String,
}

/// Messages sent from the server to Twilio.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Audio to play to the caller.
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: OutboundMedia,
    },
    /// Asks Twilio to echo `name` back once all preceding media has played.
    Mark {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        mark: MarkLabel,
    },
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OutboundMedia {
    /// Base64 encoded 8 kHz mu-law audio.
    pub payload: String,
}
