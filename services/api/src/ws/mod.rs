//! Twilio Media Streams
//!
//! This module carries a phone call's audio between Twilio and the interview.
//! It is structured into submodules:
//!
//! - `protocol`: The JSON messages Twilio exchanges over the media stream.
//! - `session`: The WebSocket lifecycle of one call, from `start` to hang-up.
//! - `speaker`: Speaks prompts into the call and tracks their playback.
//! - `provider`: Streams caller audio to a speech recognition backend.

pub mod protocol;
pub mod provider;
pub mod session;
pub mod speaker;

pub use session::stream_handler;
