//! Silver-Line API Library Crate
//!
//! This library contains the telephone side of the screening service: the
//! Twilio webhook, the media stream WebSocket, speech synthesis and
//! recognition, configuration and routing. The binaries are thin wrappers
//! around this library.

pub mod audio_utils;
pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
pub mod tts;
pub mod ws;
