//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the speech backends,
//! the clinical sink and the configuration shared by every call.

use crate::{config::Config, tts::Synthesizer, ws::provider::Transcriber};
use silverline_core::sink::ClinicalSink;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
/// All fields are public to be accessible from other modules.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub transcriber: Arc<dyn Transcriber>,
    pub sink: Arc<dyn ClinicalSink>,
}
