//! Speech collaborator contracts.

use anyhow::Result;
use async_trait::async_trait;

/// One recognition result from the speech-input side.
///
/// `text` is `None` for silence or audio the recognizer could not transcribe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtteranceEvent {
    pub text: Option<String>,
}

impl UtteranceEvent {
    pub fn recognized(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    pub fn silence() -> Self {
        Self { text: None }
    }

    /// The transcript, if it holds anything other than whitespace.
    pub fn recognized_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Renders text as speech to the caller.
///
/// `speak` resolves once the text has been handed to the transport; the
/// transport is responsible for holding back further input until playback
/// has finished.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    async fn speak(&self, text: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognized_text_filters_blank_transcripts() {
        assert_eq!(UtteranceEvent::silence().recognized_text(), None);
        assert_eq!(UtteranceEvent::recognized("").recognized_text(), None);
        assert_eq!(UtteranceEvent::recognized("  \t").recognized_text(), None);
        assert_eq!(
            UtteranceEvent::recognized(" satu ").recognized_text(),
            Some("satu")
        );
    }
}
