//! Session Driver
//!
//! Runs one call's interview against the speech output and the clinical sink.
//! The driver is strictly sequential: each call to `on_utterance` finishes
//! speaking (and, at the end, notifying) before it returns.

use crate::{
    Command,
    interview::{InterviewError, InterviewSession, Outcome},
    sink::ClinicalSink,
    speech::{SpeechOutput, UtteranceEvent},
};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What a single utterance did to the interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// No recognized text; nothing changed.
    Ignored,
    /// The answer was recorded and the item at this index was asked.
    Asked(usize),
    /// The last answer was recorded and the interview concluded.
    Finished(Outcome),
}

/// Drives one interview from first prompt to disposition.
pub struct SessionDriver {
    session: InterviewSession,
    output: Arc<dyn SpeechOutput>,
    sink: Arc<dyn ClinicalSink>,
}

impl SessionDriver {
    /// Creates a driver around a fresh interview.
    pub fn new(
        session: InterviewSession,
        output: Arc<dyn SpeechOutput>,
        sink: Arc<dyn ClinicalSink>,
    ) -> Self {
        Self {
            session,
            output,
            sink,
        }
    }

    pub fn session(&self) -> &InterviewSession {
        &self.session
    }

    /// Asks the first question.
    pub async fn start(&mut self) -> Result<()> {
        let question = self.session.next_prompt().inspect_err(|e| {
            error!(error = %e, "Cannot start an interview that is already complete");
        })?;
        info!(index = question.index, "Starting PHQ-9 interview");
        self.output.speak(question.text).await
    }

    /// Handles one recognition event from the caller.
    pub async fn on_utterance(&mut self, event: UtteranceEvent) -> Result<Progress> {
        let Some(text) = event.recognized_text() else {
            debug!("Ignoring utterance without recognized text");
            return Ok(Progress::Ignored);
        };

        let index = self.session.current_index();
        let command = self.session.advance(text).inspect_err(|e: &InterviewError| {
            error!(error = %e, utterance = %text, "Answer submitted to a finished interview");
        })?;
        info!(
            index,
            utterance = %text,
            score = self.session.answers()[index],
            "Answer recorded"
        );

        match command {
            Command::SpeakText(prompt) => {
                self.output.speak(&prompt).await?;
                Ok(Progress::Asked(self.session.current_index()))
            }
            Command::SessionComplete(outcome) => {
                info!(
                    total = outcome.total,
                    disposition = %outcome.disposition,
                    "Interview complete"
                );
                if let Err(e) = self.sink.notify(&outcome).await {
                    warn!(error = ?e, "Clinical sink rejected the outcome");
                }
                self.output.speak(outcome.disposition.message()).await?;
                Ok(Progress::Finished(outcome))
            }
        }
    }

    /// Discards an interview whose caller went away before the last answer.
    pub fn abandon(self) {
        if self.session.is_complete() {
            debug!("Session closed after completion");
        } else {
            info!(
                answered = self.session.current_index(),
                "Caller disconnected mid-interview; discarding answers"
            );
        }
    }
}
