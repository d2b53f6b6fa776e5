//! Interview State Machine
//!
//! Tracks the progress of a single PHQ-9 call. The machine is either waiting
//! for the answer to item `i` or complete; every accepted answer moves it
//! forward by exactly one item.

use crate::{
    Command,
    questions::{self, QUESTION_COUNT, Question},
    scoring,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Conventional PHQ-9 cutoff for mild-or-greater depression.
pub const DEFAULT_ESCALATION_THRESHOLD: u32 = 10;

/// Highest total the instrument can produce.
pub const MAX_TOTAL: u32 = 27;

/// Misuse of the state machine by its driver.
///
/// These are programming errors, never caller input problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterviewError {
    #[error("interview is already complete; no further answers or prompts")]
    SessionComplete,
    #[error("interview is not complete: {answered} of 9 items answered")]
    NotComplete { answered: usize },
}

/// Where the interview currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewState {
    /// Waiting for the answer to the item at this index (0..=8).
    AwaitingAnswer(usize),
    Complete,
}

/// The routing decision made from the final total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Caller is told a clinician will be connected.
    Escalate,
    /// Caller receives a neutral farewell.
    Close,
}

impl Disposition {
    /// The closing line spoken to the caller.
    pub fn message(&self) -> &'static str {
        match self {
            Disposition::Escalate => "Thank you. I will connect you to our nurse now.",
            Disposition::Close => "Thank you, have a nice day.",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Escalate => write!(f, "escalate"),
            Disposition::Close => write!(f, "close"),
        }
    }
}

/// Result of a finished interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub total: u32,
    pub disposition: Disposition,
}

/// Per-call interview progress.
///
/// The current index is derived from the number of collected answers, so the
/// two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewSession {
    answers: Vec<u8>,
    threshold: u32,
}

impl Default for InterviewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl InterviewSession {
    /// Starts a fresh interview at item 0 with the standard cutoff.
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_ESCALATION_THRESHOLD)
    }

    /// Starts a fresh interview with a custom escalation cutoff.
    pub fn with_threshold(threshold: u32) -> Self {
        Self {
            answers: Vec::with_capacity(QUESTION_COUNT),
            threshold,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn answers(&self) -> &[u8] {
        &self.answers
    }

    pub fn current_index(&self) -> usize {
        self.answers.len()
    }

    pub fn is_complete(&self) -> bool {
        self.answers.len() == QUESTION_COUNT
    }

    pub fn state(&self) -> InterviewState {
        if self.is_complete() {
            InterviewState::Complete
        } else {
            InterviewState::AwaitingAnswer(self.answers.len())
        }
    }

    /// Returns the item currently awaiting an answer. Never advances.
    pub fn next_prompt(&self) -> Result<Question, InterviewError> {
        match self.state() {
            InterviewState::AwaitingAnswer(index) => {
                questions::question(index).ok_or(InterviewError::SessionComplete)
            }
            InterviewState::Complete => Err(InterviewError::SessionComplete),
        }
    }

    /// Scores `raw_token` and records it as the answer to the current item.
    ///
    /// Returns the recorded score.
    pub fn submit_answer(&mut self, raw_token: &str) -> Result<u8, InterviewError> {
        if self.is_complete() {
            return Err(InterviewError::SessionComplete);
        }
        let score = scoring::interpret(raw_token);
        self.answers.push(score);
        Ok(score)
    }

    /// Totals the answers and picks a disposition.
    pub fn finalize(&self) -> Result<Outcome, InterviewError> {
        if !self.is_complete() {
            return Err(InterviewError::NotComplete {
                answered: self.answers.len(),
            });
        }
        let total: u32 = self.answers.iter().map(|&score| u32::from(score)).sum();
        let disposition = if total >= self.threshold {
            Disposition::Escalate
        } else {
            Disposition::Close
        };
        Ok(Outcome { total, disposition })
    }

    /// Applies one answer and decides what happens next.
    pub fn advance(&mut self, raw_token: &str) -> Result<Command, InterviewError> {
        self.submit_answer(raw_token)?;
        if self.is_complete() {
            Ok(Command::SessionComplete(self.finalize()?))
        } else {
            Ok(Command::SpeakText(self.next_prompt()?.text.to_string()))
        }
    }
}
