//! Silver-Line interview core.
//!
//! Everything needed to run a PHQ-9 screening over any speech transport: the
//! question bank, the answer interpreter, the interview state machine and the
//! driver that ties them to speech output and the clinical sink.

pub mod driver;
pub mod interview;
pub mod questions;
pub mod scoring;
pub mod sink;
pub mod speech;

/// Represents commands that the interview issues to an external runtime.
///
/// This enum decouples the interview's decision-making from the runtime's
/// execution of side effects (speaking a prompt, concluding the call).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Command the runtime to speak the given text to the caller.
    SpeakText(String),
    /// The last item was answered; the outcome decides the closing message.
    SessionComplete(interview::Outcome),
}
