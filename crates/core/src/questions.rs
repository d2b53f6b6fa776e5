//! PHQ-9 Question Bank
//!
//! The nine screening items, in the order they are asked. The ordering is part
//! of the instrument and must never change.

use serde::Serialize;

/// Number of items in the PHQ-9 instrument.
pub const QUESTION_COUNT: usize = 9;

/// The fixed PHQ-9 prompts, in delivery order.
pub const QUESTIONS: [&str; QUESTION_COUNT] = [
    "Little interest or pleasure in doing things?",
    "Feeling down, depressed, or hopeless?",
    "Trouble falling or staying asleep, or sleeping too much?",
    "Feeling tired or having little energy?",
    "Poor appetite or overeating?",
    "Feeling bad about yourself or that you are a failure or have let yourself or your family down?",
    "Trouble concentrating on things, such as reading the newspaper or watching television?",
    "Moving or speaking so slowly that other people could have noticed? Or the opposite — being so fidgety or restless that you have been moving around a lot more than usual?",
    "Thoughts that you would be better off dead, or of hurting yourself?",
];

/// A single screening item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Question {
    /// Zero-based position in the bank.
    pub index: usize,
    pub text: &'static str,
}

/// Looks up the question at `index`, or `None` past the end of the bank.
pub fn question(index: usize) -> Option<Question> {
    QUESTIONS.get(index).map(|&text| Question { index, text })
}

/// Iterates over the whole bank in order.
pub fn all() -> impl Iterator<Item = Question> {
    QUESTIONS
        .iter()
        .enumerate()
        .map(|(index, &text)| Question { index, text })
}
