//! Answer Interpreter
//!
//! Maps a recognized utterance onto a PHQ-9 item score. The vocabulary is
//! deliberately tiny: the Malay number words and the digits 0 through 3.

use tracing::debug;

/// Highest score a single item can receive.
pub const MAX_ITEM_SCORE: u8 = 3;

/// Accepted tokens and the score each denotes. Lookup is case-insensitive.
pub const SCORE_VOCABULARY: [(&str, u8); 8] = [
    ("kosong", 0),
    ("satu", 1),
    ("dua", 2),
    ("tiga", 3),
    ("0", 0),
    ("1", 1),
    ("2", 2),
    ("3", 3),
];

/// Interprets a raw token as an item score.
///
/// Unrecognized input (including the empty string) scores 0. Silence or a
/// mis-transcription is therefore indistinguishable from an honest "0".
pub fn interpret(token: &str) -> u8 {
    let normalized = token.to_lowercase();
    match SCORE_VOCABULARY
        .iter()
        .find(|(word, _)| *word == normalized)
    {
        Some(&(_, score)) => score,
        None => {
            debug!(token = %token, "Unrecognized answer token; scoring as 0");
            0
        }
    }
}
