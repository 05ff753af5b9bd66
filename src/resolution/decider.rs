//! Decision providers.
//!
//! The resolution session asks a [`DecisionProvider`] what to do with each
//! duplicate group. [`ConsoleDecider`](super::ConsoleDecider) prompts a
//! human; [`ScriptedDecider`] replays a fixed list of answers.

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;

use super::choice::{Choice, ChoiceError};

/// Errors that end a resolution session early.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// The input stream closed before a choice was made.
    #[error("input closed before a choice was made")]
    InputClosed,

    /// A scripted provider ran out of answers.
    #[error("no more scripted answers")]
    Exhausted,

    /// Reading input or writing the prompt failed.
    #[error("prompt I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Source of choices for duplicate groups.
pub trait DecisionProvider {
    /// Choose an action for the group `checksum` made of `files`.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError`] when no choice can be obtained.
    fn decide(&mut self, checksum: &str, files: &[PathBuf]) -> Result<Choice, DecisionError>;

    /// Called when the last choice was rejected; `decide` is called again.
    fn reject(&mut self, _reason: &ChoiceError) {}
}

/// Provider that replays pre-recorded answers.
///
/// Answers that fail to parse are counted as rejections and skipped, the
/// same way an operator's typo would be.
///
/// # Example
///
/// ```
/// use dedupe::resolution::{Choice, DecisionProvider, ScriptedDecider};
///
/// let mut decider = ScriptedDecider::from_answers(["oops", "2"]);
/// assert_eq!(decider.decide("abc", &[]).unwrap(), Choice::Keep(2));
/// assert_eq!(decider.rejections().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedDecider {
    answers: VecDeque<String>,
    rejections: Vec<ChoiceError>,
    asked: Vec<String>,
}

impl ScriptedDecider {
    /// Create a provider from a list of choices.
    #[must_use]
    pub fn new(choices: impl IntoIterator<Item = Choice>) -> Self {
        Self::from_answers(choices.into_iter().map(|c| match c {
            Choice::KeepAll => "a".to_string(),
            Choice::DeleteAll => "n".to_string(),
            Choice::Keep(n) => n.to_string(),
            Choice::Symlink(n) => format!("s{n}"),
        }))
    }

    /// Create a provider from raw operator input lines.
    #[must_use]
    pub fn from_answers<S: Into<String>>(answers: impl IntoIterator<Item = S>) -> Self {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Every rejection seen so far.
    #[must_use]
    pub fn rejections(&self) -> &[ChoiceError] {
        &self.rejections
    }

    /// Checksums of the groups asked about, in order.
    #[must_use]
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    /// Number of answers not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl DecisionProvider for ScriptedDecider {
    fn decide(&mut self, checksum: &str, _files: &[PathBuf]) -> Result<Choice, DecisionError> {
        if self.asked.last().map(String::as_str) != Some(checksum) {
            self.asked.push(checksum.to_string());
        }
        loop {
            let answer = self.answers.pop_front().ok_or(DecisionError::Exhausted)?;
            match answer.parse::<Choice>() {
                Ok(choice) => return Ok(choice),
                Err(e) => self.rejections.push(e),
            }
        }
    }

    fn reject(&mut self, reason: &ChoiceError) {
        self.rejections.push(reason.clone());
    }
}
