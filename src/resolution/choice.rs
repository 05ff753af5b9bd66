//! Operator choices for a duplicate group.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// What to do with one duplicate group.
///
/// Indices are 1-based, as shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Keep every file.
    KeepAll,
    /// Delete every file.
    DeleteAll,
    /// Keep the file at this position and delete the others.
    Keep(usize),
    /// Keep the file at this position and replace the others with links to it.
    Symlink(usize),
}

/// Why a choice was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChoiceError {
    /// The input did not parse as a choice.
    #[error("Invalid choice '{0}'")]
    Unrecognized(String),

    /// The index is outside the group.
    #[error("Invalid choice: {index} is not between 1 and {len}")]
    OutOfRange { index: usize, len: usize },

    /// The file to keep is gone or no longer a regular file.
    #[error("Invalid choice: {0} is no longer a regular file")]
    KeptFileMissing(PathBuf),
}

impl Choice {
    /// Zero-based position of the file to keep, if any.
    #[must_use]
    pub fn kept_index(self) -> Option<usize> {
        match self {
            Self::Keep(n) | Self::Symlink(n) => n.checked_sub(1),
            Self::KeepAll | Self::DeleteAll => None,
        }
    }

    /// Check that the choice addresses a file within a group of `len` files.
    ///
    /// # Errors
    ///
    /// Returns [`ChoiceError::OutOfRange`] for an index outside `1..=len`.
    pub fn check_range(self, len: usize) -> Result<Self, ChoiceError> {
        match self {
            Self::Keep(index) | Self::Symlink(index) if index == 0 || index > len => {
                Err(ChoiceError::OutOfRange { index, len })
            }
            _ => Ok(self),
        }
    }
}

impl FromStr for Choice {
    type Err = ChoiceError;

    /// Parse operator input: `a`, `n`, a number, or `s` followed by a number.
    ///
    /// # Example
    ///
    /// ```
    /// use dedupe::resolution::Choice;
    ///
    /// assert_eq!("A".parse::<Choice>().unwrap(), Choice::KeepAll);
    /// assert_eq!(" 2\n".parse::<Choice>().unwrap(), Choice::Keep(2));
    /// assert_eq!("s1".parse::<Choice>().unwrap(), Choice::Symlink(1));
    /// assert!("maybe".parse::<Choice>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_ascii_lowercase();
        let unrecognized = || ChoiceError::Unrecognized(s.trim().to_string());

        match input.as_str() {
            "a" | "all" => Ok(Self::KeepAll),
            "n" | "none" => Ok(Self::DeleteAll),
            other => {
                let (symlink, digits) = match other.strip_prefix('s') {
                    Some(rest) => (true, rest.trim_start()),
                    None => (false, other),
                };
                let index: usize = digits.parse().map_err(|_| unrecognized())?;
                Ok(if symlink {
                    Self::Symlink(index)
                } else {
                    Self::Keep(index)
                })
            }
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepAll => f.write_str("keep all"),
            Self::DeleteAll => f.write_str("delete all"),
            Self::Keep(n) => write!(f, "keep #{n}"),
            Self::Symlink(n) => write!(f, "keep #{n} and link the rest"),
        }
    }
}
