//! Domain errors reported by [`crate::store::TaskStore`].

use thiserror::Error;

use crate::task::TaskId;

/// Rejection of a title handed to `add`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title too short: expected at least {min} characters, got {actual}")]
    TitleTooShort { min: usize, actual: usize },

    /// Only produced when blank titles are configured to be ignored.
    #[error("title is blank")]
    BlankTitle,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("task {0} not found")]
pub struct NotFoundError(pub TaskId);
