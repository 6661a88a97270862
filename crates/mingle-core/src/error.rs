//! Input error types.

use thiserror::Error;

/// Errors for malformed survey input rows.
///
/// These are per-attendee: the pipeline records the offending row and
/// continues with the rest of the batch.
#[derive(Debug, Clone, Error)]
pub enum SurveyError {
    #[error("attendee name is empty")]
    EmptyName,

    #[error("duplicate attendee: {0}")]
    DuplicateAttendee(String),
}

/// Result type for survey input handling.
pub type SurveyResult<T> = Result<T, SurveyError>;
