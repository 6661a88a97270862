//! # Mingle Core
//!
//! Core survey types and answer normalization for the mingle matching
//! pipeline.
//!
//! Cleaned survey data arrives as [`SurveyResponse`] rows (one per
//! attendee). [`survey::normalize_response`] strips unanswered questions
//! and produces the parallel question/answer lists everything downstream
//! (embedding, similarity, clustering) works from.

mod error;
mod survey;
mod types;

pub use error::{SurveyError, SurveyResult};
pub use survey::{is_valid_answer, normalize_batch, normalize_response, NormalizedBatch};
pub use types::{answer_id, QuestionAnswer, SurveyResponse, ValidAnswers, NULL_ANSWER};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{normalize_batch, normalize_response};
    pub use crate::{QuestionAnswer, SurveyResponse, ValidAnswers};
    pub use crate::{SurveyError, SurveyResult};
}
