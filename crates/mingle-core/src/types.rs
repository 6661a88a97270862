//! Survey data types.

use serde::{Deserialize, Serialize};

/// Sentinel used in cleaned survey data to mark an unanswered question.
///
/// Compared case-insensitively, so `"null"` and `"Null"` count too.
pub const NULL_ANSWER: &str = "NULL";

/// One question together with an attendee's raw answer text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    /// Question label, e.g. "Learning Interest".
    pub question: String,
    /// Raw answer text; may be empty or the null sentinel.
    pub answer: String,
}

impl QuestionAnswer {
    /// Create a new question/answer pair.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// One attendee's row of cleaned survey data.
///
/// The name is the attendee's identifier and must be unique within a
/// pipeline run. Answers keep the survey's question order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyResponse {
    /// Attendee identifier.
    pub name: String,
    /// Ordered (question, answer) pairs; unanswered slots hold the
    /// null sentinel or an empty string.
    pub answers: Vec<QuestionAnswer>,
}

impl SurveyResponse {
    /// Create a response from a name and (question, answer) pairs.
    pub fn new<Q, A>(name: impl Into<String>, pairs: impl IntoIterator<Item = (Q, A)>) -> Self
    where
        Q: Into<String>,
        A: Into<String>,
    {
        Self {
            name: name.into(),
            answers: pairs
                .into_iter()
                .map(|(q, a)| QuestionAnswer::new(q, a))
                .collect(),
        }
    }

    /// Number of answer slots (answered or not).
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// Whether the row has no answer slots at all.
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

/// Parallel lists of surviving questions and answers after normalization.
///
/// Both lists have the same length and keep the original survey order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidAnswers {
    /// Question labels whose answers survived filtering.
    pub questions: Vec<String>,
    /// The surviving answer texts, parallel to `questions`.
    pub answers: Vec<String>,
}

impl ValidAnswers {
    /// Number of surviving answers.
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// Whether nothing survived filtering.
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Iterate over (question, answer) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.questions
            .iter()
            .map(String::as_str)
            .zip(self.answers.iter().map(String::as_str))
    }
}

/// Composite id for an answer-level embedding record.
///
/// `"::"` keeps names containing underscores or spaces from colliding
/// with question labels.
pub fn answer_id(name: &str, question: &str) -> String {
    format!("{}::{}", name, question)
}
