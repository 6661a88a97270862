//! Answer normalization.
//!
//! Filters out unanswered questions before embedding. An answer survives
//! if it is non-empty after trimming and is not the `"NULL"` sentinel
//! (case-insensitive). Filtering is deterministic and order-preserving.

use crate::types::{SurveyResponse, ValidAnswers, NULL_ANSWER};

/// Whether a raw answer counts as answered.
pub fn is_valid_answer(raw: &str) -> bool {
    let trimmed = raw.trim();
    !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case(NULL_ANSWER)
}

/// Filter one response down to its surviving (question, answer) pairs.
///
/// Returns `None` when no answer survives; such attendees are excluded
/// from downstream processing entirely (skipped, not an error).
pub fn normalize_response(response: &SurveyResponse) -> Option<ValidAnswers> {
    let mut questions = Vec::new();
    let mut answers = Vec::new();

    for pair in &response.answers {
        if is_valid_answer(&pair.answer) {
            questions.push(pair.question.clone());
            answers.push(pair.answer.trim().to_string());
        }
    }

    if answers.is_empty() {
        None
    } else {
        Some(ValidAnswers { questions, answers })
    }
}

/// Result of normalizing a whole batch of responses.
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    /// Attendees with at least one surviving answer, in input order.
    pub kept: Vec<(String, ValidAnswers)>,
    /// Names of attendees excluded because every answer was null/empty.
    pub skipped: Vec<String>,
}

/// Normalize a batch of responses, separating kept from skipped attendees.
pub fn normalize_batch(responses: &[SurveyResponse]) -> NormalizedBatch {
    let mut kept = Vec::new();
    let mut skipped = Vec::new();

    for response in responses {
        match normalize_response(response) {
            Some(valid) => kept.push((response.name.clone(), valid)),
            None => skipped.push(response.name.clone()),
        }
    }

    NormalizedBatch { kept, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SurveyResponse;

    #[test]
    fn test_valid_answer() {
        assert!(is_valid_answer("I love jazz"));
        assert!(is_valid_answer("  padded  "));
        assert!(!is_valid_answer(""));
        assert!(!is_valid_answer("   "));
        assert!(!is_valid_answer("NULL"));
        assert!(!is_valid_answer("null"));
        assert!(!is_valid_answer("  Null  "));
    }

    #[test]
    fn test_filtering_preserves_order() {
        let resp = SurveyResponse::new(
            "Ada",
            [
                ("Q1", "first"),
                ("Q2", "NULL"),
                ("Q3", ""),
                ("Q4", "fourth"),
            ],
        );

        let valid = normalize_response(&resp).unwrap();
        assert_eq!(valid.questions, vec!["Q1", "Q4"]);
        assert_eq!(valid.answers, vec!["first", "fourth"]);
    }

    #[test]
    fn test_survivor_count_matches_answered() {
        let resp = SurveyResponse::new(
            "Ada",
            [("Q1", "yes"), ("Q2", "NULL"), ("Q3", "also yes")],
        );
        let valid = normalize_response(&resp).unwrap();
        assert_eq!(valid.len(), 2);
    }

    #[test]
    fn test_all_null_yields_none() {
        let resp = SurveyResponse::new("Ghost", [("Q1", "NULL"), ("Q2", "  ")]);
        assert!(normalize_response(&resp).is_none());
    }

    #[test]
    fn test_answers_are_trimmed() {
        let resp = SurveyResponse::new("Ada", [("Q1", "  jazz  ")]);
        let valid = normalize_response(&resp).unwrap();
        assert_eq!(valid.answers[0], "jazz");
    }

    #[test]
    fn test_batch_separates_skipped() {
        let responses = vec![
            SurveyResponse::new("Ada", [("Q1", "jazz")]),
            SurveyResponse::new("Ghost", [("Q1", "NULL")]),
            SurveyResponse::new("Grace", [("Q1", "compilers")]),
        ];

        let batch = normalize_batch(&responses);
        let names: Vec<&str> = batch.kept.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Grace"]);
        assert_eq!(batch.skipped, vec!["Ghost"]);
    }
}
