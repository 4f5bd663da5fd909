use serde::Serialize;

use crate::models::survey::{AnswerSheet, AnswerValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    pub score: u32,
    pub total: u32,
}

/// Scores a submission against an answer key.
///
/// Returns `None` when there is no key (or it is empty). Absent or
/// mis-shaped submitted answers count as misses, never as errors.
pub fn score(correct_answers: Option<&AnswerSheet>, submitted: &AnswerSheet) -> Option<Score> {
    let key = correct_answers.filter(|key| !key.is_empty())?;

    let score = key
        .iter()
        .filter(|(question, expected)| is_match(expected, submitted.get(question.as_str())))
        .count();

    Some(Score {
        score: score as u32,
        total: key.len() as u32,
    })
}

fn is_match(expected: &AnswerValue, submitted: Option<&AnswerValue>) -> bool {
    match expected {
        AnswerValue::Choices(_) => {
            let expected_set = expected.choice_set().unwrap_or_default();
            match submitted {
                None => expected_set.is_empty(),
                Some(value) => value.choice_set() == Some(expected_set),
            }
        }
        AnswerValue::Single(expected) => {
            matches!(submitted, Some(AnswerValue::Single(value)) if value == expected)
        }
    }
}
