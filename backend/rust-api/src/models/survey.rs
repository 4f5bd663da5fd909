use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// A single answer, either submitted by a respondent or expected by an answer key.
///
/// Arrays are multi-select answers (checkbox semantics); every other JSON value
/// is a scalar answer compared by strict equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Choices(Vec<Value>),
    Single(Value),
}

impl AnswerValue {
    /// Distinct elements of a multi-select answer, keyed by their canonical JSON text.
    pub fn choice_set(&self) -> Option<BTreeSet<String>> {
        match self {
            AnswerValue::Choices(items) => Some(items.iter().map(Value::to_string).collect()),
            AnswerValue::Single(_) => None,
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Single(Value::String(value.to_string()))
    }
}

impl From<Vec<&str>> for AnswerValue {
    fn from(values: Vec<&str>) -> Self {
        AnswerValue::Choices(
            values
                .into_iter()
                .map(|v| Value::String(v.to_string()))
                .collect(),
        )
    }
}

/// Question identifier -> answer. Used for submissions and answer keys alike.
pub type AnswerSheet = BTreeMap<String, AnswerValue>;

/// Question embedded in a survey. Identity is its position in the survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Question {
    pub text: String,

    /// Free-form type tag ("text", "radio", "checkbox", ...)
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<Question>,
    pub correct_answers: Option<AnswerSheet>,
}

/// Stored submission. Listed raw, without score/total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub id: i64,
    pub survey_id: i64,
    pub answers: AnswerSheet,
    pub timestamp: DateTime<Utc>,
    pub student_name: Option<String>,
}

/// Submission enriched with its score. `score`/`total` are null when the
/// survey has no answer key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredResponse {
    #[serde(flatten)]
    pub response: SurveyResponse,
    pub score: Option<u32>,
    pub total: Option<u32>,
}

/// Тело запроса на создание опроса
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSurveyRequest {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[validate(nested)]
    pub questions: Vec<Question>,

    #[serde(default)]
    pub correct_answers: Option<AnswerSheet>,
}

/// Body of a survey update. Carries no answer key, so a `correct_answers`
/// field in the payload is ignored.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSurveyRequest {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[validate(nested)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponseRequest {
    pub answers: AnswerSheet,

    #[serde(default)]
    pub student_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteSurveyResponse {
    pub detail: String,
}
