use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, to_bson};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};

use super::{NewResponse, NewSurvey, StoreError, StoredSubmission, SurveyStore, SurveyUpdate};
use crate::models::survey::{AnswerSheet, Question, Survey, SurveyResponse};
use crate::utils::time::{bson_datetime_as_chrono, chrono_to_bson};

const SURVEYS: &str = "surveys";
const RESPONSES: &str = "responses";
const COUNTERS: &str = "counters";

/// Survey as stored in the "surveys" collection.
///
/// Answer maps are keyed by client-supplied question identifiers, so they are
/// kept as JSON text and never interpreted as BSON field paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SurveyDocument {
    #[serde(rename = "_id")]
    id: i64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    questions: Vec<Question>,
    #[serde(default)]
    correct_answers: Option<String>,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    updated_at: DateTime<Utc>,
}

impl SurveyDocument {
    fn into_survey(self) -> Result<Survey, StoreError> {
        Ok(Survey {
            id: self.id,
            title: self.title,
            description: self.description,
            questions: self.questions,
            correct_answers: decode_answers(self.correct_answers.as_deref())?,
        })
    }
}

/// Response as stored in the "responses" collection
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResponseDocument {
    #[serde(rename = "_id")]
    id: i64,
    survey_id: i64,
    answers: String,
    #[serde(with = "bson_datetime_as_chrono")]
    timestamp: DateTime<Utc>,
    #[serde(default)]
    student_name: Option<String>,
}

impl ResponseDocument {
    fn into_response(self) -> Result<SurveyResponse, StoreError> {
        Ok(SurveyResponse {
            id: self.id,
            survey_id: self.survey_id,
            answers: serde_json::from_str(&self.answers)?,
            timestamp: self.timestamp,
            student_name: self.student_name,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Counter {
    seq: i64,
}

fn encode_answers(answers: Option<&AnswerSheet>) -> Result<Option<String>, StoreError> {
    Ok(answers.map(serde_json::to_string).transpose()?)
}

fn decode_answers(text: Option<&str>) -> Result<Option<AnswerSheet>, StoreError> {
    Ok(text.map(serde_json::from_str::<AnswerSheet>).transpose()?)
}

/// MongoDB-backed store. Cascading delete and response submission run in a
/// multi-document transaction, which needs a replica-set deployment.
#[derive(Clone)]
pub struct MongoSurveyStore {
    client: Client,
    mongo: Database,
}

impl MongoSurveyStore {
    pub fn new(client: Client, database: &str) -> Self {
        let mongo = client.database(database);
        Self { client, mongo }
    }

    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        let store = Self::new(client, database);
        store.ensure_indexes().await?;
        tracing::info!("MongoDB connected, database={}", database);
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        self.responses()
            .create_index(IndexModel::builder().keys(doc! { "survey_id": 1 }).build())
            .await?;
        Ok(())
    }

    fn surveys(&self) -> Collection<SurveyDocument> {
        self.mongo.collection(SURVEYS)
    }

    fn responses(&self) -> Collection<ResponseDocument> {
        self.mongo.collection(RESPONSES)
    }

    fn counters(&self) -> Collection<Counter> {
        self.mongo.collection(COUNTERS)
    }

    /// Allocates the next id of a sequence. Not rolled back with a failed
    /// write, so ids may have gaps.
    async fn next_id(&self, sequence: &str) -> Result<i64, StoreError> {
        let counter = self
            .counters()
            .find_one_and_update(doc! { "_id": sequence }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("counter {} was not upserted", sequence)))?;
        Ok(counter.seq)
    }
}

#[async_trait]
impl SurveyStore for MongoSurveyStore {
    fn name(&self) -> &'static str {
        "mongo"
    }

    async fn create_survey(&self, survey: NewSurvey) -> Result<Survey, StoreError> {
        let now = Utc::now();
        let document = SurveyDocument {
            id: self.next_id(SURVEYS).await?,
            title: survey.title,
            description: survey.description,
            questions: survey.questions,
            correct_answers: encode_answers(survey.correct_answers.as_ref())?,
            created_at: now,
            updated_at: now,
        };

        self.surveys().insert_one(&document).await?;
        document.into_survey()
    }

    async fn list_surveys(&self) -> Result<Vec<Survey>, StoreError> {
        let documents: Vec<SurveyDocument> = self
            .surveys()
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await?
            .try_collect()
            .await?;

        documents
            .into_iter()
            .map(SurveyDocument::into_survey)
            .collect()
    }

    async fn get_survey(&self, id: i64) -> Result<Survey, StoreError> {
        self.surveys()
            .find_one(doc! { "_id": id })
            .await?
            .ok_or_else(|| StoreError::survey_not_found(id))?
            .into_survey()
    }

    async fn update_survey(&self, id: i64, update: SurveyUpdate) -> Result<Survey, StoreError> {
        let changes = doc! {
            "$set": {
                "title": update.title,
                "description": update.description,
                "questions": to_bson(&update.questions)?,
                "updatedAt": chrono_to_bson(Utc::now()),
            }
        };

        self.surveys()
            .find_one_and_update(doc! { "_id": id }, changes)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| StoreError::survey_not_found(id))?
            .into_survey()
    }

    async fn delete_survey(&self, id: i64) -> Result<(), StoreError> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        let deleted = self
            .surveys()
            .delete_one(doc! { "_id": id })
            .session(&mut session)
            .await?;

        if deleted.deleted_count == 0 {
            session.abort_transaction().await?;
            return Err(StoreError::survey_not_found(id));
        }

        let responses = self
            .responses()
            .delete_many(doc! { "survey_id": id })
            .session(&mut session)
            .await?;

        session.commit_transaction().await?;

        tracing::debug!(
            "Deleted survey {} with {} responses",
            id,
            responses.deleted_count
        );
        Ok(())
    }

    async fn insert_response(
        &self,
        survey_id: i64,
        response: NewResponse,
    ) -> Result<StoredSubmission, StoreError> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        let Some(survey) = self
            .surveys()
            .find_one(doc! { "_id": survey_id })
            .session(&mut session)
            .await?
        else {
            session.abort_transaction().await?;
            return Err(StoreError::survey_not_found(survey_id));
        };
        let correct_answers = decode_answers(survey.correct_answers.as_deref())?;

        let document = ResponseDocument {
            id: self.next_id(RESPONSES).await?,
            survey_id,
            answers: serde_json::to_string(&response.answers)?,
            timestamp: response.timestamp,
            student_name: response.student_name.clone(),
        };

        self.responses()
            .insert_one(&document)
            .session(&mut session)
            .await?;

        session.commit_transaction().await?;

        Ok(StoredSubmission {
            response: SurveyResponse {
                id: document.id,
                survey_id,
                answers: response.answers,
                timestamp: response.timestamp,
                student_name: response.student_name,
            },
            correct_answers,
        })
    }

    async fn list_responses(&self, survey_id: i64) -> Result<Vec<SurveyResponse>, StoreError> {
        let documents: Vec<ResponseDocument> = self
            .responses()
            .find(doc! { "survey_id": survey_id })
            .sort(doc! { "_id": 1 })
            .await?
            .try_collect()
            .await?;

        documents
            .into_iter()
            .map(ResponseDocument::into_response)
            .collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.mongo.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::survey::AnswerValue;
    use mongodb::bson;

    #[test]
    fn test_survey_document_round_trips_through_bson() {
        let key: AnswerSheet = [
            ("q.1".to_string(), AnswerValue::from(vec!["a", "b"])),
            ("$q2".to_string(), AnswerValue::from("x")),
        ]
        .into_iter()
        .collect();

        let document = SurveyDocument {
            id: 3,
            title: "Quiz".to_string(),
            description: None,
            questions: vec![Question {
                text: "Pick".to_string(),
                kind: "checkbox".to_string(),
                options: Some(vec!["a".to_string(), "b".to_string()]),
            }],
            correct_answers: encode_answers(Some(&key)).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let raw = bson::to_document(&document).unwrap();
        assert_eq!(raw.get_i64("_id").unwrap(), 3);
        assert!(raw.get_str("correct_answers").is_ok());
        assert!(raw.get_datetime("createdAt").is_ok());

        let decoded: SurveyDocument = bson::from_document(raw).unwrap();
        let survey = decoded.into_survey().unwrap();
        assert_eq!(survey.correct_answers, Some(key));
        assert_eq!(survey.questions[0].kind, "checkbox");
    }

    #[test]
    fn test_corrupt_answers_surface_as_encoding_error() {
        let document = ResponseDocument {
            id: 1,
            survey_id: 1,
            answers: "not json".to_string(),
            timestamp: Utc::now(),
            student_name: None,
        };
        assert!(matches!(
            document.into_response(),
            Err(StoreError::Encoding(_))
        ));
    }
}
