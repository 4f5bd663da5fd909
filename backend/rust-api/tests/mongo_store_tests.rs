//! Runs against a live MongoDB replica set:
//! `MONGO_URI=mongodb://localhost:27017/?replicaSet=rs0 cargo test -- --ignored`

use chrono::{SubsecRound, Utc};
use survey_api::{
    models::survey::{AnswerSheet, Question},
    store::{mongo::MongoSurveyStore, NewResponse, NewSurvey, StoreError, SurveyStore, SurveyUpdate},
};
use uuid::Uuid;

async fn connect() -> MongoSurveyStore {
    let uri = std::env::var("MONGO_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017/?replicaSet=rs0".to_string());
    let database = format!("surveys_test_{}", Uuid::new_v4().simple());
    MongoSurveyStore::connect(&uri, &database)
        .await
        .expect("Failed to connect to test MongoDB")
}

fn new_survey() -> NewSurvey {
    let mut key = AnswerSheet::new();
    key.insert("q1".to_string(), "Paris".into());
    key.insert("q2".to_string(), vec!["a", "b"].into());

    NewSurvey {
        title: "Capitals".to_string(),
        description: None,
        questions: vec![Question {
            text: "Capital of France?".to_string(),
            kind: "radio".to_string(),
            options: Some(vec!["Paris".to_string(), "Lyon".to_string()]),
        }],
        correct_answers: Some(key),
    }
}

#[tokio::test]
#[ignore]
async fn test_mongo_survey_lifecycle() {
    let store = connect().await;
    store.ping().await.unwrap();

    let created = store.create_survey(new_survey()).await.unwrap();
    let fetched = store.get_survey(created.id).await.unwrap();
    assert_eq!(fetched, created);

    let updated = store
        .update_survey(
            created.id,
            SurveyUpdate {
                title: "Renamed".to_string(),
                description: Some("d".to_string()),
                questions: vec![],
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.correct_answers, created.correct_answers);

    let mut answers = AnswerSheet::new();
    answers.insert("q1".to_string(), "Paris".into());
    let stored = store
        .insert_response(
            created.id,
            NewResponse {
                answers: answers.clone(),
                student_name: Some("Ann".to_string()),
                timestamp: Utc::now().trunc_subsecs(3),
            },
        )
        .await
        .unwrap();
    assert_eq!(stored.correct_answers, created.correct_answers);

    let listed = store.list_responses(created.id).await.unwrap();
    assert_eq!(listed, vec![stored.response]);

    store.delete_survey(created.id).await.unwrap();
    assert!(store.list_responses(created.id).await.unwrap().is_empty());
    assert!(matches!(
        store.get_survey(created.id).await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
#[ignore]
async fn test_mongo_insert_response_for_missing_survey() {
    let store = connect().await;

    let result = store
        .insert_response(
            404,
            NewResponse {
                answers: AnswerSheet::new(),
                student_name: None,
                timestamp: Utc::now().trunc_subsecs(3),
            },
        )
        .await;

    assert!(matches!(result, Err(StoreError::NotFound { .. })));
    assert!(store.list_responses(404).await.unwrap().is_empty());
}
