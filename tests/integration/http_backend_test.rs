//! HttpBackend against a fake backend served by axum.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use dataquest::backend::{
    CellValue, ExecuteRequest, GenerateRequest, HttpBackend, QueryBackend,
};
use dataquest::config::BackendConfig;
use dataquest::error::DataQuestError;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

type Reply = (StatusCode, Value);

/// Canned replies plus a log of received bodies, keyed by endpoint.
#[derive(Clone)]
struct FakeBackend {
    generate: Reply,
    execute: Reply,
    received: Arc<Mutex<Vec<(&'static str, Value)>>>,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            generate: (StatusCode::OK, json!({ "sql_query": "SELECT 1;" })),
            execute: (StatusCode::OK, json!({ "results": [] })),
            received: Arc::default(),
        }
    }

    fn generate(mut self, status: StatusCode, body: Value) -> Self {
        self.generate = (status, body);
        self
    }

    fn execute(mut self, status: StatusCode, body: Value) -> Self {
        self.execute = (status, body);
        self
    }

    fn bodies(&self, endpoint: &str) -> Vec<Value> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| *e == endpoint)
            .map(|(_, body)| body.clone())
            .collect()
    }

    /// Serves on an ephemeral port and returns a client pointed at it.
    async fn start(&self) -> HttpBackend {
        let app = Router::new()
            .route("/query", post(handle_generate))
            .route("/execute-query", post(handle_execute))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        HttpBackend::new(&BackendConfig {
            base_url: format!("http://{addr}"),
            timeout_secs: Some(5),
        })
        .unwrap()
    }
}

async fn handle_generate(
    State(fake): State<FakeBackend>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    fake.received.lock().unwrap().push(("query", body));
    (fake.generate.0, Json(fake.generate.1))
}

async fn handle_execute(
    State(fake): State<FakeBackend>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    fake.received.lock().unwrap().push(("execute-query", body));
    (fake.execute.0, Json(fake.execute.1))
}

fn execute_request(query: &str) -> ExecuteRequest {
    ExecuteRequest {
        query: query.to_string(),
    }
}

#[tokio::test]
async fn test_generate_returns_sql() {
    let fake = FakeBackend::new().generate(
        StatusCode::OK,
        json!({ "sql_query": "SELECT name FROM student;" }),
    );
    let backend = fake.start().await;

    let sql = backend
        .generate(&GenerateRequest::new("List all students"))
        .await
        .unwrap();

    assert_eq!(sql, "SELECT name FROM student;");
}

#[tokio::test]
async fn test_generate_omits_absent_feedback_fields() {
    let fake = FakeBackend::new();
    let backend = fake.start().await;

    backend
        .generate(&GenerateRequest::new("How many teams?"))
        .await
        .unwrap();

    assert_eq!(
        fake.bodies("query"),
        vec![json!({ "question": "How many teams?" })]
    );
}

#[tokio::test]
async fn test_generate_sends_feedback_fields() {
    let fake = FakeBackend::new();
    let backend = fake.start().await;

    let request = GenerateRequest::new("List all students").with_feedback(
        Some("SQLite error: no such table: students".to_string()),
        Some("SELECT name FROM students;".to_string()),
    );
    backend.generate(&request).await.unwrap();

    assert_eq!(
        fake.bodies("query"),
        vec![json!({
            "question": "List all students",
            "previous_error": "SQLite error: no such table: students",
            "previous_query": "SELECT name FROM students;",
        })]
    );
}

#[tokio::test]
async fn test_generate_error_carries_detail() {
    let fake = FakeBackend::new().generate(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "detail": "Model overloaded" }),
    );
    let backend = fake.start().await;

    let err = backend
        .generate(&GenerateRequest::new("anything"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        DataQuestError::rejected(500, Some("Model overloaded".to_string()))
    );
}

#[tokio::test]
async fn test_error_without_detail() {
    let fake = FakeBackend::new().execute(StatusCode::BAD_REQUEST, json!({}));
    let backend = fake.start().await;

    let err = backend
        .execute(&execute_request("SELEC 1"))
        .await
        .unwrap_err();

    assert_eq!(err, DataQuestError::rejected(400, None));
    assert_eq!(err.detail(), None);
}

#[tokio::test]
async fn test_structured_detail_is_rendered_as_json() {
    let fake = FakeBackend::new().generate(
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({ "detail": [{ "loc": ["body", "question"], "msg": "field required" }] }),
    );
    let backend = fake.start().await;

    let err = backend
        .generate(&GenerateRequest::new(""))
        .await
        .unwrap_err();

    assert_eq!(
        err.detail(),
        Some(r#"[{"loc":["body","question"],"msg":"field required"}]"#)
    );
}

#[tokio::test]
async fn test_execute_positional_rows() {
    let fake = FakeBackend::new().execute(
        StatusCode::OK,
        json!({ "results": [["Alice Chen", 1], ["Bob Martinez", null]] }),
    );
    let backend = fake.start().await;

    let result = backend
        .execute(&execute_request("SELECT name, team FROM student;"))
        .await
        .unwrap();

    assert_eq!(result.columns, vec!["column_1", "column_2"]);
    assert_eq!(
        result.rows,
        vec![
            vec![CellValue::Text("Alice Chen".to_string()), CellValue::Int(1)],
            vec![CellValue::Text("Bob Martinez".to_string()), CellValue::Null],
        ]
    );
    assert_eq!(
        fake.bodies("execute-query"),
        vec![json!({ "query": "SELECT name, team FROM student;" })]
    );
}

#[tokio::test]
async fn test_execute_named_rows_keep_key_order() {
    let fake = FakeBackend::new().execute(
        StatusCode::OK,
        json!({ "results": [
            { "name": "AI Chatbot", "company": "TechCorp" },
            { "name": "Data Analytics Platform", "company": "DataCo" },
        ] }),
    );
    let backend = fake.start().await;

    let result = backend
        .execute(&execute_request("SELECT name, company FROM project;"))
        .await
        .unwrap();

    assert_eq!(result.columns, vec!["name", "company"]);
    assert_eq!(result.row_count(), 2);
    assert_eq!(result.rows[1][1], CellValue::Text("DataCo".to_string()));
}

#[tokio::test]
async fn test_execute_empty_results() {
    let fake = FakeBackend::new();
    let backend = fake.start().await;

    let result = backend
        .execute(&execute_request("SELECT * FROM student WHERE 0;"))
        .await
        .unwrap();

    assert!(result.is_empty());
}

#[tokio::test]
async fn test_malformed_success_body_is_response_error() {
    let fake = FakeBackend::new().generate(StatusCode::OK, json!({ "sql": "SELECT 1" }));
    let backend = fake.start().await;

    let err = backend
        .generate(&GenerateRequest::new("q"))
        .await
        .unwrap_err();

    assert!(matches!(err, DataQuestError::Response(_)), "{err:?}");
    assert_eq!(err.detail(), None);
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::new(&BackendConfig {
        base_url: format!("http://{addr}"),
        timeout_secs: Some(5),
    })
    .unwrap();

    let err = backend
        .generate(&GenerateRequest::new("q"))
        .await
        .unwrap_err();

    assert!(matches!(err, DataQuestError::Transport(_)), "{err:?}");
}
