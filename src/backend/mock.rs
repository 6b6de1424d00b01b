//! In-memory mock backend for tests and headless runs.
//!
//! Answers from a small canned student/project dataset, supports custom
//! responses keyed by substring, and records every call it receives.

use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex, PoisonError};

use crate::backend::types::{ExecuteRequest, GenerateRequest, RawRow, ResultSet};
use crate::backend::QueryBackend;
use crate::error::{DataQuestError, Result};

/// A call received by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Generate(GenerateRequest),
    Execute(ExecuteRequest),
}

/// Mock backend that returns canned responses based on input patterns.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    /// Custom generation responses (question pattern -> SQL or error).
    generate_responses: Vec<(String, Result<String>)>,
    /// Custom execution responses (query pattern -> rows or error).
    execute_responses: Vec<(String, Result<ResultSet>)>,
    /// Response used for every feedback retry, if set.
    feedback_response: Option<Result<String>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockBackend {
    /// Creates a new mock backend with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `sql` for questions containing `pattern`.
    pub fn with_sql(mut self, pattern: impl Into<String>, sql: impl Into<String>) -> Self {
        self.generate_responses
            .push((pattern.into(), Ok(sql.into())));
        self
    }

    /// Fails generation for questions containing `pattern`.
    pub fn with_generate_error(mut self, pattern: impl Into<String>, error: DataQuestError) -> Self {
        self.generate_responses.push((pattern.into(), Err(error)));
        self
    }

    /// Returns `rows` for queries containing `pattern`.
    pub fn with_rows(mut self, pattern: impl Into<String>, rows: ResultSet) -> Self {
        self.execute_responses.push((pattern.into(), Ok(rows)));
        self
    }

    /// Fails execution for queries containing `pattern`.
    pub fn with_execute_error(mut self, pattern: impl Into<String>, error: DataQuestError) -> Self {
        self.execute_responses.push((pattern.into(), Err(error)));
        self
    }

    /// Returns `sql` for every generation request carrying error feedback.
    pub fn with_feedback_sql(mut self, sql: impl Into<String>) -> Self {
        self.feedback_response = Some(Ok(sql.into()));
        self
    }

    /// Returns all calls received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns the most recent generation request, if any.
    pub fn last_generate(&self) -> Option<GenerateRequest> {
        self.calls().into_iter().rev().find_map(|c| match c {
            RecordedCall::Generate(r) => Some(r),
            RecordedCall::Execute(_) => None,
        })
    }

    /// Returns the most recent execution request, if any.
    pub fn last_execute(&self) -> Option<ExecuteRequest> {
        self.calls().into_iter().rev().find_map(|c| match c {
            RecordedCall::Execute(r) => Some(r),
            RecordedCall::Generate(_) => None,
        })
    }

    fn record(&self, call: RecordedCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn mock_sql(&self, request: &GenerateRequest) -> Result<String> {
        let question = request.question.to_lowercase();

        if request.has_feedback() {
            if let Some(response) = &self.feedback_response {
                return response.clone();
            }
        }

        for (pattern, response) in &self.generate_responses {
            if question.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if let Some(previous) = request.previous_query.as_deref() {
            return Ok(fix_table_names(previous));
        }

        if question.contains("count") && question.contains("student") {
            return Ok("SELECT COUNT(*) FROM student;".to_string());
        }

        if question.contains("student") {
            return Ok("SELECT name, team FROM student;".to_string());
        }

        if question.contains("project") {
            return Ok("SELECT name, company FROM project;".to_string());
        }

        Err(DataQuestError::rejected(
            500,
            Some(format!("Could not generate SQL for: {}", request.question)),
        ))
    }

    fn mock_rows(&self, request: &ExecuteRequest) -> Result<ResultSet> {
        let query = request.query.trim().to_lowercase();

        for (pattern, response) in &self.execute_responses {
            if query.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if query.is_empty() {
            return Err(sqlite_error("incomplete input"));
        }

        let Some(table) = table_name(&query) else {
            let first = query.split_whitespace().next().unwrap_or_default();
            return Err(sqlite_error(&format!("near \"{first}\": syntax error")));
        };

        let rows = match table.as_str() {
            "student" => student_rows(),
            "project" => project_rows(),
            other => return Err(sqlite_error(&format!("no such table: {other}"))),
        };

        if query.contains("count(") {
            return ResultSet::from_raw_rows(vec![RawRow::Positional(vec![json!(rows.len())])]);
        }

        ResultSet::from_raw_rows(rows)
    }
}

#[async_trait]
impl QueryBackend for MockBackend {
    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        self.record(RecordedCall::Generate(request.clone()));
        self.mock_sql(request)
    }

    async fn execute(&self, request: &ExecuteRequest) -> Result<ResultSet> {
        self.record(RecordedCall::Execute(request.clone()));
        self.mock_rows(request)
    }

    fn describe(&self) -> String {
        "mock backend".to_string()
    }
}

fn sqlite_error(message: &str) -> DataQuestError {
    DataQuestError::rejected(400, Some(format!("SQLite error: {message}")))
}

/// Returns the identifier following the first `from` keyword.
fn table_name(query: &str) -> Option<String> {
    let mut words = query.split_whitespace();
    words.find(|w| *w == "from")?;
    words.next().map(|t| {
        t.trim_end_matches(';')
            .trim_matches(|c| c == '"' || c == '`')
            .to_string()
    })
}

/// Singularizes the plural table names the mock's generator gets wrong.
fn fix_table_names(query: &str) -> String {
    query
        .replace("students", "student")
        .replace("projects", "project")
}

fn student_rows() -> Vec<RawRow> {
    [
        ("Alice Chen", 1),
        ("Bob Martinez", 2),
        ("Carol Okafor", 1),
        ("Dan Novak", 3),
    ]
    .into_iter()
    .map(|(name, team)| RawRow::Positional(vec![json!(name), json!(team)]))
    .collect()
}

fn project_rows() -> Vec<RawRow> {
    [
        ("AI Chatbot", "TechCorp"),
        ("Data Analytics Platform", "DataCo"),
    ]
    .into_iter()
    .map(|(name, company)| RawRow::Positional(vec![json!(name), json!(company)]))
    .collect()
}
