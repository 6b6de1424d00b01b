//! Wire types for the query backend and the normalized result set.
//!
//! The execute endpoint may return rows either as positional arrays or as
//! column-name → value objects. Both are normalized into a [`ResultSet`]
//! with an explicit column list; a response mixing the two is rejected.

use crate::error::{DataQuestError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Body of `POST /query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The natural-language question, sent as typed.
    pub question: String,

    /// Error text from the failed attempt being retried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_error: Option<String>,

    /// Query text from the failed attempt being retried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_query: Option<String>,
}

impl GenerateRequest {
    /// Creates a plain generation request with no feedback attached.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            previous_error: None,
            previous_query: None,
        }
    }

    /// Attaches the previous error and query for a feedback retry.
    pub fn with_feedback(mut self, error: Option<String>, query: Option<String>) -> Self {
        self.previous_error = error;
        self.previous_query = query;
        self
    }

    /// Returns true if this request carries error feedback.
    pub fn has_feedback(&self) -> bool {
        self.previous_error.is_some() || self.previous_query.is_some()
    }
}

/// Success body of `POST /query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub sql_query: String,
}

/// Body of `POST /execute-query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub query: String,
}

/// Success body of `POST /execute-query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub results: Vec<RawRow>,
}

/// A row as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRow {
    /// Cell values aligned by position.
    Positional(Vec<JsonValue>),
    /// Column name → value, in the order the backend sent them.
    Named(Map<String, JsonValue>),
}

/// Extracts the `detail` field from a non-2xx response body.
///
/// Only the `detail` field of a JSON object counts; any other body has no
/// detail. String details are used verbatim, structured ones (validation
/// error lists, objects) are rendered as compact JSON.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    let value: JsonValue = serde_json::from_str(body).ok()?;
    match value.as_object()?.get("detail")? {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A single cell value from a result row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// NULL value.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Nested arrays or objects.
    Json(JsonValue),
}

impl CellValue {
    /// Returns true if this is a NULL value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns a display string for the value.
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
            Self::Json(j) => j.to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<JsonValue> for CellValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Self::Float(f)
                } else {
                    Self::Text(n.to_string())
                }
            }
            JsonValue::String(s) => Self::Text(s),
            other => Self::Json(other),
        }
    }
}

/// Tabular data returned by a successful execute call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Column names, in display order.
    pub columns: Vec<String>,
    /// Rows of cells, each exactly `columns.len()` wide.
    pub rows: Vec<Vec<CellValue>>,
}

impl ResultSet {
    /// Creates an empty result set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the backend returned no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Normalizes wire rows into a rectangular table.
    ///
    /// Positional rows get generated column names (`column_1`, ...) and are
    /// padded with NULL to the widest row. Named rows take their columns from
    /// key order of first appearance; missing keys become NULL.
    pub fn from_raw_rows(raw: Vec<RawRow>) -> Result<Self> {
        let Some(first) = raw.first() else {
            return Ok(Self::new());
        };

        match first {
            RawRow::Positional(_) => Self::from_positional(raw),
            RawRow::Named(_) => Self::from_named(raw),
        }
    }

    fn from_positional(raw: Vec<RawRow>) -> Result<Self> {
        let mut rows = Vec::with_capacity(raw.len());
        for row in raw {
            match row {
                RawRow::Positional(cells) => {
                    rows.push(cells.into_iter().map(CellValue::from).collect::<Vec<_>>())
                }
                RawRow::Named(_) => return Err(mixed_shapes()),
            }
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, CellValue::Null);
        }

        let columns = (1..=width).map(|i| format!("column_{i}")).collect();
        Ok(Self { columns, rows })
    }

    fn from_named(raw: Vec<RawRow>) -> Result<Self> {
        let mut maps = Vec::with_capacity(raw.len());
        for row in raw {
            match row {
                RawRow::Named(map) => maps.push(map),
                RawRow::Positional(_) => return Err(mixed_shapes()),
            }
        }

        let mut columns: Vec<String> = Vec::new();
        for map in &maps {
            for key in map.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = maps
            .into_iter()
            .map(|mut map| {
                columns
                    .iter()
                    .map(|col| map.remove(col).map(CellValue::from).unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }
}

fn mixed_shapes() -> DataQuestError {
    DataQuestError::response("result rows mix positional arrays and column objects")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse_rows(body: JsonValue) -> Result<ResultSet> {
        let response: ExecuteResponse = serde_json::from_value(body).unwrap();
        ResultSet::from_raw_rows(response.results)
    }

    #[test]
    fn test_generate_request_omits_absent_feedback() {
        let body = serde_json::to_value(GenerateRequest::new("Show all projects")).unwrap();
        assert_eq!(body, json!({ "question": "Show all projects" }));
    }

    #[test]
    fn test_generate_request_with_feedback() {
        let request = GenerateRequest::new("Show all projects").with_feedback(
            Some("no such table: projects".to_string()),
            Some("SELECT * FROM projects;".to_string()),
        );
        assert!(request.has_feedback());

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "question": "Show all projects",
                "previous_error": "no such table: projects",
                "previous_query": "SELECT * FROM projects;"
            })
        );
    }

    #[test]
    fn test_positional_rows() {
        let result = parse_rows(json!({ "results": [[1, "Alice", null], [2, "Bob", 3.5]] })).unwrap();

        assert_eq!(result.columns, vec!["column_1", "column_2", "column_3"]);
        assert_eq!(
            result.rows[0],
            vec![
                CellValue::Int(1),
                CellValue::Text("Alice".to_string()),
                CellValue::Null
            ]
        );
        assert_eq!(result.rows[1][2], CellValue::Float(3.5));
    }

    #[test]
    fn test_positional_rows_are_padded() {
        let result = parse_rows(json!({ "results": [[1], [2, "x"]] })).unwrap();
        assert_eq!(result.columns.len(), 2);
        assert_eq!(result.rows[0], vec![CellValue::Int(1), CellValue::Null]);
    }

    #[test]
    fn test_named_rows_keep_key_order() {
        let result = parse_rows(json!({
            "results": [
                { "name": "Alice", "team": 3 },
                { "name": "Bob", "team": 1, "grade": 88.5 }
            ]
        }))
        .unwrap();

        assert_eq!(result.columns, vec!["name", "team", "grade"]);
        assert_eq!(result.rows[0][2], CellValue::Null);
        assert_eq!(result.rows[1][2], CellValue::Float(88.5));
    }

    #[test]
    fn test_empty_results() {
        let result = parse_rows(json!({ "results": [] })).unwrap();
        assert!(result.is_empty());
        assert!(result.columns.is_empty());
    }

    #[test]
    fn test_mixed_shapes_rejected() {
        let err = parse_rows(json!({ "results": [[1], { "a": 1 }] })).unwrap_err();
        assert_eq!(err.category(), "Response Error");
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Null.to_display_string(), "NULL");
        assert_eq!(CellValue::Bool(true).to_display_string(), "true");
        assert_eq!(CellValue::from(json!(42)).to_display_string(), "42");
        assert_eq!(
            CellValue::from(json!({ "Plans": "ship" })).to_display_string(),
            r#"{"Plans":"ship"}"#
        );
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(
            error_detail(r#"{"detail":"syntax error at AND"}"#).as_deref(),
            Some("syntax error at AND")
        );
        assert_eq!(error_detail(r#"{"message":"nope"}"#), None);
        assert_eq!(error_detail(r#"{"detail":null}"#), None);
        assert_eq!(
            error_detail(r#"{"detail":[{"loc":["body","question"]}]}"#).as_deref(),
            Some(r#"[{"loc":["body","question"]}]"#)
        );
    }

    #[test]
    fn test_error_detail_requires_object_body() {
        assert_eq!(error_detail(r#"["upstream down"]"#), None);
        assert_eq!(error_detail(r#""upstream down""#), None);
        assert_eq!(error_detail("502 Bad Gateway"), None);
    }
}
