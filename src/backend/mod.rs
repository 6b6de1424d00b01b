//! Query backend integration.
//!
//! The backend turns questions into SQL and runs SQL against its own
//! database. DataQuest only talks to it through the [`QueryBackend`] trait.

pub mod http;
pub mod mock;
pub mod types;

pub use http::HttpBackend;
pub use mock::{MockBackend, RecordedCall};
pub use types::{
    CellValue, ExecuteRequest, ExecuteResponse, GenerateRequest, GenerateResponse, RawRow,
    ResultSet,
};

use async_trait::async_trait;

use crate::error::Result;

/// Trait for clients of the natural-language-to-SQL backend.
///
/// Implementations must be thread-safe (Send + Sync) so calls can run on
/// spawned tasks.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Asks the backend to translate a question into SQL.
    async fn generate(&self, request: &GenerateRequest) -> Result<String>;

    /// Asks the backend to run a SQL string and return its rows.
    async fn execute(&self, request: &ExecuteRequest) -> Result<ResultSet>;

    /// Short human-readable description of where calls go.
    fn describe(&self) -> String;
}
