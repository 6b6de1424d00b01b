//! HTTP client for the query backend.
//!
//! Talks JSON to `POST {base}/query` and `POST {base}/execute-query`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::backend::types::{
    error_detail, ExecuteRequest, ExecuteResponse, GenerateRequest, GenerateResponse, ResultSet,
};
use crate::backend::QueryBackend;
use crate::config::BackendConfig;
use crate::error::{DataQuestError, Result};

/// Path of the generation endpoint, relative to the base URL.
const GENERATE_PATH: &str = "query";

/// Path of the execution endpoint, relative to the base URL.
const EXECUTE_PATH: &str = "execute-query";

/// HTTP query backend client.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    client: Client,
}

impl HttpBackend {
    /// Creates a new client from backend configuration.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut base_url = config.parsed_url()?;

        // Url::join replaces the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| {
            DataQuestError::internal(format!("Failed to create HTTP client: {e}"))
        })?;

        Ok(Self { base_url, client })
    }

    /// Returns the full URL for an endpoint path.
    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DataQuestError::config(format!("Invalid endpoint '{path}': {e}")))
    }

    /// Maps a non-2xx response into a rejection carrying the backend detail.
    fn parse_error(status: StatusCode, body: &str) -> DataQuestError {
        DataQuestError::rejected(status.as_u16(), error_detail(body))
    }

    /// Maps a reqwest send error into a transport error.
    fn transport_error(error: reqwest::Error) -> DataQuestError {
        if error.is_timeout() {
            DataQuestError::transport("Request timed out")
        } else if error.is_connect() {
            DataQuestError::transport(format!("Failed to connect to backend: {error}"))
        } else {
            DataQuestError::transport(format!("Request failed: {error}"))
        }
    }

    /// POSTs a JSON body and decodes the JSON success response.
    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DataQuestError::transport(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let error = Self::parse_error(status, &text);
            warn!("Backend returned {} for /{}: {}", status, path, error);
            return Err(error);
        }

        serde_json::from_str(&text)
            .map_err(|e| DataQuestError::response(format!("Failed to parse response: {e}")))
    }
}

#[async_trait]
impl QueryBackend for HttpBackend {
    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let response: GenerateResponse = self.post_json(GENERATE_PATH, request).await?;
        Ok(response.sql_query)
    }

    async fn execute(&self, request: &ExecuteRequest) -> Result<ResultSet> {
        let response: ExecuteResponse = self.post_json(EXECUTE_PATH, request).await?;
        ResultSet::from_raw_rows(response.results)
    }

    fn describe(&self) -> String {
        self.base_url.as_str().trim_end_matches('/').to_string()
    }
}
