//! Core client trait and error types.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Method;
use serde::Deserialize;
use thiserror::Error;

use crate::http::TransportError;
use crate::model::{
    CompletionRequest, CompletionResponse, EditsRequest, EditsResponse, EmbeddingsRequest,
    EmbeddingsResponse, Engine, EngineObject, EnginesResponse, FileDeleteResponse, FileObject,
    FilePurpose, FineTuneOptions, FineTuneResponse, SearchRequest, SearchResponse,
};
use crate::options::ClientOptions;
use crate::stream::EventStream;

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request payload could not be serialized.
    #[error("failed encoding json: {0}")]
    Encoding(#[source] serde_json::Error),

    /// The transport failed before a response was received.
    #[error("{method} \"{url}\": {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("failed to read from body: {0}")]
    BodyRead(#[source] TransportError),

    /// A success response did not match the expected shape.
    #[error("invalid json response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The API answered with a non-2xx status.
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    StreamRead(TransportError),

    #[error("invalid json stream data: {0}")]
    StreamDecode(#[source] serde_json::Error),

    #[error("stream ended before [DONE]")]
    UnexpectedEof,

    #[error("request cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure reported by the API itself.
///
/// `status_code` always comes from the HTTP status line; any status carried in
/// the body is ignored.
#[derive(Error, Debug, Clone, PartialEq, Eq, Deserialize)]
#[error("[{status_code}:{error_type}] {message}")]
pub struct ApiError {
    #[serde(skip)]
    pub status_code: u16,
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub message: String,
}

impl ApiError {
    /// Error for a failure body that is not the usual error envelope.
    pub fn unexpected(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            error_type: "Unexpected".to_string(),
            message: body.into(),
        }
    }
}

/// Wire shape of an error body: `{"error": {"type": ..., "message": ...}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiError,
}

/// Operations offered by the API.
///
/// Implementors provide one method per endpoint; the engine-less variants and
/// the callback-driven streaming methods are derived from those.
///
/// # Required Methods
/// - `options`: Accessor for the client configuration
/// - one method per endpoint (`engines`, `completion_with_engine`, ...)
///
/// # Provided Methods (with default implementations)
/// - `completion`, `completion_events`, `search`: use the default engine
/// - `completion_stream`, `completion_stream_with_engine`: drive a completion
///   stream and hand each event to a callback
/// - `create_fine_tune`: fine-tune with default hyperparameters
#[async_trait]
pub trait Client: Send + Sync {
    /// Get reference to the client options.
    fn options(&self) -> &ClientOptions;

    /// Engine used when an operation does not name one.
    fn default_engine(&self) -> Engine {
        self.options().default_engine
    }

    /// List the available engines with their owner and availability.
    async fn engines(&self) -> Result<EnginesResponse, ClientError>;

    /// Retrieve a single engine.
    async fn engine(&self, engine: Engine) -> Result<EngineObject, ClientError>;

    /// Complete `request.prompt` with the given engine.
    async fn completion_with_engine(
        &self,
        engine: Engine,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ClientError>;

    /// Stream a completion from the given engine.
    ///
    /// The returned stream yields one event per `data:` frame and ends after
    /// `[DONE]`. It yields at most one error, after which it ends.
    async fn completion_events_with_engine(
        &self,
        engine: Engine,
        request: CompletionRequest,
    ) -> Result<EventStream<CompletionResponse>, ClientError>;

    /// Edit `request.input` following `request.instruction`.
    async fn edits(&self, request: EditsRequest) -> Result<EditsResponse, ClientError>;

    /// Rank `request.documents` against `request.query`.
    async fn search_with_engine(
        &self,
        engine: Engine,
        request: SearchRequest,
    ) -> Result<SearchResponse, ClientError>;

    /// Embed every string of `request.input`.
    async fn embeddings(
        &self,
        engine: Engine,
        request: EmbeddingsRequest,
    ) -> Result<EmbeddingsResponse, ClientError>;

    /// Upload a local file for use with other endpoints.
    async fn upload_file(
        &self,
        path: &Path,
        purpose: FilePurpose,
    ) -> Result<FileObject, ClientError>;

    /// Delete an uploaded file.
    async fn delete_file(&self, file_id: &str) -> Result<FileDeleteResponse, ClientError>;

    /// Start a fine-tune job.
    async fn create_fine_tune_with_options(
        &self,
        options: FineTuneOptions,
    ) -> Result<FineTuneResponse, ClientError>;

    /// Fetch the state of a fine-tune job.
    async fn get_fine_tune(&self, fine_tune_id: &str) -> Result<FineTuneResponse, ClientError>;

    async fn completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ClientError> {
        self.completion_with_engine(self.default_engine(), request)
            .await
    }

    async fn completion_events(
        &self,
        request: CompletionRequest,
    ) -> Result<EventStream<CompletionResponse>, ClientError> {
        self.completion_events_with_engine(self.default_engine(), request)
            .await
    }

    /// Stream a completion from the default engine, calling `on_data` once per
    /// event in arrival order.
    async fn completion_stream<F>(
        &self,
        request: CompletionRequest,
        on_data: F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(CompletionResponse) + Send,
    {
        self.completion_stream_with_engine(self.default_engine(), request, on_data)
            .await
    }

    /// Stream a completion from `engine`, calling `on_data` once per event.
    ///
    /// `on_data` runs inline with the read loop. Returns `Ok(())` once `[DONE]`
    /// is seen; any error stops delivery, and events already delivered stay
    /// delivered.
    async fn completion_stream_with_engine<F>(
        &self,
        engine: Engine,
        request: CompletionRequest,
        mut on_data: F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(CompletionResponse) + Send,
    {
        let mut events = self.completion_events_with_engine(engine, request).await?;
        while let Some(event) = events.next().await {
            on_data(event?);
        }
        Ok(())
    }

    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, ClientError> {
        self.search_with_engine(self.default_engine(), request)
            .await
    }

    /// Fine-tune on `training_file` with default hyperparameters.
    async fn create_fine_tune(
        &self,
        training_file: &str,
    ) -> Result<FineTuneResponse, ClientError> {
        self.create_fine_tune_with_options(FineTuneOptions::new(training_file))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError {
            status_code: 429,
            error_type: "rate_limit".to_string(),
            message: "slow down".to_string(),
        };
        assert_eq!(err.to_string(), "[429:rate_limit] slow down");
        assert_eq!(
            ClientError::from(err).to_string(),
            "[429:rate_limit] slow down"
        );
    }

    #[test]
    fn test_api_error_envelope_ignores_body_status() {
        let body =
            r#"{"error":{"type":"invalid_request_error","message":"bad","status_code":999}}"#;
        let parsed: ApiErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.status_code, 0);
        assert_eq!(parsed.error.error_type, "invalid_request_error");
    }

    #[test]
    fn test_unexpected_error() {
        let err = ApiError::unexpected(502, "Bad Gateway");
        assert_eq!(err.to_string(), "[502:Unexpected] Bad Gateway");
    }

    #[test]
    fn test_transport_error_names_method_and_url() {
        let err = ClientError::Transport {
            method: Method::POST,
            url: "https://api.openai.com/v1/edits".to_string(),
            source: TransportError::new("request error"),
        };
        assert_eq!(
            err.to_string(),
            "POST \"https://api.openai.com/v1/edits\": request error"
        );
    }
}
