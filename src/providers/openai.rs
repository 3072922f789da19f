//! OpenAI GPT-3 API client implementation.
//!
//! This module implements the `Client` trait on top of a pluggable
//! [`Transport`]. Every operation goes through the same three steps: build
//! the request, perform it, and decode the body.
//! See: <https://beta.openai.com/docs/api-reference>

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::{Client, ClientError};
use crate::http::{
    add_extra_headers, HttpRequest, HttpResponse, MultipartForm, ReqwestTransport, RequestBody,
    Transport,
};
use crate::model::{
    CompletionRequest, CompletionResponse, EditsRequest, EditsResponse, EmbeddingsRequest,
    EmbeddingsResponse, Engine, EngineObject, EnginesResponse, FileDeleteResponse, FileObject,
    FilePurpose, FineTuneOptions, FineTuneResponse, SearchRequest, SearchResponse,
};
use crate::options::{ClientOptions, SecretString};
use crate::sse::SseResponseExt;
use crate::stream::{cancellable, EventStream};

const ORGANIZATION_HEADER: HeaderName = HeaderName::from_static("openai-organization");

/// OpenAI client.
///
/// Cloning is cheap: clones share the options and the transport, so one
/// client can serve many concurrent calls.
#[derive(Clone)]
pub struct OpenAiClient {
    options: Arc<ClientOptions>,
    transport: Arc<dyn Transport>,
    cancellation: Option<CancellationToken>,
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("options", &self.options)
            .field("cancellation", &self.cancellation)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Create a client with the given API key and default options.
    pub fn new(api_key: impl Into<SecretString>) -> Result<Self, ClientError> {
        Self::with_options(ClientOptions::new(api_key))
    }

    /// Create a client that talks through a `reqwest` transport built from
    /// `options.transport`.
    pub fn with_options(options: ClientOptions) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(&options.transport)
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_transport(options, Arc::new(transport)))
    }

    /// Create a client that sends every request through `transport`.
    pub fn with_transport(options: ClientOptions, transport: Arc<dyn Transport>) -> Self {
        Self {
            options: Arc::new(options),
            transport,
            cancellation: None,
        }
    }

    /// A client sharing this one's configuration whose calls abort with
    /// [`ClientError::Cancelled`] once `token` is cancelled.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancellation: Some(token),
            ..self.clone()
        }
    }

    /// Build a request for `path` carrying the authentication headers.
    pub fn build_request(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<HttpRequest, ClientError> {
        let mut headers = HeaderMap::new();

        // Multipart bodies get their content type, boundary included, from the transport.
        if !matches!(body, RequestBody::Multipart(_)) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let mut auth =
            HeaderValue::from_str(&format!("Bearer {}", self.options.api_key.expose_secret()))
                .map_err(|_| ClientError::Config("invalid API key".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        if let Some(organization) = self.options.organization() {
            headers.insert(
                ORGANIZATION_HEADER,
                HeaderValue::from_str(organization)
                    .map_err(|_| ClientError::Config("invalid organization id".to_string()))?,
            );
        }

        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.options.transport.user_agent)
                .map_err(|_| ClientError::Config("invalid user agent".to_string()))?,
        );

        add_extra_headers(&mut headers, &self.options.transport.extra_headers)?;

        Ok(HttpRequest {
            method,
            url: self.options.url(path),
            headers,
            body,
        })
    }

    fn json_request<P: Serialize>(
        &self,
        method: Method,
        path: &str,
        payload: &P,
    ) -> Result<HttpRequest, ClientError> {
        self.build_request(method, path, RequestBody::json(payload)?)
    }

    /// Send `request` and return the response if its status is 2xx.
    pub async fn perform(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let method = request.method.clone();
        let url = request.url.clone();
        debug!(%method, %url, "sending request");

        let response = self
            .cancellable(self.transport.execute(request))
            .await?
            .map_err(|source| {
                warn!(%method, %url, error = %source, "transport failure");
                ClientError::Transport {
                    method: method.clone(),
                    url: url.clone(),
                    source,
                }
            })?;

        let status = response.status;
        debug!(%method, %url, status = status.as_u16(), "received response");

        self.cancellable(response.error_for_status())
            .await?
            .inspect_err(|e| warn!(%method, %url, error = %e, "request failed"))
    }

    /// Perform `request` and decode the JSON body.
    async fn send<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, ClientError> {
        let response = self.perform(request).await?;
        self.cancellable(response.json()).await?
    }

    /// Run `future` unless the cancellation token fires first.
    async fn cancellable<F: Future>(&self, future: F) -> Result<F::Output, ClientError> {
        match &self.cancellation {
            None => Ok(future.await),
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(ClientError::Cancelled),
                output = future => Ok(output),
            },
        }
    }
}

/// Read the whole file at `path`, closing it before returning.
async fn read_file(path: &Path) -> Result<Vec<u8>, ClientError> {
    let to_error = |source| ClientError::File {
        path: path.to_path_buf(),
        source,
    };
    let mut file = tokio::fs::File::open(path).await.map_err(to_error)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents).await.map_err(to_error)?;
    Ok(contents)
}

#[async_trait]
impl Client for OpenAiClient {
    fn options(&self) -> &ClientOptions {
        &self.options
    }

    async fn engines(&self) -> Result<EnginesResponse, ClientError> {
        let request = self.build_request(Method::GET, "/engines", RequestBody::Empty)?;
        self.send(request).await
    }

    async fn engine(&self, engine: Engine) -> Result<EngineObject, ClientError> {
        let request =
            self.build_request(Method::GET, &format!("/engines/{engine}"), RequestBody::Empty)?;
        self.send(request).await
    }

    async fn completion_with_engine(
        &self,
        engine: Engine,
        mut request: CompletionRequest,
    ) -> Result<CompletionResponse, ClientError> {
        request.stream = false;
        let request = self.json_request(
            Method::POST,
            &format!("/engines/{engine}/completions"),
            &request,
        )?;
        self.send(request).await
    }

    async fn completion_events_with_engine(
        &self,
        engine: Engine,
        mut request: CompletionRequest,
    ) -> Result<EventStream<CompletionResponse>, ClientError> {
        request.stream = true;
        let request = self.json_request(
            Method::POST,
            &format!("/engines/{engine}/completions"),
            &request,
        )?;
        let response = self.perform(request).await?;
        Ok(cancellable(
            response.sse_events::<CompletionResponse>(),
            self.cancellation.clone(),
        ))
    }

    async fn edits(&self, request: EditsRequest) -> Result<EditsResponse, ClientError> {
        let request = self.json_request(Method::POST, "/edits", &request)?;
        self.send(request).await
    }

    async fn search_with_engine(
        &self,
        engine: Engine,
        request: SearchRequest,
    ) -> Result<SearchResponse, ClientError> {
        let request =
            self.json_request(Method::POST, &format!("/engines/{engine}/search"), &request)?;
        self.send(request).await
    }

    async fn embeddings(
        &self,
        engine: Engine,
        request: EmbeddingsRequest,
    ) -> Result<EmbeddingsResponse, ClientError> {
        let request = self.json_request(
            Method::POST,
            &format!("/engines/{engine}/embeddings"),
            &request,
        )?;
        self.send(request).await
    }

    async fn upload_file(
        &self,
        path: &Path,
        purpose: FilePurpose,
    ) -> Result<FileObject, ClientError> {
        let contents = read_file(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let form = MultipartForm::new()
            .file("file", file_name, contents)
            .text("purpose", purpose.as_str());
        let request = self.build_request(Method::POST, "/files", RequestBody::Multipart(form))?;
        self.send(request).await
    }

    async fn delete_file(&self, file_id: &str) -> Result<FileDeleteResponse, ClientError> {
        let request = self.build_request(
            Method::DELETE,
            &format!("/files/{file_id}"),
            RequestBody::Empty,
        )?;
        self.send(request).await
    }

    async fn create_fine_tune_with_options(
        &self,
        options: FineTuneOptions,
    ) -> Result<FineTuneResponse, ClientError> {
        let request = self.json_request(Method::POST, "/fine-tunes", &options)?;
        self.send(request).await
    }

    async fn get_fine_tune(&self, fine_tune_id: &str) -> Result<FineTuneResponse, ClientError> {
        let request = self.build_request(
            Method::GET,
            &format!("/fine-tunes/{fine_tune_id}"),
            RequestBody::Empty,
        )?;
        self.send(request).await
    }
}
