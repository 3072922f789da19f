//! HTTP plumbing: the pluggable transport, the request and response
//! descriptors that cross it, and status classification of responses.
//!
//! The client only ever talks to a [`Transport`]. [`ReqwestTransport`] is the
//! default; tests substitute their own implementation.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::client::{ApiError, ApiErrorResponse, ClientError};
use crate::options::TransportOptions;

/// Failure raised by a transport while sending a request or reading a body.
pub struct TransportError {
    inner: Box<dyn std::error::Error + Send + Sync>,
}

impl TransportError {
    pub fn new(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            inner: error.into(),
        }
    }

    /// The underlying error, e.g. a `reqwest::Error` for the default transport.
    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.inner
    }
}

impl fmt::Debug for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        Self::new(error)
    }
}

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        contents: Bytes,
    },
}

/// A `multipart/form-data` body, independent of any HTTP library.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    pub parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        contents: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            contents: contents.into(),
        });
        self
    }

    /// Look up a text field by name.
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            FormPart::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    fn into_reqwest(self) -> Result<reqwest::multipart::Form, reqwest::Error> {
        let mut form = reqwest::multipart::Form::new();
        for part in self.parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::File {
                    name,
                    file_name,
                    contents,
                } => {
                    let part = reqwest::multipart::Part::bytes(contents.to_vec())
                        .file_name(file_name)
                        .mime_str("application/octet-stream")?;
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Bytes),
    Multipart(MultipartForm),
}

impl RequestBody {
    /// Serialize `payload` as a JSON body.
    pub fn json<T: serde::Serialize + ?Sized>(payload: &T) -> Result<Self, ClientError> {
        serde_json::to_vec(payload)
            .map(|raw| RequestBody::Json(Bytes::from(raw)))
            .map_err(ClientError::Encoding)
    }

    /// Raw JSON bytes, if this is a JSON body.
    pub fn as_json(&self) -> Option<&[u8]> {
        match self {
            RequestBody::Json(raw) => Some(raw),
            _ => None,
        }
    }
}

/// A fully formed request, ready for a [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

/// Response body as a stream of chunks; any chunk may fail.
pub type ResponseBody = BoxStream<'static, Result<Bytes, TransportError>>;

pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ResponseBody,
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: ResponseBody) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    /// Response whose whole body is available up front.
    pub fn from_bytes(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self::new(status, stream::once(async move { Ok::<_, TransportError>(body) }).boxed())
    }

    /// Response whose body arrives as the given chunks, in order.
    pub fn from_chunks(status: StatusCode, chunks: Vec<Result<Bytes, TransportError>>) -> Self {
        Self::new(status, stream::iter(chunks).boxed())
    }

    /// Read the whole body.
    pub async fn bytes(self) -> Result<Bytes, TransportError> {
        let mut body = self.body;
        let mut buffer = BytesMut::new();
        while let Some(chunk) = body.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer.freeze())
    }

    /// Pass a 2xx response through; turn anything else into an error.
    ///
    /// The error body is parsed as the API's error envelope. When that fails
    /// the raw body becomes the message of an `Unexpected` error.
    pub async fn error_for_status(self) -> Result<Self, ClientError> {
        if self.status.is_success() {
            return Ok(self);
        }
        let status = self.status.as_u16();
        let body = self.bytes().await.map_err(ClientError::BodyRead)?;
        Err(api_error(status, &body).into())
    }

    /// Read the body and decode it as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        let body = self.bytes().await.map_err(ClientError::BodyRead)?;
        serde_json::from_slice(&body).map_err(ClientError::Decode)
    }
}

/// Normalize an error body into an [`ApiError`] carrying `status`.
pub fn api_error(status: u16, body: &[u8]) -> ApiError {
    match serde_json::from_slice::<ApiErrorResponse>(body) {
        Ok(envelope) => ApiError {
            status_code: status,
            ..envelope.error
        },
        Err(_) => ApiError::unexpected(status, String::from_utf8_lossy(body)),
    }
}

/// Executes HTTP requests on behalf of the client.
///
/// Implementations return any response they receive, whatever its status;
/// status handling belongs to the caller. Errors are reserved for failures
/// where no response exists (connection refused, DNS, timeout).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(options: &TransportOptions) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(options)?,
        })
    }

    /// Wrap an already configured `reqwest::Client`.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);

        let builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(raw) => builder.body(raw),
            RequestBody::Multipart(form) => builder.multipart(form.into_reqwest()?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(TransportError::from))
            .boxed();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Build a configured HTTP client from transport options.
///
/// This applies common configuration like timeouts and proxies.
pub fn build_http_client(transport_options: &TransportOptions) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder();

    if let Some(timeout) = transport_options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(proxy_url) = &transport_options.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
    }

    builder.build()
}

/// Add extra headers to a request if specified in transport options.
pub fn add_extra_headers(
    headers: &mut HeaderMap,
    extra_headers: &Option<HashMap<String, String>>,
) -> Result<(), ClientError> {
    if let Some(extra) = extra_headers {
        for (key, value) in extra {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| ClientError::Config(format!("invalid header name: {key}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ClientError::Config(format!("invalid header value for {key}")))?;
            headers.insert(name, value);
        }
    }
    Ok(())
}
