//! # gpt3 - client for the OpenAI GPT-3 API
//!
//! A small, async Rust client for the completions, edits, search, embeddings,
//! files, and fine-tunes endpoints.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Pluggable HTTP transport (`reqwest` by default)
//! - Streaming completions via Server-Sent Events, as a `Stream` or a callback
//! - Normalized API errors that always carry the HTTP status
//! - Cooperative cancellation through `CancellationToken`
//!
//! ## Architecture
//!
//! Every operation is a fixed mapping of verb, path, payload and result type
//! that goes through the same pipeline:
//!
//! 1. **Request building** adds the JSON body and the auth headers
//! 2. **The transport** executes the request ([`http::Transport`])
//! 3. **Response normalization** turns non-2xx answers into [`ApiError`]s and
//!    decodes 2xx bodies
//!
//! Streaming completions hand the body to the [`sse`] decoder instead.
//!
//! ## Example
//! ```no_run
//! use gpt3::client::Client;
//! use gpt3::model::{CompletionRequest, Engine};
//! use gpt3::options::ClientOptions;
//! use gpt3::providers::OpenAiClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ClientOptions::new("your-api-key").with_default_engine(Engine::Ada);
//!     let client = OpenAiClient::with_options(options)?;
//!
//!     let request = CompletionRequest::new("Once upon a time").with_max_tokens(16);
//!     let response = client.completion(request).await?;
//!     println!("{}", response.choices[0].text);
//!
//!     client
//!         .completion_stream(CompletionRequest::new("Count to five:"), |event| {
//!             print!("{}", event.choices[0].text);
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod http;
pub mod model;
pub mod options;
pub mod providers;
pub mod sse;
pub mod stream;

// Re-exports for convenience
pub use client::{ApiError, Client, ClientError};
pub use model::{CompletionRequest, CompletionResponse, Engine};
pub use options::ClientOptions;
pub use providers::OpenAiClient;
pub use stream::EventStream;
