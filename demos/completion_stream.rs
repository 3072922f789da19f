//! Streamed completion example: prints tokens as they arrive. Ctrl-C cancels
//! the stream.
//!
//! Run with:
//! ```bash
//! export OPENAI_API_KEY="your-api-key"
//! cargo run --example completion_stream
//! ```

use std::io::Write;

use gpt3::client::{Client, ClientError};
use gpt3::model::CompletionRequest;
use gpt3::options::ClientOptions;
use gpt3::providers::OpenAiClient;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = ClientOptions::from_env()
        .ok_or("OPENAI_API_KEY environment variable must be set")?;

    let token = CancellationToken::new();
    let client = OpenAiClient::with_options(options)?.with_cancellation(token.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let request = CompletionRequest::new("Write a haiku about the sea.")
        .with_max_tokens(64)
        .with_temperature(0.7);

    let result = client
        .completion_stream(request, |event| {
            if let Some(choice) = event.choices.first() {
                print!("{}", choice.text);
                let _ = std::io::stdout().flush();
            }
        })
        .await;
    println!();

    match result {
        Ok(()) => Ok(()),
        Err(ClientError::Cancelled) => {
            eprintln!("cancelled");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
