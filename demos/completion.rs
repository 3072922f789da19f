//! Simple completion example.
//!
//! Run with:
//! ```bash
//! export OPENAI_API_KEY="your-api-key"
//! cargo run --example completion
//! ```

use gpt3::client::Client;
use gpt3::model::{CompletionRequest, Engine};
use gpt3::options::ClientOptions;
use gpt3::providers::OpenAiClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Picks up OPENAI_API_KEY, OPENAI_ORGANIZATION and OPENAI_BASE_URL
    let options = ClientOptions::from_env()
        .ok_or("OPENAI_API_KEY environment variable must be set")?;
    let client = OpenAiClient::with_options(options)?;

    let engines = client.engines().await?;
    println!("=== Engines ===");
    for engine in &engines.data {
        println!("{} (owner: {}, ready: {})", engine.id, engine.owner, engine.ready);
    }

    let request = CompletionRequest::new("The capital of France is")
        .with_max_tokens(5)
        .with_stop(".");

    println!("\nSending request to OpenAI...");
    match client.completion_with_engine(Engine::Ada, request).await {
        Ok(response) => {
            println!("\n=== Response ===");
            for choice in &response.choices {
                println!("{}: {}", choice.index, choice.text.trim());
                println!("Finish reason: {:?}", choice.finish_reason);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
