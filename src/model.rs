//! Request and response types for the completions, edits, search, embeddings,
//! files, and fine-tunes endpoints.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Engines the API serves. Paths are built from these, never from free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Engine {
    #[serde(rename = "text-ada-001")]
    TextAda001,
    #[serde(rename = "text-babbage-001")]
    TextBabbage001,
    #[serde(rename = "text-curie-001")]
    TextCurie001,
    #[serde(rename = "text-davinci-001")]
    TextDavinci001,
    #[serde(rename = "ada")]
    Ada,
    #[serde(rename = "babbage")]
    Babbage,
    #[serde(rename = "curie")]
    Curie,
    #[default]
    #[serde(rename = "davinci")]
    Davinci,
    #[serde(rename = "text-similarity-ada-001")]
    TextSimilarityAda001,
    #[serde(rename = "text-search-ada-doc-001")]
    TextSearchAdaDoc001,
    #[serde(rename = "text-search-ada-query-001")]
    TextSearchAdaQuery001,
}

impl Engine {
    pub const ALL: [Engine; 11] = [
        Engine::TextAda001,
        Engine::TextBabbage001,
        Engine::TextCurie001,
        Engine::TextDavinci001,
        Engine::Ada,
        Engine::Babbage,
        Engine::Curie,
        Engine::Davinci,
        Engine::TextSimilarityAda001,
        Engine::TextSearchAdaDoc001,
        Engine::TextSearchAdaQuery001,
    ];

    /// Engine id as it appears in request paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::TextAda001 => "text-ada-001",
            Engine::TextBabbage001 => "text-babbage-001",
            Engine::TextCurie001 => "text-curie-001",
            Engine::TextDavinci001 => "text-davinci-001",
            Engine::Ada => "ada",
            Engine::Babbage => "babbage",
            Engine::Curie => "curie",
            Engine::Davinci => "davinci",
            Engine::TextSimilarityAda001 => "text-similarity-ada-001",
            Engine::TextSearchAdaDoc001 => "text-search-ada-doc-001",
            Engine::TextSearchAdaQuery001 => "text-search-ada-query-001",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an engine id that is not one of [`Engine::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown engine `{name}`, expected one of: {}", Engine::ALL.iter().join(", "))]
pub struct UnknownEngine {
    pub name: String,
}

impl FromStr for Engine {
    type Err = UnknownEngine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Engine::ALL
            .into_iter()
            .find(|engine| engine.as_str() == s)
            .ok_or_else(|| UnknownEngine {
                name: s.to_string(),
            })
    }
}

/// What an uploaded file is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilePurpose {
    FineTune,
    Search,
    Answers,
    Classifications,
}

impl FilePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilePurpose::FineTune => "fine-tune",
            FilePurpose::Search => "search",
            FilePurpose::Answers => "answers",
            FilePurpose::Classifications => "classifications",
        }
    }
}

impl fmt::Display for FilePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Engines ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineObject {
    pub id: String,
    pub object: String,
    pub owner: String,
    pub ready: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnginesResponse {
    pub data: Vec<EngineObject>,
    pub object: String,
}

// --- Completions ---

/// Request body for the completions endpoint.
///
/// `stream` is overwritten by the client depending on whether a streaming
/// operation was called.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,

    /// Text that comes after the inserted completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling, an alternative to temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Number of choices to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,

    /// Include the log probabilities of this many most likely tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<u32>,

    /// Echo back the prompt in addition to the completion
    #[serde(default)]
    pub echo: bool,

    /// Up to 4 sequences where generation stops
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,

    #[serde(default)]
    pub presence_penalty: f32,

    #[serde(default)]
    pub frequency_penalty: f32,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_stop(mut self, stop: impl Into<String>) -> Self {
        self.stop.push(stop.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogprobResult {
    pub tokens: Vec<String>,
    pub token_logprobs: Vec<f32>,
    pub top_logprobs: Vec<HashMap<String, f32>>,
    pub text_offset: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionChoice {
    pub text: String,
    pub index: u32,
    /// Only present when the request asked for `logprobs`
    #[serde(default)]
    pub logprobs: Option<LogprobResult>,
    /// `None` on intermediate streaming events
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// A completion, or one incremental event of a streamed completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<CompletionChoice>,
}

// --- Edits ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditsRequest {
    /// Model id, e.g. `text-davinci-edit-001`
    pub model: String,
    /// Text to use as the starting point for the edit
    #[serde(default)]
    pub input: String,
    /// How the model should edit the input
    pub instruction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditsChoice {
    pub text: String,
    pub index: u32,
}

/// Token accounting shared by the edits and embeddings responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditsResponse {
    pub object: String,
    pub created: u64,
    pub choices: Vec<EditsChoice>,
    pub usage: Usage,
}

// --- Search ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub documents: Vec<String>,
    pub query: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchData {
    /// Index of the matched document in the request
    pub document: u32,
    pub object: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub data: Vec<SearchData>,
    pub object: String,
}

// --- Embeddings ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingsRequest {
    pub input: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub object: String,
    pub embedding: Vec<f64>,
    pub index: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingsResponse {
    pub object: String,
    pub usage: Usage,
    pub data: Vec<Embedding>,
}

// --- Files ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileObject {
    pub id: String,
    pub object: String,
    pub bytes: u64,
    pub created_at: u64,
    pub filename: String,
    pub purpose: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileDeleteResponse {
    pub id: String,
    pub object: String,
    pub deleted: bool,
}

// --- Fine-tunes ---

/// Body of a fine-tune job request. Only `training_file` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FineTuneOptions {
    pub training_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_rate_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_epochs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_loss_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub compute_classification_metrics: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification_n_classes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification_positive_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification_betas: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

impl FineTuneOptions {
    pub fn new(training_file: impl Into<String>) -> Self {
        Self {
            training_file: training_file.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HyperParams {
    pub batch_size: u32,
    pub learning_rate_multiplier: f64,
    pub n_epochs: u32,
    pub prompt_loss_weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FineTuneEvent {
    pub object: String,
    pub created_at: u64,
    pub level: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FineTuneResponse {
    pub id: String,
    pub object: String,
    pub model: String,
    pub created_at: u64,
    #[serde(default)]
    pub events: Vec<FineTuneEvent>,
    #[serde(default)]
    pub training_files: Vec<FileObject>,
    #[serde(default)]
    pub result_files: Vec<FileObject>,
    #[serde(default)]
    pub validation_files: Vec<FileObject>,
    pub updated_at: u64,
    pub status: String,
    #[serde(default)]
    pub organization_id: String,
    #[serde(rename = "hyperparams", alias = "HyperParams", default)]
    pub hyper_params: HyperParams,
    pub fine_tuned_model: Option<String>,
}
