use crate::config::Config;
use crate::error::{InferenceError, PipelineError};
use crate::progress;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One entry of an ordered conversation. Role ordering is caller-defined
/// and not validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// The single outbound contract of the whole pipeline: send an ordered list
/// of role-tagged messages, get back generated text. Stage agents depend on
/// this trait, never on the concrete client, so tests can substitute a
/// scripted double.
pub trait Inference: Send + Sync {
    fn generate(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
        stream: bool,
    ) -> impl Future<Output = Result<String, InferenceError>> + Send;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

enum StreamEvent {
    Fragment(String),
    Done,
}

// SSE frames arrive as "data: {json}" lines with a "data: [DONE]" sentinel.
// Lines that don't parse are skipped rather than failing the stream.
fn parse_sse_line(line: &str) -> Option<StreamEvent> {
    let data = line.trim().strip_prefix("data:")?.trim_start();
    if data == "[DONE]" {
        return Some(StreamEvent::Done);
    }
    let chunk: ChatChunk = serde_json::from_str(data).ok()?;
    let text = chunk.choices.into_iter().next()?.delta.content?;
    if text.is_empty() {
        None
    } else {
        Some(StreamEvent::Fragment(text))
    }
}

/// Client for an OpenAI-compatible chat-completions endpoint. Holds the
/// credential and model name resolved once at construction; every call is a
/// fresh, independent request with no session state.
pub struct InferenceClient {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl InferenceClient {
    pub fn new(config: &Config) -> Result<Self, PipelineError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            PipelineError::Configuration(
                "QUARTET_API_KEY not set and no inference.api_key in config.toml".to_string(),
            )
        })?;

        Ok(InferenceClient {
            base_url: config.inference.base_url.clone(),
            model: config.inference.model.clone(),
            api_key,
            client: reqwest::Client::new(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(
        &self,
        messages: &[Message],
        temperature: f32,
        max_tokens: u32,
        stream: bool,
    ) -> Result<reqwest::Response, InferenceError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature,
            max_tokens,
            stream,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Api { status, body });
        }

        Ok(response)
    }

    /// Streams one completion, invoking `callback` with each text fragment
    /// in arrival order, and returns the concatenated result. One call, one
    /// inference request; the stream is not restartable.
    pub async fn generate_streaming<F>(
        &self,
        messages: &[Message],
        temperature: f32,
        max_tokens: u32,
        mut callback: F,
    ) -> Result<String, InferenceError>
    where
        F: FnMut(&str) + Send,
    {
        let response = self.send(messages, temperature, max_tokens, true).await?;
        let mut stream = response.bytes_stream();

        let mut full_text = String::new();
        let mut pending = String::new();

        while let Some(item) = stream.next().await {
            let chunk = item?;
            pending.push_str(&String::from_utf8_lossy(&chunk));

            // Frames can split across network chunks; only consume whole lines.
            while let Some(pos) = pending.find('\n') {
                let line = pending[..pos].to_string();
                pending.drain(..=pos);

                match parse_sse_line(&line) {
                    Some(StreamEvent::Fragment(text)) => {
                        full_text.push_str(&text);
                        callback(&text);
                    }
                    Some(StreamEvent::Done) => return Ok(full_text),
                    None => {}
                }
            }
        }

        Ok(full_text)
    }
}

impl Inference for InferenceClient {
    async fn generate(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
        stream: bool,
    ) -> Result<String, InferenceError> {
        let started = Instant::now();

        let text = if stream {
            self.generate_streaming(&messages, temperature, max_tokens, |_| {})
                .await?
        } else {
            let response = self.send(&messages, temperature, max_tokens, false).await?;
            let parsed: ChatResponse = response.json().await?;
            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| {
                    InferenceError::MalformedResponse(
                        "no completion choice in response".to_string(),
                    )
                })?
        };

        // Advisory telemetry only; not part of the return contract.
        progress::log_with(
            progress::Kind::Inference,
            format!("inference call took {:.2}s", started.elapsed().as_secs_f64()),
        );

        Ok(text)
    }
}
