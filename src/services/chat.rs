use crate::{
    config::{github::GitHubConfig, hackathon, openai::OpenAiConfig},
    error::{AppError, AppResult},
};
use axum::body::Bytes;
use futures_util::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use utoipa::ToSchema;

/// Only the most recent messages are forwarded.
pub const MAX_MESSAGES: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

pub type DeltaStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// Reject empty conversations and unknown roles, keep the last [`MAX_MESSAGES`].
pub fn prepare_messages(messages: Option<Vec<ChatMessage>>) -> AppResult<Vec<ChatMessage>> {
    let mut messages = match messages {
        Some(m) if !m.is_empty() => m,
        _ => return Err(AppError::Validation("Messages array is required".to_string())),
    };

    if let Some(bad) = messages
        .iter()
        .find(|m| m.role != "user" && m.role != "assistant")
    {
        return Err(AppError::Validation(format!(
            "Invalid message role: {}",
            bad.role
        )));
    }

    if messages.len() > MAX_MESSAGES {
        messages.drain(..messages.len() - MAX_MESSAGES);
    }
    Ok(messages)
}

pub fn system_prompt(github: &GitHubConfig) -> String {
    let repo_url = format!("https://github.com/{}", github.repository());

    let prizes = hackathon::PRIZES
        .iter()
        .map(|(place, amount)| format!("- **{place}**: {amount}"))
        .collect::<Vec<_>>()
        .join("\n");
    let steps = hackathon::HOW_TO_STEPS
        .iter()
        .enumerate()
        .map(|(i, (title, text))| format!("{}. {title}: {text}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    let faq = hackathon::FAQ
        .iter()
        .map(|(q, a)| format!("Q: {q}\nA: {a}\n\n"))
        .collect::<String>();

    format!(
        "You are the official AI assistant for the {name}. \
         You help participants with questions about the hackathon.\n\n\
         ## Hackathon Details\n\
         - **Name**: {name}\n\
         - **Tagline**: {tagline}\n\
         - **Description**: {description}\n\
         - **Start Date**: {start}\n\
         - **Submission Deadline**: {deadline}\n\
         - **GitHub Repository**: {repo_url}\n\
         - **Submission Method**: Create a GitHub Issue with the \"{label}\" label\n\n\
         ## Prizes\n{prizes}\n\n\
         ## Project Categories\n{categories}\n\n\
         ## How to Participate\n{steps}\n\n\
         ## Frequently Asked Questions\n{faq}\
         ## Guidelines\n\
         - Answer questions based ONLY on the information provided above.\n\
         - If someone asks about something not covered here, say you don't have that \
         information and suggest they check the hackathon website or GitHub repository.\n\
         - Be concise and friendly.\n\
         - When relevant, link to the GitHub repository: {repo_url}\n\
         - Do not make up information about judges or details not listed above.",
        name = hackathon::NAME,
        tagline = hackathon::TAGLINE,
        description = hackathon::DESCRIPTION,
        start = hackathon::START_DATE,
        deadline = hackathon::DEADLINE,
        label = github.submission_label,
        categories = hackathon::PROJECT_CATEGORIES.join(", "),
    )
}

#[derive(Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    content: Option<String>,
}

/// Incremental decoder for a chat-completions event stream.
///
/// Input arrives in arbitrary byte chunks; only complete lines are decoded,
/// so at most one partial line is held at a time.
#[derive(Debug, Default)]
pub struct SseDeltaDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDeltaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, get back the text deltas completed by them.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut deltas = Vec::new();
        if self.done {
            return deltas;
        }

        self.buffer.extend_from_slice(chunk);
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(delta) = self.decode_line(&line) {
                deltas.push(delta);
            }
            if self.done {
                self.buffer.clear();
                break;
            }
        }
        deltas
    }

    /// Decode whatever is left once the upstream closes.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let delta = if self.done { None } else { self.decode_line(&rest) };
        self.done = true;
        delta
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    fn decode_line(&mut self, line: &[u8]) -> Option<String> {
        let line = std::str::from_utf8(line).ok()?;
        let data = line
            .trim_end_matches(['\r', '\n'])
            .strip_prefix("data:")?
            .trim_start();

        if data == "[DONE]" {
            self.done = true;
            return None;
        }

        match serde_json::from_str::<CompletionChunk>(data) {
            Ok(chunk) => chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .filter(|content| !content.is_empty()),
            Err(e) => {
                tracing::warn!("skipping malformed completion chunk: {}", e);
                None
            }
        }
    }
}

#[derive(Serialize)]
struct UpstreamMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct UpstreamRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: Vec<UpstreamMessage<'a>>,
}

/// Forwards conversations to the model provider and relays the answer.
#[derive(Clone)]
pub struct ChatRelay {
    http: reqwest::Client,
    config: Arc<OpenAiConfig>,
    system_prompt: Arc<str>,
}

impl ChatRelay {
    pub fn new(config: OpenAiConfig, github: &GitHubConfig) -> anyhow::Result<Self> {
        // No overall timeout: answers stream for as long as the model writes.
        let http = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            system_prompt: system_prompt(github).into(),
            config: Arc::new(config),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Start a completion and return its text deltas as a byte stream.
    ///
    /// Dropping the stream drops the upstream response, which stops reading.
    pub async fn stream(&self, messages: Vec<ChatMessage>) -> AppResult<DeltaStream> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(AppError::ServiceUnavailable(
                "Chat assistant is not configured".to_string(),
            ));
        };

        let mut upstream_messages = Vec::with_capacity(messages.len() + 1);
        upstream_messages.push(UpstreamMessage {
            role: "system",
            content: &self.system_prompt,
        });
        upstream_messages.extend(messages.iter().map(|m| UpstreamMessage {
            role: &m.role,
            content: &m.content,
        }));

        let body = UpstreamRequest {
            model: &self.config.model,
            stream: true,
            messages: upstream_messages,
        };

        let request = self
            .http
            .post(format!("{}/chat/completions", self.config.api_url))
            .bearer_auth(api_key)
            .json(&body)
            .send();

        let response = tokio::time::timeout(self.config.timeout, request)
            .await
            .map_err(|_| AppError::Upstream("Chat provider timed out".to_string()))?
            .map_err(|e| AppError::Upstream(format!("Chat request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, detail = %detail, "chat provider rejected request");
            return Err(AppError::Upstream(format!(
                "Chat provider returned {status}"
            )));
        }

        Ok(relay_deltas(response.bytes_stream()))
    }
}

/// Turn an upstream event stream into plain text chunks.
pub fn relay_deltas<S, E>(upstream: S) -> DeltaStream
where
    S: futures_util::Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = (Box::pin(upstream), SseDeltaDecoder::new(), VecDeque::<String>::new());

    stream::unfold(state, |(mut upstream, mut decoder, mut pending)| async move {
        loop {
            if let Some(text) = pending.pop_front() {
                return Some((Ok(Bytes::from(text)), (upstream, decoder, pending)));
            }
            if decoder.is_done() {
                return None;
            }
            match upstream.next().await {
                Some(Ok(chunk)) => pending.extend(decoder.push(&chunk)),
                Some(Err(e)) => {
                    tracing::warn!("chat upstream stream failed: {}", e);
                    return None;
                }
                None => pending.extend(decoder.finish()),
            }
        }
    })
    .boxed()
}
