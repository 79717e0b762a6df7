use serde::{Deserialize, Serialize};

use super::RequestOptions;
use crate::error::{OracleError, Result};

pub(super) const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

#[derive(Serialize)]
pub(super) struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [AnthropicMessage<'a>; 1],
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

pub(super) fn request<'a>(
    model: &'a str,
    system_prompt: &'a str,
    user_prompt: &'a str,
    options: RequestOptions,
) -> AnthropicRequest<'a> {
    AnthropicRequest {
        model,
        max_tokens: options.max_tokens,
        temperature: options.temperature,
        system: system_prompt,
        messages: [AnthropicMessage {
            role: "user",
            content: user_prompt,
        }],
    }
}

/// Concatenated text blocks of a messages response.
pub(super) fn response_text(body: &[u8]) -> Result<String> {
    let parsed: AnthropicResponse = serde_json::from_slice(body)
        .map_err(|err| OracleError::Response(format!("invalid Anthropic payload: {err}")))?;
    let text: String = parsed
        .content
        .into_iter()
        .filter_map(|block| match block {
            AnthropicResponseBlock::Text { text } => Some(text),
            AnthropicResponseBlock::Other => None,
        })
        .collect();
    if text.is_empty() {
        return Err(OracleError::Response(
            "Anthropic response missing text content".into(),
        ));
    }
    Ok(text)
}
