use serde::{Deserialize, Serialize};

use super::RequestOptions;
use crate::error::{OracleError, Result};

#[derive(Serialize)]
pub(super) struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

pub(super) fn request<'a>(
    model: Option<&'a str>,
    system_prompt: &'a str,
    user_prompt: &'a str,
    options: RequestOptions,
) -> ChatRequest<'a> {
    ChatRequest {
        model,
        temperature: options.temperature,
        messages: [
            ChatMessage {
                role: "system",
                content: system_prompt,
            },
            ChatMessage {
                role: "user",
                content: user_prompt,
            },
        ],
        max_tokens: options.max_tokens,
        response_format: options
            .response_json
            .then_some(ResponseFormat { kind: "json_object" }),
    }
}

pub(super) fn response_text(body: &[u8]) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_slice(body)
        .map_err(|err| OracleError::Response(format!("invalid chat completion payload: {err}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| OracleError::Response("chat completion has no message content".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_choice_content() {
        let body = br#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}}]}"#;
        assert_eq!(response_text(body).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn missing_choices_is_an_error() {
        assert!(matches!(
            response_text(br#"{"choices":[]}"#),
            Err(OracleError::Response(_))
        ));
        assert!(matches!(
            response_text(br#"{"choices":[{"message":{"content":null}}]}"#),
            Err(OracleError::Response(_))
        ));
        assert!(response_text(b"<html>bad gateway</html>").is_err());
    }
}
