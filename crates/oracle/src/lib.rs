//! JSON chat oracle used to pick the best redirect target.
//!
//! [`ChatOracle`] is the seam the matcher depends on; [`HttpOracle`] talks to
//! OpenAI, Azure OpenAI, Anthropic or any OpenAI-compatible server, and
//! [`StubOracle`] answers offline.

use async_trait::async_trait;

mod client;
mod config;
mod error;
mod json;
mod limiter;
mod providers;
mod stub;

pub use client::HttpOracle;
pub use config::{mask_secret, resolve_secret, OracleConfig, ProviderKind};
pub use error::{OracleError, Result};
pub use json::parse_json_object;
pub use stub::StubOracle;

/// Untyped JSON object as returned by a model.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

#[async_trait]
pub trait ChatOracle: Send + Sync {
    /// Sends a system/user prompt pair and returns the reply as a JSON object.
    async fn chat_json(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_output_tokens: u32,
    ) -> Result<JsonObject>;
}

#[async_trait]
impl<T: ChatOracle + ?Sized> ChatOracle for Box<T> {
    async fn chat_json(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_output_tokens: u32,
    ) -> Result<JsonObject> {
        (**self)
            .chat_json(system_prompt, user_prompt, max_output_tokens)
            .await
    }
}
