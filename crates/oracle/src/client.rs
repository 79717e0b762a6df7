use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::{OracleConfig, ProviderKind};
use crate::error::{OracleError, Result};
use crate::json::parse_json_object;
use crate::limiter::RateLimiter;
use crate::providers::{Endpoint, RequestOptions};
use crate::{ChatOracle, JsonObject};

const CONNECTION_TEST_SYSTEM: &str = "You are a test assistant. Always respond in JSON format.";
const CONNECTION_TEST_USER: &str = r#"Reply with JSON: {"status": "success"}"#;
const CONNECTION_TEST_MAX_TOKENS: u32 = 50;

/// Provider-agnostic JSON chat client with rate limiting and retries.
pub struct HttpOracle {
    client: Client,
    endpoint: Endpoint,
    temperature: f32,
    response_json: bool,
    max_retries: u32,
    retry_base_delay: f64,
    limiter: RateLimiter,
}

impl HttpOracle {
    /// Validates credentials and builds the HTTP client.
    ///
    /// Missing keys, models or endpoints surface here, before any request.
    pub fn from_config(cfg: &OracleConfig) -> Result<Self> {
        let endpoint = Endpoint::from_config(cfg)?;
        if !cfg.retry_base_delay.is_finite() || cfg.retry_base_delay < 0.0 {
            return Err(OracleError::Config(format!(
                "retry_base_delay must be a non-negative number, got {}",
                cfg.retry_base_delay
            )));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_seconds.max(1)))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            temperature: cfg.temperature,
            response_json: cfg.response_json,
            max_retries: cfg.max_retries.max(1),
            retry_base_delay: cfg.retry_base_delay,
            limiter: RateLimiter::per_second(cfg.qps),
        })
    }

    pub fn provider(&self) -> ProviderKind {
        self.endpoint.kind
    }

    pub fn model(&self) -> Option<&str> {
        self.endpoint.model.as_deref()
    }

    pub fn url(&self) -> &str {
        &self.endpoint.url
    }

    /// Sends one small JSON request, without retries.
    pub async fn test_connection(&self) -> Result<()> {
        let reply = self
            .attempt(
                CONNECTION_TEST_SYSTEM,
                CONNECTION_TEST_USER,
                CONNECTION_TEST_MAX_TOKENS,
            )
            .await?;
        log::debug!("Connection test reply: {:?}", reply);
        Ok(())
    }

    async fn attempt(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_output_tokens: u32,
    ) -> Result<JsonObject> {
        let options = RequestOptions {
            temperature: self.temperature,
            max_tokens: max_output_tokens,
            response_json: self.response_json,
        };
        let body = self.endpoint.body(system_prompt, user_prompt, options)?;

        self.limiter.wait().await;
        let resp = self
            .client
            .post(&self.endpoint.url)
            .headers(self.endpoint.headers.clone())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(OracleError::Status {
                provider: self.endpoint.label(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let text = self.endpoint.response_text(&bytes)?;
        parse_json_object(&text)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let secs = self.retry_base_delay.powi(attempt as i32) + 0.05 * f64::from(attempt);
        Duration::from_secs_f64(secs.clamp(0.0, 300.0))
    }
}

#[async_trait]
impl ChatOracle for HttpOracle {
    async fn chat_json(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_output_tokens: u32,
    ) -> Result<JsonObject> {
        let mut last_error = None;
        for attempt in 0..self.max_retries {
            match self
                .attempt(system_prompt, user_prompt, max_output_tokens)
                .await
            {
                Ok(reply) => return Ok(reply),
                Err(err) => {
                    log::warn!(
                        "{} request attempt {}/{} failed: {err}",
                        self.endpoint.label(),
                        attempt + 1,
                        self.max_retries
                    );
                    last_error = Some(err);
                    if attempt + 1 < self.max_retries {
                        tokio::time::sleep(self.backoff(attempt)).await;
                    }
                }
            }
        }

        Err(OracleError::Exhausted {
            attempts: self.max_retries,
            last: Box::new(
                last_error.unwrap_or_else(|| OracleError::Other("no attempts made".into())),
            ),
        })
    }
}
