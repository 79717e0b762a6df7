use crate::config::{resolve_secret, OracleConfig, ProviderKind};
use crate::error::{OracleError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

mod anthropic;
mod openai;

/// Sampling options shared by every provider.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RequestOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub response_json: bool,
}

/// A fully resolved provider endpoint: URL, auth headers and wire shape.
#[derive(Debug, Clone)]
pub(crate) struct Endpoint {
    pub kind: ProviderKind,
    pub url: String,
    pub headers: HeaderMap,
    /// `None` for Azure, where the deployment in the URL selects the model.
    pub model: Option<String>,
}

impl Endpoint {
    pub(crate) fn from_config(cfg: &OracleConfig) -> Result<Self> {
        let model = cfg.model().map(str::to_string);
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let (url, model) = match cfg.provider {
            ProviderKind::OpenAi => {
                let key = resolve_secret(cfg.openai_api_key.as_deref())
                    .ok_or_else(|| config_error("Missing OpenAI API key"))?;
                let model = model.ok_or_else(|| config_error("Missing OpenAI model in config"))?;
                headers.insert(AUTHORIZATION, header_value(&format!("Bearer {key}"))?);
                let base = cfg.openai_base_url.trim_end_matches('/');
                (format!("{base}/chat/completions"), Some(model))
            }
            ProviderKind::Azure => {
                let endpoint = cfg.azure_endpoint.as_deref().map(str::trim);
                let key = resolve_secret(cfg.azure_api_key.as_deref());
                let deployment = cfg.azure_deployment.as_deref().map(str::trim);
                let (Some(endpoint), Some(key), Some(deployment)) = (
                    endpoint.filter(|e| !e.is_empty()),
                    key,
                    deployment.filter(|d| !d.is_empty()),
                ) else {
                    return Err(config_error(
                        "Missing Azure OpenAI settings: endpoint/api_key/deployment",
                    ));
                };
                headers.insert("api-key", header_value(&key)?);
                let url = format!(
                    "{}/openai/deployments/{deployment}/chat/completions?api-version={}",
                    endpoint.trim_end_matches('/'),
                    cfg.azure_api_version
                );
                (url, None)
            }
            ProviderKind::Anthropic => {
                let key = resolve_secret(cfg.anthropic_api_key.as_deref())
                    .ok_or_else(|| config_error("Missing Anthropic API key"))?;
                let model =
                    model.ok_or_else(|| config_error("Missing Anthropic model in config"))?;
                headers.insert("x-api-key", header_value(&key)?);
                headers.insert(
                    "anthropic-version",
                    header_value(&cfg.anthropic_api_version)?,
                );
                (anthropic::MESSAGES_URL.to_string(), Some(model))
            }
            ProviderKind::OpenAiCompatible => {
                let base = cfg
                    .compatible_base_url
                    .as_deref()
                    .map(str::trim)
                    .filter(|b| !b.is_empty())
                    .ok_or_else(|| {
                        config_error("Missing compatible_base_url for OpenAI-compatible provider")
                    })?;
                let model = model.ok_or_else(|| config_error("Missing model in config"))?;
                if let Some(key) = resolve_secret(cfg.compatible_api_key.as_deref()) {
                    headers.insert(AUTHORIZATION, header_value(&format!("Bearer {key}"))?);
                }
                (compatible_url(base), Some(model))
            }
        };

        Ok(Self {
            kind: cfg.provider,
            url,
            headers,
            model,
        })
    }

    pub(crate) fn label(&self) -> &'static str {
        match self.kind {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Azure => "Azure OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::OpenAiCompatible => "Compatible provider",
        }
    }

    /// JSON request body for this provider.
    pub(crate) fn body(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: RequestOptions,
    ) -> Result<serde_json::Value> {
        let value = match self.kind {
            ProviderKind::Anthropic => serde_json::to_value(anthropic::request(
                self.model.as_deref().unwrap_or_default(),
                system_prompt,
                user_prompt,
                options,
            )),
            _ => serde_json::to_value(openai::request(
                self.model.as_deref(),
                system_prompt,
                user_prompt,
                options,
            )),
        };
        value.map_err(|err| OracleError::Other(format!("Failed to encode request: {err}")))
    }

    /// Assistant text from a successful response body.
    pub(crate) fn response_text(&self, body: &[u8]) -> Result<String> {
        match self.kind {
            ProviderKind::Anthropic => anthropic::response_text(body),
            _ => openai::response_text(body),
        }
    }
}

/// Chat-completions URL for an OpenAI-compatible base, with or without `/v1`.
pub(crate) fn compatible_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with("/v1") {
        format!("{base}/chat/completions")
    } else {
        format!("{base}/v1/chat/completions")
    }
}

fn config_error(message: &str) -> OracleError {
    OracleError::Config(message.to_string())
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value.trim())
        .map_err(|_| OracleError::Config("credential contains invalid header characters".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn options() -> RequestOptions {
        RequestOptions {
            temperature: 0.0,
            max_tokens: 400,
            response_json: true,
        }
    }

    #[test]
    fn compatible_url_handles_v1_suffix() {
        assert_eq!(
            compatible_url("https://ai.example.com/v1/"),
            "https://ai.example.com/v1/chat/completions"
        );
        assert_eq!(
            compatible_url("https://ai.example.com/api"),
            "https://ai.example.com/api/v1/chat/completions"
        );
    }

    #[test]
    fn openai_requires_key_and_model() {
        let cfg = OracleConfig {
            model: Some("gpt-4o-mini".into()),
            ..OracleConfig::default()
        };
        let err = Endpoint::from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("Missing OpenAI API key"), "{err}");

        let cfg = OracleConfig {
            openai_api_key: Some("sk-test".into()),
            ..OracleConfig::default()
        };
        let err = Endpoint::from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("model"), "{err}");
    }

    #[test]
    fn openai_endpoint_and_body() {
        let cfg = OracleConfig {
            model: Some("gpt-4o-mini".into()),
            openai_api_key: Some("sk-test".into()),
            ..OracleConfig::default()
        };
        let endpoint = Endpoint::from_config(&cfg).unwrap();
        assert_eq!(endpoint.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(endpoint.headers[AUTHORIZATION], "Bearer sk-test");

        let body = endpoint.body("sys", "user", options()).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user");
        assert_eq!(body["max_tokens"], 400);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn azure_puts_deployment_in_url_and_omits_model() {
        let cfg = OracleConfig {
            provider: ProviderKind::Azure,
            azure_endpoint: Some("https://res.openai.azure.com/".into()),
            azure_api_key: Some("az-key".into()),
            azure_deployment: Some("gpt4".into()),
            ..OracleConfig::default()
        };
        let endpoint = Endpoint::from_config(&cfg).unwrap();
        assert_eq!(
            endpoint.url,
            "https://res.openai.azure.com/openai/deployments/gpt4/chat/completions?api-version=2024-02-15-preview"
        );
        assert_eq!(endpoint.headers["api-key"], "az-key");
        let body = endpoint.body("s", "u", options()).unwrap();
        assert!(body.get("model").is_none());

        let missing = OracleConfig {
            provider: ProviderKind::Azure,
            ..OracleConfig::default()
        };
        assert!(matches!(
            Endpoint::from_config(&missing),
            Err(OracleError::Config(_))
        ));
    }

    #[test]
    fn anthropic_headers_and_system_prompt() {
        let cfg = OracleConfig {
            provider: ProviderKind::Anthropic,
            model: Some("claude-3-5-haiku-latest".into()),
            anthropic_api_key: Some("ant-key".into()),
            ..OracleConfig::default()
        };
        let endpoint = Endpoint::from_config(&cfg).unwrap();
        assert_eq!(endpoint.url, "https://api.anthropic.com/v1/messages");
        assert_eq!(endpoint.headers["x-api-key"], "ant-key");
        assert_eq!(endpoint.headers["anthropic-version"], "2023-06-01");

        let body = endpoint.body("be terse", "match this", options()).unwrap();
        assert_eq!(body["system"], "be terse");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["content"], "match this");
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn compatible_auth_is_optional() {
        let cfg = OracleConfig {
            provider: ProviderKind::OpenAiCompatible,
            model: Some("llama3".into()),
            compatible_base_url: Some("http://localhost:11434".into()),
            ..OracleConfig::default()
        };
        let endpoint = Endpoint::from_config(&cfg).unwrap();
        assert_eq!(endpoint.url, "http://localhost:11434/v1/chat/completions");
        assert!(endpoint.headers.get(AUTHORIZATION).is_none());
    }
}
