use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";
pub const DEFAULT_ANTHROPIC_API_VERSION: &str = "2023-06-01";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(try_from = "String")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Azure,
    Anthropic,
    /// Any server speaking the OpenAI chat-completions protocol.
    OpenAiCompatible,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Azure => "azure",
            Self::Anthropic => "anthropic",
            Self::OpenAiCompatible => "openai_compatible",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "azure" => Ok(Self::Azure),
            "anthropic" => Ok(Self::Anthropic),
            "openai_compatible" | "compatible" | "local" | "liara" => Ok(Self::OpenAiCompatible),
            other => Err(format!("Unsupported provider: {other}")),
        }
    }
}

impl TryFrom<String> for ProviderKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Provider selection, credentials and transport policy (`[ai]` table).
///
/// Secret fields accept `env:NAME` to read the value from the environment.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OracleConfig {
    pub provider: ProviderKind,
    pub model: Option<String>,
    pub temperature: f32,
    /// Ask chat-completions providers for a JSON object response.
    pub response_json: bool,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_base_delay: f64,
    /// Maximum requests per second; zero or less disables spacing.
    pub qps: f64,

    pub openai_api_key: Option<String>,
    pub openai_base_url: String,

    pub azure_endpoint: Option<String>,
    pub azure_api_key: Option<String>,
    pub azure_api_version: String,
    pub azure_deployment: Option<String>,

    pub anthropic_api_key: Option<String>,
    pub anthropic_api_version: String,

    pub compatible_base_url: Option<String>,
    pub compatible_api_key: Option<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: None,
            temperature: 0.0,
            response_json: true,
            timeout_seconds: 60,
            max_retries: 3,
            retry_base_delay: 1.5,
            qps: 1.0,
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            azure_endpoint: None,
            azure_api_key: None,
            azure_api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            azure_deployment: None,
            anthropic_api_key: None,
            anthropic_api_version: DEFAULT_ANTHROPIC_API_VERSION.to_string(),
            compatible_base_url: None,
            compatible_api_key: None,
        }
    }
}

impl OracleConfig {
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}

/// Resolves `env:NAME` references; empty values count as unset.
pub fn resolve_secret(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    match value.strip_prefix("env:") {
        Some(name) => std::env::var(name.trim()).ok().filter(|v| !v.is_empty()),
        None => Some(value.to_string()),
    }
}

/// Masks all but the last `visible` characters of a secret for display.
pub fn mask_secret(secret: &str, visible: usize) -> String {
    let total = secret.chars().count();
    let hidden = total.saturating_sub(visible);
    let tail: String = secret.chars().skip(hidden).collect();
    format!("{}{}", "*".repeat(hidden), tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn provider_aliases() {
        assert_eq!("OpenAI".parse::<ProviderKind>(), Ok(ProviderKind::OpenAi));
        assert_eq!("liara".parse::<ProviderKind>(), Ok(ProviderKind::OpenAiCompatible));
        assert_eq!("local".parse::<ProviderKind>(), Ok(ProviderKind::OpenAiCompatible));
        assert!("cohere".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg: OracleConfig =
            serde_json::from_str(r#"{"provider":"anthropic","model":" claude "}"#).unwrap();
        assert_eq!(cfg.provider, ProviderKind::Anthropic);
        assert_eq!(cfg.model(), Some("claude"));
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.anthropic_api_version, DEFAULT_ANTHROPIC_API_VERSION);
        assert!(cfg.response_json);
    }

    #[test]
    fn unknown_provider_is_a_parse_error() {
        let err = serde_json::from_str::<OracleConfig>(r#"{"provider":"nope"}"#).unwrap_err();
        assert!(err.to_string().contains("Unsupported provider"), "{err}");
    }

    #[test]
    fn secrets_resolve_from_environment() {
        std::env::set_var("REMAP_ORACLE_TEST_KEY", "sk-from-env");
        assert_eq!(
            resolve_secret(Some("env:REMAP_ORACLE_TEST_KEY")),
            Some("sk-from-env".to_string())
        );
        assert_eq!(resolve_secret(Some("env:REMAP_ORACLE_MISSING_KEY")), None);
        assert_eq!(resolve_secret(Some("sk-inline")), Some("sk-inline".to_string()));
        assert_eq!(resolve_secret(Some("  ")), None);
        assert_eq!(resolve_secret(None), None);
    }

    #[test]
    fn masks_all_but_tail() {
        assert_eq!(mask_secret("abcdef", 2), "****ef");
        assert_eq!(mask_secret("ab", 10), "ab");
    }
}
