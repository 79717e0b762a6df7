use anyhow::{Context, Result};
use remap_oracle::{
    mask_secret, resolve_secret, ChatOracle, HttpOracle, OracleConfig, ProviderKind, StubOracle,
};
use std::env;

/// Set to `stub` to answer every row offline.
pub const ORACLE_ENV: &str = "URL_REMAP_ORACLE";

/// The oracle a run talks to, before it is handed to the matcher.
pub enum Backend {
    Stub(StubOracle),
    Http(HttpOracle),
}

impl Backend {
    /// Builds the configured backend; invalid `[ai]` settings fail here.
    pub fn from_config(cfg: &OracleConfig) -> Result<Self> {
        if oracle_is_stub() {
            log::warn!("{ORACLE_ENV}=stub: using the offline stub oracle");
            return Ok(Self::Stub(StubOracle));
        }
        let oracle = HttpOracle::from_config(cfg).context("Invalid [ai] configuration")?;
        Ok(Self::Http(oracle))
    }

    /// Human-readable provider, model, endpoint and masked key.
    pub fn describe(&self, cfg: &OracleConfig) -> Vec<(&'static str, String)> {
        match self {
            Self::Stub(_) => vec![("Provider", "stub".to_string())],
            Self::Http(oracle) => {
                let key = active_api_key(cfg)
                    .map(|k| mask_secret(&k, 4))
                    .unwrap_or_else(|| "not set".to_string());
                vec![
                    ("Provider", oracle.provider().to_string()),
                    ("Model", oracle.model().unwrap_or("-").to_string()),
                    ("Endpoint", oracle.url().to_string()),
                    ("API key", key),
                ]
            }
        }
    }

    pub async fn test_connection(&self) -> Result<()> {
        match self {
            Self::Stub(_) => Ok(()),
            Self::Http(oracle) => Ok(oracle.test_connection().await?),
        }
    }

    pub fn into_oracle(self) -> Box<dyn ChatOracle> {
        match self {
            Self::Stub(oracle) => Box::new(oracle),
            Self::Http(oracle) => Box::new(oracle),
        }
    }
}

fn oracle_is_stub() -> bool {
    env::var(ORACLE_ENV)
        .map(|v| v.eq_ignore_ascii_case("stub"))
        .unwrap_or(false)
}

fn active_api_key(cfg: &OracleConfig) -> Option<String> {
    let raw = match cfg.provider {
        ProviderKind::OpenAi => cfg.openai_api_key.as_deref(),
        ProviderKind::Azure => cfg.azure_api_key.as_deref(),
        ProviderKind::Anthropic => cfg.anthropic_api_key.as_deref(),
        ProviderKind::OpenAiCompatible => cfg.compatible_api_key.as_deref(),
    };
    resolve_secret(raw)
}
