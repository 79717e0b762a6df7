use anyhow::{Context, Result};
use remap_matcher::{DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MIN_CONFIDENCE, DEFAULT_TEST_LIMIT};
use remap_oracle::OracleConfig;
use remap_search::RankPolicy;
use serde::Deserialize;
use std::path::Path;

/// Contents of the `--config` TOML file.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub ai: OracleConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
}

/// Optional `[matching]` table; command-line flags take precedence.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MatchingConfig {
    pub policy: RankPolicy,
    /// Shortlist size; the policy's own default when unset.
    pub top_k: Option<usize>,
    pub min_confidence: f64,
    pub test_limit: usize,
    pub throttle_ms: u64,
    pub max_output_tokens: u32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            policy: RankPolicy::default(),
            top_k: None,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            test_limit: DEFAULT_TEST_LIMIT,
            throttle_ms: 10,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(raw)?;
        cfg.matching.validate()?;
        Ok(cfg)
    }
}

impl MatchingConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            anyhow::bail!(
                "matching.min_confidence must be within [0, 1], got {}",
                self.min_confidence
            );
        }
        if self.top_k == Some(0) {
            anyhow::bail!("matching.top_k must be at least 1");
        }
        Ok(())
    }
}
