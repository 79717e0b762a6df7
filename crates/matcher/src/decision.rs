use remap_oracle::{ChatOracle, JsonObject};
use remap_protocol::MatchResult;
use serde_json::Value;

use crate::prompt::build_prompt;

pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 400;

/// Asks the oracle to pick among a shortlist and keeps its answer honest.
pub struct DecisionEngine<O> {
    oracle: O,
    max_output_tokens: u32,
}

impl<O: ChatOracle> DecisionEngine<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Never fails: oracle errors and empty shortlists become fallback results.
    pub async fn decide(&self, old_url: &str, candidates: Vec<String>) -> MatchResult {
        if candidates.is_empty() {
            return MatchResult::fallback(candidates, "no candidate URLs available");
        }

        let prompt = build_prompt(old_url, &candidates);
        match self
            .oracle
            .chat_json(&prompt.system, &prompt.user, self.max_output_tokens)
            .await
        {
            Ok(reply) => coerce_reply(&reply, candidates),
            Err(err) => {
                log::warn!("Oracle failed for '{old_url}', using top candidate: {err}");
                MatchResult::fallback(candidates, err)
            }
        }
    }
}

/// Typed match from an untyped oracle reply.
///
/// A URL outside `candidates` is replaced by the first candidate.
pub fn coerce_reply(reply: &JsonObject, candidates: Vec<String>) -> MatchResult {
    let mut best_new_url = coerce_url(reply.get("best_new_url"));
    let confidence = coerce_confidence(reply.get("confidence"));
    let rationale = coerce_text(reply.get("rationale"));

    if !candidates.contains(&best_new_url) {
        if !best_new_url.is_empty() {
            log::debug!("Oracle chose '{best_new_url}' outside the shortlist; overriding");
        }
        best_new_url = candidates.first().cloned().unwrap_or_default();
    }

    MatchResult {
        best_new_url,
        confidence,
        rationale,
        candidates,
    }
}

fn coerce_url(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn coerce_confidence(value: Option<&Value>) -> f64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    raw.filter(|c| c.is_finite())
        .map_or(0.0, |c| c.clamp(0.0, 1.0))
}

fn coerce_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn reply(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn shortlist() -> Vec<String> {
        vec!["/a".to_string(), "/b".to_string()]
    }

    #[test]
    fn accepts_offered_url() {
        let result = coerce_reply(
            &reply(json!({"best_new_url": " /b ", "confidence": 0.8, "rationale": " ok "})),
            shortlist(),
        );
        assert_eq!(result.best_new_url, "/b");
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.rationale, "ok");
        assert_eq!(result.candidates, shortlist());
    }

    #[test]
    fn overrides_url_outside_shortlist() {
        let result = coerce_reply(
            &reply(json!({"best_new_url": "/not/offered", "confidence": 0.8})),
            shortlist(),
        );
        assert_eq!(result.best_new_url, "/a");
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.rationale, "");
    }

    #[test]
    fn missing_or_malformed_fields_get_defaults() {
        let result = coerce_reply(&reply(json!({})), shortlist());
        assert_eq!(result.best_new_url, "/a");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.rationale, "");

        let result = coerce_reply(
            &reply(json!({"best_new_url": ["/a"], "confidence": "high", "rationale": 7})),
            shortlist(),
        );
        assert_eq!(result.best_new_url, "/a");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.rationale, "7");
    }

    #[test]
    fn confidence_accepts_numeric_strings_and_is_clamped() {
        let parse = |v: Value| coerce_confidence(Some(&v));
        assert_eq!(parse(json!("0.65")), 0.65);
        assert_eq!(parse(json!(1.7)), 1.0);
        assert_eq!(parse(json!(-3)), 0.0);
        assert_eq!(parse(json!(null)), 0.0);
        assert_eq!(parse(json!(true)), 0.0);
        assert_eq!(coerce_confidence(None), 0.0);
    }
}
