use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::{ChatOracle, JsonObject};

/// Offline oracle for dry runs and tests.
///
/// Never names a URL, so the decision engine settles on the top-ranked
/// candidate; confidence is reported as 1.0.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubOracle;

#[async_trait]
impl ChatOracle for StubOracle {
    async fn chat_json(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _max_output_tokens: u32,
    ) -> Result<JsonObject> {
        let mut reply = JsonObject::new();
        reply.insert("best_new_url".into(), Value::String(String::new()));
        reply.insert("confidence".into(), Value::from(1.0));
        reply.insert(
            "rationale".into(),
            Value::String("stub oracle: top-ranked candidate".into()),
        );
        Ok(reply)
    }
}
