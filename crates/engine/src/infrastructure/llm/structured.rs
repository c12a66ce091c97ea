//! Structured completion without a live provider's native JSON mode.
//!
//! Realizes SPEC_FULL.md §9's "Structured completion becomes
//! `(schema_text, parser) -> value`": render format instructions into the
//! prompt, call `complete` with `json_mode: true`, then run the tolerant
//! extractor (C3) and deserialize.

use serde::de::DeserializeOwned;

use super::port::{CompletionOptions, LlmCallError, LlmPort, LlmStructureError};
use crate::infrastructure::json_extract::extract_and_deserialize;

/// A human-readable "return only JSON matching this shape" instruction
/// block, generated from a plain description of the target type's fields
/// rather than introspected at runtime (SPEC_FULL.md §9's "Dynamic schema
/// from validated shape").
pub fn format_instructions(shape_description: &str) -> String {
    format!(
        "Respond with a single JSON value and nothing else -- no prose, no \
         markdown fences. The JSON must have this shape:\n{shape_description}"
    )
}

/// `complete_structured`: calls `complete` in JSON mode with format
/// instructions appended to the user prompt, then extracts and
/// deserializes the result into `T`.
pub async fn complete_structured<T: DeserializeOwned>(
    llm: &dyn LlmPort,
    system_prompt: &str,
    user_prompt: &str,
    shape_description: &str,
) -> Result<T, LlmStructureError> {
    let prompt = format!("{user_prompt}\n\n{}", format_instructions(shape_description));
    let text = llm
        .complete(
            system_prompt,
            &prompt,
            CompletionOptions {
                json_mode: true,
                ..Default::default()
            },
        )
        .await
        .map_err(LlmCallError::from)?;
    extract_and_deserialize(&text).map_err(|e| LlmStructureError::Unparseable(e.preview))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::Deserialize;

    struct EchoLlm(&'static str);

    #[async_trait]
    impl LlmPort for EchoLlm {
        async fn complete(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _options: CompletionOptions,
        ) -> Result<String, LlmCallError> {
            Ok(self.0.to_string())
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Thing {
        name: String,
    }

    #[tokio::test]
    async fn parses_structured_response() {
        let llm = EchoLlm("{\"name\": \"Keeper\"}");
        let result: Thing = complete_structured(&llm, "sys", "user", "{name: string}")
            .await
            .unwrap();
        assert_eq!(result, Thing { name: "Keeper".to_string() });
    }

    #[tokio::test]
    async fn reports_unparseable_on_garbage() {
        let llm = EchoLlm("not json at all");
        let result: Result<Thing, _> = complete_structured(&llm, "sys", "user", "{name: string}").await;
        assert!(matches!(result, Err(LlmStructureError::Unparseable(_))));
    }
}
