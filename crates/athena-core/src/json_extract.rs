// ABOUTME: Pulls the JSON object out of free-form LLM text output
// ABOUTME: Prefers fenced ```json blocks, falls back to the outermost brace span

use crate::error::{AthenaError, Result};
use serde::de::DeserializeOwned;

const PREVIEW_CHARS: usize = 300;

/// Return the JSON object embedded in `raw`.
///
/// A fenced code block (```json or bare ```) wins when its body starts with `{`.
/// Otherwise the span from the first `{` to the last `}` is returned.
pub fn extract_json<'a>(raw: &'a str, context: &str) -> Result<&'a str> {
    if let Some(body) = fenced_body(raw) {
        if body.starts_with('{') {
            return Ok(body);
        }
    }

    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(&raw[start..=end]),
        _ => Err(AthenaError::JsonExtraction {
            context: context.to_string(),
            preview: raw.chars().take(PREVIEW_CHARS).collect(),
        }),
    }
}

/// Extract and deserialize agent output.
pub fn parse_agent_json<T: DeserializeOwned>(raw: &str, context: &str) -> Result<T> {
    let json = extract_json(raw, context)?;
    Ok(serde_json::from_str(json)?)
}

fn fenced_body(raw: &str) -> Option<&str> {
    let open = raw.find("```")?;
    let after_fence = &raw[open + 3..];
    let after_lang = after_fence
        .strip_prefix("json")
        .or_else(|| after_fence.strip_prefix("JSON"))
        .unwrap_or(after_fence);
    let close = after_lang.find("```")?;
    Some(after_lang[..close].trim())
}
