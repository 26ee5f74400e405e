use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use super::types::ToolInvocation;
use crate::utils::ExtractionError;

/// A fenced block, optionally tagged `json`, holding one JSON object.
/// Lazy so that several blocks in one reply are matched separately.
static TOOL_CALL_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("tool-call pattern is valid")
});

/// Parse tool calls from model output, in document order.
///
/// Blocks that are not valid JSON, or that lack `name`/`args`, are skipped.
pub fn extract_tool_calls(text: &str) -> Vec<ToolInvocation> {
    TOOL_CALL_BLOCK
        .captures_iter(text)
        .filter_map(|captures| {
            let block = captures.get(1)?.as_str();
            match parse_tool_call(block) {
                Ok(invocation) => Some(invocation),
                Err(e) => {
                    warn!("Failed to parse tool call ({}): {}", e, block);
                    None
                }
            }
        })
        .collect()
}

/// Parse a single JSON object into a tool call
pub fn parse_tool_call(block: &str) -> Result<ToolInvocation, ExtractionError> {
    let value: Value = serde_json::from_str(block)?;
    let Value::Object(mut object) = value else {
        return Err(ExtractionError::NotAnObject);
    };

    let name = match object.remove("name") {
        Some(Value::String(name)) if !name.is_empty() => name,
        Some(_) => return Err(ExtractionError::InvalidField("name")),
        None => return Err(ExtractionError::MissingField("name")),
    };

    let args = match object.remove("args") {
        Some(Value::Object(args)) => args,
        Some(_) => return Err(ExtractionError::InvalidField("args")),
        None => return Err(ExtractionError::MissingField("args")),
    };

    Ok(ToolInvocation { name, args })
}

/// Remove any tool-call blocks the model echoed into its final answer
pub fn strip_tool_calls(text: &str) -> String {
    TOOL_CALL_BLOCK.replace_all(text, "").trim().to_string()
}
