use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tool call the model embedded in its reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Tool name, never empty
    pub name: String,
    /// Arguments in the order the model wrote them
    pub args: Map<String, Value>,
}

/// Text produced by running one tool call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub invocation_name: String,
    pub text: String,
}

impl ToolResult {
    /// Line fed back to the model in the follow-up prompt
    pub fn to_prompt_line(&self) -> String {
        format!("Result of {}: {}", self.invocation_name, self.text)
    }
}
