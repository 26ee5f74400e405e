use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Conversation state returned by the inference endpoint.
///
/// Opaque: it is stored and sent back verbatim, never inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationState(Value);

/// Body of `POST /api/generate`
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub system: &'a str,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<&'a ConversationState>,
}

/// Fields of the endpoint's reply that the gateway cares about
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub context: Option<ConversationState>,
}
