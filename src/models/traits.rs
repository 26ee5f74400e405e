use async_trait::async_trait;

use crate::utils::GatewayError;

/// A language model that turns a prompt into text.
///
/// Implementations own whatever conversation state the endpoint hands back and
/// thread it into the next call themselves; callers only see text or a typed
/// failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Model: Send {
    /// Generate a single, non-streamed completion
    async fn generate(&mut self, prompt: &str, system: &str) -> Result<String, GatewayError>;

    /// Get the name of the model
    fn name(&self) -> &str;
}
