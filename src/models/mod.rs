// Gateway module for models - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod ollama;
mod traits;
mod types;

// Public re-exports - the ONLY way to access model functionality
pub use ollama::OllamaModel;
pub use traits::Model;
pub use types::{ConversationState, GenerateRequest, GenerateResponse};

#[cfg(test)]
pub use traits::MockModel;
