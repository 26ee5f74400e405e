/// Ollama integration module - Gateway
mod detector;

pub use detector::{is_installed, list_models};
