pub mod agents;
pub mod app;
pub mod backend;
pub mod cli;
pub mod constants;
pub mod models;
pub mod ollama;
pub mod runtime;
pub mod utils;

pub use agents::{Dispatcher, StubCalendar};
pub use app::{load_config, Config};
pub use models::{Model, OllamaModel};
pub use runtime::{Agent, Orchestrator};
pub use utils::{GatewayError, StartupError};
