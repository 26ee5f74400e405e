/// Runtime orchestrator module - Gateway
mod agent_loop;
mod non_interactive;
mod orchestrator;
mod session;
mod signal;

pub use agent_loop::{
    classify_input, follow_up_prompt, Agent, ExecutedCall, TurnEvent, TurnOutcome, UserInput,
};
pub use non_interactive::{
    format_result, run_once, ExecutionMetadata, NonInteractiveResult, ToolCallReport,
};
pub use orchestrator::Orchestrator;
pub use session::{run_session, with_backend, SessionEnd};
pub use signal::ShutdownSignal;
