use tracing::debug;

use crate::agents::{
    extract_tool_calls, strip_tool_calls, system_preamble, CalendarBackend, Dispatcher,
    ToolInvocation, ToolResult,
};
use crate::constants::EXIT_KEYWORDS;
use crate::models::Model;
use crate::utils::GatewayError;

/// What a line of user input asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInput<'a> {
    Exit,
    Blank,
    Prompt(&'a str),
}

/// Classify a line typed at the prompt
pub fn classify_input(line: &str) -> UserInput<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        UserInput::Blank
    } else if EXIT_KEYWORDS.iter().any(|k| trimmed.eq_ignore_ascii_case(k)) {
        UserInput::Exit
    } else {
        UserInput::Prompt(trimmed)
    }
}

/// Progress reported while a turn runs tools
#[derive(Debug, Clone, Copy)]
pub enum TurnEvent<'a> {
    UsingTools(usize),
    Executing(&'a ToolInvocation),
    Finished(&'a ToolResult),
}

/// A tool call together with what it produced
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedCall {
    pub invocation: ToolInvocation,
    pub result: ToolResult,
}

/// Everything one turn produced
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Text to present to the user
    pub response: String,
    pub tool_calls: Vec<ExecutedCall>,
    /// Set when a model call failed; `response` then holds its message
    pub error: Option<GatewayError>,
}

impl TurnOutcome {
    fn answered(response: String, tool_calls: Vec<ExecutedCall>) -> Self {
        Self {
            response,
            tool_calls,
            error: None,
        }
    }

    fn failed(error: GatewayError, tool_calls: Vec<ExecutedCall>) -> Self {
        Self {
            response: error.to_string(),
            tool_calls,
            error: Some(error),
        }
    }
}

/// Prompt for the second model call: the question plus every tool result
pub fn follow_up_prompt(user_input: &str, calls: &[ExecutedCall]) -> String {
    let results = calls
        .iter()
        .map(|call| call.result.to_prompt_line())
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\n\nTool results:\n{}", user_input, results)
}

/// Drives one user turn: query, run tools, re-query
pub struct Agent<M, C> {
    model: M,
    dispatcher: Dispatcher<C>,
    system: String,
}

impl<M: Model, C: CalendarBackend> Agent<M, C> {
    pub fn new(model: M, dispatcher: Dispatcher<C>) -> Self {
        Self {
            model,
            dispatcher,
            system: system_preamble().to_string(),
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Run a full turn for `input`. Failures end up in the outcome, never as errors.
    pub async fn run_turn<F>(&mut self, input: &str, mut observe: F) -> TurnOutcome
    where
        F: FnMut(TurnEvent<'_>) + Send,
    {
        let first = match self.model.generate(input, &self.system).await {
            Ok(text) => text,
            Err(e) => return TurnOutcome::failed(e, Vec::new()),
        };

        let invocations = extract_tool_calls(&first);
        if invocations.is_empty() {
            return TurnOutcome::answered(first, Vec::new());
        }

        debug!("Model requested {} tool call(s)", invocations.len());
        observe(TurnEvent::UsingTools(invocations.len()));

        let mut executed = Vec::with_capacity(invocations.len());
        for invocation in invocations {
            observe(TurnEvent::Executing(&invocation));
            let result = self.dispatcher.dispatch(&invocation).await;
            observe(TurnEvent::Finished(&result));
            executed.push(ExecutedCall { invocation, result });
        }

        let prompt = follow_up_prompt(input, &executed);
        match self.model.generate(&prompt, &self.system).await {
            Ok(text) => TurnOutcome::answered(strip_tool_calls(&text), executed),
            Err(e) => TurnOutcome::failed(e, executed),
        }
    }
}
