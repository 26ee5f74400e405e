use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::future::Future;
use std::time::{Duration, Instant};

use super::agent_loop::Agent;
use super::session::with_backend;
use crate::agents::CalendarBackend;
use crate::backend::Supervisor;
use crate::cli::OutputFormat;
use crate::models::Model;

/// Result of a non-interactive run
#[derive(Debug, Serialize)]
pub struct NonInteractiveResult {
    /// The prompt that was executed
    pub prompt: String,
    /// The final answer, or the gateway error message
    pub response: String,
    /// Tool calls made along the way
    pub tool_calls: Vec<ToolCallReport>,
    /// Gateway error, if the turn hit one
    pub error: Option<String>,
    pub metadata: ExecutionMetadata,
}

#[derive(Debug, Serialize)]
pub struct ToolCallReport {
    pub name: String,
    pub args: Map<String, Value>,
    pub result: String,
}

#[derive(Debug, Serialize)]
pub struct ExecutionMetadata {
    /// Model used
    pub model: String,
    /// Execution time in milliseconds
    pub duration_ms: u128,
}

/// Run a single prompt with the backend up for just that turn.
///
/// Returns `None` when `shutdown` fires first; the backend is stopped either way.
pub async fn run_once<S, M, C, F>(
    supervisor: &mut S,
    agent: &mut Agent<M, C>,
    prompt: &str,
    shutdown: F,
    grace: Duration,
) -> Result<Option<NonInteractiveResult>>
where
    S: Supervisor,
    M: Model,
    C: CalendarBackend,
    F: Future<Output = ()> + Send,
{
    let start_time = Instant::now();

    let turn = async {
        tokio::select! {
            biased;
            _ = shutdown => Ok(None),
            outcome = agent.run_turn(prompt, |_| {}) => Ok(Some(outcome)),
        }
    };
    let Some(outcome) = with_backend(supervisor, grace, turn).await? else {
        return Ok(None);
    };

    Ok(Some(NonInteractiveResult {
        prompt: prompt.to_string(),
        response: outcome.response,
        tool_calls: outcome
            .tool_calls
            .into_iter()
            .map(|call| ToolCallReport {
                name: call.invocation.name,
                args: call.invocation.args,
                result: call.result.text,
            })
            .collect(),
        error: outcome.error.map(|e| e.to_string()),
        metadata: ExecutionMetadata {
            model: agent.model_name().to_string(),
            duration_ms: start_time.elapsed().as_millis(),
        },
    }))
}

/// Format the result according to the output format
pub fn format_result(result: &NonInteractiveResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(result)
            .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize result: {}\"}}", e)),
        OutputFormat::Text => {
            let mut output = String::new();

            if !result.tool_calls.is_empty() {
                output.push_str("--- Tool calls ---\n");
                for call in &result.tool_calls {
                    output.push_str(&format!("[{}] {}\n", call.name, call.result));
                }
                output.push('\n');
            }

            output.push_str(&result.response);
            output
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{Dispatcher, StubCalendar};
    use crate::app::CalendarConfig;
    use crate::backend::{MockSupervisor, SessionHandle};
    use crate::models::MockModel;
    use mockall::Sequence;

    #[tokio::test]
    async fn test_single_turn_with_tools_as_json() {
        let mut model = MockModel::new();
        let mut seq = Sequence::new();
        model
            .expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_: &str, _: &str| {
                Ok("```json\n{\"name\": \"delete-event\", \"args\": {\"eventId\": \"abc\"}}\n```".to_string())
            });
        model
            .expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_: &str, _: &str| Ok("Deleted it.".to_string()));
        model.expect_name().return_const("llama3".to_string());

        let mut supervisor = MockSupervisor::new();
        supervisor
            .expect_start()
            .times(1)
            .returning(|| Ok(SessionHandle::detached()));
        supervisor.expect_stop().times(1).return_const(());

        let mut agent = Agent::new(model, Dispatcher::new(StubCalendar, CalendarConfig::default()));
        let result = run_once(
            &mut supervisor,
            &mut agent,
            "drop abc",
            std::future::pending(),
            Duration::from_millis(10),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(result.response, "Deleted it.");
        assert!(result.error.is_none());
        assert_eq!(result.tool_calls[0].result, "Deleted event: abc");

        let json: Value = serde_json::from_str(&format_result(&result, OutputFormat::Json)).unwrap();
        assert_eq!(json["tool_calls"][0]["name"], "delete-event");
        assert_eq!(json["metadata"]["model"], "llama3");

        let text = format_result(&result, OutputFormat::Text);
        assert!(text.starts_with("--- Tool calls ---\n[delete-event] Deleted event: abc"));
        assert!(text.ends_with("Deleted it."));
    }

    #[tokio::test]
    async fn test_shutdown_during_turn_still_stops_backend() {
        // no expectations: the model must not be asked
        let model = MockModel::new();

        let mut supervisor = MockSupervisor::new();
        supervisor
            .expect_start()
            .times(1)
            .returning(|| Ok(SessionHandle::detached()));
        supervisor.expect_stop().times(1).return_const(());

        let mut agent = Agent::new(model, Dispatcher::new(StubCalendar, CalendarConfig::default()));
        let result = run_once(
            &mut supervisor,
            &mut agent,
            "hello",
            std::future::ready(()),
            Duration::from_millis(10),
        )
        .await
        .unwrap();

        assert!(result.is_none());
    }
}
