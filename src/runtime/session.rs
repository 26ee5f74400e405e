use anyhow::Result;
use colored::Colorize;
use futures::FutureExt;
use std::future::Future;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use super::agent_loop::{classify_input, Agent, TurnEvent, UserInput};
use crate::agents::CalendarBackend;
use crate::backend::Supervisor;
use crate::models::Model;

/// Why an interactive session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user typed an exit keyword
    UserExit,
    /// Input was closed
    EndOfInput,
    /// The shutdown signal fired
    Interrupted,
}

/// Run `work` with the backend up, stopping it exactly once however `work` ends.
///
/// A panic inside `work` is held until the backend is stopped, then resumed.
pub async fn with_backend<S, T, Fut>(supervisor: &mut S, grace: Duration, work: Fut) -> Result<T>
where
    S: Supervisor,
    Fut: Future<Output = Result<T>>,
{
    let handle = supervisor.start().await?;

    let outcome = AssertUnwindSafe(work).catch_unwind().await;

    supervisor.stop(handle, grace).await;

    match outcome {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Run an interactive session until exit, end of input or `shutdown`
pub async fn run_session<S, M, C, R, W, F>(
    supervisor: &mut S,
    agent: &mut Agent<M, C>,
    input: R,
    output: &mut W,
    shutdown: F,
    grace: Duration,
) -> Result<SessionEnd>
where
    S: Supervisor,
    M: Model,
    C: CalendarBackend,
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
    F: Future<Output = ()> + Send,
{
    let chat = async {
        let end = tokio::select! {
            end = chat_loop(agent, input, &mut *output) => end?,
            _ = shutdown => {
                info!("Shutdown signal received");
                SessionEnd::Interrupted
            }
        };
        writeln!(output, "\nShutting down...")?;
        Ok::<_, anyhow::Error>(end)
    };

    let end = with_backend(supervisor, grace, chat).await?;
    debug!("Session ended: {:?}", end);
    Ok(end)
}

async fn chat_loop<M, C, R, W>(agent: &mut Agent<M, C>, input: R, output: &mut W) -> Result<SessionEnd>
where
    M: Model,
    C: CalendarBackend,
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    writeln!(output, "Running AI Agent session. Type 'exit' to quit.")?;
    let mut lines = input.lines();

    loop {
        write!(output, "\n{} ", "You:".green().bold())?;
        output.flush()?;

        let Some(line) = lines.next_line().await? else {
            return Ok(SessionEnd::EndOfInput);
        };

        let text = match classify_input(&line) {
            UserInput::Exit => return Ok(SessionEnd::UserExit),
            UserInput::Blank => continue,
            UserInput::Prompt(text) => text,
        };

        let mut console_error = None;
        let outcome = agent
            .run_turn(text, |event| {
                if console_error.is_none() {
                    console_error = present_event(&mut *output, event).err();
                }
            })
            .await;
        if let Some(e) = console_error {
            return Err(e.into());
        }

        writeln!(output, "\n{} {}", "Assistant:".cyan().bold(), outcome.response)?;
    }
}

fn present_event<W: Write>(output: &mut W, event: TurnEvent<'_>) -> std::io::Result<()> {
    match event {
        TurnEvent::UsingTools(_) => {
            writeln!(output, "\n{}", "Assistant is using tools to help you...".dimmed())
        }
        TurnEvent::Executing(call) => {
            let args = serde_json::to_string_pretty(&call.args).unwrap_or_default();
            writeln!(output, "\nExecuting: {}", call.name.yellow())?;
            writeln!(output, "Arguments: {}", args)
        }
        TurnEvent::Finished(result) => writeln!(output, "Result: {}", result.text),
    }
}
