use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::calendar::CalendarBackend;
use super::tools::ToolRequest;
use super::types::{ToolInvocation, ToolResult};
use crate::app::CalendarConfig;
use crate::utils::DispatchError;

/// Runs tool calls against a calendar backend.
///
/// Never fails: unknown tools and backend errors come back as result text.
pub struct Dispatcher<C> {
    backend: C,
    defaults: CalendarConfig,
}

impl<C: CalendarBackend> Dispatcher<C> {
    pub fn new(backend: C, defaults: CalendarConfig) -> Self {
        Self { backend, defaults }
    }

    /// Execute one tool call and tag the result with its name
    pub async fn dispatch(&self, invocation: &ToolInvocation) -> ToolResult {
        ToolResult {
            invocation_name: invocation.name.clone(),
            text: self.execute(&invocation.name, &invocation.args).await,
        }
    }

    /// Execute a named tool, returning human-readable text
    pub async fn execute(&self, name: &str, args: &Map<String, Value>) -> String {
        match self.run(name, args).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Tool call {} failed: {}", name, e);
                e.to_string()
            }
        }
    }

    async fn run(&self, name: &str, args: &Map<String, Value>) -> Result<String, DispatchError> {
        let request = ToolRequest::resolve(name, args, &self.defaults)?;
        debug!("Dispatching {:?}", request);

        let outcome = match &request {
            ToolRequest::ListCalendars => self.backend.list_calendars().await,
            ToolRequest::ListEvents { calendar_id } => self.backend.list_events(calendar_id).await,
            ToolRequest::CreateEvent(event) => self.backend.create_event(event).await,
            ToolRequest::UpdateEvent {
                calendar_id,
                event_id,
                changes,
            } => {
                self.backend
                    .update_event(calendar_id, event_id, changes)
                    .await
            }
            ToolRequest::DeleteEvent {
                calendar_id,
                event_id,
            } => self.backend.delete_event(calendar_id, event_id).await,
        };

        outcome.map_err(|e| DispatchError::Backend {
            tool: request.tool().name().to_string(),
            message: e.to_string(),
        })
    }
}
