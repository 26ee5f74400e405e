use serde_json::{Map, Value};
use std::fmt;

use crate::app::CalendarConfig;
use crate::constants::{UNKNOWN_EVENT_ID, UNKNOWN_TIME, UNTITLED_EVENT};
use crate::utils::DispatchError;

/// The calendar tools the model may call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarTool {
    ListCalendars,
    ListEvents,
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
}

impl CalendarTool {
    pub const ALL: [CalendarTool; 5] = [
        CalendarTool::ListCalendars,
        CalendarTool::ListEvents,
        CalendarTool::CreateEvent,
        CalendarTool::UpdateEvent,
        CalendarTool::DeleteEvent,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    /// Wire name used in tool calls
    pub fn name(self) -> &'static str {
        match self {
            CalendarTool::ListCalendars => "list-calendars",
            CalendarTool::ListEvents => "list-events",
            CalendarTool::CreateEvent => "create-event",
            CalendarTool::UpdateEvent => "update-event",
            CalendarTool::DeleteEvent => "delete-event",
        }
    }

    /// One-line description shown to the model
    pub fn description(self) -> &'static str {
        match self {
            CalendarTool::ListCalendars => "Lists all available calendars",
            CalendarTool::ListEvents => "Lists events from a calendar (requires calendarId)",
            CalendarTool::CreateEvent => {
                "Creates a new event (requires calendarId, summary, start, end)"
            }
            CalendarTool::UpdateEvent => "Updates an event (requires calendarId, eventId)",
            CalendarTool::DeleteEvent => "Deletes an event (requires calendarId, eventId)",
        }
    }
}

impl fmt::Display for CalendarTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fields of an event to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub calendar_id: String,
    pub summary: String,
    pub start: String,
    pub end: String,
}

/// A tool call with its arguments typed and defaults applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    ListCalendars,
    ListEvents {
        calendar_id: String,
    },
    CreateEvent(NewEvent),
    UpdateEvent {
        calendar_id: String,
        event_id: String,
        /// Every other argument, in the order given
        changes: Vec<(String, String)>,
    },
    DeleteEvent {
        calendar_id: String,
        event_id: String,
    },
}

impl ToolRequest {
    /// Resolve a named call against the per-tool defaults
    pub fn resolve(
        name: &str,
        args: &Map<String, Value>,
        defaults: &CalendarConfig,
    ) -> Result<Self, DispatchError> {
        let tool =
            CalendarTool::from_name(name).ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;

        let request = match tool {
            CalendarTool::ListCalendars => ToolRequest::ListCalendars,
            CalendarTool::ListEvents => ToolRequest::ListEvents {
                calendar_id: arg_or(args, "calendarId", &defaults.list_default),
            },
            CalendarTool::CreateEvent => ToolRequest::CreateEvent(NewEvent {
                calendar_id: arg_or(args, "calendarId", &defaults.create_default),
                summary: arg_or(args, "summary", UNTITLED_EVENT),
                start: arg_or(args, "start", UNKNOWN_TIME),
                end: arg_or(args, "end", UNKNOWN_TIME),
            }),
            CalendarTool::UpdateEvent => ToolRequest::UpdateEvent {
                calendar_id: arg_or(args, "calendarId", &defaults.modify_default),
                event_id: arg_or(args, "eventId", UNKNOWN_EVENT_ID),
                changes: args
                    .iter()
                    .filter(|(key, _)| key.as_str() != "calendarId" && key.as_str() != "eventId")
                    .map(|(key, value)| (key.clone(), render_value(value)))
                    .collect(),
            },
            CalendarTool::DeleteEvent => ToolRequest::DeleteEvent {
                calendar_id: arg_or(args, "calendarId", &defaults.modify_default),
                event_id: arg_or(args, "eventId", UNKNOWN_EVENT_ID),
            },
        };

        Ok(request)
    }

    pub fn tool(&self) -> CalendarTool {
        match self {
            ToolRequest::ListCalendars => CalendarTool::ListCalendars,
            ToolRequest::ListEvents { .. } => CalendarTool::ListEvents,
            ToolRequest::CreateEvent(_) => CalendarTool::CreateEvent,
            ToolRequest::UpdateEvent { .. } => CalendarTool::UpdateEvent,
            ToolRequest::DeleteEvent { .. } => CalendarTool::DeleteEvent,
        }
    }

    pub fn calendar_id(&self) -> Option<&str> {
        match self {
            ToolRequest::ListCalendars => None,
            ToolRequest::ListEvents { calendar_id }
            | ToolRequest::UpdateEvent { calendar_id, .. }
            | ToolRequest::DeleteEvent { calendar_id, .. } => Some(calendar_id),
            ToolRequest::CreateEvent(event) => Some(&event.calendar_id),
        }
    }
}

/// An argument as text, or `default` when absent or null
fn arg_or(args: &Map<String, Value>, key: &str, default: &str) -> String {
    match args.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(value) => render_value(value),
    }
}

/// Strings verbatim, anything else as compact JSON
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
