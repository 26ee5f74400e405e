// Gateway module for agents - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod calendar;
mod dispatcher;
mod parser;
mod prompt;
mod tools;
mod types;

// Public re-exports - the ONLY way to access agent functionality
pub use calendar::{CalendarBackend, StubCalendar};
pub use dispatcher::Dispatcher;
pub use parser::{extract_tool_calls, parse_tool_call, strip_tool_calls};
pub use prompt::system_preamble;
pub use tools::{render_value, CalendarTool, NewEvent, ToolRequest};
pub use types::{ToolInvocation, ToolResult};
