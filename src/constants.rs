/// Constants module to avoid magic numbers in the codebase

// Network Configuration
pub const DEFAULT_OLLAMA_HOST: &str = "localhost";
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;
pub const OLLAMA_GENERATE_PATH: &str = "/api/generate";
pub const OLLAMA_TAGS_PATH: &str = "/api/tags";

// Model Configuration
pub const DEFAULT_MODEL: &str = "llama3";

// Timeouts
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const HEALTH_PROBE_TIMEOUT_MS: u64 = 500;
pub const HEALTH_PROBE_INTERVAL_MS: u64 = 500;
pub const BACKEND_SETTLE_DELAY_SECS: u64 = 2;
pub const BACKEND_STARTUP_TIMEOUT_SECS: u64 = 30;
pub const BACKEND_SHUTDOWN_GRACE_SECS: u64 = 5;

// Calendar backend process
pub const DEFAULT_BACKEND_COMMAND: &[&str] = &["npm", "start"];
pub const DEFAULT_BACKEND_DIR: &str = "./google-calendar-mcp";

// Default calendar identifiers, per tool family
pub const LIST_DEFAULT_CALENDAR: &str = "primary";
pub const CREATE_DEFAULT_CALENDAR: &str = "owner@example.com";
pub const MODIFY_DEFAULT_CALENDAR: &str = "primary";

// Tool argument placeholders
pub const UNTITLED_EVENT: &str = "Untitled Event";
pub const UNKNOWN_TIME: &str = "Unknown time";
pub const UNKNOWN_EVENT_ID: &str = "unknown";

// Session control
pub const EXIT_KEYWORDS: &[&str] = &["exit", "quit", "bye"];

// Log preview length for malformed payloads
pub const MALFORMED_PREVIEW_CHARS: usize = 100;
