use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    BACKEND_SETTLE_DELAY_SECS, BACKEND_SHUTDOWN_GRACE_SECS, BACKEND_STARTUP_TIMEOUT_SECS,
    CREATE_DEFAULT_CALENDAR, DEFAULT_BACKEND_COMMAND, DEFAULT_BACKEND_DIR, DEFAULT_MODEL,
    DEFAULT_OLLAMA_HOST, DEFAULT_OLLAMA_PORT, HTTP_REQUEST_TIMEOUT_SECS, LIST_DEFAULT_CALENDAR,
    MODIFY_DEFAULT_CALENDAR,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model selection
    #[serde(default)]
    pub model: ModelSettings,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Calendar backend process
    #[serde(default)]
    pub backend: BackendConfig,

    /// Calendar tool defaults
    #[serde(default)]
    pub calendar: CalendarConfig,
}

/// Model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Model name as known to Ollama
    pub name: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Ollama configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    pub host: String,
    /// Ollama server port
    pub port: u16,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OLLAMA_HOST.to_string(),
            port: DEFAULT_OLLAMA_PORT,
            timeout_secs: HTTP_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl OllamaConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Point at another server. Accepts `host`, `host:port` or `http://host:port`.
    pub fn set_endpoint(&mut self, endpoint: &str) -> Result<()> {
        let with_scheme = if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("http://{}", endpoint)
        };

        let url = reqwest::Url::parse(&with_scheme)
            .with_context(|| format!("Invalid Ollama endpoint: {}", endpoint))?;
        if url.scheme() != "http" {
            anyhow::bail!("Unsupported scheme for Ollama endpoint: {}", url.scheme());
        }

        self.host = url
            .host_str()
            .with_context(|| format!("Ollama endpoint has no host: {}", endpoint))?
            .to_string();
        self.port = url.port().unwrap_or(DEFAULT_OLLAMA_PORT);
        Ok(())
    }
}

/// Calendar backend process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Launch the backend at all
    pub enabled: bool,
    /// Program and arguments
    pub command: Vec<String>,
    /// Directory the command runs in
    pub working_dir: PathBuf,
    /// Fallback wait when no readiness probe is configured
    pub settle_delay_secs: u64,
    /// Line of backend output that signals readiness
    pub ready_log_pattern: Option<String>,
    /// URL that answers 2xx once the backend is ready
    pub health_url: Option<String>,
    /// Upper bound on waiting for a probe
    pub startup_timeout_secs: u64,
    /// How long to wait for a graceful exit before force-killing
    pub shutdown_grace_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: DEFAULT_BACKEND_COMMAND.iter().map(|s| s.to_string()).collect(),
            working_dir: PathBuf::from(DEFAULT_BACKEND_DIR),
            settle_delay_secs: BACKEND_SETTLE_DELAY_SECS,
            ready_log_pattern: None,
            health_url: None,
            startup_timeout_secs: BACKEND_STARTUP_TIMEOUT_SECS,
            shutdown_grace_secs: BACKEND_SHUTDOWN_GRACE_SECS,
        }
    }
}

impl BackendConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// Default calendar identifiers applied when a tool call omits `calendarId`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Used by list-events
    pub list_default: String,
    /// Used by create-event
    pub create_default: String,
    /// Used by update-event and delete-event
    pub modify_default: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            list_default: LIST_DEFAULT_CALENDAR.to_string(),
            create_default: CREATE_DEFAULT_CALENDAR.to_string(),
            modify_default: MODIFY_DEFAULT_CALENDAR.to_string(),
        }
    }
}

/// Load configuration from multiple sources
pub fn load_config() -> Result<Config> {
    let config_dir = get_config_dir()?;
    let global_config = config_dir.join("config.toml");
    let local_config = PathBuf::from(".calendar-agent/config.toml");

    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if global_config.exists() {
        figment = figment.merge(Toml::file(&global_config));
    }

    if local_config.exists() {
        figment = figment.merge(Toml::file(&local_config));
    }

    extract(figment)
}

/// Load configuration from an explicit file, still honouring the environment
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Config file not found: {}", path.display());
    }

    let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(path));
    extract(figment)
}

fn extract(figment: Figment) -> Result<Config> {
    // CALENDAR_AGENT_OLLAMA__PORT=11500 -> ollama.port
    figment
        .merge(Env::prefixed("CALENDAR_AGENT_").split("__"))
        .extract()
        .context("Failed to load configuration")
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "calendar-agent") {
        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;
        Ok(config_dir.to_path_buf())
    } else {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        let config_dir = PathBuf::from(home).join(".config").join("calendar-agent");
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = if let Some(p) = path {
        p
    } else {
        get_config_dir()?.join("config.toml")
    };

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist
pub fn init_config() -> Result<PathBuf> {
    let config_file = get_config_dir()?.join("config.toml");

    if !config_file.exists() {
        save_config(&Config::default(), Some(config_file.clone()))?;
        println!("Created default configuration at: {}", config_file.display());
    } else {
        println!("Configuration already exists at: {}", config_file.display());
    }

    Ok(config_file)
}
