use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "calendar-agent")]
#[command(version)]
#[command(about = "A local-model calendar assistant that calls tools over Ollama", long_about = None)]
pub struct Cli {
    /// Ollama model to use (e.g., llama3, mistral)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Ollama endpoint (e.g., http://localhost:11434)
    #[arg(long)]
    pub host: Option<String>,

    /// Don't launch the calendar backend
    #[arg(long)]
    pub no_backend: bool,

    /// Non-interactive prompt to execute
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Output format for non-interactive mode
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, requires = "prompt")]
    pub output_format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Initialize configuration
    Init,
    /// Start a chat session (default)
    Chat,
    /// List the calendar tools offered to the model
    Tools,
    /// Check status of dependencies
    Status,
    /// Show version information
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON structured output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "calendar-agent",
            "-m",
            "mistral",
            "--host",
            "http://gpu-box:11434",
            "--no-backend",
            "-p",
            "what's on today?",
            "--output-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.model.as_deref(), Some("mistral"));
        assert_eq!(cli.host.as_deref(), Some("http://gpu-box:11434"));
        assert!(cli.no_backend);
        assert_eq!(cli.prompt.as_deref(), Some("what's on today?"));
        assert_eq!(cli.output_format, OutputFormat::Json);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_output_format_requires_prompt() {
        assert!(Cli::try_parse_from(["calendar-agent", "--output-format", "json"]).is_err());
    }

    #[test]
    fn test_subcommand() {
        let cli = Cli::try_parse_from(["calendar-agent", "status"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Status));
    }
}
