use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use tokio::io::BufReader;
use tracing::warn;

use super::agent_loop::Agent;
use super::non_interactive::{format_result, run_once};
use super::session::{run_session, SessionEnd};
use super::signal::ShutdownSignal;
use crate::{
    agents::{Dispatcher, StubCalendar},
    app::{load_config, load_config_from, Config},
    backend::ProcessSupervisor,
    cli::{handle_command, Cli},
    models::OllamaModel,
};

/// Main runtime orchestrator
pub struct Orchestrator {
    cli: Cli,
    config: Config,
}

impl Orchestrator {
    /// Create a new orchestrator from CLI args
    pub fn new(cli: Cli) -> Result<Self> {
        let config = match &cli.config {
            // an explicit file that fails to load is fatal
            Some(path) => load_config_from(path)?,
            None => match load_config() {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!("Failed to load config: {:#}. Using defaults.", e);
                    Config::default()
                }
            },
        };

        let config = apply_overrides(config, &cli)?;
        Ok(Self { cli, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the orchestrator
    pub async fn run(self) -> Result<()> {
        // Handle subcommands
        if let Some(command) = &self.cli.command {
            if handle_command(command, &self.config).await? {
                return Ok(()); // Command handled, exit
            }
        }

        let model = OllamaModel::from_config(&self.config)?;
        println!(
            "Calendar client initialized with {} model",
            self.config.model.name.green()
        );

        let dispatcher = Dispatcher::new(StubCalendar, self.config.calendar.clone());
        let mut agent = Agent::new(model, dispatcher);
        let mut supervisor = ProcessSupervisor::new(self.config.backend.clone());
        let grace = self.config.backend.shutdown_grace();
        let signal = ShutdownSignal::install();

        if let Some(prompt) = &self.cli.prompt {
            let Some(result) =
                run_once(&mut supervisor, &mut agent, prompt, signal.recv(), grace).await?
            else {
                std::process::exit(130);
            };
            println!("{}", format_result(&result, self.cli.output_format));

            if result.error.is_some() {
                std::process::exit(1);
            }
            return Ok(());
        }

        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        let end = run_session(
            &mut supervisor,
            &mut agent,
            stdin,
            &mut stdout,
            signal.recv(),
            grace,
        )
        .await?;
        stdout.flush()?;

        if end == SessionEnd::Interrupted {
            // the blocking stdin reader would otherwise hold the runtime open
            std::process::exit(130);
        }

        Ok(())
    }
}

/// Fold command-line overrides into the loaded configuration
fn apply_overrides(mut config: Config, cli: &Cli) -> Result<Config> {
    if let Some(model) = &cli.model {
        config.model.name = model.clone();
    }
    if let Some(host) = &cli.host {
        config.ollama.set_endpoint(host)?;
    }
    if cli.no_backend {
        config.backend.enabled = false;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "calendar-agent",
            "--model",
            "mistral",
            "--host",
            "http://gpu-box:11500",
            "--no-backend",
        ]);

        let config = apply_overrides(Config::default(), &cli).unwrap();
        assert_eq!(config.model.name, "mistral");
        assert_eq!(config.ollama.base_url(), "http://gpu-box:11500");
        assert!(!config.backend.enabled);
    }

    #[test]
    fn test_explicit_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("agent.toml");
        std::fs::write(&path, "[model]\nname = \"phi3\"\n").unwrap();

        let cli = Cli::parse_from(["calendar-agent", "-c", path.to_str().unwrap()]);
        let orchestrator = Orchestrator::new(cli).unwrap();
        assert_eq!(orchestrator.config().model.name, "phi3");
        assert!(orchestrator.config().backend.enabled);
    }

    #[test]
    fn test_missing_explicit_config_is_fatal() {
        let cli = Cli::parse_from(["calendar-agent", "-c", "/nonexistent/agent.toml"]);
        assert!(Orchestrator::new(cli).is_err());
    }
}
