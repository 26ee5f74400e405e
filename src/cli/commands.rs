use anyhow::Result;
use colored::Colorize;

use crate::{
    agents::CalendarTool,
    app::{get_config_dir, init_config, Config},
    ollama::{is_installed as is_ollama_installed, list_models as get_ollama_models},
};

use super::Commands;

/// Handle CLI subcommands. Returns `true` when the command finished the run.
pub async fn handle_command(command: &Commands, config: &Config) -> Result<bool> {
    match command {
        Commands::Init => {
            println!("Initializing calendar-agent configuration...");
            init_config()?;
            println!("Configuration initialized successfully!");
            Ok(true)
        }
        Commands::Tools => {
            show_tools();
            Ok(true)
        }
        Commands::Version => {
            show_version();
            Ok(true)
        }
        Commands::Status => {
            show_status(config).await?;
            Ok(true)
        }
        Commands::Chat => Ok(false), // Continue to chat session
    }
}

/// Print the tools offered to the model
pub fn show_tools() {
    println!("Calendar tools:");
    for tool in CalendarTool::ALL {
        println!("  • {} - {}", tool.name().green(), tool.description());
    }
}

/// Show version information
pub fn show_version() {
    println!("calendar-agent v{}", env!("CARGO_PKG_VERSION"));
    println!("   A local-model calendar assistant");
}

/// Show status of all dependencies
async fn show_status(config: &Config) -> Result<()> {
    println!("calendar-agent Status:");
    println!();

    // Check Ollama
    let base_url = config.ollama.base_url();
    if !is_ollama_installed() {
        println!("  [WARNING] Ollama: Not installed locally");
    }
    match get_ollama_models(&base_url).await {
        Ok(models) if models.is_empty() => {
            println!("  [WARNING] Ollama: Running at {} (no models)", base_url);
        }
        Ok(models) => {
            println!(
                "  [OK] Ollama: Running at {} ({} models installed)",
                base_url,
                models.len()
            );
            for model in models.iter().take(3) {
                println!("      • {}", model);
            }
            if models.len() > 3 {
                println!("      ... and {} more", models.len() - 3);
            }
            if !models.iter().any(|m| model_matches(m, &config.model.name)) {
                println!(
                    "  [WARNING] Model '{}' not pulled (try: ollama pull {})",
                    config.model.name, config.model.name
                );
            }
        }
        Err(_) => println!("  [ERROR] Ollama: Not reachable at {}", base_url),
    }

    // Check calendar backend
    let backend = &config.backend;
    if !backend.enabled {
        println!("  [OK] Calendar backend: Disabled");
    } else {
        match backend.command.first() {
            Some(program) if which::which(program).is_ok() => {
                println!("  [OK] Calendar backend: {}", backend.command.join(" "));
            }
            Some(program) => println!("  [ERROR] Calendar backend: '{}' not found", program),
            None => println!("  [ERROR] Calendar backend: No command configured"),
        }
        if backend.working_dir.is_dir() {
            println!("      in {}", backend.working_dir.display());
        } else {
            println!(
                "  [ERROR] Backend directory missing: {}",
                backend.working_dir.display()
            );
        }
    }

    // Check configuration
    let config_path = get_config_dir()?.join("config.toml");
    if config_path.exists() {
        println!("  [OK] Configuration: {}", config_path.display());
    } else {
        println!("  [WARNING] Configuration: Not found (using defaults)");
    }

    println!();
    Ok(())
}

/// `llama3` matches `llama3:latest`
fn model_matches(installed: &str, wanted: &str) -> bool {
    installed == wanted || installed.split(':').next() == Some(wanted)
}
