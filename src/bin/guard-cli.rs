use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use stake_guard::config::ConfigManager;

#[derive(Parser)]
#[command(name = "guard-cli")]
#[command(about = "Operator CLI for stake-guard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate environment configuration and print the security report
    Validate {
        /// Optional TOML defaults file merged below the environment
        #[arg(long)]
        defaults: Option<PathBuf>,
    },
    /// Print the full configuration with secrets redacted
    ShowConfig {
        /// Optional TOML defaults file merged below the environment
        #[arg(long)]
        defaults: Option<PathBuf>,
    },
    /// One-shot reachability probe of an endpoint
    Probe {
        url: String,

        #[arg(long, default_value_t = 5)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { defaults } => {
            let manager = match load(defaults.as_deref()) {
                Ok(manager) => manager,
                Err(error) => {
                    eprintln!("Configuration rejected: {error}");
                    std::process::exit(1);
                }
            };
            let report = manager.validate_security();
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_valid {
                std::process::exit(1);
            }
        }
        Commands::ShowConfig { defaults } => {
            let manager = match load(defaults.as_deref()) {
                Ok(manager) => manager,
                Err(error) => {
                    eprintln!("Configuration rejected: {error}");
                    std::process::exit(1);
                }
            };
            println!("{}", serde_json::to_string_pretty(&manager.all_redacted())?);
        }
        Commands::Probe { url, timeout_secs } => {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()?;
            match client.get(&url).send().await {
                Ok(response) => println!("{} -> {}", url, response.status()),
                Err(error) => {
                    eprintln!("{url} unreachable: {error}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn load(defaults: Option<&std::path::Path>) -> Result<ConfigManager, stake_guard::config::ConfigError> {
    match defaults {
        Some(path) => ConfigManager::from_file_and_env(path),
        None => ConfigManager::from_env(),
    }
}
