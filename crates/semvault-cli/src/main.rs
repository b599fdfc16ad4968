//! Semvault CLI - inspect and manage stored semantic models
//!
//! # Usage
//!
//! ```bash
//! # Create a local configuration
//! semvault config init
//!
//! # List stored models
//! semvault list
//!
//! # Show one model
//! semvault show Sales --entities
//!
//! # Check for and delete a model
//! semvault exists Sales
//! semvault delete Sales --force
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

/// Semvault - semantic model storage
#[derive(Parser, Debug)]
#[command(name = "semvault")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Vault directory holding the stored models
    #[arg(long, short = 'd', global = true, env = "SEMVAULT_DIR")]
    vault_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

impl GlobalOptions {
    /// Convert global options to config overrides
    pub fn to_config_overrides(&self) -> semvault_config::ConfigOverrides {
        semvault_config::ConfigOverrides {
            vault_dir: self.vault_dir.clone(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the models stored in the vault
    List(commands::list::ListArgs),

    /// Show a stored model
    Show(commands::show::ShowArgs),

    /// Check whether a model is stored
    Exists(commands::exists::ExistsArgs),

    /// Delete a stored model
    Delete(commands::delete::DeleteArgs),

    /// View and manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = if cli.global.quiet {
        Level::ERROR
    } else if cli.global.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::List(args) => commands::list::execute(args, cli.global).await,
        Commands::Show(args) => commands::show::execute(args, cli.global).await,
        Commands::Exists(args) => commands::exists::execute(args, cli.global).await,
        Commands::Delete(args) => commands::delete::execute(args, cli.global).await,
        Commands::Config(cmd) => commands::config::execute(cmd, cli.global).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_show_with_entities() {
        let cli = Cli::try_parse_from(["semvault", "show", "Sales", "--entities"]).unwrap();
        assert!(matches!(cli.command, Commands::Show(_)));
    }

    #[test]
    fn test_parse_global_vault_dir() {
        let cli = Cli::try_parse_from(["semvault", "-d", "/data/vault", "list"]).unwrap();
        assert_eq!(cli.global.vault_dir, Some(PathBuf::from("/data/vault")));
    }
}
