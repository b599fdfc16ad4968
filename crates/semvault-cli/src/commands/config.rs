//! Config command - view and initialize configuration.

use anyhow::{Context, Result};
use clap::Subcommand;

use semvault_config::ConfigLoader;

use super::load_config;
use crate::GlobalOptions;

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Create a local `.semvault/config.toml` with defaults
    Init,

    /// Print the merged effective configuration
    Show,
}

/// Execute a config subcommand
pub async fn execute(cmd: ConfigCommand, global: GlobalOptions) -> Result<()> {
    match cmd {
        ConfigCommand::Init => {
            let workspace = std::env::current_dir().context("Failed to get current directory")?;
            let path = ConfigLoader::new().init_local(&workspace)?;
            super::print_info(
                &format!("created configuration at {}", path.display()),
                global.quiet,
            );
            Ok(())
        }
        ConfigCommand::Show => {
            let config = load_config(&global)?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
