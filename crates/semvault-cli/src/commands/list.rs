//! List command - enumerate models stored in the vault.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::{create_repository, load_config, resolve_vault_dir};
use crate::GlobalOptions;

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct ListResult {
    vault_dir: String,
    models: Vec<String>,
}

/// Execute the list command
pub async fn execute(args: ListArgs, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;
    let vault_dir = resolve_vault_dir(&config)?;
    let repository = create_repository(&config)?;

    let models = repository.list_models(&vault_dir, None).await?;

    if args.json {
        let result = ListResult {
            vault_dir: vault_dir.display().to_string(),
            models,
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if models.is_empty() {
        super::print_info(
            &format!("No models stored in {}", vault_dir.display()),
            global.quiet,
        );
        return Ok(());
    }

    for name in models {
        println!("{}", name);
    }
    Ok(())
}
