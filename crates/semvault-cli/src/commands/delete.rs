//! Delete command - remove a stored model from the vault.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Args;

use super::{create_repository, load_config, model_path};
use crate::GlobalOptions;

/// Arguments for the delete command
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Model name
    name: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'f')]
    force: bool,
}

/// Execute the delete command
pub async fn execute(args: DeleteArgs, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;
    let path = model_path(&config, &args.name)?;
    let repository = create_repository(&config)?;

    if !args.force {
        print!(
            "Delete model '{}' at {}? [y/N] ",
            args.name,
            path.display()
        );
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut answer = String::new();
        io::stdin()
            .read_line(&mut answer)
            .context("Failed to read confirmation")?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            super::print_info("aborted", global.quiet);
            return Ok(());
        }
    }

    let deleted = repository.delete_model(&path, None).await?;
    if deleted {
        super::print_info(&format!("deleted model '{}'", args.name), global.quiet);
    } else {
        super::print_info(
            &format!("model '{}' was not stored, nothing to delete", args.name),
            global.quiet,
        );
    }
    Ok(())
}
