//! Exists command - check whether a model is stored.

use anyhow::Result;
use clap::Args;

use super::{create_repository, load_config, model_path};
use crate::GlobalOptions;

/// Arguments for the exists command
#[derive(Args, Debug)]
pub struct ExistsArgs {
    /// Model name
    name: String,
}

/// Execute the exists command.
///
/// Exits with status 0 when the model is stored, 1 when it is not, so the
/// command composes in scripts.
pub async fn execute(args: ExistsArgs, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;
    let path = model_path(&config, &args.name)?;
    let repository = create_repository(&config)?;

    let exists = repository.exists(&path, None).await?;
    if exists {
        super::print_info(&format!("model '{}' is stored", args.name), global.quiet);
        Ok(())
    } else {
        super::print_info(&format!("model '{}' is not stored", args.name), global.quiet);
        std::process::exit(1);
    }
}
