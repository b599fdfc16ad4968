//! Show command - display one stored model.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use semvault_core::Annotated;

use super::{create_repository, load_config};
use crate::GlobalOptions;

/// Arguments for the show command
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Model name
    name: String,

    /// List every entity, not just counts
    #[arg(long, short = 'e')]
    entities: bool,

    /// Defer entity reads until first access
    #[arg(long)]
    lazy: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct ModelSummary {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    table_count: usize,
    view_count: usize,
    stored_procedure_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    entities: Option<Vec<EntitySummary>>,
}

#[derive(Debug, Serialize)]
struct EntitySummary {
    kind: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// Execute the show command
pub async fn execute(args: ShowArgs, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;
    let path = super::model_path(&config, &args.name)?;
    let repository = create_repository(&config)?;

    let mut options = super::load_options(&config);
    options.lazy = args.lazy;
    let model = repository.load_model(&path, &options).await?;
    let tables = model.tables().await?;
    let views = model.views().await?;
    let procedures = model.stored_procedures().await?;

    let entities = if args.entities {
        let mut list = Vec::new();
        for entity in model.entities().await? {
            let description = match &entity {
                semvault_core::ModelEntity::Table(t) => t.description(),
                semvault_core::ModelEntity::View(v) => v.description(),
                semvault_core::ModelEntity::StoredProcedure(p) => p.description(),
            };
            list.push(EntitySummary {
                kind: entity.kind().as_str().to_string(),
                name: entity.qualified_name(),
                description,
            });
        }
        Some(list)
    } else {
        None
    };

    let summary = ModelSummary {
        name: model.name().to_string(),
        source: model.source().map(str::to_string),
        description: model.description(),
        table_count: tables.len(),
        view_count: views.len(),
        stored_procedure_count: procedures.len(),
        entities,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Model: {}", summary.name);
    if let Some(source) = &summary.source {
        println!("Source: {}", source);
    }
    if let Some(description) = &summary.description {
        println!("Description: {}", description);
    }
    println!(
        "Entities: {} tables, {} views, {} stored procedures",
        summary.table_count, summary.view_count, summary.stored_procedure_count
    );

    if let Some(entities) = &summary.entities {
        println!();
        for entity in entities {
            match &entity.description {
                Some(description) => {
                    println!("  [{}] {} - {}", entity.kind, entity.name, description)
                }
                None => println!("  [{}] {}", entity.kind, entity.name),
            }
        }
    }
    Ok(())
}
