use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::cli::output::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::{migrations, DatabaseManager};

#[derive(Args, Debug)]
pub struct MigrateArgs {
    #[arg(long, help = "List applied and pending migrations without running anything")]
    pub status: bool,
}

pub async fn handle(args: MigrateArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let manager = DatabaseManager::connect(&config().database)
        .await
        .context("connecting to the course database")?;

    let result = if args.status {
        status(&manager, output_format).await
    } else {
        apply(&manager, output_format).await
    };

    manager.close().await;
    result
}

async fn status(manager: &DatabaseManager, output_format: OutputFormat) -> anyhow::Result<()> {
    let applied = migrations::applied_versions(manager.pool()).await?;
    let pending = migrations::pending(&applied);

    let details: Vec<String> = migrations::MIGRATIONS
        .iter()
        .map(|m| {
            let state = if applied.contains(&m.version) { "applied" } else { "pending" };
            format!("{:>4} {:<28} {}", m.version, m.name, state)
        })
        .collect();

    output_success(
        output_format,
        &format!("{} applied, {} pending", applied.len(), pending.len()),
        json!({
            "applied": applied,
            "pending": pending.iter().map(|m| m.version).collect::<Vec<_>>(),
        }),
        &details,
    )
}

async fn apply(manager: &DatabaseManager, output_format: OutputFormat) -> anyhow::Result<()> {
    let ran = migrations::run(manager.pool()).await.context("applying migrations")?;

    let message = if ran.is_empty() {
        "Schema already up to date".to_string()
    } else {
        format!("Applied {} migration(s)", ran.len())
    };
    let details: Vec<String> = ran.iter().map(|v| format!("applied version {}", v)).collect();

    output_success(output_format, &message, json!({ "applied": ran }), &details)
}
