use std::path::PathBuf;

use anyhow::{bail, Result};
use blueprint_fitness::export::Severity;
use blueprint_fitness::services::ImportOptions;
use clap::Subcommand;
use colored::Colorize;

use crate::context::AppContext;

#[derive(Subcommand)]
pub enum DataSubcommands {
    /// Export the active profile to JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import an export file into the active profile
    Import {
        file: PathBuf,

        /// Give every imported record a new id
        #[arg(long)]
        new_ids: bool,
    },

    /// Check an export file for broken references
    Validate {
        file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn execute(ctx: &AppContext, command: DataSubcommands) -> Result<()> {
    let sync = &ctx.services.data_sync;

    match command {
        DataSubcommands::Export { output } => {
            let profile = ctx.active_profile().await?;
            let payload = sync.export(profile.id).await?;
            match output {
                Some(path) => {
                    sync.write_file(&payload, &path).await?;
                    println!(
                        "✓ Exported {} records from {} to {}",
                        payload.record_count(),
                        profile.name,
                        path.display()
                    );
                }
                None => println!("{}", payload.to_json()?),
            }
        }
        DataSubcommands::Import { file, new_ids } => {
            let profile = ctx.active_profile().await?;
            let payload = sync.read_file(&file).await?;
            let options = ImportOptions {
                regenerate_ids: new_ids,
            };
            let summary = sync.import(profile.id, payload, options).await?;
            println!(
                "✓ Imported {} records into {}",
                summary.records_imported,
                profile.name.bold()
            );
            if summary.warnings > 0 {
                println!(
                    "{}",
                    format!("{} warning(s); run `blueprint data validate` for details", summary.warnings)
                        .yellow()
                );
            }
        }
        DataSubcommands::Validate { file, json } => {
            let payload = sync.read_file(&file).await?;
            let report = sync.validate(&payload);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for issue in &report.issues {
                    let line = issue.to_string();
                    match issue.severity {
                        Severity::Error => println!("{}", line.red()),
                        Severity::Warning => println!("{}", line.yellow()),
                    }
                }
                println!("{}", report);
            }
            if !report.is_valid() {
                bail!("{} has {} error(s)", file.display(), report.error_count());
            }
        }
    }
    Ok(())
}
