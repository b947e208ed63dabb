use anyhow::Result;
use chrono::NaiveDate;
use clap::Subcommand;
use colored::Colorize;

use super::today;
use crate::context::{pick_by_id, AppContext};
use crate::output::{self, heading, short_id};

#[derive(Subcommand)]
pub enum WeightSubcommands {
    /// Log body weight
    Add {
        /// Weight in the configured unit
        weight: f64,

        /// Defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List weight records, oldest first
    List {
        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Correct a weight record
    Edit {
        /// Record id
        record: String,

        #[arg(short, long)]
        weight: Option<f64>,

        #[arg(short, long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a weight record
    Delete {
        /// Record id
        record: String,
    },
}

#[derive(Subcommand)]
pub enum HeightSubcommands {
    /// Log height in centimeters
    Add {
        height: f64,

        /// Defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// List height records
    List,

    /// Delete a height record
    Delete {
        /// Record id
        record: String,
    },
}

pub async fn execute_weight(ctx: &AppContext, command: WeightSubcommands) -> Result<()> {
    let profile = ctx.active_profile().await?;
    let body = &ctx.services.body_metrics;
    let unit = ctx.unit();

    match command {
        WeightSubcommands::Add {
            weight,
            date,
            notes,
        } => {
            let date = date.unwrap_or_else(today);
            let record = body
                .add_weight(profile.id, date, unit.to_kg(weight), notes)
                .await?;
            println!(
                "✓ Logged {} on {}",
                output::weight(record.weight, unit).bold(),
                record.date
            );
            if let Some(report) = body.bmi(profile.id).await? {
                println!("BMI {:.1} ({:?})", report.bmi, report.category);
            }
        }
        WeightSubcommands::List { from, to } => {
            let records = body.list_weights(profile.id, from, to).await?;
            heading(&format!("Weight ({} records)", records.len()));
            for record in &records {
                let notes = record.notes.as_deref().unwrap_or_default();
                println!(
                    "{}  {}  {:>10}  {}",
                    short_id(record.id),
                    record.date,
                    output::weight(record.weight, unit),
                    notes.dimmed()
                );
            }
            if records.len() > 1 {
                let trend = body
                    .weight_trend(profile.id, ctx.services.progress.config())
                    .await?;
                println!();
                println!("Trend: {}", output::direction(trend.direction));
            }
        }
        WeightSubcommands::Edit {
            record,
            weight,
            date,
            notes,
        } => {
            let records = body.list_weights(profile.id, None, None).await?;
            let record = pick_by_id(records, &record, |r| r.id, "weight record")?;
            let updated = body
                .update_weight(profile.id, record.id, weight.map(|w| unit.to_kg(w)), date, notes)
                .await?;
            println!(
                "✓ Updated record: {} on {}",
                output::weight(updated.weight, unit),
                updated.date
            );
        }
        WeightSubcommands::Delete { record } => {
            let records = body.list_weights(profile.id, None, None).await?;
            let record = pick_by_id(records, &record, |r| r.id, "weight record")?;
            body.delete_weight(profile.id, record.id).await?;
            println!("✓ Deleted weight record from {}", record.date);
        }
    }
    Ok(())
}

pub async fn execute_height(ctx: &AppContext, command: HeightSubcommands) -> Result<()> {
    let profile = ctx.active_profile().await?;
    let body = &ctx.services.body_metrics;

    match command {
        HeightSubcommands::Add { height, date } => {
            let record = body
                .add_height(profile.id, date.unwrap_or_else(today), height, None)
                .await?;
            println!("✓ Logged {:.1} cm on {}", record.height, record.date);
        }
        HeightSubcommands::List => {
            let records = body.list_heights(profile.id).await?;
            heading(&format!("Height ({} records)", records.len()));
            for record in records {
                println!("{}  {}  {:.1} cm", short_id(record.id), record.date, record.height);
            }
        }
        HeightSubcommands::Delete { record } => {
            let records = body.list_heights(profile.id).await?;
            let record = pick_by_id(records, &record, |r| r.id, "height record")?;
            body.delete_height(profile.id, record.id).await?;
            println!("✓ Deleted height record from {}", record.date);
        }
    }
    Ok(())
}
