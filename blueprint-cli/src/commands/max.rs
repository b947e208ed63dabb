use anyhow::Result;
use chrono::NaiveDate;
use clap::Subcommand;
use colored::Colorize;

use super::today;
use crate::context::{pick_by_id, AppContext};
use crate::output::{self, heading, short_id};

#[derive(Subcommand)]
pub enum MaxSubcommands {
    /// Record a tested lift
    Add {
        /// Exercise name or id
        exercise: String,

        /// Load in the configured unit
        weight: f64,

        #[arg(short, long, default_value_t = 1)]
        reps: u32,

        /// Defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List tested lifts
    List {
        /// Only this exercise
        exercise: Option<String>,
    },

    /// Delete a tested lift
    Delete {
        /// Record id
        record: String,
    },
}

pub async fn execute(ctx: &AppContext, command: MaxSubcommands) -> Result<()> {
    let profile = ctx.active_profile().await?;
    let max_logs = &ctx.services.max_logs;
    let unit = ctx.unit();

    match command {
        MaxSubcommands::Add {
            exercise,
            weight,
            reps,
            date,
            notes,
        } => {
            let exercise = ctx.resolve_exercise(profile.id, &exercise).await?;
            let previous = max_logs.best(profile.id, exercise.id).await?;
            let log = max_logs
                .add(
                    profile.id,
                    exercise.id,
                    unit.to_kg(weight),
                    reps,
                    date.unwrap_or_else(today),
                    notes,
                )
                .await?;
            println!(
                "✓ {}: {} x {} (e1RM {})",
                exercise.name.bold(),
                output::weight(log.weight_entered, unit),
                log.reps,
                output::weight(log.estimated_1rm, unit)
            );
            if previous.map_or(true, |p| log.estimated_1rm > p.estimated_1rm) {
                println!("{}", "New best!".green().bold());
            }
        }
        MaxSubcommands::List { exercise } => {
            let exercise = match exercise {
                Some(query) => Some(ctx.resolve_exercise(profile.id, &query).await?),
                None => None,
            };
            let logs = max_logs.list(profile.id, exercise.as_ref().map(|e| e.id)).await?;
            let title = match exercise {
                Some(ref e) => format!("Maxes: {}", e.name),
                None => "Maxes".to_string(),
            };
            heading(&title);
            for log in logs {
                let name = match exercise {
                    Some(ref e) => e.name.clone(),
                    None => ctx
                        .services
                        .exercises
                        .get(profile.id, log.exercise_id)
                        .await
                        .map(|e| e.name)
                        .unwrap_or_else(|_| "?".to_string()),
                };
                println!(
                    "{}  {}  {:<24} {} x {}  e1RM {}",
                    short_id(log.id),
                    log.date,
                    name,
                    output::weight(log.weight_entered, unit),
                    log.reps,
                    output::weight(log.estimated_1rm, unit)
                );
            }
        }
        MaxSubcommands::Delete { record } => {
            let logs = max_logs.list(profile.id, None).await?;
            let log = pick_by_id(logs, &record, |l| l.id, "max record")?;
            max_logs.delete(profile.id, log.id).await?;
            println!("✓ Deleted max from {}", log.date);
        }
    }
    Ok(())
}
