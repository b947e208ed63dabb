use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::today;
use crate::context::AppContext;
use crate::output::{self, heading};

#[derive(Subcommand)]
pub enum ProgressSubcommands {
    /// Estimated one-rep max over time for an exercise
    Exercise {
        /// Exercise name or id
        exercise: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Body weight trend
    Weight {
        #[arg(long)]
        json: bool,
    },

    /// Training volume per day
    Volume {
        #[arg(long)]
        json: bool,
    },

    /// Streaks, frequency and personal records
    Summary {
        #[arg(long)]
        json: bool,
    },
}

pub async fn execute(ctx: &AppContext, command: ProgressSubcommands) -> Result<()> {
    let profile = ctx.active_profile().await?;
    let progress = &ctx.services.progress;
    let unit = ctx.unit();
    let as_weight = move |kg: f64| output::weight(kg, unit);

    match command {
        ProgressSubcommands::Exercise { exercise, json } => {
            let exercise = ctx.resolve_exercise(profile.id, &exercise).await?;
            let report = progress.exercise_progress(profile.id, exercise.id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            heading(&format!("{}: estimated 1RM", report.exercise_name));
            if report.one_rep_max.points.is_empty() {
                println!("No sets or maxes logged yet");
            } else {
                output::metric_progress(&report.one_rep_max, &as_weight);
            }
        }
        ProgressSubcommands::Weight { json } => {
            let report = progress.body_weight_progress(profile.id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            heading("Body weight");
            if report.points.is_empty() {
                println!("No weight logged yet");
            } else {
                output::metric_progress(&report, &as_weight);
            }
        }
        ProgressSubcommands::Volume { json } => {
            let report = progress.volume_progress(profile.id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            heading("Training volume");
            if report.points.is_empty() {
                println!("No finished workouts yet");
            } else {
                output::metric_progress(&report, &as_weight);
            }
        }
        ProgressSubcommands::Summary { json } => {
            let summary = progress.summary(profile.id, today()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }
            heading(&format!("{}: summary", profile.name));
            println!("Workouts:       {}", summary.streaks.total_workouts);
            println!(
                "Streak:         {} week(s), longest {}",
                summary.streaks.current_weeks, summary.streaks.longest_weeks
            );
            println!("Per week:       {:.1} (last 4 weeks)", summary.weekly_frequency);
            println!("Total volume:   {}", as_weight(summary.total_volume));
            if let Some(weight) = summary.latest_weight {
                println!("Weight:         {}", as_weight(weight));
            }
            if let Some(bmi) = summary.bmi {
                println!("BMI:            {:.1}", bmi);
            }
            if !summary.personal_records.is_empty() {
                println!();
                println!("{}", "Personal records".bold());
                for record in &summary.personal_records {
                    println!(
                        "  {:<24} {}  ({})",
                        record.exercise_name,
                        as_weight(record.estimated_1rm),
                        record.date
                    );
                }
            }
        }
    }
    Ok(())
}
