use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use crate::context::AppContext;
use crate::output::{self, heading, short_id};

#[derive(Subcommand)]
pub enum ProfileSubcommands {
    /// Create a profile and switch to it
    Create {
        name: String,

        /// Keep the current profile active
        #[arg(long)]
        no_switch: bool,
    },

    /// List profiles
    List {
        /// Include archived profiles
        #[arg(short, long)]
        all: bool,
    },

    /// Switch the active profile
    Use {
        /// Profile name or id
        profile: String,
    },

    /// Rename the active profile
    Rename { name: String },

    /// Archive or restore a profile
    Archive {
        /// Profile name or id
        profile: String,

        /// Restore instead of archiving
        #[arg(long)]
        undo: bool,
    },

    /// Delete a profile and everything it owns
    Delete {
        /// Profile name or id
        profile: String,

        /// Skip the safety check
        #[arg(short, long)]
        force: bool,
    },

    /// Show the active profile
    Show,
}

pub async fn execute(ctx: &mut AppContext, command: ProfileSubcommands) -> Result<()> {
    match command {
        ProfileSubcommands::Create { name, no_switch } => {
            let profile = ctx.services.profiles.create(&name).await?;
            println!("✓ Created profile {} ({})", profile.name.bold(), short_id(profile.id));
            if !no_switch || ctx.config.profile.active_profile_id.is_none() {
                ctx.set_active_profile(Some(profile.id))?;
                println!("Active profile is now {}", profile.name);
            }
        }
        ProfileSubcommands::List { all } => {
            let active = ctx.config.profile.active_profile_id;
            heading("Profiles");
            for profile in ctx.services.profiles.list(all).await? {
                let marker = if Some(profile.id) == active { "*" } else { " " };
                let archived = if profile.is_archived { " (archived)" } else { "" };
                println!(
                    "{} {}  {}{}  last used {}",
                    marker.green(),
                    short_id(profile.id),
                    profile.name,
                    archived.dimmed(),
                    profile.last_accessed_at.format("%Y-%m-%d")
                );
            }
        }
        ProfileSubcommands::Use { profile } => {
            let profile = ctx.resolve_profile(&profile).await?;
            let profile = ctx.services.profiles.touch(profile.id).await?;
            ctx.set_active_profile(Some(profile.id))?;
            println!("✓ Switched to {}", profile.name.bold());
        }
        ProfileSubcommands::Rename { name } => {
            let profile = ctx.active_profile().await?;
            let renamed = ctx.services.profiles.rename(profile.id, &name).await?;
            println!("✓ Renamed {} to {}", profile.name, renamed.name.bold());
        }
        ProfileSubcommands::Archive { profile, undo } => {
            let profile = ctx.resolve_profile(&profile).await?;
            let profile = ctx.services.profiles.set_archived(profile.id, !undo).await?;
            let verb = if undo { "Restored" } else { "Archived" };
            println!("✓ {} {}", verb, profile.name);
        }
        ProfileSubcommands::Delete { profile, force } => {
            let profile = ctx.resolve_profile(&profile).await?;
            if !force {
                println!(
                    "This deletes {} and all of its plans, workouts and measurements.",
                    profile.name.bold()
                );
                println!("Run again with --force to confirm");
                return Ok(());
            }
            let removed = ctx.services.profiles.delete(profile.id).await?;
            if ctx.config.profile.active_profile_id == Some(profile.id) {
                ctx.set_active_profile(None)?;
            }
            println!("✓ Deleted {} ({} records)", profile.name, removed);
        }
        ProfileSubcommands::Show => {
            let profile = ctx.active_profile().await?;
            let services = &ctx.services;
            heading(&profile.name);
            println!("Id:        {}", profile.id);
            println!("Created:   {}", profile.created_at.format("%Y-%m-%d"));

            if let Some(record) = services.body_metrics.latest_weight(profile.id).await? {
                println!("Weight:    {} ({})", output::weight(record.weight, ctx.unit()), record.date);
            }
            if let Some(record) = services.body_metrics.latest_height(profile.id).await? {
                println!("Height:    {:.1} cm ({})", record.height, record.date);
            }
            if let Some(report) = services.body_metrics.bmi(profile.id).await? {
                println!("BMI:       {:.1} ({:?})", report.bmi, report.category);
            }

            let plans = services.training_plans.list_plans(profile.id, false).await?;
            let workouts = services
                .workouts
                .list(profile.id, &Default::default())
                .await?;
            println!("Plans:     {}", plans.len());
            println!("Workouts:  {}", workouts.len());
        }
    }
    Ok(())
}
