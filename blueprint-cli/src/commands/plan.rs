use anyhow::Result;
use blueprint_fitness::models::{GroupType, Session, TrainingPlan};
use blueprint_fitness::services::PlanHierarchy;
use chrono::Weekday;
use clap::{Subcommand, ValueEnum};
use colored::Colorize;
use uuid::Uuid;

use crate::context::{pick_by_id, AppContext};
use crate::output::{self, heading, short_id};
use crate::set_parser::SetParser;

#[derive(Clone, Copy, ValueEnum)]
pub enum GroupKind {
    Single,
    Superset,
    Circuit,
    Emom,
    Amrap,
    Tabata,
}

impl From<GroupKind> for GroupType {
    fn from(kind: GroupKind) -> Self {
        match kind {
            GroupKind::Single => GroupType::Single,
            GroupKind::Superset => GroupType::Superset,
            GroupKind::Circuit => GroupType::Circuit,
            GroupKind::Emom => GroupType::Emom,
            GroupKind::Amrap => GroupType::Amrap,
            GroupKind::Tabata => GroupType::Tabata,
        }
    }
}

#[derive(Subcommand)]
pub enum PlanSubcommands {
    /// Create a training plan
    Create {
        name: String,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// List training plans
    List {
        /// Include archived plans
        #[arg(short, long)]
        all: bool,
    },

    /// Show a plan with its sessions and exercises
    Show {
        /// Plan name or id
        plan: String,
    },

    /// Add a session to a plan
    AddSession {
        /// Plan name or id
        plan: String,

        name: String,

        /// Day of the week, e.g. mon
        #[arg(short, long)]
        day: Option<Weekday>,
    },

    /// Add an exercise to a session in its own group
    AddExercise {
        /// Plan name or id
        plan: String,

        /// Session name or id
        session: String,

        /// Exercise name or id
        exercise: String,

        /// Sets, e.g. 3x5@100, 3x8-12@60kg or 4x30s
        sets: String,

        /// Type of the new group
        #[arg(short, long, value_enum, default_value = "single")]
        group: GroupKind,

        /// Add to the last group of the session rather than a new group
        #[arg(long)]
        join: bool,

        /// Rest after each set in seconds
        #[arg(short, long, default_value_t = 90)]
        rest: u32,

        /// Time cap for EMOM/AMRAP groups in minutes
        #[arg(long)]
        minutes: Option<u32>,
    },

    /// Remove a session from a plan
    RemoveSession {
        /// Plan name or id
        plan: String,

        /// Session name or id
        session: String,
    },

    /// Rename a plan or change its notes
    Edit {
        /// Plan name or id
        plan: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Archive or restore a plan
    Archive {
        /// Plan name or id
        plan: String,

        /// Restore instead of archiving
        #[arg(long)]
        undo: bool,
    },

    /// Delete a plan with its sessions
    Delete {
        /// Plan name or id
        plan: String,
    },

    /// Show the next session, or move past it
    Next {
        /// Plan name or id
        plan: String,

        /// Skip ahead without logging a workout
        #[arg(long)]
        advance: bool,
    },
}

async fn resolve_plan(ctx: &AppContext, profile_id: Uuid, query: &str) -> Result<TrainingPlan> {
    let plans = ctx.services.training_plans.list_plans(profile_id, true).await?;
    if let Some(plan) = plans.iter().find(|p| p.name.eq_ignore_ascii_case(query.trim())) {
        return Ok(plan.clone());
    }
    pick_by_id(plans, query, |p| p.id, "plan")
}

async fn resolve_session(
    ctx: &AppContext,
    profile_id: Uuid,
    plan: &TrainingPlan,
    query: &str,
) -> Result<Session> {
    let mut sessions = Vec::with_capacity(plan.session_ids.len());
    for id in &plan.session_ids {
        sessions.push(ctx.services.training_plans.get_session(profile_id, *id).await?);
    }
    if let Some(session) = sessions.iter().find(|s| s.name.eq_ignore_ascii_case(query.trim())) {
        return Ok(session.clone());
    }
    pick_by_id(sessions, query, |s| s.id, "session")
}

fn print_hierarchy(ctx: &AppContext, hierarchy: &PlanHierarchy) {
    let plan = &hierarchy.plan;
    heading(&plan.name);
    if let Some(ref description) = plan.description {
        println!("{}", description);
    }
    if let Some(ref notes) = plan.notes {
        println!("{}", notes.dimmed());
    }

    let current = plan.current_session_id();
    for session in &hierarchy.sessions {
        let marker = if Some(session.session.id) == current { "▶" } else { " " };
        let day = session
            .session
            .day_of_week
            .map(|d| format!(" ({})", d))
            .unwrap_or_default();
        println!();
        println!(
            "{} {}{}  {}",
            marker.green(),
            session.session.name.bold(),
            day,
            short_id(session.session.id).dimmed()
        );
        for group in &session.groups {
            if group.group.group_type != GroupType::Single {
                let cap = group
                    .group
                    .duration_minutes
                    .map(|m| format!(" {} min", m))
                    .unwrap_or_default();
                println!("    {:?}{}", group.group.group_type, cap);
            }
            for planned in &group.exercises {
                println!(
                    "    • {:<24} {}  rest {}s",
                    planned.exercise.name,
                    output::set_configuration(&planned.applied.set_configuration, ctx.unit()),
                    planned.applied.rest_seconds
                );
            }
        }
    }
}

pub async fn execute(ctx: &AppContext, command: PlanSubcommands) -> Result<()> {
    let profile = ctx.active_profile().await?;
    let plans = &ctx.services.training_plans;

    match command {
        PlanSubcommands::Create { name, description } => {
            let plan = plans.create_plan(profile.id, &name, description).await?;
            println!("✓ Created plan {} ({})", plan.name.bold(), short_id(plan.id));
        }
        PlanSubcommands::List { all } => {
            let list = plans.list_plans(profile.id, all).await?;
            heading(&format!("Training plans ({})", list.len()));
            for plan in list {
                let archived = if plan.is_archived { " (archived)" } else { "" };
                println!(
                    "{}  {:<28} {} session(s){}",
                    short_id(plan.id),
                    plan.name,
                    plan.session_ids.len(),
                    archived.dimmed()
                );
            }
        }
        PlanSubcommands::Show { plan } => {
            let plan = resolve_plan(ctx, profile.id, &plan).await?;
            let hierarchy = plans.load_plan(profile.id, plan.id).await?;
            print_hierarchy(ctx, &hierarchy);
        }
        PlanSubcommands::AddSession { plan, name, day } => {
            let plan = resolve_plan(ctx, profile.id, &plan).await?;
            let session = plans.add_session(profile.id, plan.id, &name, day).await?;
            println!("✓ Added session {} to {}", session.name.bold(), plan.name);
        }
        PlanSubcommands::AddExercise {
            plan,
            session,
            exercise,
            sets,
            group,
            join,
            rest,
            minutes,
        } => {
            let plan = resolve_plan(ctx, profile.id, &plan).await?;
            let session = resolve_session(ctx, profile.id, &plan, &session).await?;
            let exercise = ctx.resolve_exercise(profile.id, &exercise).await?;
            let set_configuration = SetParser::new()?.parse(&sets, ctx.unit())?;

            let group_id = match session.group_ids.last() {
                Some(id) if join => *id,
                _ => {
                    plans
                        .add_group(profile.id, session.id, group.into(), minutes)
                        .await?
                        .id
                }
            };
            let applied = plans
                .add_applied_exercise(profile.id, group_id, exercise.id, set_configuration, rest)
                .await?;
            println!(
                "✓ Added {} to {}: {}",
                exercise.name.bold(),
                session.name,
                output::set_configuration(&applied.set_configuration, ctx.unit())
            );
        }
        PlanSubcommands::RemoveSession { plan, session } => {
            let plan = resolve_plan(ctx, profile.id, &plan).await?;
            let session = resolve_session(ctx, profile.id, &plan, &session).await?;
            plans.remove_session(profile.id, plan.id, session.id).await?;
            println!("✓ Removed {} from {}", session.name, plan.name);
        }
        PlanSubcommands::Edit {
            plan,
            name,
            description,
            notes,
        } => {
            let plan = resolve_plan(ctx, profile.id, &plan).await?;
            let updated = plans
                .update_plan(profile.id, plan.id, name, description, notes)
                .await?;
            println!("✓ Updated {}", updated.name.bold());
        }
        PlanSubcommands::Archive { plan, undo } => {
            let plan = resolve_plan(ctx, profile.id, &plan).await?;
            plans.set_plan_archived(profile.id, plan.id, !undo).await?;
            let verb = if undo { "Restored" } else { "Archived" };
            println!("✓ {} {}", verb, plan.name);
        }
        PlanSubcommands::Delete { plan } => {
            let plan = resolve_plan(ctx, profile.id, &plan).await?;
            plans.delete_plan(profile.id, plan.id).await?;
            println!("✓ Deleted {}", plan.name);
        }
        PlanSubcommands::Next { plan, advance } => {
            let mut plan = resolve_plan(ctx, profile.id, &plan).await?;
            if advance {
                plan = plans.advance_plan(profile.id, plan.id).await?;
            }
            let hierarchy = plans.load_plan(profile.id, plan.id).await?;
            match hierarchy.current_session() {
                Some(session) => {
                    heading(&format!("Next: {}", session.session.name));
                    for planned in session.groups.iter().flat_map(|g| g.exercises.iter()) {
                        println!(
                            "• {:<24} {}",
                            planned.exercise.name,
                            output::set_configuration(&planned.applied.set_configuration, ctx.unit())
                        );
                    }
                    println!();
                    println!(
                        "Start it with `blueprint workout start --plan {}`",
                        short_id(plan.id)
                    );
                }
                None => println!("{} has no sessions yet", plan.name),
            }
        }
    }
    Ok(())
}
