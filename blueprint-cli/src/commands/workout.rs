use anyhow::{anyhow, bail, Result};
use blueprint_fitness::models::WorkoutLog;
use blueprint_fitness::services::{PerformedExerciseDetail, WorkoutDetail, WorkoutFilter};
use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use colored::Colorize;
use uuid::Uuid;

use crate::context::{pick_by_id, AppContext};
use crate::output::{self, heading, short_id};
use crate::set_parser::SetParser;

#[derive(Subcommand)]
pub enum WorkoutSubcommands {
    /// Start a workout from a plan's next session or from scratch
    Start {
        /// Plan name or id; starts its current session
        #[arg(short, long)]
        plan: Option<String>,

        /// Session name or id within the plan
        #[arg(short, long, requires = "plan")]
        session: Option<String>,

        /// Name for a workout without a plan
        #[arg(short, long, default_value = "Workout")]
        name: String,
    },

    /// Log a finished workout in one go, e.g. `Squat=3x5@100 Dips=3x10`
    Log {
        /// Exercise=sets entries
        #[arg(required = true)]
        entries: Vec<String>,

        #[arg(short, long, default_value = "Workout")]
        name: String,

        /// Rating from 1 to 5
        #[arg(short, long)]
        rating: Option<u8>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Add an exercise to the running workout
    Add {
        /// Exercise name or id
        exercise: String,
    },

    /// Record a set in the running workout
    Set {
        /// Exercise name or id
        exercise: String,

        reps: u32,

        /// Load in the configured unit
        #[arg(short, long)]
        weight: Option<f64>,

        /// Rate of perceived exertion, 1 to 10
        #[arg(long)]
        rpe: Option<f64>,
    },

    /// Skip an exercise in the running workout
    Skip {
        /// Exercise name or id
        exercise: String,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Finish the running workout
    Finish {
        /// Rating from 1 to 5
        #[arg(short, long)]
        rating: Option<u8>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List workouts, newest first
    List {
        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,

        /// Only workouts from this plan
        #[arg(short, long)]
        plan: Option<String>,

        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Show a workout; defaults to the most recent one
    Show {
        /// Workout id
        workout: Option<String>,
    },

    /// Delete a workout
    Delete {
        /// Workout id
        workout: String,
    },
}

/// The latest workout that has not been finished
async fn running_workout(ctx: &AppContext, profile_id: Uuid) -> Result<WorkoutLog> {
    ctx.services
        .workouts
        .list(profile_id, &WorkoutFilter::default())
        .await?
        .into_iter()
        .find(|w| !w.is_finished())
        .ok_or_else(|| anyhow!("No workout in progress. Start one with `blueprint workout start`"))
}

async fn resolve_workout(ctx: &AppContext, profile_id: Uuid, query: &str) -> Result<WorkoutLog> {
    let workouts = ctx
        .services
        .workouts
        .list(profile_id, &WorkoutFilter::default())
        .await?;
    pick_by_id(workouts, query, |w| w.id, "workout")
}

async fn find_performed<'a>(
    ctx: &AppContext,
    profile_id: Uuid,
    detail: &'a WorkoutDetail,
    query: &str,
) -> Result<&'a PerformedExerciseDetail> {
    let exercise = ctx.resolve_exercise(profile_id, query).await?;
    detail
        .exercises()
        .find(|e| e.exercise.exercise_id == exercise.id)
        .ok_or_else(|| {
            anyhow!(
                "{} is not part of this workout; add it with `blueprint workout add`",
                exercise.name
            )
        })
}

fn print_detail(ctx: &AppContext, detail: &WorkoutDetail) {
    let workout = &detail.workout;
    heading(&format!(
        "{} on {}",
        workout.session_name,
        workout.start_time.format("%Y-%m-%d %H:%M")
    ));
    if let Some(ref plan) = workout.training_plan_name {
        println!("Plan:     {}", plan);
    }
    match workout.duration_seconds {
        Some(seconds) => println!("Duration: {}", output::duration(seconds)),
        None => println!("{}", "In progress".yellow()),
    }
    println!("Volume:   {}", output::weight(detail.total_volume(), ctx.unit()));
    if let Some(rating) = workout.user_rating {
        println!("Rating:   {}/5", rating);
    }
    if let Some(ref notes) = workout.notes {
        println!("Notes:    {}", notes);
    }

    for performed in detail.exercises() {
        println!();
        let skipped = if performed.exercise.is_skipped { " (skipped)" } else { "" };
        println!("{}{}", performed.exercise.exercise_name.bold(), skipped.dimmed());
        for (index, set) in performed.sets.iter().enumerate() {
            let load = set
                .weight
                .map(|kg| format!(" @ {}", output::weight(kg, ctx.unit())))
                .unwrap_or_default();
            let rpe = set.rpe.map(|r| format!(" RPE {}", r)).unwrap_or_default();
            let line = format!("  {}. {} reps{}{}", index + 1, set.reps, load, rpe);
            if set.completed {
                println!("{}", line);
            } else {
                println!("{}", line.dimmed());
            }
        }
    }
}

pub async fn execute(ctx: &AppContext, command: WorkoutSubcommands) -> Result<()> {
    let profile = ctx.active_profile().await?;
    let workouts = &ctx.services.workouts;
    let plans = &ctx.services.training_plans;

    match command {
        WorkoutSubcommands::Start {
            plan,
            session,
            name,
        } => {
            if let Ok(running) = running_workout(ctx, profile.id).await {
                bail!(
                    "{} ({}) is still running; finish it first",
                    running.session_name,
                    short_id(running.id)
                );
            }

            let Some(plan_query) = plan else {
                let workout = workouts.start_free(profile.id, &name, Utc::now()).await?;
                println!("✓ Started {} ({})", workout.session_name.bold(), short_id(workout.id));
                return Ok(());
            };

            let candidates = plans.list_plans(profile.id, false).await?;
            let plan = match candidates
                .iter()
                .find(|p| p.name.eq_ignore_ascii_case(plan_query.trim()))
            {
                Some(plan) => plan.clone(),
                None => pick_by_id(candidates, &plan_query, |p| p.id, "plan")?,
            };
            let hierarchy = plans.load_plan(profile.id, plan.id).await?;
            let session_id = match session {
                Some(query) => {
                    let sessions: Vec<_> = hierarchy.sessions.iter().map(|s| &s.session).collect();
                    match sessions
                        .iter()
                        .find(|s| s.name.eq_ignore_ascii_case(query.trim()))
                    {
                        Some(s) => s.id,
                        None => pick_by_id(sessions, &query, |s| s.id, "session")?.id,
                    }
                }
                None => hierarchy
                    .current_session()
                    .map(|s| s.session.id)
                    .ok_or_else(|| anyhow!("{} has no sessions yet", plan.name))?,
            };

            let detail = workouts
                .start_from_session(profile.id, session_id, Utc::now())
                .await?;
            println!(
                "✓ Started {} from {} ({})",
                detail.workout.session_name.bold(),
                plan.name,
                short_id(detail.workout.id)
            );
            for performed in detail.exercises() {
                println!("  • {} ({} sets)", performed.exercise.exercise_name, performed.sets.len());
            }
        }
        WorkoutSubcommands::Log {
            entries,
            name,
            rating,
            notes,
        } => {
            let parser = SetParser::new()?;
            let mut parsed = Vec::with_capacity(entries.len());
            for entry in &entries {
                let (exercise, sets) = entry
                    .split_once('=')
                    .ok_or_else(|| anyhow!("Expected Exercise=sets, got '{}'", entry))?;
                let exercise = ctx.resolve_exercise(profile.id, exercise).await?;
                let config = parser.parse(sets, ctx.unit())?;
                parsed.push((exercise, config));
            }

            let now = Utc::now();
            let workout = workouts.start_free(profile.id, &name, now).await?;
            for (exercise, config) in &parsed {
                let performed = workouts.add_exercise(profile.id, workout.id, exercise.id).await?;
                for target in config.planned_sets() {
                    workouts
                        .record_set(profile.id, performed.id, target.reps, target.weight, None)
                        .await?;
                }
            }
            let finished = workouts
                .finish(profile.id, workout.id, now, rating, notes)
                .await?;
            println!(
                "✓ Logged {} with {} exercise(s), volume {}",
                finished.session_name.bold(),
                parsed.len(),
                output::weight(finished.total_volume.unwrap_or_default(), ctx.unit())
            );
        }
        WorkoutSubcommands::Add { exercise } => {
            let workout = running_workout(ctx, profile.id).await?;
            let exercise = ctx.resolve_exercise(profile.id, &exercise).await?;
            workouts.add_exercise(profile.id, workout.id, exercise.id).await?;
            println!("✓ Added {} to {}", exercise.name.bold(), workout.session_name);
        }
        WorkoutSubcommands::Set {
            exercise,
            reps,
            weight,
            rpe,
        } => {
            let workout = running_workout(ctx, profile.id).await?;
            let detail = workouts.get_detail(profile.id, workout.id).await?;
            let performed = find_performed(ctx, profile.id, &detail, &exercise).await?;
            let weight = weight.map(|w| ctx.unit().to_kg(w));

            let set = workouts
                .record_set(profile.id, performed.exercise.id, reps, weight, rpe)
                .await?;
            let load = set
                .weight
                .map(|kg| format!(" @ {}", output::weight(kg, ctx.unit())))
                .unwrap_or_default();
            println!(
                "✓ {}: set {} done, {} reps{}",
                performed.exercise.exercise_name,
                performed.completed_sets() + 1,
                set.reps,
                load
            );
        }
        WorkoutSubcommands::Skip { exercise, reason } => {
            let workout = running_workout(ctx, profile.id).await?;
            let detail = workouts.get_detail(profile.id, workout.id).await?;
            let performed = find_performed(ctx, profile.id, &detail, &exercise).await?;
            workouts
                .skip_exercise(profile.id, performed.exercise.id, reason)
                .await?;
            println!("✓ Skipped {}", performed.exercise.exercise_name);
        }
        WorkoutSubcommands::Finish { rating, notes } => {
            let workout = running_workout(ctx, profile.id).await?;
            let finished = workouts
                .finish(profile.id, workout.id, Utc::now(), rating, notes)
                .await?;
            println!(
                "✓ Finished {} in {}, volume {}",
                finished.session_name.bold(),
                output::duration(finished.duration_seconds.unwrap_or_default()),
                output::weight(finished.total_volume.unwrap_or_default(), ctx.unit())
            );
        }
        WorkoutSubcommands::List {
            from,
            to,
            plan,
            limit,
        } => {
            let training_plan_id = match plan {
                Some(query) => {
                    let candidates = plans.list_plans(profile.id, true).await?;
                    let found = match candidates
                        .iter()
                        .find(|p| p.name.eq_ignore_ascii_case(query.trim()))
                    {
                        Some(p) => p.clone(),
                        None => pick_by_id(candidates, &query, |p| p.id, "plan")?,
                    };
                    Some(found.id)
                }
                None => None,
            };
            let filter = WorkoutFilter {
                from,
                to,
                training_plan_id,
                finished_only: false,
            };
            let list = workouts.list(profile.id, &filter).await?;
            heading(&format!("Workouts ({})", list.len()));
            for workout in list.iter().take(limit) {
                let status = match workout.duration_seconds {
                    Some(seconds) => output::duration(seconds),
                    None => "running".yellow().to_string(),
                };
                println!(
                    "{}  {}  {:<24} {:>10}  {}",
                    short_id(workout.id),
                    workout.start_time.format("%Y-%m-%d"),
                    workout.session_name,
                    status,
                    output::weight(workout.total_volume.unwrap_or_default(), ctx.unit())
                );
            }
        }
        WorkoutSubcommands::Show { workout } => {
            let workout = match workout {
                Some(query) => resolve_workout(ctx, profile.id, &query).await?,
                None => workouts
                    .list(profile.id, &WorkoutFilter::default())
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| anyhow!("No workouts logged yet"))?,
            };
            let detail = workouts.get_detail(profile.id, workout.id).await?;
            print_detail(ctx, &detail);
        }
        WorkoutSubcommands::Delete { workout } => {
            let workout = resolve_workout(ctx, profile.id, &workout).await?;
            workouts.delete(profile.id, workout.id).await?;
            println!("✓ Deleted {} ({})", workout.session_name, short_id(workout.id));
        }
    }
    Ok(())
}
