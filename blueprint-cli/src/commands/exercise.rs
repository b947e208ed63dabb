use anyhow::Result;
use blueprint_fitness::models::{
    CounterType, ExerciseCategory, ExerciseUpdate, MovementType, NewExercise,
};
use blueprint_fitness::services::ExerciseFilter;
use clap::Subcommand;
use colored::Colorize;

use crate::context::AppContext;
use crate::output::{self, heading, short_id};

#[derive(Subcommand)]
pub enum ExerciseSubcommands {
    /// Add an exercise to the library
    Add {
        name: String,

        /// strength, hypertrophy, endurance, power, mobility or cardio
        #[arg(short, long, default_value = "strength")]
        category: ExerciseCategory,

        /// compound, isolation or static
        #[arg(short, long, default_value = "compound")]
        movement: MovementType,

        /// What a set counts: reps, seconds, minutes or meters
        #[arg(long, default_value = "reps")]
        counter: CounterType,

        /// Primary muscles, comma separated
        #[arg(long, value_delimiter = ',')]
        muscles: Vec<String>,

        /// Equipment, comma separated
        #[arg(long, value_delimiter = ',')]
        equipment: Vec<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// List exercises
    List {
        #[arg(short, long)]
        category: Option<ExerciseCategory>,

        /// Match name, muscles or equipment
        #[arg(short, long)]
        search: Option<String>,

        /// Include archived exercises
        #[arg(short, long)]
        all: bool,
    },

    /// Show an exercise
    Show {
        /// Exercise name or id
        exercise: String,
    },

    /// Change an exercise
    Edit {
        /// Exercise name or id
        exercise: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        category: Option<ExerciseCategory>,

        #[arg(short, long)]
        movement: Option<MovementType>,

        #[arg(long)]
        counter: Option<CounterType>,

        #[arg(long, value_delimiter = ',')]
        muscles: Option<Vec<String>>,

        #[arg(long, value_delimiter = ',')]
        equipment: Option<Vec<String>>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Link an exercise that can stand in for another
    Substitute {
        /// Exercise name or id
        exercise: String,

        /// Substitute name or id
        substitute: String,

        /// Remove the link instead
        #[arg(long)]
        remove: bool,
    },

    /// Archive or restore an exercise
    Archive {
        /// Exercise name or id
        exercise: String,

        /// Restore instead of archiving
        #[arg(long)]
        undo: bool,
    },

    /// Delete an exercise
    Delete {
        /// Exercise name or id
        exercise: String,

        /// Also remove it from plans and max logs
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn execute(ctx: &AppContext, command: ExerciseSubcommands) -> Result<()> {
    let profile = ctx.active_profile().await?;
    let exercises = &ctx.services.exercises;

    match command {
        ExerciseSubcommands::Add {
            name,
            category,
            movement,
            counter,
            muscles,
            equipment,
            description,
        } => {
            let new_exercise = NewExercise {
                name,
                description,
                category,
                movement_type: movement,
                counter_type: counter,
                primary_muscles: muscles,
                equipment,
            };
            let exercise = exercises.create(profile.id, new_exercise).await?;
            println!("✓ Added {} ({})", exercise.name.bold(), short_id(exercise.id));
        }
        ExerciseSubcommands::List {
            category,
            search,
            all,
        } => {
            let filter = ExerciseFilter {
                category,
                search,
                include_archived: all,
            };
            let list = exercises.list(profile.id, &filter).await?;
            heading(&format!("Exercises ({})", list.len()));
            for exercise in list {
                let archived = if exercise.is_archived { " (archived)" } else { "" };
                println!(
                    "{}  {:<28} {:<12} {}{}",
                    short_id(exercise.id),
                    exercise.name,
                    exercise.category.to_string(),
                    exercise.primary_muscles.join(", ").dimmed(),
                    archived.dimmed()
                );
            }
        }
        ExerciseSubcommands::Show { exercise } => {
            let exercise = ctx.resolve_exercise(profile.id, &exercise).await?;
            heading(&exercise.name);
            println!("Id:         {}", exercise.id);
            println!("Category:   {}", exercise.category);
            println!("Movement:   {:?}", exercise.movement_type);
            println!("Counts:     {:?}", exercise.counter_type);
            if let Some(ref description) = exercise.description {
                println!("About:      {}", description);
            }
            if !exercise.primary_muscles.is_empty() {
                println!("Muscles:    {}", exercise.primary_muscles.join(", "));
            }
            if !exercise.equipment.is_empty() {
                println!("Equipment:  {}", exercise.equipment.join(", "));
            }
            for id in &exercise.substitution_ids {
                if let Ok(substitute) = exercises.get(profile.id, *id).await {
                    println!("Swap for:   {}", substitute.name);
                }
            }
            if let Some(best) = ctx.services.max_logs.best(profile.id, exercise.id).await? {
                println!(
                    "Best max:   {} (e1RM from {} x {} on {})",
                    output::weight(best.estimated_1rm, ctx.unit()),
                    output::weight(best.weight_entered, ctx.unit()),
                    best.reps,
                    best.date
                );
            }
            let history = ctx
                .services
                .workouts
                .exercise_history(profile.id, exercise.id)
                .await?;
            println!("Logged in:  {} workout(s)", history.len());
        }
        ExerciseSubcommands::Edit {
            exercise,
            name,
            category,
            movement,
            counter,
            muscles,
            equipment,
            description,
        } => {
            let exercise = ctx.resolve_exercise(profile.id, &exercise).await?;
            let update = ExerciseUpdate {
                name,
                description,
                category,
                movement_type: movement,
                counter_type: counter,
                primary_muscles: muscles,
                equipment,
            };
            let updated = exercises.update(profile.id, exercise.id, update).await?;
            println!("✓ Updated {}", updated.name.bold());
        }
        ExerciseSubcommands::Substitute {
            exercise,
            substitute,
            remove,
        } => {
            let exercise = ctx.resolve_exercise(profile.id, &exercise).await?;
            let substitute = ctx.resolve_exercise(profile.id, &substitute).await?;
            if remove {
                exercises
                    .remove_substitution(profile.id, exercise.id, substitute.id)
                    .await?;
                println!("✓ {} no longer substitutes {}", substitute.name, exercise.name);
            } else {
                exercises
                    .add_substitution(profile.id, exercise.id, substitute.id)
                    .await?;
                println!("✓ {} can substitute {}", substitute.name, exercise.name);
            }
        }
        ExerciseSubcommands::Archive { exercise, undo } => {
            let exercise = ctx.resolve_exercise(profile.id, &exercise).await?;
            exercises.set_archived(profile.id, exercise.id, !undo).await?;
            let verb = if undo { "Restored" } else { "Archived" };
            println!("✓ {} {}", verb, exercise.name);
        }
        ExerciseSubcommands::Delete { exercise, force } => {
            let exercise = ctx.resolve_exercise(profile.id, &exercise).await?;
            exercises.delete(profile.id, exercise.id, force).await?;
            println!("✓ Deleted {}", exercise.name);
        }
    }
    Ok(())
}
