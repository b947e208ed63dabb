mod body;
mod config_cmd;
mod data;
mod exercise;
mod max;
mod plan;
mod profile;
mod progress;
mod workout;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::context::AppContext;

pub use body::{HeightSubcommands, WeightSubcommands};
pub use data::DataSubcommands;
pub use exercise::ExerciseSubcommands;
pub use max::MaxSubcommands;
pub use plan::PlanSubcommands;
pub use profile::ProfileSubcommands;
pub use progress::ProgressSubcommands;
pub use workout::WorkoutSubcommands;

#[derive(Parser)]
#[command(name = "blueprint")]
#[command(about = "Offline training log: plans, workouts, body metrics and progress", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(long, global = true, env = "BLUEPRINT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage profiles
    #[command(subcommand)]
    Profile(ProfileSubcommands),

    /// Manage the exercise library
    #[command(subcommand)]
    Exercise(ExerciseSubcommands),

    /// Manage training plans
    #[command(subcommand)]
    Plan(PlanSubcommands),

    /// Log workouts
    #[command(subcommand)]
    Workout(WorkoutSubcommands),

    /// Track body weight
    #[command(subcommand)]
    Weight(WeightSubcommands),

    /// Track height
    #[command(subcommand)]
    Height(HeightSubcommands),

    /// Record tested maxes
    #[command(subcommand)]
    Max(MaxSubcommands),

    /// Show progress reports
    #[command(subcommand)]
    Progress(ProgressSubcommands),

    /// Export, import and check data
    #[command(subcommand)]
    Data(DataSubcommands),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigSubcommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Show current configuration
    Show,

    /// Initialize configuration with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Completions { shell } => {
                generate_completions(shell);
                Ok(())
            }
            Commands::Config(subcmd) => match subcmd {
                ConfigSubcommands::Show => config_cmd::show_config(self.config).await,
                ConfigSubcommands::Init { force } => {
                    config_cmd::init_config(self.config, force).await
                }
            },
            command => {
                let mut ctx = AppContext::open(self.config)?;
                match command {
                    Commands::Profile(subcmd) => profile::execute(&mut ctx, subcmd).await,
                    Commands::Exercise(subcmd) => exercise::execute(&ctx, subcmd).await,
                    Commands::Plan(subcmd) => plan::execute(&ctx, subcmd).await,
                    Commands::Workout(subcmd) => workout::execute(&ctx, subcmd).await,
                    Commands::Weight(subcmd) => body::execute_weight(&ctx, subcmd).await,
                    Commands::Height(subcmd) => body::execute_height(&ctx, subcmd).await,
                    Commands::Max(subcmd) => max::execute(&ctx, subcmd).await,
                    Commands::Progress(subcmd) => progress::execute(&ctx, subcmd).await,
                    Commands::Data(subcmd) => data::execute(&ctx, subcmd).await,
                    Commands::Config(_) | Commands::Completions { .. } => Ok(()),
                }
            }
        }
    }
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

/// Today's date on the local clock
pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
