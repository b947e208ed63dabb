// Application services

pub mod body_metrics_service;
pub mod container;
pub mod data_sync_service;
pub mod exercise_service;
pub mod max_log_service;
pub mod profile_service;
pub mod progress_service;
pub mod training_plan_service;
pub mod workout_service;

pub use body_metrics_service::{BmiReport, BodyMetricsService};
pub use container::{AppServices, Repositories};
pub use data_sync_service::{DataSyncService, ImportOptions, ImportSummary};
pub use exercise_service::{ExerciseFilter, ExerciseService};
pub use max_log_service::MaxLogService;
pub use profile_service::ProfileService;
pub use progress_service::{
    ExerciseProgress, MetricProgress, PersonalRecord, ProgressService, ProgressSummary,
};
pub use training_plan_service::{
    GroupHierarchy, PlanHierarchy, PlannedExercise, SessionHierarchy, TrainingPlanService,
};
pub use workout_service::{
    ExerciseSetHistory, PerformedExerciseDetail, PerformedGroupDetail, WorkoutDetail,
    WorkoutFilter, WorkoutService,
};
