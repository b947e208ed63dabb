use std::sync::Arc;

use crate::config::AnalyticsConfig;
use crate::models::{
    AppliedExercise, Exercise, ExerciseGroup, HeightRecord, MaxLog, PerformedExerciseLog,
    PerformedGroupLog, PerformedSet, Profile, Session, TrainingPlan, WeightRecord, WorkoutLog,
};
use crate::queries::QueryService;
use crate::repository::SharedRepository;
use crate::storage::Database;

use super::{
    BodyMetricsService, DataSyncService, ExerciseService, MaxLogService, ProfileService,
    ProgressService, TrainingPlanService, WorkoutService,
};

/// One repository per table, injected into every service
#[derive(Clone)]
pub struct Repositories {
    pub profiles: SharedRepository<Profile>,
    pub weight_records: SharedRepository<WeightRecord>,
    pub height_records: SharedRepository<HeightRecord>,
    pub exercises: SharedRepository<Exercise>,
    pub training_plans: SharedRepository<TrainingPlan>,
    pub sessions: SharedRepository<Session>,
    pub exercise_groups: SharedRepository<ExerciseGroup>,
    pub applied_exercises: SharedRepository<AppliedExercise>,
    pub workout_logs: SharedRepository<WorkoutLog>,
    pub performed_groups: SharedRepository<PerformedGroupLog>,
    pub performed_exercises: SharedRepository<PerformedExerciseLog>,
    pub performed_sets: SharedRepository<PerformedSet>,
    pub max_logs: SharedRepository<MaxLog>,
}

impl Repositories {
    /// Every table backed by the same local database
    pub fn from_database(db: &Database) -> Self {
        let db = Arc::new(db.clone());
        Self {
            profiles: db.clone(),
            weight_records: db.clone(),
            height_records: db.clone(),
            exercises: db.clone(),
            training_plans: db.clone(),
            sessions: db.clone(),
            exercise_groups: db.clone(),
            applied_exercises: db.clone(),
            workout_logs: db.clone(),
            performed_groups: db.clone(),
            performed_exercises: db.clone(),
            performed_sets: db.clone(),
            max_logs: db,
        }
    }
}

/// Fully wired application layer
#[derive(Clone)]
pub struct AppServices {
    pub profiles: ProfileService,
    pub body_metrics: BodyMetricsService,
    pub exercises: ExerciseService,
    pub training_plans: TrainingPlanService,
    pub workouts: WorkoutService,
    pub max_logs: MaxLogService,
    pub progress: ProgressService,
    pub data_sync: DataSyncService,
    pub queries: QueryService,
}

impl AppServices {
    pub fn new(db: Database, analytics: AnalyticsConfig) -> Self {
        let repos = Repositories::from_database(&db);
        Self::with_repositories(db, repos, analytics)
    }

    pub fn with_repositories(db: Database, repos: Repositories, analytics: AnalyticsConfig) -> Self {
        let profiles = ProfileService::new(db.clone(), repos.clone());
        let body_metrics = BodyMetricsService::new(repos.clone());
        let exercises = ExerciseService::new(repos.clone());
        let training_plans = TrainingPlanService::new(repos.clone());
        let workouts = WorkoutService::new(repos.clone(), training_plans.clone());
        let max_logs = MaxLogService::new(repos.clone());
        let progress = ProgressService::new(repos.clone(), workouts.clone(), analytics);
        let data_sync = DataSyncService::new(repos);
        let queries = QueryService::new(
            db,
            exercises.clone(),
            training_plans.clone(),
            workouts.clone(),
            body_metrics.clone(),
            progress.clone(),
        );

        Self {
            profiles,
            body_metrics,
            exercises,
            training_plans,
            workouts,
            max_logs,
            progress,
            data_sync,
            queries,
        }
    }
}
