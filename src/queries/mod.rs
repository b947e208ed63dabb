//! Read-side adapters for the view layer.
//!
//! One-shot queries wrap a service call in a [`QueryState`]. Live queries
//! return a stream that yields the current result immediately and again
//! after every committed write to one of the tables the query reads.

use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::stream::{self, BoxStream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApplicationResult;
use crate::models::{
    Entity, Exercise, HeightRecord, MaxLog, PerformedSet, Session, TrainingPlan, WeightRecord,
    WorkoutLog,
};
use crate::services::{
    BodyMetricsService, ExerciseFilter, ExerciseService, PlanHierarchy, ProgressService,
    ProgressSummary, TrainingPlanService, WorkoutFilter, WorkoutService,
};
use crate::storage::Database;

/// Outcome of a query as the view layer sees it
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    Ready(T),
    Failed(String),
}

impl<T> QueryState<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            QueryState::Ready(value) => Some(value),
            QueryState::Failed(_) => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, QueryState::Ready(_))
    }
}

impl<T> From<ApplicationResult<T>> for QueryState<T> {
    fn from(result: ApplicationResult<T>) -> Self {
        match result {
            Ok(value) => QueryState::Ready(value),
            Err(e) => QueryState::Failed(e.to_string()),
        }
    }
}

pub type LiveQuery<T> = BoxStream<'static, QueryState<T>>;

#[derive(Clone)]
pub struct QueryService {
    db: Database,
    exercises: ExerciseService,
    training_plans: TrainingPlanService,
    workouts: WorkoutService,
    body_metrics: BodyMetricsService,
    progress: ProgressService,
}

impl QueryService {
    pub fn new(
        db: Database,
        exercises: ExerciseService,
        training_plans: TrainingPlanService,
        workouts: WorkoutService,
        body_metrics: BodyMetricsService,
        progress: ProgressService,
    ) -> Self {
        Self {
            db,
            exercises,
            training_plans,
            workouts,
            body_metrics,
            progress,
        }
    }

    /// Re-run `loader` whenever one of `tables` changes for `profile_id`.
    /// A lagging subscriber reloads as well, since it may have missed events.
    pub fn watch<T, F, Fut>(&self, tables: &[&'static str], profile_id: Uuid, loader: F) -> LiveQuery<T>
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApplicationResult<T>> + Send + 'static,
    {
        // Subscribe before the first load so no write slips in between
        let changes = BroadcastStream::new(self.db.subscribe());
        let tables = tables.to_vec();
        let loader = Arc::new(loader);

        let initial = {
            let loader = Arc::clone(&loader);
            stream::once(async move { loader().await })
        };
        let updates = changes
            .filter_map(move |change| {
                let relevant = match change {
                    Ok(event) => event.profile_id == profile_id && tables.contains(&event.table),
                    Err(lagged) => {
                        debug!("Live query lagged: {}", lagged);
                        true
                    }
                };
                async move { relevant.then_some(()) }
            })
            .then(move |()| {
                let loader = Arc::clone(&loader);
                async move { loader().await }
            });

        initial.chain(updates).map(QueryState::from).boxed()
    }

    // One-shot queries

    pub async fn workouts(&self, profile_id: Uuid, filter: WorkoutFilter) -> QueryState<Vec<WorkoutLog>> {
        self.workouts.list(profile_id, &filter).await.into()
    }

    pub async fn weight_history(&self, profile_id: Uuid) -> QueryState<Vec<WeightRecord>> {
        self.body_metrics.list_weights(profile_id, None, None).await.into()
    }

    pub async fn exercises(&self, profile_id: Uuid, filter: ExerciseFilter) -> QueryState<Vec<Exercise>> {
        self.exercises.list(profile_id, &filter).await.into()
    }

    pub async fn plans(&self, profile_id: Uuid) -> QueryState<Vec<TrainingPlan>> {
        self.training_plans.list_plans(profile_id, false).await.into()
    }

    pub async fn plan(&self, profile_id: Uuid, plan_id: Uuid) -> QueryState<PlanHierarchy> {
        self.training_plans.load_plan(profile_id, plan_id).await.into()
    }

    // Live queries

    pub fn watch_workouts(&self, profile_id: Uuid, filter: WorkoutFilter) -> LiveQuery<Vec<WorkoutLog>> {
        let service = self.workouts.clone();
        self.watch(&[WorkoutLog::TABLE], profile_id, move || {
            let service = service.clone();
            let filter = filter.clone();
            async move { service.list(profile_id, &filter).await }
        })
    }

    pub fn watch_weight_history(&self, profile_id: Uuid) -> LiveQuery<Vec<WeightRecord>> {
        let service = self.body_metrics.clone();
        self.watch(&[WeightRecord::TABLE], profile_id, move || {
            let service = service.clone();
            async move { service.list_weights(profile_id, None, None).await }
        })
    }

    pub fn watch_exercises(&self, profile_id: Uuid, filter: ExerciseFilter) -> LiveQuery<Vec<Exercise>> {
        let service = self.exercises.clone();
        self.watch(&[Exercise::TABLE], profile_id, move || {
            let service = service.clone();
            let filter = filter.clone();
            async move { service.list(profile_id, &filter).await }
        })
    }

    pub fn watch_plans(&self, profile_id: Uuid) -> LiveQuery<Vec<TrainingPlan>> {
        let service = self.training_plans.clone();
        self.watch(
            &[TrainingPlan::TABLE, Session::TABLE],
            profile_id,
            move || {
                let service = service.clone();
                async move { service.list_plans(profile_id, false).await }
            },
        )
    }

    pub fn watch_summary(&self, profile_id: Uuid, today: NaiveDate) -> LiveQuery<ProgressSummary> {
        let service = self.progress.clone();
        self.watch(
            &[
                WorkoutLog::TABLE,
                PerformedSet::TABLE,
                WeightRecord::TABLE,
                HeightRecord::TABLE,
                MaxLog::TABLE,
            ],
            profile_id,
            move || {
                let service = service.clone();
                async move { service.summary(profile_id, today).await }
            },
        )
    }
}
