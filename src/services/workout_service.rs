use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{ApplicationError, ApplicationResult};
use crate::models::{
    GroupType, PerformedExerciseLog, PerformedGroupLog, PerformedSet, WorkoutLog,
};
use crate::repository::require;

use super::{Repositories, TrainingPlanService};

#[derive(Debug, Clone, Serialize)]
pub struct PerformedExerciseDetail {
    pub exercise: PerformedExerciseLog,
    pub sets: Vec<PerformedSet>,
}

impl PerformedExerciseDetail {
    pub fn volume(&self) -> f64 {
        self.sets.iter().map(PerformedSet::volume).sum()
    }

    pub fn completed_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.completed).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformedGroupDetail {
    pub group: PerformedGroupLog,
    pub exercises: Vec<PerformedExerciseDetail>,
}

/// A workout log with everything performed in it
#[derive(Debug, Clone, Serialize)]
pub struct WorkoutDetail {
    pub workout: WorkoutLog,
    pub groups: Vec<PerformedGroupDetail>,
}

impl WorkoutDetail {
    pub fn exercises(&self) -> impl Iterator<Item = &PerformedExerciseDetail> {
        self.groups.iter().flat_map(|g| g.exercises.iter())
    }

    pub fn total_volume(&self) -> f64 {
        self.exercises().map(PerformedExerciseDetail::volume).sum()
    }

    pub fn completed_sets(&self) -> usize {
        self.exercises().map(PerformedExerciseDetail::completed_sets).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkoutFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub training_plan_id: Option<Uuid>,
    pub finished_only: bool,
}

impl WorkoutFilter {
    pub fn matches(&self, workout: &WorkoutLog) -> bool {
        let date = workout.start_time.date_naive();
        if self.from.is_some_and(|from| date < from) || self.to.is_some_and(|to| date > to) {
            return false;
        }
        if self.training_plan_id.is_some() && workout.training_plan_id != self.training_plan_id {
            return false;
        }
        !self.finished_only || workout.is_finished()
    }
}

/// The sets of one exercise within one workout
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseSetHistory {
    pub workout_id: Uuid,
    pub date: NaiveDate,
    pub exercise_name: String,
    pub sets: Vec<PerformedSet>,
}

/// Workout logging: starting, recording and finishing sessions
#[derive(Clone)]
pub struct WorkoutService {
    repos: Repositories,
    training_plans: TrainingPlanService,
}

impl WorkoutService {
    pub fn new(repos: Repositories, training_plans: TrainingPlanService) -> Self {
        Self {
            repos,
            training_plans,
        }
    }

    /// Start a workout from a planned session, copying its groups,
    /// exercises and planned sets into the log
    #[instrument(skip(self))]
    pub async fn start_from_session(
        &self,
        profile_id: Uuid,
        session_id: Uuid,
        start_time: DateTime<Utc>,
    ) -> ApplicationResult<WorkoutDetail> {
        let hierarchy = self.training_plans.load_session(profile_id, session_id).await?;
        let plan = self
            .repos
            .training_plans
            .list_by_profile(profile_id)
            .await?
            .into_iter()
            .find(|p| p.session_ids.contains(&session_id));

        let mut workout = WorkoutLog::start(profile_id, hierarchy.session.name.clone(), start_time)?
            .with_source(plan.map(|p| (p.id, p.name)), Some(session_id))?;

        let mut groups = Vec::with_capacity(hierarchy.groups.len());
        let mut performed_groups = Vec::new();
        let mut performed_exercises = Vec::new();
        let mut performed_sets = Vec::new();

        for planned_group in &hierarchy.groups {
            let mut group = PerformedGroupLog::new(profile_id, planned_group.group.group_type);
            let mut exercises = Vec::with_capacity(planned_group.exercises.len());

            for planned in &planned_group.exercises {
                let mut exercise =
                    PerformedExerciseLog::new(profile_id, planned.exercise.id, &planned.exercise.name)?;
                let mut sets = Vec::new();
                for target in planned.applied.set_configuration.planned_sets() {
                    let set = PerformedSet::planned(profile_id, target.reps, target.weight)?;
                    exercise = exercise.with_performed_set(set.id)?;
                    sets.push(set);
                }
                group = group.with_performed_exercise(exercise.id)?;
                performed_sets.extend(sets.iter().cloned());
                performed_exercises.push(exercise.clone());
                exercises.push(PerformedExerciseDetail { exercise, sets });
            }

            workout = workout.with_performed_group(group.id)?;
            performed_groups.push(group.clone());
            groups.push(PerformedGroupDetail { group, exercises });
        }

        self.repos.performed_sets.save_many(&performed_sets).await?;
        self.repos.performed_exercises.save_many(&performed_exercises).await?;
        self.repos.performed_groups.save_many(&performed_groups).await?;
        self.repos.workout_logs.save(&workout).await?;

        info!(
            "Started workout {} from session {} with {} planned sets",
            workout.id,
            hierarchy.session.name,
            performed_sets.len()
        );
        Ok(WorkoutDetail { workout, groups })
    }

    /// Start an empty workout not tied to any plan
    #[instrument(skip(self))]
    pub async fn start_free(
        &self,
        profile_id: Uuid,
        name: &str,
        start_time: DateTime<Utc>,
    ) -> ApplicationResult<WorkoutLog> {
        require(self.repos.profiles.as_ref(), profile_id, profile_id).await?;
        let workout = WorkoutLog::start(profile_id, name.trim(), start_time)?;
        self.repos.workout_logs.save(&workout).await?;

        info!("Started free workout {} ({})", workout.session_name, workout.id);
        Ok(workout)
    }

    async fn open_workout(&self, profile_id: Uuid, id: Uuid) -> ApplicationResult<WorkoutLog> {
        let workout = require(self.repos.workout_logs.as_ref(), profile_id, id).await?;
        if workout.is_finished() {
            return Err(ApplicationError::Conflict(format!(
                "Workout {} is already finished",
                id
            )));
        }
        Ok(workout)
    }

    /// Fail with `Conflict` unless the workout holding the exercise is still running
    async fn ensure_exercise_open(
        &self,
        profile_id: Uuid,
        performed_exercise_id: Uuid,
    ) -> ApplicationResult<()> {
        let groups = self.repos.performed_groups.list_by_profile(profile_id).await?;
        let group_ids: Vec<Uuid> = groups
            .iter()
            .filter(|g| g.performed_exercise_ids.contains(&performed_exercise_id))
            .map(|g| g.id)
            .collect();

        let workouts = self.repos.workout_logs.list_by_profile(profile_id).await?;
        let owner = workouts.iter().find(|w| {
            w.performed_group_ids
                .iter()
                .any(|id| group_ids.contains(id))
        });
        match owner {
            Some(workout) if workout.is_finished() => Err(ApplicationError::Conflict(format!(
                "Workout {} is already finished",
                workout.id
            ))),
            _ => Ok(()),
        }
    }

    /// Add an exercise to a running workout in its own group
    pub async fn add_exercise(
        &self,
        profile_id: Uuid,
        workout_id: Uuid,
        exercise_id: Uuid,
    ) -> ApplicationResult<PerformedExerciseLog> {
        let workout = self.open_workout(profile_id, workout_id).await?;
        let library_entry = require(self.repos.exercises.as_ref(), profile_id, exercise_id).await?;

        let exercise = PerformedExerciseLog::new(profile_id, exercise_id, library_entry.name)?;
        let group = PerformedGroupLog::new(profile_id, GroupType::Single)
            .with_performed_exercise(exercise.id)?;
        let workout = workout.with_performed_group(group.id)?;

        self.repos.performed_exercises.save(&exercise).await?;
        self.repos.performed_groups.save(&group).await?;
        self.repos.workout_logs.save(&workout).await?;
        Ok(exercise)
    }

    /// Record a completed set. Fills the first planned set that is not
    /// done yet, or appends a new one when all are done.
    #[instrument(skip(self))]
    pub async fn record_set(
        &self,
        profile_id: Uuid,
        performed_exercise_id: Uuid,
        reps: u32,
        weight: Option<f64>,
        rpe: Option<f64>,
    ) -> ApplicationResult<PerformedSet> {
        let exercise = require(
            self.repos.performed_exercises.as_ref(),
            profile_id,
            performed_exercise_id,
        )
        .await?;
        self.ensure_exercise_open(profile_id, exercise.id).await?;

        let sets = self
            .repos
            .performed_sets
            .get_many(&exercise.performed_set_ids)
            .await?;

        let set = match sets.into_iter().find(|s| !s.completed) {
            Some(planned) => planned.completed_with(reps, weight, rpe)?,
            None => {
                let set = PerformedSet::planned(profile_id, reps, weight)?
                    .completed_with(reps, weight, rpe)?;
                let exercise = exercise.with_performed_set(set.id)?;
                self.repos.performed_exercises.save(&exercise).await?;
                set
            }
        };
        self.repos.performed_sets.save(&set).await?;

        debug!("Recorded set {} x {:?}", set.reps, set.weight);
        Ok(set)
    }

    pub async fn skip_exercise(
        &self,
        profile_id: Uuid,
        performed_exercise_id: Uuid,
        notes: Option<String>,
    ) -> ApplicationResult<PerformedExerciseLog> {
        let exercise = require(
            self.repos.performed_exercises.as_ref(),
            profile_id,
            performed_exercise_id,
        )
        .await?;
        self.ensure_exercise_open(profile_id, exercise.id).await?;
        let exercise = exercise.skipped(notes);
        self.repos.performed_exercises.save(&exercise).await?;
        Ok(exercise)
    }

    /// Close the workout with its total volume. A workout started from the
    /// plan's current session moves the plan on to the next one.
    #[instrument(skip(self, notes))]
    pub async fn finish(
        &self,
        profile_id: Uuid,
        workout_id: Uuid,
        end_time: DateTime<Utc>,
        user_rating: Option<u8>,
        notes: Option<String>,
    ) -> ApplicationResult<WorkoutLog> {
        let detail = self.get_detail(profile_id, workout_id).await?;
        let workout = detail
            .workout
            .finished(end_time, detail.total_volume(), user_rating, notes)?;
        self.repos.workout_logs.save(&workout).await?;

        if let (Some(plan_id), Some(session_id)) = (workout.training_plan_id, workout.session_id) {
            match self.repos.training_plans.get(plan_id).await? {
                Some(plan) if plan.current_session_id() == Some(session_id) => {
                    self.training_plans.advance_plan(profile_id, plan_id).await?;
                }
                Some(_) => debug!("Session {} was not the plan's current one", session_id),
                None => warn!("Plan {} no longer exists, not advancing", plan_id),
            }
        }

        info!(
            "Finished workout {} in {}s, volume {:.1}",
            workout.id,
            workout.duration_seconds.unwrap_or_default(),
            workout.total_volume.unwrap_or_default()
        );
        Ok(workout)
    }

    pub async fn get(&self, profile_id: Uuid, id: Uuid) -> ApplicationResult<WorkoutLog> {
        require(self.repos.workout_logs.as_ref(), profile_id, id).await
    }

    pub async fn get_detail(&self, profile_id: Uuid, id: Uuid) -> ApplicationResult<WorkoutDetail> {
        let workout = self.get(profile_id, id).await?;
        let performed_groups = self
            .repos
            .performed_groups
            .get_many(&workout.performed_group_ids)
            .await?;

        let mut groups = Vec::with_capacity(performed_groups.len());
        for group in performed_groups {
            let performed_exercises = self
                .repos
                .performed_exercises
                .get_many(&group.performed_exercise_ids)
                .await?;
            let mut exercises = Vec::with_capacity(performed_exercises.len());
            for exercise in performed_exercises {
                let sets = self
                    .repos
                    .performed_sets
                    .get_many(&exercise.performed_set_ids)
                    .await?;
                exercises.push(PerformedExerciseDetail { exercise, sets });
            }
            groups.push(PerformedGroupDetail { group, exercises });
        }

        Ok(WorkoutDetail { workout, groups })
    }

    /// Newest first
    pub async fn list(
        &self,
        profile_id: Uuid,
        filter: &WorkoutFilter,
    ) -> ApplicationResult<Vec<WorkoutLog>> {
        let mut workouts: Vec<WorkoutLog> = self
            .repos
            .workout_logs
            .list_by_profile(profile_id)
            .await?
            .into_iter()
            .filter(|w| filter.matches(w))
            .collect();
        workouts.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(workouts)
    }

    /// Delete a workout with its performed groups, exercises and sets
    #[instrument(skip(self))]
    pub async fn delete(&self, profile_id: Uuid, id: Uuid) -> ApplicationResult<()> {
        let detail = self.get_detail(profile_id, id).await?;

        let set_ids: Vec<Uuid> = detail
            .exercises()
            .flat_map(|e| e.exercise.performed_set_ids.iter().copied())
            .collect();
        let exercise_ids: Vec<Uuid> = detail.exercises().map(|e| e.exercise.id).collect();

        self.repos.performed_sets.delete_many(&set_ids).await?;
        self.repos.performed_exercises.delete_many(&exercise_ids).await?;
        self.repos
            .performed_groups
            .delete_many(&detail.workout.performed_group_ids)
            .await?;
        self.repos.workout_logs.delete(id).await?;

        info!("Deleted workout {}", id);
        Ok(())
    }

    /// Every logged appearance of an exercise, oldest first
    pub async fn exercise_history(
        &self,
        profile_id: Uuid,
        exercise_id: Uuid,
    ) -> ApplicationResult<Vec<ExerciseSetHistory>> {
        let mut workouts = self.list(profile_id, &WorkoutFilter::default()).await?;
        workouts.reverse();

        let mut history = Vec::new();
        for workout in workouts {
            let detail = self.get_detail(profile_id, workout.id).await?;
            for performed in detail.exercises() {
                if performed.exercise.exercise_id != exercise_id || performed.exercise.is_skipped {
                    continue;
                }
                history.push(ExerciseSetHistory {
                    workout_id: workout.id,
                    date: workout.start_time.date_naive(),
                    exercise_name: performed.exercise.exercise_name.clone(),
                    sets: performed.sets.clone(),
                });
            }
        }
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exercise, NewExercise, Profile, SetConfiguration, TrainingPlan};
    use crate::storage::Database;
    use assert_matches::assert_matches;
    use chrono::Duration;

    struct Fixture {
        service: WorkoutService,
        plans: TrainingPlanService,
        repos: Repositories,
        profile_id: Uuid,
        squat: Exercise,
        plan: TrainingPlan,
        day_a: Uuid,
    }

    async fn setup() -> Fixture {
        let db = Database::temporary().unwrap();
        let repos = Repositories::from_database(&db);
        let profile = Profile::new("Alex").unwrap();
        repos.profiles.save(&profile).await.unwrap();
        let squat = Exercise::new(profile.id, NewExercise::strength("Squat")).unwrap();
        repos.exercises.save(&squat).await.unwrap();

        let plans = TrainingPlanService::new(repos.clone());
        let plan = plans.create_plan(profile.id, "Strength", None).await.unwrap();
        let day_a = plans.add_session(profile.id, plan.id, "Day A", None).await.unwrap();
        plans.add_session(profile.id, plan.id, "Day B", None).await.unwrap();
        let group = plans
            .add_group(profile.id, day_a.id, GroupType::Single, None)
            .await
            .unwrap();
        plans
            .add_applied_exercise(
                profile.id,
                group.id,
                squat.id,
                SetConfiguration::standard(3, 5, Some(100.0)),
                180,
            )
            .await
            .unwrap();

        Fixture {
            service: WorkoutService::new(repos.clone(), plans.clone()),
            plans,
            repos,
            profile_id: profile.id,
            squat,
            plan,
            day_a: day_a.id,
        }
    }

    #[tokio::test]
    async fn test_start_from_session_materializes_sets() {
        let f = setup().await;
        let detail = f
            .service
            .start_from_session(f.profile_id, f.day_a, Utc::now())
            .await
            .unwrap();

        assert_eq!(detail.workout.training_plan_id, Some(f.plan.id));
        assert_eq!(detail.workout.training_plan_name.as_deref(), Some("Strength"));
        assert_eq!(detail.groups.len(), 1);
        let exercise = &detail.groups[0].exercises[0];
        assert_eq!(exercise.exercise.exercise_name, "Squat");
        assert_eq!(exercise.sets.len(), 3);
        assert!(exercise.sets.iter().all(|s| !s.completed && s.weight == Some(100.0)));

        let reloaded = f.service.get_detail(f.profile_id, detail.workout.id).await.unwrap();
        assert_eq!(reloaded.exercises().count(), 1);
    }

    #[tokio::test]
    async fn test_record_and_finish_advances_plan() {
        let f = setup().await;
        let start = Utc::now() - Duration::minutes(50);
        let detail = f
            .service
            .start_from_session(f.profile_id, f.day_a, start)
            .await
            .unwrap();
        let performed_id = detail.groups[0].exercises[0].exercise.id;

        for _ in 0..4 {
            f.service
                .record_set(f.profile_id, performed_id, 5, Some(100.0), Some(8.0))
                .await
                .unwrap();
        }

        let finished = f
            .service
            .finish(f.profile_id, detail.workout.id, start + Duration::minutes(50), Some(4), None)
            .await
            .unwrap();
        assert_eq!(finished.total_volume, Some(2000.0));
        assert_eq!(finished.duration_seconds, Some(50 * 60));

        let plan = f.plans.get_plan(f.profile_id, f.plan.id).await.unwrap();
        assert_eq!(plan.current_session_index, 1);

        let again = f
            .service
            .finish(f.profile_id, detail.workout.id, Utc::now(), None, None)
            .await;
        assert_matches!(again, Err(ApplicationError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_free_workout_and_history() {
        let f = setup().await;
        let workout = f.service.start_free(f.profile_id, "Extra", Utc::now()).await.unwrap();
        let performed = f
            .service
            .add_exercise(f.profile_id, workout.id, f.squat.id)
            .await
            .unwrap();
        f.service
            .record_set(f.profile_id, performed.id, 8, Some(80.0), None)
            .await
            .unwrap();

        let history = f.service.exercise_history(f.profile_id, f.squat.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sets[0].reps, 8);
        assert!(history[0].sets[0].completed);
    }

    #[tokio::test]
    async fn test_delete_cascades_performed_records() {
        let f = setup().await;
        let detail = f
            .service
            .start_from_session(f.profile_id, f.day_a, Utc::now())
            .await
            .unwrap();

        f.service.delete(f.profile_id, detail.workout.id).await.unwrap();

        assert_eq!(f.repos.workout_logs.count_by_profile(f.profile_id).await.unwrap(), 0);
        assert_eq!(f.repos.performed_groups.count_by_profile(f.profile_id).await.unwrap(), 0);
        assert_eq!(f.repos.performed_exercises.count_by_profile(f.profile_id).await.unwrap(), 0);
        assert_eq!(f.repos.performed_sets.count_by_profile(f.profile_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_filter() {
        let f = setup().await;
        let old = Utc::now() - Duration::days(30);
        f.service.start_free(f.profile_id, "Old", old).await.unwrap();
        f.service.start_free(f.profile_id, "New", Utc::now()).await.unwrap();

        let all = f.service.list(f.profile_id, &WorkoutFilter::default()).await.unwrap();
        assert_eq!(all[0].session_name, "New");

        let recent = f
            .service
            .list(
                f.profile_id,
                &WorkoutFilter {
                    from: Some((Utc::now() - Duration::days(7)).date_naive()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
    }
}
