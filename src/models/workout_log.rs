use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::entity::impl_entity;
use super::training_plan::GroupType;
use super::validation::{error, unique_ids};
use crate::error::{ApplicationError, ApplicationResult};

/// Allowed drift between a stored duration and end minus start
pub const DURATION_TOLERANCE_SECONDS: i64 = 60;

// ============================================================================
// Workout log
// ============================================================================

/// A performed workout. Plan and session names are copied so the log stays
/// readable after the plan is edited or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_workout_times"))]
pub struct WorkoutLog {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub training_plan_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub training_plan_name: Option<String>,
    pub session_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub session_name: String,
    #[validate(custom(function = "unique_ids"))]
    pub performed_group_ids: Vec<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    #[validate(range(min = 0.0))]
    pub total_volume: Option<f64>,
    #[validate(range(min = 1, max = 5))]
    pub user_rating: Option<u8>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(WorkoutLog, "workout_logs", "WorkoutLog");

fn validate_workout_times(log: &WorkoutLog) -> Result<(), ValidationError> {
    if let Some(end) = log.end_time {
        if end < log.start_time {
            return Err(error(
                "end_before_start",
                "Workout cannot end before it starts",
            ));
        }
        if let Some(duration) = log.duration_seconds {
            let elapsed = (end - log.start_time).num_seconds();
            if (elapsed - duration).abs() > DURATION_TOLERANCE_SECONDS {
                return Err(error(
                    "duration_mismatch",
                    format!(
                        "Duration {}s does not match elapsed time {}s",
                        duration, elapsed
                    ),
                ));
            }
        }
    }
    if matches!(log.duration_seconds, Some(d) if d < 0) {
        return Err(error("negative_duration", "Duration cannot be negative"));
    }
    Ok(())
}

impl WorkoutLog {
    pub fn start(
        profile_id: Uuid,
        session_name: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> ApplicationResult<Self> {
        let now = Utc::now();
        let log = Self {
            id: Uuid::new_v4(),
            profile_id,
            training_plan_id: None,
            training_plan_name: None,
            session_id: None,
            session_name: session_name.into(),
            performed_group_ids: Vec::new(),
            start_time,
            end_time: None,
            duration_seconds: None,
            total_volume: None,
            user_rating: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        log.validate()?;
        Ok(log)
    }

    pub fn with_source(
        &self,
        training_plan: Option<(Uuid, String)>,
        session_id: Option<Uuid>,
    ) -> ApplicationResult<Self> {
        let (training_plan_id, training_plan_name) = match training_plan {
            Some((id, name)) => (Some(id), Some(name)),
            None => (None, None),
        };
        let updated = Self {
            training_plan_id,
            training_plan_name,
            session_id,
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }

    pub fn with_performed_group(&self, group_id: Uuid) -> ApplicationResult<Self> {
        let mut performed_group_ids = self.performed_group_ids.clone();
        performed_group_ids.push(group_id);
        let updated = Self {
            performed_group_ids,
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }

    /// Close the workout, deriving duration from the end time
    pub fn finished(
        &self,
        end_time: DateTime<Utc>,
        total_volume: f64,
        user_rating: Option<u8>,
        notes: Option<String>,
    ) -> ApplicationResult<Self> {
        if self.is_finished() {
            return Err(ApplicationError::Conflict(format!(
                "Workout {} is already finished",
                self.id
            )));
        }
        let updated = Self {
            end_time: Some(end_time),
            duration_seconds: Some((end_time - self.start_time).num_seconds()),
            total_volume: Some(total_volume),
            user_rating,
            notes: notes.or_else(|| self.notes.clone()),
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }
}

// ============================================================================
// Performed group
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PerformedGroupLog {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub group_type: GroupType,
    #[validate(custom(function = "unique_ids"))]
    pub performed_exercise_ids: Vec<Uuid>,
    pub actual_rest_seconds: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(PerformedGroupLog, "performed_groups", "PerformedGroupLog");

impl PerformedGroupLog {
    pub fn new(profile_id: Uuid, group_type: GroupType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            profile_id,
            group_type,
            performed_exercise_ids: Vec::new(),
            actual_rest_seconds: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_performed_exercise(&self, exercise_log_id: Uuid) -> ApplicationResult<Self> {
        let mut performed_exercise_ids = self.performed_exercise_ids.clone();
        performed_exercise_ids.push(exercise_log_id);
        let updated = Self {
            performed_exercise_ids,
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }
}

// ============================================================================
// Performed exercise
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PerformedExerciseLog {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub exercise_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub exercise_name: String,
    #[validate(custom(function = "unique_ids"))]
    pub performed_set_ids: Vec<Uuid>,
    pub is_skipped: bool,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(PerformedExerciseLog, "performed_exercises", "PerformedExerciseLog");

impl PerformedExerciseLog {
    pub fn new(
        profile_id: Uuid,
        exercise_id: Uuid,
        exercise_name: impl Into<String>,
    ) -> ApplicationResult<Self> {
        let now = Utc::now();
        let log = Self {
            id: Uuid::new_v4(),
            profile_id,
            exercise_id,
            exercise_name: exercise_name.into(),
            performed_set_ids: Vec::new(),
            is_skipped: false,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        log.validate()?;
        Ok(log)
    }

    pub fn with_performed_set(&self, set_id: Uuid) -> ApplicationResult<Self> {
        let mut performed_set_ids = self.performed_set_ids.clone();
        performed_set_ids.push(set_id);
        let updated = Self {
            performed_set_ids,
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }

    pub fn skipped(&self, notes: Option<String>) -> Self {
        Self {
            is_skipped: true,
            notes: notes.or_else(|| self.notes.clone()),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

// ============================================================================
// Performed set
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_set_numbers"))]
pub struct PerformedSet {
    pub id: Uuid,
    pub profile_id: Uuid,
    #[validate(range(max = 10000))]
    pub reps: u32,
    #[validate(range(min = 0.0, max = 1000.0))]
    pub weight: Option<f64>,
    #[validate(range(min = 1.0, max = 10.0))]
    pub rpe: Option<f64>,
    pub completed: bool,
    pub is_warmup: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(PerformedSet, "performed_sets", "PerformedSet");

// Range checks pass NaN through
fn validate_set_numbers(set: &PerformedSet) -> Result<(), ValidationError> {
    if set.weight.is_some_and(|w| !w.is_finite()) {
        return Err(error("invalid_weight", "Weight must be a finite number"));
    }
    if set.rpe.is_some_and(|r| !r.is_finite()) {
        return Err(error("invalid_rpe", "RPE must be a finite number"));
    }
    Ok(())
}

impl PerformedSet {
    /// A planned set, not yet done
    pub fn planned(profile_id: Uuid, reps: u32, weight: Option<f64>) -> ApplicationResult<Self> {
        let now = Utc::now();
        let set = Self {
            id: Uuid::new_v4(),
            profile_id,
            reps,
            weight,
            rpe: None,
            completed: false,
            is_warmup: false,
            created_at: now,
            updated_at: now,
        };
        set.validate()?;
        Ok(set)
    }

    pub fn completed_with(
        &self,
        reps: u32,
        weight: Option<f64>,
        rpe: Option<f64>,
    ) -> ApplicationResult<Self> {
        let updated = Self {
            reps,
            weight,
            rpe,
            completed: true,
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }

    pub fn as_warmup(&self) -> Self {
        Self {
            is_warmup: true,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Load moved by this set; warm-ups and incomplete sets count zero
    pub fn volume(&self) -> f64 {
        if !self.completed || self.is_warmup {
            return 0.0;
        }
        self.weight.unwrap_or(0.0) * f64::from(self.reps)
    }
}
