use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::entity::impl_entity;
use super::validation::{error, not_blank, unique_ids};
use crate::error::{ApplicationError, ApplicationResult};

// ============================================================================
// Training plan
// ============================================================================

/// Ordered rotation of sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_plan_index"))]
pub struct TrainingPlan {
    pub id: Uuid,
    pub profile_id: Uuid,
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(custom(function = "unique_ids"))]
    pub session_ids: Vec<Uuid>,
    pub is_archived: bool,
    pub current_session_index: usize,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(TrainingPlan, "training_plans", "TrainingPlan");

fn validate_plan_index(plan: &TrainingPlan) -> Result<(), ValidationError> {
    if !plan.session_ids.is_empty() && plan.current_session_index >= plan.session_ids.len() {
        return Err(error(
            "session_index_out_of_range",
            "Current session index is past the last session",
        ));
    }
    Ok(())
}

impl TrainingPlan {
    pub fn new(
        profile_id: Uuid,
        name: impl Into<String>,
        description: Option<String>,
    ) -> ApplicationResult<Self> {
        let now = Utc::now();
        let plan = Self {
            id: Uuid::new_v4(),
            profile_id,
            name: name.into().trim().to_string(),
            description,
            session_ids: Vec::new(),
            is_archived: false,
            current_session_index: 0,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        plan.validate()?;
        Ok(plan)
    }

    pub fn with_details(
        &self,
        name: Option<String>,
        description: Option<String>,
        notes: Option<String>,
    ) -> ApplicationResult<Self> {
        let updated = Self {
            name: name
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| self.name.clone()),
            description: description.or_else(|| self.description.clone()),
            notes: notes.or_else(|| self.notes.clone()),
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }

    pub fn with_session(&self, session_id: Uuid) -> ApplicationResult<Self> {
        let mut session_ids = self.session_ids.clone();
        session_ids.push(session_id);
        self.with_session_ids(session_ids)
    }

    pub fn without_session(&self, session_id: Uuid) -> ApplicationResult<Self> {
        let session_ids = self
            .session_ids
            .iter()
            .copied()
            .filter(|id| *id != session_id)
            .collect();
        self.with_session_ids(session_ids)
    }

    /// Replace the session order. The new order must be a permutation of the current one.
    pub fn with_session_order(&self, order: Vec<Uuid>) -> ApplicationResult<Self> {
        let mut current = self.session_ids.clone();
        let mut proposed = order.clone();
        current.sort();
        proposed.sort();
        if current != proposed {
            return Err(ApplicationError::validation(
                "Session order must contain exactly the plan's sessions",
            ));
        }
        self.with_session_ids(order)
    }

    fn with_session_ids(&self, session_ids: Vec<Uuid>) -> ApplicationResult<Self> {
        let current_session_index = if session_ids.is_empty() {
            0
        } else {
            self.current_session_index.min(session_ids.len() - 1)
        };
        let updated = Self {
            session_ids,
            current_session_index,
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }

    pub fn with_archived(&self, is_archived: bool) -> Self {
        Self {
            is_archived,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Move the rotation to the next session, wrapping after the last one
    pub fn advanced(&self) -> Self {
        let current_session_index = if self.session_ids.is_empty() {
            0
        } else {
            (self.current_session_index + 1) % self.session_ids.len()
        };
        Self {
            current_session_index,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    pub fn current_session_id(&self) -> Option<Uuid> {
        self.session_ids.get(self.current_session_index).copied()
    }
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Session {
    pub id: Uuid,
    pub profile_id: Uuid,
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "unique_ids"))]
    pub group_ids: Vec<Uuid>,
    pub day_of_week: Option<Weekday>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(Session, "sessions", "Session");

impl Session {
    pub fn new(
        profile_id: Uuid,
        name: impl Into<String>,
        day_of_week: Option<Weekday>,
    ) -> ApplicationResult<Self> {
        let now = Utc::now();
        let session = Self {
            id: Uuid::new_v4(),
            profile_id,
            name: name.into().trim().to_string(),
            group_ids: Vec::new(),
            day_of_week,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        session.validate()?;
        Ok(session)
    }

    pub fn with_group(&self, group_id: Uuid) -> ApplicationResult<Self> {
        let mut group_ids = self.group_ids.clone();
        group_ids.push(group_id);
        let updated = Self {
            group_ids,
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }

    pub fn without_group(&self, group_id: Uuid) -> Self {
        Self {
            group_ids: self
                .group_ids
                .iter()
                .copied()
                .filter(|id| *id != group_id)
                .collect(),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    pub fn with_name(&self, name: impl Into<String>) -> ApplicationResult<Self> {
        let updated = Self {
            name: name.into().trim().to_string(),
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }
}

// ============================================================================
// Exercise group
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    Single,
    Superset,
    Circuit,
    Emom,
    Amrap,
    Tabata,
}

impl GroupType {
    /// Group types that run against a clock
    pub fn is_timed(self) -> bool {
        matches!(self, GroupType::Emom | GroupType::Amrap)
    }
}

/// Exercises performed together inside a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_group_shape"))]
pub struct ExerciseGroup {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub group_type: GroupType,
    #[validate(custom(function = "unique_ids"))]
    pub applied_exercise_ids: Vec<Uuid>,
    pub rest_between_exercises: Option<u32>,
    pub rest_after_group: Option<u32>,
    pub duration_minutes: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub rounds: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(ExerciseGroup, "exercise_groups", "ExerciseGroup");

fn validate_group_shape(group: &ExerciseGroup) -> Result<(), ValidationError> {
    if group.group_type == GroupType::Single && group.applied_exercise_ids.len() > 1 {
        return Err(error(
            "single_group_overflow",
            "A single group holds at most one exercise",
        ));
    }
    if group.group_type.is_timed() && group.duration_minutes.unwrap_or(0) == 0 {
        return Err(error(
            "missing_duration",
            "EMOM and AMRAP groups need a duration",
        ));
    }
    Ok(())
}

impl ExerciseGroup {
    pub fn new(
        profile_id: Uuid,
        group_type: GroupType,
        duration_minutes: Option<u32>,
    ) -> ApplicationResult<Self> {
        let now = Utc::now();
        let group = Self {
            id: Uuid::new_v4(),
            profile_id,
            group_type,
            applied_exercise_ids: Vec::new(),
            rest_between_exercises: None,
            rest_after_group: None,
            duration_minutes,
            rounds: None,
            created_at: now,
            updated_at: now,
        };
        group.validate()?;
        Ok(group)
    }

    pub fn with_applied_exercise(&self, applied_exercise_id: Uuid) -> ApplicationResult<Self> {
        let mut applied_exercise_ids = self.applied_exercise_ids.clone();
        applied_exercise_ids.push(applied_exercise_id);
        let updated = Self {
            applied_exercise_ids,
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }

    pub fn without_applied_exercise(&self, applied_exercise_id: Uuid) -> Self {
        Self {
            applied_exercise_ids: self
                .applied_exercise_ids
                .iter()
                .copied()
                .filter(|id| *id != applied_exercise_id)
                .collect(),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    pub fn with_rest(
        &self,
        rest_between_exercises: Option<u32>,
        rest_after_group: Option<u32>,
    ) -> Self {
        Self {
            rest_between_exercises,
            rest_after_group,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    pub fn with_rounds(&self, rounds: Option<u32>) -> ApplicationResult<Self> {
        let updated = Self {
            rounds,
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }
}

// ============================================================================
// Set configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepRange {
    pub min: u32,
    pub max: u32,
}

impl RepRange {
    pub fn exact(reps: u32) -> Self {
        Self {
            min: reps,
            max: reps,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PyramidMode {
    Ascending,
    Descending,
    /// Up to the peak then back down
    Both,
}

/// How the sets of an applied exercise are laid out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SetConfiguration {
    Standard {
        sets: u32,
        reps: RepRange,
        load: Option<f64>,
    },
    Drop {
        sets: u32,
        reps: RepRange,
        drops: u32,
        drop_percentage: f64,
        load: Option<f64>,
    },
    Pyramidal {
        start_reps: u32,
        end_reps: u32,
        step: u32,
        mode: PyramidMode,
        load: Option<f64>,
    },
    Timed {
        sets: u32,
        duration_seconds: u32,
    },
}

/// One set to perform, derived from a configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedSet {
    pub reps: u32,
    pub weight: Option<f64>,
}

const MAX_REPS: u32 = 100;

fn check_rep_count(reps: u32) -> Result<(), ValidationError> {
    if reps == 0 || reps > MAX_REPS {
        return Err(error("invalid_reps", "Reps must be between 1 and 100"));
    }
    Ok(())
}

fn check_reps(reps: &RepRange) -> Result<(), ValidationError> {
    check_rep_count(reps.min)?;
    check_rep_count(reps.max)?;
    if reps.min > reps.max {
        return Err(error(
            "invalid_rep_range",
            "Rep range minimum exceeds maximum",
        ));
    }
    Ok(())
}

fn check_sets(sets: u32) -> Result<(), ValidationError> {
    if sets == 0 || sets > 50 {
        return Err(error("invalid_sets", "Sets must be between 1 and 50"));
    }
    Ok(())
}

fn check_load(load: Option<f64>) -> Result<(), ValidationError> {
    match load {
        Some(l) if !(0.0..=1000.0).contains(&l) => {
            Err(error("invalid_load", "Load must be between 0 and 1000 kg"))
        }
        _ => Ok(()),
    }
}

impl SetConfiguration {
    pub fn standard(sets: u32, reps: u32, load: Option<f64>) -> Self {
        SetConfiguration::Standard {
            sets,
            reps: RepRange::exact(reps),
            load,
        }
    }

    pub fn check(&self) -> Result<(), ValidationError> {
        match self {
            SetConfiguration::Standard { sets, reps, load } => {
                check_sets(*sets)?;
                check_reps(reps)?;
                check_load(*load)
            }
            SetConfiguration::Drop {
                sets,
                reps,
                drops,
                drop_percentage,
                load,
            } => {
                check_sets(*sets)?;
                check_reps(reps)?;
                check_load(*load)?;
                if *drops == 0 || *drops > 5 {
                    return Err(error("invalid_drops", "Drops must be between 1 and 5"));
                }
                if !(*drop_percentage > 0.0 && *drop_percentage < 100.0) {
                    return Err(error(
                        "invalid_drop_percentage",
                        "Drop percentage must be between 0 and 100",
                    ));
                }
                Ok(())
            }
            SetConfiguration::Pyramidal {
                start_reps,
                end_reps,
                step,
                mode,
                load,
            } => {
                check_load(*load)?;
                check_rep_count(*start_reps)?;
                check_rep_count(*end_reps)?;
                if *step == 0 || *step > start_reps.abs_diff(*end_reps) {
                    return Err(error(
                        "invalid_step",
                        "Pyramid step must be between 1 and the rep difference",
                    ));
                }
                let ordered = match mode {
                    PyramidMode::Ascending | PyramidMode::Both => start_reps < end_reps,
                    PyramidMode::Descending => start_reps > end_reps,
                };
                if !ordered {
                    return Err(error(
                        "invalid_pyramid_order",
                        format!(
                            "{:?} pyramid cannot go from {} to {} reps",
                            mode, start_reps, end_reps
                        ),
                    ));
                }
                Ok(())
            }
            SetConfiguration::Timed {
                sets,
                duration_seconds,
            } => {
                check_sets(*sets)?;
                if *duration_seconds == 0 {
                    return Err(error("invalid_duration", "Duration must be positive"));
                }
                Ok(())
            }
        }
    }

    /// Expand into individual sets. Rep ranges target their lower bound.
    pub fn planned_sets(&self) -> Vec<PlannedSet> {
        match self {
            SetConfiguration::Standard { sets, reps, load } => (0..*sets)
                .map(|_| PlannedSet {
                    reps: reps.min,
                    weight: *load,
                })
                .collect(),
            SetConfiguration::Drop {
                sets,
                reps,
                drops,
                drop_percentage,
                load,
            } => {
                let mut planned = Vec::new();
                for _ in 0..*sets {
                    let mut weight = *load;
                    planned.push(PlannedSet {
                        reps: reps.min,
                        weight,
                    });
                    for _ in 0..*drops {
                        weight = weight.map(|w| w * (1.0 - drop_percentage / 100.0));
                        planned.push(PlannedSet {
                            reps: reps.min,
                            weight,
                        });
                    }
                }
                planned
            }
            SetConfiguration::Pyramidal {
                start_reps,
                end_reps,
                step,
                mode,
                load,
            } => pyramid_reps(*start_reps, *end_reps, *step, *mode)
                .into_iter()
                .map(|reps| PlannedSet {
                    reps,
                    weight: *load,
                })
                .collect(),
            SetConfiguration::Timed {
                sets,
                duration_seconds,
            } => (0..*sets)
                .map(|_| PlannedSet {
                    reps: *duration_seconds,
                    weight: None,
                })
                .collect(),
        }
    }

    pub fn total_sets(&self) -> usize {
        self.planned_sets().len()
    }
}

fn pyramid_reps(start: u32, end: u32, step: u32, mode: PyramidMode) -> Vec<u32> {
    let walk = |from: u32, to: u32| -> Vec<u32> {
        let mut reps = Vec::new();
        let mut current = from;
        if from <= to {
            while current < to {
                reps.push(current);
                current = current.saturating_add(step.max(1));
            }
        } else {
            while current > to {
                reps.push(current);
                current = current.saturating_sub(step.max(1)).max(to);
            }
        }
        reps.push(to);
        reps
    };

    match mode {
        PyramidMode::Ascending | PyramidMode::Descending => walk(start, end),
        PyramidMode::Both => {
            let mut reps = walk(start, end);
            let mut down = walk(end, start);
            down.remove(0);
            reps.append(&mut down);
            reps
        }
    }
}

// ============================================================================
// Applied exercise
// ============================================================================

/// An exercise placed in a group with its set prescription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AppliedExercise {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub exercise_id: Uuid,
    #[validate(custom(function = "validate_set_configuration"))]
    pub set_configuration: SetConfiguration,
    #[validate(range(max = 3600))]
    pub rest_seconds: u32,
    #[validate(range(min = 1.0, max = 10.0))]
    pub target_rpe: Option<f64>,
    #[validate(length(max = 1000))]
    pub execution_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(AppliedExercise, "applied_exercises", "AppliedExercise");

fn validate_set_configuration(config: &SetConfiguration) -> Result<(), ValidationError> {
    config.check()
}

impl AppliedExercise {
    pub fn new(
        profile_id: Uuid,
        exercise_id: Uuid,
        set_configuration: SetConfiguration,
        rest_seconds: u32,
    ) -> ApplicationResult<Self> {
        let now = Utc::now();
        let applied = Self {
            id: Uuid::new_v4(),
            profile_id,
            exercise_id,
            set_configuration,
            rest_seconds,
            target_rpe: None,
            execution_notes: None,
            created_at: now,
            updated_at: now,
        };
        applied.validate()?;
        Ok(applied)
    }

    pub fn with_set_configuration(
        &self,
        set_configuration: SetConfiguration,
    ) -> ApplicationResult<Self> {
        let updated = Self {
            set_configuration,
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }

    pub fn with_target_rpe(&self, target_rpe: Option<f64>) -> ApplicationResult<Self> {
        let updated = Self {
            target_rpe,
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pyramid(start: u32, end: u32, step: u32, mode: PyramidMode) -> SetConfiguration {
        SetConfiguration::Pyramidal {
            start_reps: start,
            end_reps: end,
            step,
            mode,
            load: Some(60.0),
        }
    }

    #[test]
    fn test_pyramid_ordering_constraints() {
        assert!(pyramid(6, 12, 2, PyramidMode::Ascending).check().is_ok());
        assert!(pyramid(12, 6, 2, PyramidMode::Ascending).check().is_err());
        assert!(pyramid(12, 6, 2, PyramidMode::Descending).check().is_ok());
        assert!(pyramid(6, 12, 2, PyramidMode::Descending).check().is_err());
        assert!(pyramid(8, 8, 1, PyramidMode::Both).check().is_err());
        assert!(pyramid(6, 12, 0, PyramidMode::Ascending).check().is_err());
    }

    #[test]
    fn test_pyramid_bounds() {
        assert!(pyramid(1, 10, u32::MAX, PyramidMode::Ascending).check().is_err());
        assert!(pyramid(1, 10, 10, PyramidMode::Ascending).check().is_err());
        assert!(pyramid(1, 10, 9, PyramidMode::Ascending).check().is_ok());
        assert!(pyramid(1, 1_000_000_000, 1, PyramidMode::Ascending).check().is_err());

        // Expansion stays finite even for unchecked values
        let reps: Vec<u32> = pyramid(1, u32::MAX, u32::MAX, PyramidMode::Ascending)
            .planned_sets()
            .iter()
            .map(|s| s.reps)
            .collect();
        assert_eq!(reps, vec![1, u32::MAX]);
    }

    #[test]
    fn test_rep_range_is_capped() {
        let config = SetConfiguration::Standard {
            sets: 3,
            reps: RepRange { min: 8, max: 500 },
            load: None,
        };
        assert!(config.check().is_err());
    }

    #[test]
    fn test_pyramid_expansion() {
        let reps = |c: SetConfiguration| -> Vec<u32> {
            c.planned_sets().iter().map(|s| s.reps).collect()
        };

        assert_eq!(reps(pyramid(6, 12, 2, PyramidMode::Ascending)), vec![6, 8, 10, 12]);
        assert_eq!(reps(pyramid(12, 7, 2, PyramidMode::Descending)), vec![12, 10, 8, 7]);
        assert_eq!(reps(pyramid(6, 10, 2, PyramidMode::Both)), vec![6, 8, 10, 8, 6]);
    }

    #[test]
    fn test_drop_set_expansion() {
        let config = SetConfiguration::Drop {
            sets: 2,
            reps: RepRange::exact(10),
            drops: 2,
            drop_percentage: 20.0,
            load: Some(100.0),
        };
        let planned = config.planned_sets();

        assert_eq!(planned.len(), 6);
        assert_eq!(planned[0].weight, Some(100.0));
        assert!((planned[1].weight.unwrap() - 80.0).abs() < 1e-9);
        assert!((planned[2].weight.unwrap() - 64.0).abs() < 1e-9);
        assert_eq!(planned[3].weight, Some(100.0));
    }

    #[test]
    fn test_applied_exercise_rejects_bad_configuration() {
        let bad = SetConfiguration::Standard {
            sets: 3,
            reps: RepRange { min: 12, max: 8 },
            load: None,
        };
        assert!(AppliedExercise::new(Uuid::new_v4(), Uuid::new_v4(), bad, 90).is_err());

        let good = SetConfiguration::standard(3, 8, Some(80.0));
        assert!(AppliedExercise::new(Uuid::new_v4(), Uuid::new_v4(), good, 90).is_ok());
    }

    #[test]
    fn test_plan_rotation_wraps() {
        let plan = TrainingPlan::new(Uuid::new_v4(), "PPL", None).unwrap();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let plan = plan.with_session(a).unwrap().with_session(b).unwrap();

        assert_eq!(plan.current_session_id(), Some(a));
        let plan = plan.advanced();
        assert_eq!(plan.current_session_id(), Some(b));
        let plan = plan.advanced();
        assert_eq!(plan.current_session_id(), Some(a));
    }

    #[test]
    fn test_plan_rejects_duplicate_sessions() {
        let plan = TrainingPlan::new(Uuid::new_v4(), "Upper/Lower", None).unwrap();
        let id = Uuid::new_v4();
        let plan = plan.with_session(id).unwrap();
        assert!(plan.with_session(id).is_err());
    }

    #[test]
    fn test_session_order_must_be_permutation() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let plan = TrainingPlan::new(Uuid::new_v4(), "Plan", None)
            .unwrap()
            .with_session(a)
            .unwrap()
            .with_session(b)
            .unwrap();

        assert_eq!(plan.with_session_order(vec![b, a]).unwrap().session_ids, vec![b, a]);
        assert!(plan.with_session_order(vec![a]).is_err());
        assert!(plan.with_session_order(vec![a, Uuid::new_v4()]).is_err());
    }

    #[test]
    fn test_group_shape() {
        let profile_id = Uuid::new_v4();
        assert!(ExerciseGroup::new(profile_id, GroupType::Emom, None).is_err());
        assert!(ExerciseGroup::new(profile_id, GroupType::Emom, Some(12)).is_ok());

        let single = ExerciseGroup::new(profile_id, GroupType::Single, None).unwrap();
        let single = single.with_applied_exercise(Uuid::new_v4()).unwrap();
        assert!(single.with_applied_exercise(Uuid::new_v4()).is_err());
    }
}
