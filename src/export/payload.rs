use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    AppliedExercise, Exercise, ExerciseGroup, HeightRecord, MaxLog, PerformedExerciseLog,
    PerformedGroupLog, PerformedSet, Profile, Session, TrainingPlan, WeightRecord, WorkoutLog,
};

/// Format version written by this build
pub const EXPORT_VERSION: u32 = 1;

/// Everything one profile owns, as written to an export file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub profile: Profile,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub applied_exercises: Vec<AppliedExercise>,
    #[serde(default)]
    pub exercise_groups: Vec<ExerciseGroup>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub training_plans: Vec<TrainingPlan>,
    #[serde(default)]
    pub workout_logs: Vec<WorkoutLog>,
    #[serde(default)]
    pub performed_groups: Vec<PerformedGroupLog>,
    #[serde(default)]
    pub performed_exercises: Vec<PerformedExerciseLog>,
    #[serde(default)]
    pub performed_sets: Vec<PerformedSet>,
    #[serde(default)]
    pub weight_records: Vec<WeightRecord>,
    #[serde(default)]
    pub height_records: Vec<HeightRecord>,
    #[serde(default)]
    pub max_logs: Vec<MaxLog>,
}

impl ExportPayload {
    pub fn new(profile: Profile) -> Self {
        Self {
            version: EXPORT_VERSION,
            exported_at: Utc::now(),
            profile,
            exercises: Vec::new(),
            applied_exercises: Vec::new(),
            exercise_groups: Vec::new(),
            sessions: Vec::new(),
            training_plans: Vec::new(),
            workout_logs: Vec::new(),
            performed_groups: Vec::new(),
            performed_exercises: Vec::new(),
            performed_sets: Vec::new(),
            weight_records: Vec::new(),
            height_records: Vec::new(),
            max_logs: Vec::new(),
        }
    }

    /// Owned records, the profile itself not counted
    pub fn record_count(&self) -> usize {
        self.exercises.len()
            + self.applied_exercises.len()
            + self.exercise_groups.len()
            + self.sessions.len()
            + self.training_plans.len()
            + self.workout_logs.len()
            + self.performed_groups.len()
            + self.performed_exercises.len()
            + self.performed_sets.len()
            + self.weight_records.len()
            + self.height_records.len()
            + self.max_logs.len()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Hand every record to `profile_id`
    pub fn with_owner(mut self, profile_id: Uuid) -> Self {
        self.profile.id = profile_id;
        self.exercises.iter_mut().for_each(|r| r.profile_id = profile_id);
        self.applied_exercises.iter_mut().for_each(|r| r.profile_id = profile_id);
        self.exercise_groups.iter_mut().for_each(|r| r.profile_id = profile_id);
        self.sessions.iter_mut().for_each(|r| r.profile_id = profile_id);
        self.training_plans.iter_mut().for_each(|r| r.profile_id = profile_id);
        self.workout_logs.iter_mut().for_each(|r| r.profile_id = profile_id);
        self.performed_groups.iter_mut().for_each(|r| r.profile_id = profile_id);
        self.performed_exercises.iter_mut().for_each(|r| r.profile_id = profile_id);
        self.performed_sets.iter_mut().for_each(|r| r.profile_id = profile_id);
        self.weight_records.iter_mut().for_each(|r| r.profile_id = profile_id);
        self.height_records.iter_mut().for_each(|r| r.profile_id = profile_id);
        self.max_logs.iter_mut().for_each(|r| r.profile_id = profile_id);
        self
    }

    /// Give every record a new id and rewrite references to match.
    /// References to ids outside the payload are left as they are.
    pub fn with_fresh_ids(mut self) -> Self {
        let mut ids = IdMap::default();
        ids.assign(self.exercises.iter().map(|r| r.id));
        ids.assign(self.applied_exercises.iter().map(|r| r.id));
        ids.assign(self.exercise_groups.iter().map(|r| r.id));
        ids.assign(self.sessions.iter().map(|r| r.id));
        ids.assign(self.training_plans.iter().map(|r| r.id));
        ids.assign(self.workout_logs.iter().map(|r| r.id));
        ids.assign(self.performed_groups.iter().map(|r| r.id));
        ids.assign(self.performed_exercises.iter().map(|r| r.id));
        ids.assign(self.performed_sets.iter().map(|r| r.id));
        ids.assign(self.weight_records.iter().map(|r| r.id));
        ids.assign(self.height_records.iter().map(|r| r.id));
        ids.assign(self.max_logs.iter().map(|r| r.id));

        for r in &mut self.exercises {
            r.id = ids.get(r.id);
            ids.rewrite(&mut r.substitution_ids);
        }
        for r in &mut self.applied_exercises {
            r.id = ids.get(r.id);
            r.exercise_id = ids.get(r.exercise_id);
        }
        for r in &mut self.exercise_groups {
            r.id = ids.get(r.id);
            ids.rewrite(&mut r.applied_exercise_ids);
        }
        for r in &mut self.sessions {
            r.id = ids.get(r.id);
            ids.rewrite(&mut r.group_ids);
        }
        for r in &mut self.training_plans {
            r.id = ids.get(r.id);
            ids.rewrite(&mut r.session_ids);
        }
        for r in &mut self.workout_logs {
            r.id = ids.get(r.id);
            r.training_plan_id = r.training_plan_id.map(|id| ids.get(id));
            r.session_id = r.session_id.map(|id| ids.get(id));
            ids.rewrite(&mut r.performed_group_ids);
        }
        for r in &mut self.performed_groups {
            r.id = ids.get(r.id);
            ids.rewrite(&mut r.performed_exercise_ids);
        }
        for r in &mut self.performed_exercises {
            r.id = ids.get(r.id);
            r.exercise_id = ids.get(r.exercise_id);
            ids.rewrite(&mut r.performed_set_ids);
        }
        for r in &mut self.performed_sets {
            r.id = ids.get(r.id);
        }
        for r in &mut self.weight_records {
            r.id = ids.get(r.id);
        }
        for r in &mut self.height_records {
            r.id = ids.get(r.id);
        }
        for r in &mut self.max_logs {
            r.id = ids.get(r.id);
            r.exercise_id = ids.get(r.exercise_id);
        }
        self
    }
}

#[derive(Default)]
struct IdMap(HashMap<Uuid, Uuid>);

impl IdMap {
    fn assign(&mut self, ids: impl Iterator<Item = Uuid>) {
        for id in ids {
            self.0.entry(id).or_insert_with(Uuid::new_v4);
        }
    }

    fn get(&self, id: Uuid) -> Uuid {
        self.0.get(&id).copied().unwrap_or(id)
    }

    fn rewrite(&self, ids: &mut [Uuid]) {
        for id in ids {
            *id = self.get(*id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewExercise, SetConfiguration};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fresh_ids_keep_references_consistent() {
        let profile = Profile::new("Alex").unwrap();
        let squat = Exercise::new(profile.id, NewExercise::strength("Squat")).unwrap();
        let applied = AppliedExercise::new(
            profile.id,
            squat.id,
            SetConfiguration::standard(3, 5, Some(100.0)),
            120,
        )
        .unwrap();
        let group = ExerciseGroup::new(profile.id, crate::models::GroupType::Single, None)
            .unwrap()
            .with_applied_exercise(applied.id)
            .unwrap();

        let mut payload = ExportPayload::new(profile);
        payload.exercises.push(squat.clone());
        payload.applied_exercises.push(applied.clone());
        payload.exercise_groups.push(group.clone());

        let fresh = payload.with_fresh_ids();
        assert_ne!(fresh.exercises[0].id, squat.id);
        assert_ne!(fresh.applied_exercises[0].id, applied.id);
        assert_eq!(fresh.applied_exercises[0].exercise_id, fresh.exercises[0].id);
        assert_eq!(
            fresh.exercise_groups[0].applied_exercise_ids,
            vec![fresh.applied_exercises[0].id]
        );
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let profile = Profile::new("Alex").unwrap();
        let json = serde_json::json!({
            "version": 1,
            "exported_at": Utc::now(),
            "profile": profile,
        });
        let payload: ExportPayload = serde_json::from_value(json).unwrap();
        assert_eq!(payload.record_count(), 0);
        assert_eq!(payload.profile, profile);
    }
}
