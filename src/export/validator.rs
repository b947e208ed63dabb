//! Referential integrity checks over an export payload.
//!
//! Every reference is resolved against the ids present in the payload.
//! A dangling reference is reported once per source record, field and
//! target, however many times the source repeats it. Each record is also
//! run through its own field validation, since a hand-edited file can hold
//! values the application would never write.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::payload::{ExportPayload, EXPORT_VERSION};
use crate::models::{
    AppliedExercise, Entity, Exercise, ExerciseGroup, MaxLog, PerformedExerciseLog,
    PerformedGroupLog, Session, TrainingPlan, WorkoutLog,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    UnsupportedVersion,
    DuplicateId,
    DuplicateReference,
    DanglingReference,
    OwnershipMismatch,
    InvalidRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityIssue {
    pub severity: Severity,
    pub kind: IssueKind,
    /// Collection holding the offending record
    pub collection: String,
    pub record_id: Option<Uuid>,
    pub field: Option<String>,
    pub target_id: Option<Uuid>,
    pub message: String,
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "[{}] {}: {}", level, self.collection, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<IntegrityIssue>,
}

impl ValidationReport {
    /// No errors; warnings are allowed
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &IntegrityIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &IntegrityIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error(s), {} warning(s)",
            self.error_count(),
            self.warning_count()
        )
    }
}

struct Checker {
    owner: Uuid,
    issues: Vec<IntegrityIssue>,
    reported: HashSet<(&'static str, Uuid, &'static str, Uuid)>,
}

impl Checker {
    fn push(&mut self, issue: IntegrityIssue) {
        self.issues.push(issue);
    }

    fn record<T: Entity + Validate>(&mut self, record: &T) {
        if let Err(errors) = record.validate() {
            self.push(IntegrityIssue {
                severity: Severity::Error,
                kind: IssueKind::InvalidRecord,
                collection: T::TABLE.to_string(),
                record_id: Some(record.id()),
                field: None,
                target_id: None,
                message: format!("{} {} is invalid: {}", T::NAME, record.id(), errors),
            });
        }
    }

    /// Duplicate ids, ownership and field rules for one collection; returns the id set
    fn collection<T: Entity + Validate>(&mut self, records: &[T]) -> HashSet<Uuid> {
        let mut ids = HashSet::with_capacity(records.len());
        for record in records {
            let id = record.id();
            if !ids.insert(id) {
                self.push(IntegrityIssue {
                    severity: Severity::Error,
                    kind: IssueKind::DuplicateId,
                    collection: T::TABLE.to_string(),
                    record_id: Some(id),
                    field: None,
                    target_id: None,
                    message: format!("{} {} appears more than once", T::NAME, id),
                });
            }
            if record.profile_id() != self.owner {
                self.push(IntegrityIssue {
                    severity: Severity::Error,
                    kind: IssueKind::OwnershipMismatch,
                    collection: T::TABLE.to_string(),
                    record_id: Some(id),
                    field: Some("profile_id".to_string()),
                    target_id: Some(record.profile_id()),
                    message: format!(
                        "{} {} belongs to profile {}, not {}",
                        T::NAME,
                        id,
                        record.profile_id(),
                        self.owner
                    ),
                });
            }
            self.record(record);
        }
        ids
    }

    fn reference(
        &mut self,
        collection: &'static str,
        source: Uuid,
        field: &'static str,
        target: Uuid,
        targets: &HashSet<Uuid>,
        severity: Severity,
    ) {
        if targets.contains(&target) || !self.reported.insert((collection, source, field, target)) {
            return;
        }
        self.push(IntegrityIssue {
            severity,
            kind: IssueKind::DanglingReference,
            collection: collection.to_string(),
            record_id: Some(source),
            field: Some(field.to_string()),
            target_id: Some(target),
            message: format!("{} of {} points at missing {}", field, source, target),
        });
    }

    fn references(
        &mut self,
        collection: &'static str,
        source: Uuid,
        field: &'static str,
        ids: &[Uuid],
        targets: &HashSet<Uuid>,
    ) {
        let mut seen = HashSet::with_capacity(ids.len());
        let mut duplicates = HashSet::new();
        for id in ids {
            if !seen.insert(*id) && duplicates.insert(*id) {
                self.push(IntegrityIssue {
                    severity: Severity::Error,
                    kind: IssueKind::DuplicateReference,
                    collection: collection.to_string(),
                    record_id: Some(source),
                    field: Some(field.to_string()),
                    target_id: Some(*id),
                    message: format!("{} of {} lists {} more than once", field, source, id),
                });
            }
            self.reference(collection, source, field, *id, targets, Severity::Error);
        }
    }
}

/// Check a payload for structural and referential problems
pub fn validate_export(payload: &ExportPayload) -> ValidationReport {
    let mut checker = Checker {
        owner: payload.profile.id,
        issues: Vec::new(),
        reported: HashSet::new(),
    };

    if payload.version != EXPORT_VERSION {
        checker.push(IntegrityIssue {
            severity: Severity::Error,
            kind: IssueKind::UnsupportedVersion,
            collection: "payload".to_string(),
            record_id: None,
            field: Some("version".to_string()),
            target_id: None,
            message: format!(
                "Export version {} is not supported (expected {})",
                payload.version, EXPORT_VERSION
            ),
        });
    }

    checker.record(&payload.profile);
    let exercises = checker.collection(&payload.exercises);
    let applied = checker.collection(&payload.applied_exercises);
    let groups = checker.collection(&payload.exercise_groups);
    let sessions = checker.collection(&payload.sessions);
    let plans = checker.collection(&payload.training_plans);
    checker.collection(&payload.workout_logs);
    let performed_groups = checker.collection(&payload.performed_groups);
    let performed_exercises = checker.collection(&payload.performed_exercises);
    let performed_sets = checker.collection(&payload.performed_sets);
    checker.collection(&payload.weight_records);
    checker.collection(&payload.height_records);
    checker.collection(&payload.max_logs);

    for plan in &payload.training_plans {
        checker.references(TrainingPlan::TABLE, plan.id, "session_ids", &plan.session_ids, &sessions);
    }
    for session in &payload.sessions {
        checker.references(Session::TABLE, session.id, "group_ids", &session.group_ids, &groups);
    }
    for group in &payload.exercise_groups {
        checker.references(
            ExerciseGroup::TABLE,
            group.id,
            "applied_exercise_ids",
            &group.applied_exercise_ids,
            &applied,
        );
    }
    for a in &payload.applied_exercises {
        checker.reference(
            AppliedExercise::TABLE,
            a.id,
            "exercise_id",
            a.exercise_id,
            &exercises,
            Severity::Error,
        );
    }
    for exercise in &payload.exercises {
        checker.references(
            Exercise::TABLE,
            exercise.id,
            "substitution_ids",
            &exercise.substitution_ids,
            &exercises,
        );
    }
    for workout in &payload.workout_logs {
        checker.references(
            WorkoutLog::TABLE,
            workout.id,
            "performed_group_ids",
            &workout.performed_group_ids,
            &performed_groups,
        );
        // Logs keep plan and session names, so a deleted plan is only a warning
        if let Some(plan_id) = workout.training_plan_id {
            checker.reference(
                WorkoutLog::TABLE,
                workout.id,
                "training_plan_id",
                plan_id,
                &plans,
                Severity::Warning,
            );
        }
        if let Some(session_id) = workout.session_id {
            checker.reference(
                WorkoutLog::TABLE,
                workout.id,
                "session_id",
                session_id,
                &sessions,
                Severity::Warning,
            );
        }
    }
    for group in &payload.performed_groups {
        checker.references(
            PerformedGroupLog::TABLE,
            group.id,
            "performed_exercise_ids",
            &group.performed_exercise_ids,
            &performed_exercises,
        );
    }
    for performed in &payload.performed_exercises {
        checker.references(
            PerformedExerciseLog::TABLE,
            performed.id,
            "performed_set_ids",
            &performed.performed_set_ids,
            &performed_sets,
        );
        checker.reference(
            PerformedExerciseLog::TABLE,
            performed.id,
            "exercise_id",
            performed.exercise_id,
            &exercises,
            Severity::Warning,
        );
    }
    for log in &payload.max_logs {
        checker.reference(
            MaxLog::TABLE,
            log.id,
            "exercise_id",
            log.exercise_id,
            &exercises,
            Severity::Error,
        );
    }

    ValidationReport {
        issues: checker.issues,
    }
}
