use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{ApplicationError, ApplicationResult};
use crate::export::{validate_export, ExportPayload, ValidationReport};
use crate::models::Entity;
use crate::repository::{require, Repository};

use super::Repositories;

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Give every imported record a new id instead of keeping the exported one
    pub regenerate_ids: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub profile_id: Uuid,
    pub records_imported: usize,
    pub warnings: usize,
    pub regenerated_ids: bool,
}

/// Export and import of a profile's data
#[derive(Clone)]
pub struct DataSyncService {
    repos: Repositories,
}

impl DataSyncService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    #[instrument(skip(self))]
    pub async fn export(&self, profile_id: Uuid) -> ApplicationResult<ExportPayload> {
        let repos = &self.repos;
        let profile = require(repos.profiles.as_ref(), profile_id, profile_id).await?;

        let mut payload = ExportPayload::new(profile);
        payload.exercises = repos.exercises.list_by_profile(profile_id).await?;
        payload.applied_exercises = repos.applied_exercises.list_by_profile(profile_id).await?;
        payload.exercise_groups = repos.exercise_groups.list_by_profile(profile_id).await?;
        payload.sessions = repos.sessions.list_by_profile(profile_id).await?;
        payload.training_plans = repos.training_plans.list_by_profile(profile_id).await?;
        payload.workout_logs = repos.workout_logs.list_by_profile(profile_id).await?;
        payload.performed_groups = repos.performed_groups.list_by_profile(profile_id).await?;
        payload.performed_exercises = repos.performed_exercises.list_by_profile(profile_id).await?;
        payload.performed_sets = repos.performed_sets.list_by_profile(profile_id).await?;
        payload.weight_records = repos.weight_records.list_by_profile(profile_id).await?;
        payload.height_records = repos.height_records.list_by_profile(profile_id).await?;
        payload.max_logs = repos.max_logs.list_by_profile(profile_id).await?;

        info!("Exported {} records for profile {}", payload.record_count(), profile_id);
        Ok(payload)
    }

    pub fn validate(&self, payload: &ExportPayload) -> ValidationReport {
        validate_export(payload)
    }

    /// Import a payload into an existing profile. The payload is validated
    /// first and refused if it has errors.
    #[instrument(skip(self, payload))]
    pub async fn import(
        &self,
        profile_id: Uuid,
        payload: ExportPayload,
        options: ImportOptions,
    ) -> ApplicationResult<ImportSummary> {
        require(self.repos.profiles.as_ref(), profile_id, profile_id).await?;

        let report = validate_export(&payload);
        if !report.is_valid() {
            let first = report
                .errors()
                .next()
                .map(ToString::to_string)
                .unwrap_or_default();
            return Err(ApplicationError::Integrity(format!("{}; first: {}", report, first)));
        }
        for issue in report.warnings() {
            warn!("Import warning: {}", issue);
        }

        let payload = if options.regenerate_ids {
            payload.with_fresh_ids()
        } else {
            payload
        };
        let payload = payload.with_owner(profile_id);

        let repos = &self.repos;
        if !options.regenerate_ids {
            check_unowned(repos.exercises.as_ref(), &payload.exercises, profile_id).await?;
            check_unowned(repos.applied_exercises.as_ref(), &payload.applied_exercises, profile_id).await?;
            check_unowned(repos.exercise_groups.as_ref(), &payload.exercise_groups, profile_id).await?;
            check_unowned(repos.sessions.as_ref(), &payload.sessions, profile_id).await?;
            check_unowned(repos.training_plans.as_ref(), &payload.training_plans, profile_id).await?;
            check_unowned(repos.workout_logs.as_ref(), &payload.workout_logs, profile_id).await?;
            check_unowned(repos.performed_groups.as_ref(), &payload.performed_groups, profile_id).await?;
            check_unowned(repos.performed_exercises.as_ref(), &payload.performed_exercises, profile_id).await?;
            check_unowned(repos.performed_sets.as_ref(), &payload.performed_sets, profile_id).await?;
            check_unowned(repos.weight_records.as_ref(), &payload.weight_records, profile_id).await?;
            check_unowned(repos.height_records.as_ref(), &payload.height_records, profile_id).await?;
            check_unowned(repos.max_logs.as_ref(), &payload.max_logs, profile_id).await?;
        }

        // Leaves first so a partial import never holds references to missing children
        repos.exercises.save_many(&payload.exercises).await?;
        repos.applied_exercises.save_many(&payload.applied_exercises).await?;
        repos.exercise_groups.save_many(&payload.exercise_groups).await?;
        repos.sessions.save_many(&payload.sessions).await?;
        repos.training_plans.save_many(&payload.training_plans).await?;
        repos.performed_sets.save_many(&payload.performed_sets).await?;
        repos.performed_exercises.save_many(&payload.performed_exercises).await?;
        repos.performed_groups.save_many(&payload.performed_groups).await?;
        repos.workout_logs.save_many(&payload.workout_logs).await?;
        repos.weight_records.save_many(&payload.weight_records).await?;
        repos.height_records.save_many(&payload.height_records).await?;
        repos.max_logs.save_many(&payload.max_logs).await?;

        let summary = ImportSummary {
            profile_id,
            records_imported: payload.record_count(),
            warnings: report.warning_count(),
            regenerated_ids: options.regenerate_ids,
        };
        info!(
            "Imported {} records into profile {}",
            summary.records_imported, profile_id
        );
        Ok(summary)
    }

    pub async fn write_file(&self, payload: &ExportPayload, path: &Path) -> ApplicationResult<()> {
        let json = payload.to_json()?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write export to {}", path.display()))?;
        Ok(())
    }

    pub async fn read_file(&self, path: &Path) -> ApplicationResult<ExportPayload> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read export from {}", path.display()))?;
        Ok(ExportPayload::from_json(&json)?)
    }
}

/// Refuse to overwrite records that another profile owns
async fn check_unowned<T: Entity>(
    repository: &dyn Repository<T>,
    records: &[T],
    profile_id: Uuid,
) -> ApplicationResult<()> {
    let ids: Vec<Uuid> = records.iter().map(Entity::id).collect();
    if let Some(existing) = repository
        .get_many(&ids)
        .await?
        .into_iter()
        .find(|r| r.profile_id() != profile_id)
    {
        return Err(ApplicationError::Conflict(format!(
            "{} {} already exists in another profile; import with new ids",
            T::NAME,
            existing.id()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Exercise, GroupType, MaxLog, NewExercise, Profile, SetConfiguration, WeightRecord,
    };
    use crate::services::{TrainingPlanService, WorkoutService};
    use crate::storage::Database;
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, Utc};
    use tempfile::tempdir;

    async fn seeded() -> (DataSyncService, Repositories, Uuid) {
        let db = Database::temporary().unwrap();
        let repos = Repositories::from_database(&db);
        let profile = Profile::new("Alex").unwrap();
        repos.profiles.save(&profile).await.unwrap();

        let squat = Exercise::new(profile.id, NewExercise::strength("Squat")).unwrap();
        repos.exercises.save(&squat).await.unwrap();
        let plans = TrainingPlanService::new(repos.clone());
        let plan = plans.create_plan(profile.id, "Plan", None).await.unwrap();
        let session = plans.add_session(profile.id, plan.id, "Day", None).await.unwrap();
        let group = plans
            .add_group(profile.id, session.id, GroupType::Single, None)
            .await
            .unwrap();
        plans
            .add_applied_exercise(
                profile.id,
                group.id,
                squat.id,
                SetConfiguration::standard(2, 5, Some(60.0)),
                90,
            )
            .await
            .unwrap();
        WorkoutService::new(repos.clone(), plans)
            .start_from_session(profile.id, session.id, Utc::now())
            .await
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        repos
            .weight_records
            .save(&WeightRecord::new(profile.id, day, 80.0, None).unwrap())
            .await
            .unwrap();
        repos
            .max_logs
            .save(&MaxLog::new(profile.id, squat.id, 120.0, 1, day, None).unwrap())
            .await
            .unwrap();

        (DataSyncService::new(repos.clone()), repos, profile.id)
    }

    #[tokio::test]
    async fn test_export_is_consistent() {
        let (service, _, profile_id) = seeded().await;
        let payload = service.export(profile_id).await.unwrap();

        // exercise, applied, group, session, plan, workout, performed group,
        // performed exercise, 2 sets, weight, max log
        assert_eq!(payload.record_count(), 12);
        let report = service.validate(&payload);
        assert!(report.issues.is_empty(), "{:?}", report.issues);
    }

    #[tokio::test]
    async fn test_import_into_other_profile_with_fresh_ids() {
        let (service, repos, profile_id) = seeded().await;
        let payload = service.export(profile_id).await.unwrap();

        let other = Profile::new("Sam").unwrap();
        repos.profiles.save(&other).await.unwrap();

        let keep_ids = service
            .import(other.id, payload.clone(), ImportOptions::default())
            .await;
        assert_matches!(keep_ids, Err(ApplicationError::Conflict(_)));

        let summary = service
            .import(other.id, payload, ImportOptions { regenerate_ids: true })
            .await
            .unwrap();
        assert_eq!(summary.records_imported, 12);
        assert_eq!(repos.exercises.count_by_profile(other.id).await.unwrap(), 1);
        assert_eq!(repos.exercises.count_by_profile(profile_id).await.unwrap(), 1);

        let reexported = service.export(other.id).await.unwrap();
        assert!(service.validate(&reexported).is_valid());
    }

    #[tokio::test]
    async fn test_import_refuses_broken_payload() {
        let (service, _, profile_id) = seeded().await;
        let mut payload = service.export(profile_id).await.unwrap();
        payload.applied_exercises.clear();

        let result = service
            .import(profile_id, payload, ImportOptions::default())
            .await;
        assert_matches!(result, Err(ApplicationError::Integrity(_)));
    }

    #[tokio::test]
    async fn test_file_round_trip() {
        let (service, _, profile_id) = seeded().await;
        let dir = tempdir().unwrap();
        let path = dir.path().join("export.json");

        let payload = service.export(profile_id).await.unwrap();
        service.write_file(&payload, &path).await.unwrap();
        let read = service.read_file(&path).await.unwrap();
        assert_eq!(read, payload);

        let missing = service.read_file(&dir.path().join("nope.json")).await;
        assert_matches!(missing, Err(ApplicationError::Internal(_)));
    }
}
