use chrono::NaiveDate;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApplicationResult;
use crate::models::MaxLog;
use crate::repository::require;

use super::Repositories;

#[derive(Clone)]
pub struct MaxLogService {
    repos: Repositories,
}

impl MaxLogService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    #[instrument(skip(self, notes))]
    pub async fn add(
        &self,
        profile_id: Uuid,
        exercise_id: Uuid,
        weight: f64,
        reps: u32,
        date: NaiveDate,
        notes: Option<String>,
    ) -> ApplicationResult<MaxLog> {
        require(self.repos.exercises.as_ref(), profile_id, exercise_id).await?;
        let log = MaxLog::new(profile_id, exercise_id, weight, reps, date, notes)?;
        self.repos.max_logs.save(&log).await?;

        info!(
            "Logged {} x {} (e1RM {:.1}) for exercise {}",
            weight, reps, log.estimated_1rm, exercise_id
        );
        Ok(log)
    }

    /// Logs for one exercise, or all when `exercise_id` is `None`; oldest first
    pub async fn list(
        &self,
        profile_id: Uuid,
        exercise_id: Option<Uuid>,
    ) -> ApplicationResult<Vec<MaxLog>> {
        let mut logs: Vec<MaxLog> = self
            .repos
            .max_logs
            .list_by_profile(profile_id)
            .await?
            .into_iter()
            .filter(|m| exercise_id.map_or(true, |id| m.exercise_id == id))
            .collect();
        logs.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(logs)
    }

    /// Highest estimated 1RM logged for the exercise
    pub async fn best(&self, profile_id: Uuid, exercise_id: Uuid) -> ApplicationResult<Option<MaxLog>> {
        Ok(self
            .list(profile_id, Some(exercise_id))
            .await?
            .into_iter()
            .max_by(|a, b| a.estimated_1rm.total_cmp(&b.estimated_1rm)))
    }

    pub async fn delete(&self, profile_id: Uuid, id: Uuid) -> ApplicationResult<()> {
        require(self.repos.max_logs.as_ref(), profile_id, id).await?;
        self.repos.max_logs.delete(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exercise, NewExercise, Profile};
    use crate::storage::Database;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[tokio::test]
    async fn test_best_uses_estimated_max() {
        let db = Database::temporary().unwrap();
        let repos = Repositories::from_database(&db);
        let profile = Profile::new("Alex").unwrap();
        repos.profiles.save(&profile).await.unwrap();
        let bench = Exercise::new(profile.id, NewExercise::strength("Bench")).unwrap();
        repos.exercises.save(&bench).await.unwrap();
        let service = MaxLogService::new(repos);

        service.add(profile.id, bench.id, 100.0, 1, day(1), None).await.unwrap();
        let triple = service.add(profile.id, bench.id, 97.5, 3, day(8), None).await.unwrap();

        let best = service.best(profile.id, bench.id).await.unwrap().unwrap();
        assert_eq!(best.id, triple.id);
        assert_eq!(service.list(profile.id, Some(bench.id)).await.unwrap().len(), 2);

        service.delete(profile.id, triple.id).await.unwrap();
        let best = service.best(profile.id, bench.id).await.unwrap().unwrap();
        assert_eq!(best.estimated_1rm, 100.0);
    }

    #[tokio::test]
    async fn test_unknown_exercise_rejected() {
        let db = Database::temporary().unwrap();
        let repos = Repositories::from_database(&db);
        let service = MaxLogService::new(repos);

        let err = service
            .add(Uuid::new_v4(), Uuid::new_v4(), 100.0, 1, day(1), None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
