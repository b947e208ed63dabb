use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{ApplicationError, ApplicationResult};
use crate::models::Profile;
use crate::repository::require;
use crate::storage::Database;

use super::Repositories;

#[derive(Clone)]
pub struct ProfileService {
    db: Database,
    repos: Repositories,
}

impl ProfileService {
    pub fn new(db: Database, repos: Repositories) -> Self {
        Self { db, repos }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, name: &str) -> ApplicationResult<Profile> {
        let existing = self.repos.profiles.list().await?;
        if existing
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(name.trim()))
        {
            return Err(ApplicationError::Conflict(format!(
                "A profile named '{}' already exists",
                name.trim()
            )));
        }

        let profile = Profile::new(name)?;
        self.repos.profiles.save(&profile).await?;

        info!("Created profile {} ({})", profile.name, profile.id);
        Ok(profile)
    }

    pub async fn get(&self, id: Uuid) -> ApplicationResult<Profile> {
        require(self.repos.profiles.as_ref(), id, id).await
    }

    /// Most recently used first
    pub async fn list(&self, include_archived: bool) -> ApplicationResult<Vec<Profile>> {
        let mut profiles: Vec<Profile> = self
            .repos
            .profiles
            .list()
            .await?
            .into_iter()
            .filter(|p| include_archived || !p.is_archived)
            .collect();
        profiles.sort_by(|a, b| b.last_accessed_at.cmp(&a.last_accessed_at));
        Ok(profiles)
    }

    #[instrument(skip(self))]
    pub async fn rename(&self, id: Uuid, name: &str) -> ApplicationResult<Profile> {
        let profile = self.get(id).await?.with_name(name)?;
        self.repos.profiles.save(&profile).await?;
        Ok(profile)
    }

    pub async fn set_archived(&self, id: Uuid, is_archived: bool) -> ApplicationResult<Profile> {
        let profile = self.get(id).await?.with_archived(is_archived);
        self.repos.profiles.save(&profile).await?;

        info!("Profile {} archived={}", id, is_archived);
        Ok(profile)
    }

    /// Record that the profile was just opened
    pub async fn touch(&self, id: Uuid) -> ApplicationResult<Profile> {
        let profile = self.get(id).await?.touched();
        self.repos.profiles.save(&profile).await?;
        Ok(profile)
    }

    /// Delete the profile and everything it owns. Returns the number of
    /// records removed, the profile included.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> ApplicationResult<usize> {
        self.get(id).await?;

        let owned = self.db.clear_profile(id)?;
        let profile = usize::from(self.repos.profiles.delete(id).await?);

        info!("Deleted profile {} and {} owned records", id, owned);
        Ok(owned + profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exercise, NewExercise, WeightRecord};
    use crate::repository::MockRepository;
    use crate::storage::Database;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn service() -> (ProfileService, Repositories, Database) {
        let db = Database::temporary().unwrap();
        let repos = Repositories::from_database(&db);
        (ProfileService::new(db.clone(), repos.clone()), repos, db)
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_names() {
        let (service, _, _) = service();
        service.create("Alex").await.unwrap();

        let duplicate = service.create(" alex ").await;
        assert_matches!(duplicate, Err(ApplicationError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_hides_archived() {
        let (service, _, _) = service();
        let a = service.create("A").await.unwrap();
        service.create("B").await.unwrap();
        service.set_archived(a.id, true).await.unwrap();

        assert_eq!(service.list(false).await.unwrap().len(), 1);
        assert_eq!(service.list(true).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_cascades_owned_records() {
        let (service, repos, _) = service();
        let keep = service.create("Keep").await.unwrap();
        let gone = service.create("Gone").await.unwrap();

        for profile_id in [keep.id, gone.id] {
            repos
                .exercises
                .save(&Exercise::new(profile_id, NewExercise::strength("Squat")).unwrap())
                .await
                .unwrap();
            repos
                .weight_records
                .save(
                    &WeightRecord::new(
                        profile_id,
                        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                        80.0,
                        None,
                    )
                    .unwrap(),
                )
                .await
                .unwrap();
        }

        assert_eq!(service.delete(gone.id).await.unwrap(), 3);
        assert!(service.get(gone.id).await.unwrap_err().is_not_found());
        assert_eq!(repos.exercises.count_by_profile(keep.id).await.unwrap(), 1);
        assert_eq!(repos.exercises.count_by_profile(gone.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces_as_error() {
        let (_, mut repos, db) = service();
        let mut mock = MockRepository::<Profile>::new();
        mock.expect_list()
            .returning(|| Err(ApplicationError::Storage(crate::error::StorageError::InvalidKey("profiles"))));
        repos.profiles = Arc::new(mock);

        let service = ProfileService::new(db, repos);
        assert_matches!(service.create("Alex").await, Err(ApplicationError::Storage(_)));
    }
}
