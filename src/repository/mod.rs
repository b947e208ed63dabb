// Repository interface used by the application services

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{ApplicationError, ApplicationResult};
use crate::models::Entity;
use crate::storage::Database;

/// Persistence operations for one entity type
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn get(&self, id: Uuid) -> ApplicationResult<Option<T>>;

    /// Records for the ids that exist, in the order given
    async fn get_many(&self, ids: &[Uuid]) -> ApplicationResult<Vec<T>>;

    async fn list(&self) -> ApplicationResult<Vec<T>>;

    async fn list_by_profile(&self, profile_id: Uuid) -> ApplicationResult<Vec<T>>;

    async fn save(&self, record: &T) -> ApplicationResult<()>;

    async fn save_many(&self, records: &[T]) -> ApplicationResult<()>;

    /// Returns false when nothing was stored under `id`
    async fn delete(&self, id: Uuid) -> ApplicationResult<bool>;

    async fn delete_many(&self, ids: &[Uuid]) -> ApplicationResult<usize>;

    async fn count_by_profile(&self, profile_id: Uuid) -> ApplicationResult<usize>;
}

pub type SharedRepository<T> = Arc<dyn Repository<T>>;

/// Fetch a record owned by `profile_id`, or fail with `NotFound`
pub async fn require<T: Entity>(
    repository: &dyn Repository<T>,
    profile_id: Uuid,
    id: Uuid,
) -> ApplicationResult<T> {
    match repository.get(id).await? {
        Some(record) if record.profile_id() == profile_id => Ok(record),
        _ => Err(ApplicationError::not_found(T::NAME, id)),
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for Database {
    async fn get(&self, id: Uuid) -> ApplicationResult<Option<T>> {
        Ok(Database::get::<T>(self, id)?)
    }

    async fn get_many(&self, ids: &[Uuid]) -> ApplicationResult<Vec<T>> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = Database::get::<T>(self, *id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn list(&self) -> ApplicationResult<Vec<T>> {
        Ok(Database::list::<T>(self)?)
    }

    async fn list_by_profile(&self, profile_id: Uuid) -> ApplicationResult<Vec<T>> {
        Ok(self.list_where::<T, _>(|record| record.profile_id() == profile_id)?)
    }

    async fn save(&self, record: &T) -> ApplicationResult<()> {
        Ok(Database::save(self, record)?)
    }

    async fn save_many(&self, records: &[T]) -> ApplicationResult<()> {
        Ok(Database::save_many(self, records)?)
    }

    async fn delete(&self, id: Uuid) -> ApplicationResult<bool> {
        Ok(Database::delete::<T>(self, id)?.is_some())
    }

    async fn delete_many(&self, ids: &[Uuid]) -> ApplicationResult<usize> {
        Ok(Database::delete_many::<T>(self, ids)?)
    }

    async fn count_by_profile(&self, profile_id: Uuid) -> ApplicationResult<usize> {
        Ok(self
            .list_where::<T, _>(|record| record.profile_id() == profile_id)?
            .len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exercise, NewExercise};
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_require_checks_ownership() {
        let db = Database::temporary().unwrap();
        let owner = Uuid::new_v4();
        let exercise = Exercise::new(owner, NewExercise::strength("Squat")).unwrap();
        Repository::<Exercise>::save(&db, &exercise).await.unwrap();

        let found = require::<Exercise>(&db, owner, exercise.id).await.unwrap();
        assert_eq!(found.id, exercise.id);

        let other = require::<Exercise>(&db, Uuid::new_v4(), exercise.id).await;
        assert_matches!(other, Err(ApplicationError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_many_preserves_order_and_skips_missing() {
        let db = Database::temporary().unwrap();
        let owner = Uuid::new_v4();
        let a = Exercise::new(owner, NewExercise::strength("A")).unwrap();
        let b = Exercise::new(owner, NewExercise::strength("B")).unwrap();
        Repository::<Exercise>::save_many(&db, &[a.clone(), b.clone()])
            .await
            .unwrap();

        let records = Repository::<Exercise>::get_many(&db, &[b.id, Uuid::new_v4(), a.id])
            .await
            .unwrap();
        let names: Vec<&str> = records.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn test_list_and_count_by_profile() {
        let db = Database::temporary().unwrap();
        let (mine, theirs) = (Uuid::new_v4(), Uuid::new_v4());
        Repository::<Exercise>::save_many(
            &db,
            &[
                Exercise::new(mine, NewExercise::strength("A")).unwrap(),
                Exercise::new(mine, NewExercise::strength("B")).unwrap(),
                Exercise::new(theirs, NewExercise::strength("C")).unwrap(),
            ],
        )
        .await
        .unwrap();

        let listed = Repository::<Exercise>::list_by_profile(&db, mine).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(Repository::<Exercise>::count_by_profile(&db, theirs).await.unwrap(), 1);
    }
}
