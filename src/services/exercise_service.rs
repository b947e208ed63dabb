use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{ApplicationError, ApplicationResult};
use crate::models::{Exercise, ExerciseCategory, ExerciseUpdate, NewExercise};
use crate::repository::require;

use super::Repositories;

#[derive(Debug, Clone, Default)]
pub struct ExerciseFilter {
    pub category: Option<ExerciseCategory>,
    pub search: Option<String>,
    pub include_archived: bool,
}

impl ExerciseFilter {
    pub fn matches(&self, exercise: &Exercise) -> bool {
        if !self.include_archived && exercise.is_archived {
            return false;
        }
        if let Some(category) = self.category {
            if exercise.category != category {
                return false;
            }
        }
        if let Some(ref term) = self.search {
            if !exercise.matches_search(term) {
                return false;
            }
        }
        true
    }
}

/// Exercise library management
#[derive(Clone)]
pub struct ExerciseService {
    repos: Repositories,
}

impl ExerciseService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    #[instrument(skip(self, new_exercise), fields(name = %new_exercise.name))]
    pub async fn create(
        &self,
        profile_id: Uuid,
        new_exercise: NewExercise,
    ) -> ApplicationResult<Exercise> {
        require(self.repos.profiles.as_ref(), profile_id, profile_id).await?;
        self.ensure_unique_name(profile_id, &new_exercise.name, None).await?;

        let exercise = Exercise::new(profile_id, new_exercise)?;
        self.repos.exercises.save(&exercise).await?;

        info!("Created exercise {} ({})", exercise.name, exercise.id);
        Ok(exercise)
    }

    async fn ensure_unique_name(
        &self,
        profile_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> ApplicationResult<()> {
        let name = name.trim();
        let taken = self
            .repos
            .exercises
            .list_by_profile(profile_id)
            .await?
            .iter()
            .any(|e| Some(e.id) != except && e.name.eq_ignore_ascii_case(name));
        if taken {
            return Err(ApplicationError::Conflict(format!(
                "An exercise named '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    pub async fn get(&self, profile_id: Uuid, id: Uuid) -> ApplicationResult<Exercise> {
        require(self.repos.exercises.as_ref(), profile_id, id).await
    }

    /// Alphabetical by name
    pub async fn list(
        &self,
        profile_id: Uuid,
        filter: &ExerciseFilter,
    ) -> ApplicationResult<Vec<Exercise>> {
        let mut exercises: Vec<Exercise> = self
            .repos
            .exercises
            .list_by_profile(profile_id)
            .await?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();
        exercises.sort_by_key(|e| e.name.to_lowercase());
        Ok(exercises)
    }

    /// Look an exercise up by exact name, ignoring case
    pub async fn find_by_name(
        &self,
        profile_id: Uuid,
        name: &str,
    ) -> ApplicationResult<Option<Exercise>> {
        Ok(self
            .repos
            .exercises
            .list_by_profile(profile_id)
            .await?
            .into_iter()
            .find(|e| e.name.eq_ignore_ascii_case(name.trim())))
    }

    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        profile_id: Uuid,
        id: Uuid,
        update: ExerciseUpdate,
    ) -> ApplicationResult<Exercise> {
        let current = self.get(profile_id, id).await?;
        if let Some(ref name) = update.name {
            self.ensure_unique_name(profile_id, name, Some(id)).await?;
        }
        let updated = current.with_update(update)?;
        self.repos.exercises.save(&updated).await?;
        Ok(updated)
    }

    pub async fn set_archived(
        &self,
        profile_id: Uuid,
        id: Uuid,
        is_archived: bool,
    ) -> ApplicationResult<Exercise> {
        let exercise = self.get(profile_id, id).await?.with_archived(is_archived);
        self.repos.exercises.save(&exercise).await?;
        Ok(exercise)
    }

    pub async fn add_substitution(
        &self,
        profile_id: Uuid,
        id: Uuid,
        substitute_id: Uuid,
    ) -> ApplicationResult<Exercise> {
        self.get(profile_id, substitute_id).await?;
        let exercise = self
            .get(profile_id, id)
            .await?
            .with_substitution(substitute_id)?;
        self.repos.exercises.save(&exercise).await?;
        Ok(exercise)
    }

    pub async fn remove_substitution(
        &self,
        profile_id: Uuid,
        id: Uuid,
        substitute_id: Uuid,
    ) -> ApplicationResult<Exercise> {
        let exercise = self
            .get(profile_id, id)
            .await?
            .without_substitution(substitute_id);
        self.repos.exercises.save(&exercise).await?;
        Ok(exercise)
    }

    /// Delete an exercise. While plans or max logs still point at it the
    /// delete is refused unless `force` is set, in which case those
    /// references are removed as well. Workout history keeps the name.
    #[instrument(skip(self))]
    pub async fn delete(&self, profile_id: Uuid, id: Uuid, force: bool) -> ApplicationResult<()> {
        self.get(profile_id, id).await?;

        let applied: Vec<_> = self
            .repos
            .applied_exercises
            .list_by_profile(profile_id)
            .await?
            .into_iter()
            .filter(|a| a.exercise_id == id)
            .collect();
        let max_logs: Vec<_> = self
            .repos
            .max_logs
            .list_by_profile(profile_id)
            .await?
            .into_iter()
            .filter(|m| m.exercise_id == id)
            .collect();

        if !force && (!applied.is_empty() || !max_logs.is_empty()) {
            return Err(ApplicationError::Conflict(format!(
                "Exercise is used by {} planned exercise(s) and {} max log(s)",
                applied.len(),
                max_logs.len()
            )));
        }

        if !applied.is_empty() {
            let applied_ids: Vec<Uuid> = applied.iter().map(|a| a.id).collect();
            let groups: Vec<_> = self
                .repos
                .exercise_groups
                .list_by_profile(profile_id)
                .await?
                .into_iter()
                .filter(|g| g.applied_exercise_ids.iter().any(|a| applied_ids.contains(a)))
                .map(|g| {
                    applied_ids
                        .iter()
                        .fold(g, |group, a| group.without_applied_exercise(*a))
                })
                .collect();
            self.repos.exercise_groups.save_many(&groups).await?;
            self.repos.applied_exercises.delete_many(&applied_ids).await?;
            warn!("Removed {} planned uses of exercise {}", applied_ids.len(), id);
        }
        if !max_logs.is_empty() {
            let ids: Vec<Uuid> = max_logs.iter().map(|m| m.id).collect();
            self.repos.max_logs.delete_many(&ids).await?;
        }

        let substituting: Vec<Exercise> = self
            .repos
            .exercises
            .list_by_profile(profile_id)
            .await?
            .into_iter()
            .filter(|e| e.substitution_ids.contains(&id))
            .map(|e| e.without_substitution(id))
            .collect();
        self.repos.exercises.save_many(&substituting).await?;

        self.repos.exercises.delete(id).await?;
        info!("Deleted exercise {}", id);
        Ok(())
    }
}
