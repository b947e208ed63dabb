use chrono::Weekday;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{ApplicationError, ApplicationResult};
use crate::models::{
    AppliedExercise, Exercise, ExerciseGroup, GroupType, Session, SetConfiguration, TrainingPlan,
};
use crate::repository::require;

use super::Repositories;

/// An applied exercise joined with its library entry
#[derive(Debug, Clone, Serialize)]
pub struct PlannedExercise {
    pub applied: AppliedExercise,
    pub exercise: Exercise,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupHierarchy {
    pub group: ExerciseGroup,
    pub exercises: Vec<PlannedExercise>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionHierarchy {
    pub session: Session,
    pub groups: Vec<GroupHierarchy>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanHierarchy {
    pub plan: TrainingPlan,
    pub sessions: Vec<SessionHierarchy>,
}

impl PlanHierarchy {
    pub fn current_session(&self) -> Option<&SessionHierarchy> {
        let id = self.plan.current_session_id()?;
        self.sessions.iter().find(|s| s.session.id == id)
    }
}

/// Plans, their sessions, groups and applied exercises
#[derive(Clone)]
pub struct TrainingPlanService {
    repos: Repositories,
}

impl TrainingPlanService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    // ------------------------------------------------------------------
    // Plans
    // ------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn create_plan(
        &self,
        profile_id: Uuid,
        name: &str,
        description: Option<String>,
    ) -> ApplicationResult<TrainingPlan> {
        require(self.repos.profiles.as_ref(), profile_id, profile_id).await?;
        let plan = TrainingPlan::new(profile_id, name, description)?;
        self.repos.training_plans.save(&plan).await?;

        info!("Created training plan {} ({})", plan.name, plan.id);
        Ok(plan)
    }

    pub async fn get_plan(&self, profile_id: Uuid, id: Uuid) -> ApplicationResult<TrainingPlan> {
        require(self.repos.training_plans.as_ref(), profile_id, id).await
    }

    /// Most recently updated first
    pub async fn list_plans(
        &self,
        profile_id: Uuid,
        include_archived: bool,
    ) -> ApplicationResult<Vec<TrainingPlan>> {
        let mut plans: Vec<TrainingPlan> = self
            .repos
            .training_plans
            .list_by_profile(profile_id)
            .await?
            .into_iter()
            .filter(|p| include_archived || !p.is_archived)
            .collect();
        plans.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(plans)
    }

    pub async fn update_plan(
        &self,
        profile_id: Uuid,
        id: Uuid,
        name: Option<String>,
        description: Option<String>,
        notes: Option<String>,
    ) -> ApplicationResult<TrainingPlan> {
        let plan = self
            .get_plan(profile_id, id)
            .await?
            .with_details(name, description, notes)?;
        self.repos.training_plans.save(&plan).await?;
        Ok(plan)
    }

    pub async fn set_plan_archived(
        &self,
        profile_id: Uuid,
        id: Uuid,
        is_archived: bool,
    ) -> ApplicationResult<TrainingPlan> {
        let plan = self.get_plan(profile_id, id).await?.with_archived(is_archived);
        self.repos.training_plans.save(&plan).await?;
        Ok(plan)
    }

    /// Delete a plan with its sessions, groups and applied exercises
    #[instrument(skip(self))]
    pub async fn delete_plan(&self, profile_id: Uuid, id: Uuid) -> ApplicationResult<()> {
        let plan = self.get_plan(profile_id, id).await?;
        for session_id in &plan.session_ids {
            self.delete_session_tree(profile_id, *session_id).await?;
        }
        self.repos.training_plans.delete(id).await?;

        info!("Deleted training plan {}", id);
        Ok(())
    }

    /// Move the plan to its next session
    pub async fn advance_plan(&self, profile_id: Uuid, id: Uuid) -> ApplicationResult<TrainingPlan> {
        let plan = self.get_plan(profile_id, id).await?.advanced();
        self.repos.training_plans.save(&plan).await?;
        Ok(plan)
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    pub async fn add_session(
        &self,
        profile_id: Uuid,
        plan_id: Uuid,
        name: &str,
        day_of_week: Option<Weekday>,
    ) -> ApplicationResult<Session> {
        let plan = self.get_plan(profile_id, plan_id).await?;
        let session = Session::new(profile_id, name, day_of_week)?;
        let plan = plan.with_session(session.id)?;

        self.repos.sessions.save(&session).await?;
        self.repos.training_plans.save(&plan).await?;
        Ok(session)
    }

    pub async fn get_session(&self, profile_id: Uuid, id: Uuid) -> ApplicationResult<Session> {
        require(self.repos.sessions.as_ref(), profile_id, id).await
    }

    pub async fn rename_session(
        &self,
        profile_id: Uuid,
        id: Uuid,
        name: &str,
    ) -> ApplicationResult<Session> {
        let session = self.get_session(profile_id, id).await?.with_name(name)?;
        self.repos.sessions.save(&session).await?;
        Ok(session)
    }

    pub async fn reorder_sessions(
        &self,
        profile_id: Uuid,
        plan_id: Uuid,
        order: Vec<Uuid>,
    ) -> ApplicationResult<TrainingPlan> {
        let plan = self
            .get_plan(profile_id, plan_id)
            .await?
            .with_session_order(order)?;
        self.repos.training_plans.save(&plan).await?;
        Ok(plan)
    }

    pub async fn remove_session(
        &self,
        profile_id: Uuid,
        plan_id: Uuid,
        session_id: Uuid,
    ) -> ApplicationResult<TrainingPlan> {
        let plan = self.get_plan(profile_id, plan_id).await?;
        if !plan.session_ids.contains(&session_id) {
            return Err(ApplicationError::not_found("Session", session_id));
        }
        let plan = plan.without_session(session_id)?;
        self.repos.training_plans.save(&plan).await?;
        self.delete_session_tree(profile_id, session_id).await?;
        Ok(plan)
    }

    async fn delete_session_tree(&self, profile_id: Uuid, session_id: Uuid) -> ApplicationResult<()> {
        let Some(session) = self.repos.sessions.get(session_id).await? else {
            warn!("Session {} already missing while deleting", session_id);
            return Ok(());
        };
        if session.profile_id != profile_id {
            return Err(ApplicationError::not_found("Session", session_id));
        }
        for group_id in &session.group_ids {
            self.delete_group_tree(*group_id).await?;
        }
        self.repos.sessions.delete(session_id).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    pub async fn add_group(
        &self,
        profile_id: Uuid,
        session_id: Uuid,
        group_type: GroupType,
        duration_minutes: Option<u32>,
    ) -> ApplicationResult<ExerciseGroup> {
        let session = self.get_session(profile_id, session_id).await?;
        let group = ExerciseGroup::new(profile_id, group_type, duration_minutes)?;
        let session = session.with_group(group.id)?;

        self.repos.exercise_groups.save(&group).await?;
        self.repos.sessions.save(&session).await?;
        Ok(group)
    }

    pub async fn get_group(&self, profile_id: Uuid, id: Uuid) -> ApplicationResult<ExerciseGroup> {
        require(self.repos.exercise_groups.as_ref(), profile_id, id).await
    }

    pub async fn update_group_rest(
        &self,
        profile_id: Uuid,
        id: Uuid,
        rest_between_exercises: Option<u32>,
        rest_after_group: Option<u32>,
    ) -> ApplicationResult<ExerciseGroup> {
        let group = self
            .get_group(profile_id, id)
            .await?
            .with_rest(rest_between_exercises, rest_after_group);
        self.repos.exercise_groups.save(&group).await?;
        Ok(group)
    }

    pub async fn remove_group(
        &self,
        profile_id: Uuid,
        session_id: Uuid,
        group_id: Uuid,
    ) -> ApplicationResult<Session> {
        let session = self.get_session(profile_id, session_id).await?;
        if !session.group_ids.contains(&group_id) {
            return Err(ApplicationError::not_found("ExerciseGroup", group_id));
        }
        let session = session.without_group(group_id);
        self.repos.sessions.save(&session).await?;
        self.delete_group_tree(group_id).await?;
        Ok(session)
    }

    async fn delete_group_tree(&self, group_id: Uuid) -> ApplicationResult<()> {
        if let Some(group) = self.repos.exercise_groups.get(group_id).await? {
            self.repos
                .applied_exercises
                .delete_many(&group.applied_exercise_ids)
                .await?;
            self.repos.exercise_groups.delete(group_id).await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Applied exercises
    // ------------------------------------------------------------------

    pub async fn add_applied_exercise(
        &self,
        profile_id: Uuid,
        group_id: Uuid,
        exercise_id: Uuid,
        set_configuration: SetConfiguration,
        rest_seconds: u32,
    ) -> ApplicationResult<AppliedExercise> {
        require(self.repos.exercises.as_ref(), profile_id, exercise_id).await?;
        let group = self.get_group(profile_id, group_id).await?;
        let applied = AppliedExercise::new(profile_id, exercise_id, set_configuration, rest_seconds)?;
        let group = group.with_applied_exercise(applied.id)?;

        self.repos.applied_exercises.save(&applied).await?;
        self.repos.exercise_groups.save(&group).await?;
        Ok(applied)
    }

    pub async fn update_set_configuration(
        &self,
        profile_id: Uuid,
        applied_exercise_id: Uuid,
        set_configuration: SetConfiguration,
    ) -> ApplicationResult<AppliedExercise> {
        let applied = require(
            self.repos.applied_exercises.as_ref(),
            profile_id,
            applied_exercise_id,
        )
        .await?
        .with_set_configuration(set_configuration)?;
        self.repos.applied_exercises.save(&applied).await?;
        Ok(applied)
    }

    pub async fn remove_applied_exercise(
        &self,
        profile_id: Uuid,
        group_id: Uuid,
        applied_exercise_id: Uuid,
    ) -> ApplicationResult<ExerciseGroup> {
        let group = self.get_group(profile_id, group_id).await?;
        if !group.applied_exercise_ids.contains(&applied_exercise_id) {
            return Err(ApplicationError::not_found(
                "AppliedExercise",
                applied_exercise_id,
            ));
        }
        let group = group.without_applied_exercise(applied_exercise_id);
        self.repos.exercise_groups.save(&group).await?;
        self.repos.applied_exercises.delete(applied_exercise_id).await?;
        Ok(group)
    }

    // ------------------------------------------------------------------
    // Hierarchy loading
    // ------------------------------------------------------------------

    pub async fn load_session(
        &self,
        profile_id: Uuid,
        session_id: Uuid,
    ) -> ApplicationResult<SessionHierarchy> {
        let session = self.get_session(profile_id, session_id).await?;
        let groups = self.repos.exercise_groups.get_many(&session.group_ids).await?;

        let mut group_hierarchies = Vec::with_capacity(groups.len());
        for group in groups {
            let applied = self
                .repos
                .applied_exercises
                .get_many(&group.applied_exercise_ids)
                .await?;
            let mut exercises = Vec::with_capacity(applied.len());
            for applied in applied {
                match self.repos.exercises.get(applied.exercise_id).await? {
                    Some(exercise) => exercises.push(PlannedExercise { applied, exercise }),
                    None => warn!(
                        "Applied exercise {} points at missing exercise {}",
                        applied.id, applied.exercise_id
                    ),
                }
            }
            group_hierarchies.push(GroupHierarchy { group, exercises });
        }

        Ok(SessionHierarchy {
            session,
            groups: group_hierarchies,
        })
    }

    pub async fn load_plan(&self, profile_id: Uuid, plan_id: Uuid) -> ApplicationResult<PlanHierarchy> {
        let plan = self.get_plan(profile_id, plan_id).await?;
        let mut sessions = Vec::with_capacity(plan.session_ids.len());
        for session_id in &plan.session_ids {
            sessions.push(self.load_session(profile_id, *session_id).await?);
        }
        Ok(PlanHierarchy { plan, sessions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewExercise, Profile};
    use crate::storage::Database;
    use assert_matches::assert_matches;

    async fn setup() -> (TrainingPlanService, Repositories, Uuid, Exercise) {
        let db = Database::temporary().unwrap();
        let repos = Repositories::from_database(&db);
        let profile = Profile::new("Alex").unwrap();
        repos.profiles.save(&profile).await.unwrap();
        let squat = Exercise::new(profile.id, NewExercise::strength("Squat")).unwrap();
        repos.exercises.save(&squat).await.unwrap();
        (TrainingPlanService::new(repos.clone()), repos, profile.id, squat)
    }

    #[tokio::test]
    async fn test_build_and_load_plan() {
        let (service, _, profile_id, squat) = setup().await;
        let plan = service.create_plan(profile_id, "5x5", None).await.unwrap();
        let day_a = service
            .add_session(profile_id, plan.id, "Day A", Some(Weekday::Mon))
            .await
            .unwrap();
        service
            .add_session(profile_id, plan.id, "Day B", Some(Weekday::Wed))
            .await
            .unwrap();
        let group = service
            .add_group(profile_id, day_a.id, GroupType::Single, None)
            .await
            .unwrap();
        service
            .add_applied_exercise(
                profile_id,
                group.id,
                squat.id,
                SetConfiguration::standard(5, 5, Some(100.0)),
                180,
            )
            .await
            .unwrap();

        let hierarchy = service.load_plan(profile_id, plan.id).await.unwrap();
        assert_eq!(hierarchy.sessions.len(), 2);
        let current = hierarchy.current_session().unwrap();
        assert_eq!(current.session.name, "Day A");
        assert_eq!(current.groups[0].exercises[0].exercise.name, "Squat");
        assert_eq!(
            current.groups[0].exercises[0].applied.set_configuration.total_sets(),
            5
        );

        let advanced = service.advance_plan(profile_id, plan.id).await.unwrap();
        assert_eq!(advanced.current_session_index, 1);
    }

    #[tokio::test]
    async fn test_applied_exercise_requires_known_exercise() {
        let (service, _, profile_id, _) = setup().await;
        let plan = service.create_plan(profile_id, "Plan", None).await.unwrap();
        let session = service
            .add_session(profile_id, plan.id, "Day", None)
            .await
            .unwrap();
        let group = service
            .add_group(profile_id, session.id, GroupType::Superset, None)
            .await
            .unwrap();

        let result = service
            .add_applied_exercise(
                profile_id,
                group.id,
                Uuid::new_v4(),
                SetConfiguration::standard(3, 10, None),
                60,
            )
            .await;
        assert_matches!(result, Err(ApplicationError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_plan_cascades() {
        let (service, repos, profile_id, squat) = setup().await;
        let plan = service.create_plan(profile_id, "Plan", None).await.unwrap();
        let session = service
            .add_session(profile_id, plan.id, "Day", None)
            .await
            .unwrap();
        let group = service
            .add_group(profile_id, session.id, GroupType::Single, None)
            .await
            .unwrap();
        let applied = service
            .add_applied_exercise(
                profile_id,
                group.id,
                squat.id,
                SetConfiguration::standard(3, 5, Some(80.0)),
                120,
            )
            .await
            .unwrap();

        service.delete_plan(profile_id, plan.id).await.unwrap();

        assert!(repos.sessions.get(session.id).await.unwrap().is_none());
        assert!(repos.exercise_groups.get(group.id).await.unwrap().is_none());
        assert!(repos.applied_exercises.get(applied.id).await.unwrap().is_none());
        assert!(repos.exercises.get(squat.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove_session_keeps_rotation_valid() {
        let (service, _, profile_id, _) = setup().await;
        let plan = service.create_plan(profile_id, "Plan", None).await.unwrap();
        let a = service.add_session(profile_id, plan.id, "A", None).await.unwrap();
        let b = service.add_session(profile_id, plan.id, "B", None).await.unwrap();
        service.advance_plan(profile_id, plan.id).await.unwrap();

        let plan = service.remove_session(profile_id, plan.id, b.id).await.unwrap();
        assert_eq!(plan.session_ids, vec![a.id]);
        assert_eq!(plan.current_session_id(), Some(a.id));

        let missing = service.remove_session(profile_id, plan.id, b.id).await;
        assert_matches!(missing, Err(ApplicationError::NotFound(_)));
    }
}
