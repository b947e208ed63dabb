mod common;

use assert_matches::assert_matches;
use blueprint_fitness::services::WorkoutFilter;
use blueprint_fitness::ApplicationError;
use chrono::Duration;
use pretty_assertions::assert_eq;

use common::{at, TestApp};

#[tokio::test]
async fn test_planned_workout_round_trip() {
    let app = TestApp::new().await;
    let (plan, squat, _) = app.two_day_plan().await;
    let workouts = &app.services.workouts;
    let day_a = plan.sessions[0].session.id;

    let detail = workouts
        .start_from_session(app.profile.id, day_a, at(0))
        .await
        .unwrap();
    assert_eq!(detail.workout.training_plan_id, Some(plan.plan.id));
    assert_eq!(detail.completed_sets(), 0);

    let performed = detail.exercises().next().unwrap().exercise.clone();
    assert_eq!(performed.exercise_id, squat.id);
    assert_eq!(performed.performed_set_ids.len(), 3);

    for reps in [5, 5, 4] {
        workouts
            .record_set(app.profile.id, performed.id, reps, Some(100.0), Some(8.0))
            .await
            .unwrap();
    }
    // A fourth set goes past the plan
    workouts
        .record_set(app.profile.id, performed.id, 3, Some(100.0), None)
        .await
        .unwrap();

    let finished = workouts
        .finish(app.profile.id, detail.workout.id, at(0) + Duration::minutes(50), Some(4), None)
        .await
        .unwrap();
    assert_eq!(finished.duration_seconds, Some(50 * 60));
    assert_eq!(finished.total_volume, Some(1700.0));

    let detail = workouts.get_detail(app.profile.id, finished.id).await.unwrap();
    assert_eq!(detail.completed_sets(), 4);

    // The plan moved on to Day B
    let plan = app
        .services
        .training_plans
        .get_plan(app.profile.id, plan.plan.id)
        .await
        .unwrap();
    assert_eq!(plan.current_session_index, 1);
}

#[tokio::test]
async fn test_finished_workout_is_read_only() {
    let app = TestApp::new().await;
    let squat = app.exercise("Squat").await;
    let workouts = &app.services.workouts;

    let workout = workouts.start_free(app.profile.id, "Extra", at(0)).await.unwrap();
    let performed = workouts
        .add_exercise(app.profile.id, workout.id, squat.id)
        .await
        .unwrap();
    workouts
        .record_set(app.profile.id, performed.id, 5, Some(100.0), None)
        .await
        .unwrap();
    let finished = workouts
        .finish(app.profile.id, workout.id, at(0) + Duration::minutes(5), None, None)
        .await
        .unwrap();
    assert_eq!(finished.total_volume, Some(500.0));

    let late_set = workouts
        .record_set(app.profile.id, performed.id, 5, Some(200.0), None)
        .await;
    assert_matches!(late_set, Err(ApplicationError::Conflict(_)));

    let late_skip = workouts
        .skip_exercise(app.profile.id, performed.id, None)
        .await;
    assert_matches!(late_skip, Err(ApplicationError::Conflict(_)));

    let detail = workouts.get_detail(app.profile.id, workout.id).await.unwrap();
    assert_eq!(detail.total_volume(), 500.0);
    assert_eq!(detail.completed_sets(), 1);

    let result = workouts.add_exercise(app.profile.id, workout.id, squat.id).await;
    assert_matches!(result, Err(ApplicationError::Conflict(_)));

    let again = workouts
        .finish(app.profile.id, workout.id, at(0) + Duration::minutes(6), None, None)
        .await;
    assert_matches!(again, Err(ApplicationError::Conflict(_)));
}

#[tokio::test]
async fn test_other_profiles_cannot_touch_a_workout() {
    let app = TestApp::new().await;
    let intruder = app.services.profiles.create("Intruder").await.unwrap();
    let workouts = &app.services.workouts;

    let workout = workouts.start_free(app.profile.id, "Mine", at(0)).await.unwrap();

    assert_matches!(
        workouts.get(intruder.id, workout.id).await,
        Err(ApplicationError::NotFound(_))
    );
    assert_matches!(
        workouts.delete(intruder.id, workout.id).await,
        Err(ApplicationError::NotFound(_))
    );
    assert!(workouts.get(app.profile.id, workout.id).await.is_ok());
}

#[tokio::test]
async fn test_history_and_progress_follow_logged_sets() {
    let app = TestApp::new().await;
    let squat = app.exercise("Squat").await;
    let workouts = &app.services.workouts;

    for (day, load) in [(0, 100.0), (7, 105.0), (14, 110.0)] {
        let workout = workouts.start_free(app.profile.id, "Squat day", at(day)).await.unwrap();
        let performed = workouts
            .add_exercise(app.profile.id, workout.id, squat.id)
            .await
            .unwrap();
        workouts
            .record_set(app.profile.id, performed.id, 5, Some(load), None)
            .await
            .unwrap();
        workouts
            .finish(app.profile.id, workout.id, at(day) + Duration::minutes(30), None, None)
            .await
            .unwrap();
    }

    let history = workouts.exercise_history(app.profile.id, squat.id).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history[0].date < history[2].date);

    let progress = app
        .services
        .progress
        .exercise_progress(app.profile.id, squat.id)
        .await
        .unwrap();
    assert_eq!(progress.one_rep_max.points.len(), 3);
    assert!(progress.one_rep_max.trend.slope > 0.0);

    let records = app.services.progress.personal_records(app.profile.id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].date, at(14).date_naive());

    let finished = workouts
        .list(
            app.profile.id,
            &WorkoutFilter {
                finished_only: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(finished.len(), 3);
    assert_eq!(finished[0].start_time, at(14));
}

#[tokio::test]
async fn test_deleting_a_plan_keeps_its_workouts_readable() {
    let app = TestApp::new().await;
    let (plan, _, _) = app.two_day_plan().await;
    let workouts = &app.services.workouts;

    let detail = workouts
        .start_from_session(app.profile.id, plan.sessions[0].session.id, at(0))
        .await
        .unwrap();
    workouts
        .finish(app.profile.id, detail.workout.id, at(0) + Duration::minutes(40), None, None)
        .await
        .unwrap();

    app.services
        .training_plans
        .delete_plan(app.profile.id, plan.plan.id)
        .await
        .unwrap();

    let detail = workouts.get_detail(app.profile.id, detail.workout.id).await.unwrap();
    assert_eq!(detail.workout.training_plan_name.as_deref(), Some("Two day"));
    assert_eq!(detail.workout.session_name, "Day A");
    assert_eq!(detail.exercises().count(), 1);
}
