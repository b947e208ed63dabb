// Shared fixtures for the integration tests

#![allow(dead_code)]

use blueprint_fitness::config::AnalyticsConfig;
use blueprint_fitness::models::{Exercise, GroupType, NewExercise, Profile, SetConfiguration};
use blueprint_fitness::services::PlanHierarchy;
use blueprint_fitness::{AppServices, Database};
use chrono::{DateTime, Duration, TimeZone, Utc};

pub struct TestApp {
    pub services: AppServices,
    pub profile: Profile,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = Database::temporary().expect("temporary database");
        let services = AppServices::new(db, AnalyticsConfig::default());
        let profile = services.profiles.create("Tester").await.expect("profile");
        Self { services, profile }
    }

    pub async fn exercise(&self, name: &str) -> Exercise {
        self.services
            .exercises
            .create(self.profile.id, NewExercise::strength(name))
            .await
            .expect("exercise")
    }

    /// A plan with two sessions: squat 3x5@100 then bench 3x8@60
    pub async fn two_day_plan(&self) -> (PlanHierarchy, Exercise, Exercise) {
        let plans = &self.services.training_plans;
        let squat = self.exercise("Squat").await;
        let bench = self.exercise("Bench Press").await;

        let plan = plans
            .create_plan(self.profile.id, "Two day", None)
            .await
            .expect("plan");
        for (name, exercise, config) in [
            ("Day A", &squat, SetConfiguration::standard(3, 5, Some(100.0))),
            ("Day B", &bench, SetConfiguration::standard(3, 8, Some(60.0))),
        ] {
            let session = plans
                .add_session(self.profile.id, plan.id, name, None)
                .await
                .expect("session");
            let group = plans
                .add_group(self.profile.id, session.id, GroupType::Single, None)
                .await
                .expect("group");
            plans
                .add_applied_exercise(self.profile.id, group.id, exercise.id, config, 120)
                .await
                .expect("applied exercise");
        }

        let hierarchy = plans
            .load_plan(self.profile.id, plan.id)
            .await
            .expect("hierarchy");
        (hierarchy, squat, bench)
    }
}

/// Evening of 1 January 2024 plus `day` days
pub fn at(day: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 18, 0, 0).unwrap() + Duration::days(day)
}
