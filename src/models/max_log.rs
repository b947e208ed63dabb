use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::entity::impl_entity;
use crate::analytics::{estimate_one_rep_max, OneRepMaxFormula};
use crate::error::ApplicationResult;

/// A tested lift, with the one-rep max it implies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MaxLog {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub exercise_id: Uuid,
    #[validate(range(min = 0.5, max = 1000.0, message = "Weight must be between 0.5 and 1000 kg"))]
    pub weight_entered: f64,
    #[validate(range(min = 1, max = 30, message = "Reps must be between 1 and 30"))]
    pub reps: u32,
    pub date: NaiveDate,
    pub estimated_1rm: f64,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(MaxLog, "max_logs", "MaxLog");

impl MaxLog {
    pub fn new(
        profile_id: Uuid,
        exercise_id: Uuid,
        weight_entered: f64,
        reps: u32,
        date: NaiveDate,
        notes: Option<String>,
    ) -> ApplicationResult<Self> {
        let now = Utc::now();
        let log = Self {
            id: Uuid::new_v4(),
            profile_id,
            exercise_id,
            weight_entered,
            reps,
            date,
            estimated_1rm: estimate_one_rep_max(weight_entered, reps, OneRepMaxFormula::default()),
            notes,
            created_at: now,
            updated_at: now,
        };
        log.validate()?;
        Ok(log)
    }

    pub fn is_direct_single(&self) -> bool {
        self.reps == 1
    }
}
