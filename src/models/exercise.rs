use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::entity::impl_entity;
use super::validation::{error, not_blank, unique_ids};
use crate::error::ApplicationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    Strength,
    Hypertrophy,
    Endurance,
    Power,
    Mobility,
    Cardio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Compound,
    Isolation,
    Static,
}

/// What a set of this exercise counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterType {
    Reps,
    Seconds,
    Minutes,
    Meters,
}

/// Exercise definition in a profile's library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_substitutions"))]
pub struct Exercise {
    pub id: Uuid,
    pub profile_id: Uuid,
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub category: ExerciseCategory,
    pub movement_type: MovementType,
    pub counter_type: CounterType,
    pub primary_muscles: Vec<String>,
    pub equipment: Vec<String>,
    #[validate(custom(function = "unique_ids"))]
    pub substitution_ids: Vec<Uuid>,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(Exercise, "exercises", "Exercise");

fn validate_substitutions(exercise: &Exercise) -> Result<(), validator::ValidationError> {
    if exercise.substitution_ids.contains(&exercise.id) {
        return Err(error(
            "self_substitution",
            "An exercise cannot substitute itself",
        ));
    }
    Ok(())
}

/// Fields for a new exercise
#[derive(Debug, Clone)]
pub struct NewExercise {
    pub name: String,
    pub description: Option<String>,
    pub category: ExerciseCategory,
    pub movement_type: MovementType,
    pub counter_type: CounterType,
    pub primary_muscles: Vec<String>,
    pub equipment: Vec<String>,
}

impl NewExercise {
    pub fn strength(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            category: ExerciseCategory::Strength,
            movement_type: MovementType::Compound,
            counter_type: CounterType::Reps,
            primary_muscles: Vec::new(),
            equipment: Vec::new(),
        }
    }
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct ExerciseUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<ExerciseCategory>,
    pub movement_type: Option<MovementType>,
    pub counter_type: Option<CounterType>,
    pub primary_muscles: Option<Vec<String>>,
    pub equipment: Option<Vec<String>>,
}

impl Exercise {
    pub fn new(profile_id: Uuid, fields: NewExercise) -> ApplicationResult<Self> {
        let now = Utc::now();
        let exercise = Self {
            id: Uuid::new_v4(),
            profile_id,
            name: fields.name.trim().to_string(),
            description: fields.description,
            category: fields.category,
            movement_type: fields.movement_type,
            counter_type: fields.counter_type,
            primary_muscles: normalize_tags(fields.primary_muscles),
            equipment: normalize_tags(fields.equipment),
            substitution_ids: Vec::new(),
            is_archived: false,
            created_at: now,
            updated_at: now,
        };
        exercise.validate()?;
        Ok(exercise)
    }

    pub fn with_update(&self, update: ExerciseUpdate) -> ApplicationResult<Self> {
        let updated = Self {
            name: update
                .name
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| self.name.clone()),
            description: update.description.or_else(|| self.description.clone()),
            category: update.category.unwrap_or(self.category),
            movement_type: update.movement_type.unwrap_or(self.movement_type),
            counter_type: update.counter_type.unwrap_or(self.counter_type),
            primary_muscles: update
                .primary_muscles
                .map(normalize_tags)
                .unwrap_or_else(|| self.primary_muscles.clone()),
            equipment: update
                .equipment
                .map(normalize_tags)
                .unwrap_or_else(|| self.equipment.clone()),
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }

    pub fn with_archived(&self, is_archived: bool) -> Self {
        Self {
            is_archived,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    pub fn with_substitution(&self, substitution_id: Uuid) -> ApplicationResult<Self> {
        let mut substitution_ids = self.substitution_ids.clone();
        if !substitution_ids.contains(&substitution_id) {
            substitution_ids.push(substitution_id);
        }
        let updated = Self {
            substitution_ids,
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }

    pub fn without_substitution(&self, substitution_id: Uuid) -> Self {
        Self {
            substitution_ids: self
                .substitution_ids
                .iter()
                .copied()
                .filter(|id| *id != substitution_id)
                .collect(),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Case-insensitive match on name, muscles and equipment
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term)
            || self.primary_muscles.iter().any(|m| m.contains(&term))
            || self.equipment.iter().any(|e| e.contains(&term))
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

impl std::fmt::Display for ExerciseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExerciseCategory::Strength => "Strength",
            ExerciseCategory::Hypertrophy => "Hypertrophy",
            ExerciseCategory::Endurance => "Endurance",
            ExerciseCategory::Power => "Power",
            ExerciseCategory::Mobility => "Mobility",
            ExerciseCategory::Cardio => "Cardio",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for ExerciseCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strength" => Ok(ExerciseCategory::Strength),
            "hypertrophy" => Ok(ExerciseCategory::Hypertrophy),
            "endurance" => Ok(ExerciseCategory::Endurance),
            "power" => Ok(ExerciseCategory::Power),
            "mobility" => Ok(ExerciseCategory::Mobility),
            "cardio" => Ok(ExerciseCategory::Cardio),
            _ => Err(anyhow::anyhow!("Unknown exercise category: {}", s)),
        }
    }
}

impl std::str::FromStr for CounterType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reps" => Ok(CounterType::Reps),
            "secs" | "seconds" => Ok(CounterType::Seconds),
            "mins" | "minutes" => Ok(CounterType::Minutes),
            "m" | "meters" => Ok(CounterType::Meters),
            _ => Err(anyhow::anyhow!("Unknown counter type: {}", s)),
        }
    }
}

impl std::str::FromStr for MovementType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compound" => Ok(MovementType::Compound),
            "isolation" => Ok(MovementType::Isolation),
            "static" => Ok(MovementType::Static),
            _ => Err(anyhow::anyhow!("Unknown movement type: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_exercise_normalizes_tags() {
        let mut fields = NewExercise::strength(" Back Squat ");
        fields.primary_muscles = vec!["Quads".into(), "quads".into(), " ".into()];

        let exercise = Exercise::new(Uuid::new_v4(), fields).unwrap();
        assert_eq!(exercise.name, "Back Squat");
        assert_eq!(exercise.primary_muscles, vec!["quads".to_string()]);
    }

    #[test]
    fn test_substitution_rules() {
        let exercise = Exercise::new(Uuid::new_v4(), NewExercise::strength("Bench")).unwrap();
        let other = Uuid::new_v4();

        let with_sub = exercise.with_substitution(other).unwrap();
        let again = with_sub.with_substitution(other).unwrap();
        assert_eq!(again.substitution_ids, vec![other]);

        assert!(exercise.with_substitution(exercise.id).is_err());
        assert!(again.without_substitution(other).substitution_ids.is_empty());
    }

    #[test]
    fn test_with_update_keeps_unspecified_fields() {
        let exercise = Exercise::new(Uuid::new_v4(), NewExercise::strength("Row")).unwrap();
        let updated = exercise
            .with_update(ExerciseUpdate {
                category: Some(ExerciseCategory::Hypertrophy),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(updated.name, "Row");
        assert_eq!(updated.category, ExerciseCategory::Hypertrophy);
        assert!(exercise
            .with_update(ExerciseUpdate {
                name: Some(String::new()),
                ..Default::default()
            })
            .is_err());
    }

    #[test]
    fn test_matches_search() {
        let mut fields = NewExercise::strength("Deadlift");
        fields.equipment = vec!["Barbell".into()];
        let exercise = Exercise::new(Uuid::new_v4(), fields).unwrap();

        assert!(exercise.matches_search("dead"));
        assert!(exercise.matches_search("BARBELL"));
        assert!(!exercise.matches_search("cable"));
    }
}
