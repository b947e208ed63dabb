use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::entity::impl_entity;
use crate::error::ApplicationResult;

pub const KG_PER_LB: f64 = 0.453_592_37;

/// Body weight measurement in kilograms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct WeightRecord {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub date: NaiveDate,
    #[validate(range(min = 1.0, max = 700.0, message = "Weight must be between 1 and 700 kg"))]
    pub weight: f64,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(WeightRecord, "weight_records", "WeightRecord");

impl WeightRecord {
    pub fn new(
        profile_id: Uuid,
        date: NaiveDate,
        weight: f64,
        notes: Option<String>,
    ) -> ApplicationResult<Self> {
        let now = Utc::now();
        let record = Self {
            id: Uuid::new_v4(),
            profile_id,
            date,
            weight,
            notes,
            created_at: now,
            updated_at: now,
        };
        record.validate()?;
        Ok(record)
    }

    pub fn with_weight(&self, weight: f64) -> ApplicationResult<Self> {
        let updated = Self {
            weight,
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }

    pub fn with_date(&self, date: NaiveDate) -> Self {
        Self {
            date,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    pub fn with_notes(&self, notes: Option<String>) -> ApplicationResult<Self> {
        let updated = Self {
            notes,
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }
}

/// Body height measurement in centimetres
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct HeightRecord {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub date: NaiveDate,
    #[validate(range(min = 30.0, max = 300.0, message = "Height must be between 30 and 300 cm"))]
    pub height: f64,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(HeightRecord, "height_records", "HeightRecord");

impl HeightRecord {
    pub fn new(
        profile_id: Uuid,
        date: NaiveDate,
        height: f64,
        notes: Option<String>,
    ) -> ApplicationResult<Self> {
        let now = Utc::now();
        let record = Self {
            id: Uuid::new_v4(),
            profile_id,
            date,
            height,
            notes,
            created_at: now,
            updated_at: now,
        };
        record.validate()?;
        Ok(record)
    }

    pub fn with_height(&self, height: f64) -> ApplicationResult<Self> {
        let updated = Self {
            height,
            updated_at: Utc::now(),
            ..self.clone()
        };
        updated.validate()?;
        Ok(updated)
    }
}

/// Unit used when reading or displaying weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lbs,
}

impl WeightUnit {
    pub fn to_kg(self, value: f64) -> f64 {
        match self {
            WeightUnit::Kg => value,
            WeightUnit::Lbs => value * KG_PER_LB,
        }
    }

    pub fn from_kg(self, kg: f64) -> f64 {
        match self {
            WeightUnit::Kg => kg,
            WeightUnit::Lbs => kg / KG_PER_LB,
        }
    }
}

impl std::fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeightUnit::Kg => write!(f, "kg"),
            WeightUnit::Lbs => write!(f, "lbs"),
        }
    }
}

impl std::str::FromStr for WeightUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kg" | "kgs" | "kilograms" => Ok(WeightUnit::Kg),
            "lb" | "lbs" | "pounds" => Ok(WeightUnit::Lbs),
            _ => Err(anyhow::anyhow!("Unknown weight unit: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_weight_range_validation() {
        let profile_id = Uuid::new_v4();
        assert!(WeightRecord::new(profile_id, date(), 82.5, None).is_ok());
        assert!(WeightRecord::new(profile_id, date(), 0.0, None).is_err());
        assert!(WeightRecord::new(profile_id, date(), 900.0, None).is_err());
    }

    #[test]
    fn test_with_weight_revalidates() {
        let record = WeightRecord::new(Uuid::new_v4(), date(), 80.0, None).unwrap();
        assert!(record.with_weight(-3.0).is_err());

        let updated = record.with_weight(79.4).unwrap();
        assert_eq!(updated.id, record.id);
        assert_eq!(updated.weight, 79.4);
    }

    #[test]
    fn test_height_range_validation() {
        let profile_id = Uuid::new_v4();
        assert!(HeightRecord::new(profile_id, date(), 178.0, None).is_ok());
        assert!(HeightRecord::new(profile_id, date(), 12.0, None).is_err());
    }

    #[test]
    fn test_weight_unit_conversion() {
        let kg = WeightUnit::Lbs.to_kg(220.0);
        assert!((kg - 99.79).abs() < 0.01);
        assert!((WeightUnit::Lbs.from_kg(kg) - 220.0).abs() < 1e-9);
        assert_eq!(WeightUnit::Kg.to_kg(50.0), 50.0);
        assert_eq!("LBS".parse::<WeightUnit>().unwrap(), WeightUnit::Lbs);
    }
}
