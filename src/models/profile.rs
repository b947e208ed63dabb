use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::validation::not_blank;
use crate::error::ApplicationResult;

/// A person whose training data is tracked. Every other record is scoped to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Profile {
    pub id: Uuid,
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub name: String,
    pub is_archived: bool,
    pub last_accessed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> ApplicationResult<Self> {
        let now = Utc::now();
        let profile = Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            is_archived: false,
            last_accessed_at: now,
            created_at: now,
            updated_at: now,
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn with_name(&self, name: impl Into<String>) -> ApplicationResult<Self> {
        let updated = Self {
            name: name.into().trim().to_string(),
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

    pub fn touched(&self) -> Self {
        Self {
            last_accessed_at: Utc::now(),
            ..self.clone()
        }
    }
}

impl super::Entity for Profile {
    const TABLE: &'static str = "profiles";
    const NAME: &'static str = "Profile";

    fn id(&self) -> Uuid {
        self.id
    }

    fn profile_id(&self) -> Uuid {
        self.id
    }
}
