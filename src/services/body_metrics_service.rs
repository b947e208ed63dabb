use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::analytics::{calculate_bmi, calculate_trend, BmiCategory, DataPoint, TrendAnalysis};
use crate::config::AnalyticsConfig;
use crate::error::ApplicationResult;
use crate::models::{HeightRecord, WeightRecord};
use crate::repository::require;

use super::Repositories;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BmiReport {
    pub bmi: f64,
    pub category: BmiCategory,
    pub weight: f64,
    pub height: f64,
    pub weight_date: NaiveDate,
    pub height_date: NaiveDate,
}

/// Weight and height tracking
#[derive(Clone)]
pub struct BodyMetricsService {
    repos: Repositories,
}

impl BodyMetricsService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    async fn ensure_profile(&self, profile_id: Uuid) -> ApplicationResult<()> {
        require(self.repos.profiles.as_ref(), profile_id, profile_id).await?;
        Ok(())
    }

    // Weight

    #[instrument(skip(self))]
    pub async fn add_weight(
        &self,
        profile_id: Uuid,
        date: NaiveDate,
        weight_kg: f64,
        notes: Option<String>,
    ) -> ApplicationResult<WeightRecord> {
        self.ensure_profile(profile_id).await?;
        let record = WeightRecord::new(profile_id, date, weight_kg, notes)?;
        self.repos.weight_records.save(&record).await?;

        info!("Logged weight {:.1} kg for profile {}", weight_kg, profile_id);
        Ok(record)
    }

    pub async fn update_weight(
        &self,
        profile_id: Uuid,
        id: Uuid,
        weight_kg: Option<f64>,
        date: Option<NaiveDate>,
        notes: Option<String>,
    ) -> ApplicationResult<WeightRecord> {
        let mut record = require(self.repos.weight_records.as_ref(), profile_id, id).await?;
        if let Some(weight) = weight_kg {
            record = record.with_weight(weight)?;
        }
        if let Some(date) = date {
            record = record.with_date(date);
        }
        if notes.is_some() {
            record = record.with_notes(notes)?;
        }
        self.repos.weight_records.save(&record).await?;
        Ok(record)
    }

    /// Oldest first, optionally limited to an inclusive date range
    pub async fn list_weights(
        &self,
        profile_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ApplicationResult<Vec<WeightRecord>> {
        let mut records: Vec<WeightRecord> = self
            .repos
            .weight_records
            .list_by_profile(profile_id)
            .await?
            .into_iter()
            .filter(|r| from.map_or(true, |f| r.date >= f) && to.map_or(true, |t| r.date <= t))
            .collect();
        records.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(records)
    }

    pub async fn latest_weight(&self, profile_id: Uuid) -> ApplicationResult<Option<WeightRecord>> {
        Ok(self.list_weights(profile_id, None, None).await?.pop())
    }

    pub async fn delete_weight(&self, profile_id: Uuid, id: Uuid) -> ApplicationResult<()> {
        require(self.repos.weight_records.as_ref(), profile_id, id).await?;
        self.repos.weight_records.delete(id).await?;
        Ok(())
    }

    /// Least-squares trend over every weight record
    pub async fn weight_trend(
        &self,
        profile_id: Uuid,
        config: &AnalyticsConfig,
    ) -> ApplicationResult<TrendAnalysis> {
        let points: Vec<DataPoint> = self
            .list_weights(profile_id, None, None)
            .await?
            .iter()
            .map(|r| DataPoint::new(r.date, r.weight))
            .collect();
        Ok(calculate_trend(&points, config))
    }

    // Height

    #[instrument(skip(self))]
    pub async fn add_height(
        &self,
        profile_id: Uuid,
        date: NaiveDate,
        height_cm: f64,
        notes: Option<String>,
    ) -> ApplicationResult<HeightRecord> {
        self.ensure_profile(profile_id).await?;
        let record = HeightRecord::new(profile_id, date, height_cm, notes)?;
        self.repos.height_records.save(&record).await?;
        Ok(record)
    }

    pub async fn update_height(
        &self,
        profile_id: Uuid,
        id: Uuid,
        height_cm: f64,
    ) -> ApplicationResult<HeightRecord> {
        let record = require(self.repos.height_records.as_ref(), profile_id, id)
            .await?
            .with_height(height_cm)?;
        self.repos.height_records.save(&record).await?;
        Ok(record)
    }

    pub async fn list_heights(&self, profile_id: Uuid) -> ApplicationResult<Vec<HeightRecord>> {
        let mut records = self.repos.height_records.list_by_profile(profile_id).await?;
        records.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(records)
    }

    pub async fn latest_height(&self, profile_id: Uuid) -> ApplicationResult<Option<HeightRecord>> {
        Ok(self.list_heights(profile_id).await?.pop())
    }

    pub async fn delete_height(&self, profile_id: Uuid, id: Uuid) -> ApplicationResult<()> {
        require(self.repos.height_records.as_ref(), profile_id, id).await?;
        self.repos.height_records.delete(id).await?;
        Ok(())
    }

    /// BMI from the latest weight and height, if both exist
    pub async fn bmi(&self, profile_id: Uuid) -> ApplicationResult<Option<BmiReport>> {
        let (Some(weight), Some(height)) = (
            self.latest_weight(profile_id).await?,
            self.latest_height(profile_id).await?,
        ) else {
            return Ok(None);
        };

        Ok(calculate_bmi(weight.weight, height.height).map(|bmi| BmiReport {
            bmi,
            category: BmiCategory::from_bmi(bmi),
            weight: weight.weight,
            height: height.height,
            weight_date: weight.date,
            height_date: height.date,
        }))
    }
}
