use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::analytics::{
    calculate_bmi, calculate_trend, detect_breakthroughs, detect_plateaus, estimate_one_rep_max,
    is_plateaued, project_trend, weekly_frequency, workout_streaks, Breakthrough, DataPoint,
    OneRepMaxFormula, Plateau, ProjectedPoint, StreakSummary, TrendAnalysis,
};
use crate::config::AnalyticsConfig;
use crate::error::ApplicationResult;
use crate::repository::require;

use super::{Repositories, WorkoutFilter, WorkoutService};

/// Weeks looked back when computing workout frequency
const FREQUENCY_WEEKS: u32 = 4;
const PROJECTION_STEP_DAYS: u32 = 7;

/// Trend, projection and plateau analysis of one dated series
#[derive(Debug, Clone, Serialize)]
pub struct MetricProgress {
    pub points: Vec<DataPoint>,
    pub trend: TrendAnalysis,
    pub projection: Vec<ProjectedPoint>,
    pub plateaus: Vec<Plateau>,
    pub breakthroughs: Vec<Breakthrough>,
    pub is_plateaued: bool,
}

impl MetricProgress {
    pub fn latest(&self) -> Option<DataPoint> {
        self.points.last().copied()
    }

    pub fn best(&self) -> Option<DataPoint> {
        self.points
            .iter()
            .copied()
            .max_by(|a, b| a.value.total_cmp(&b.value))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseProgress {
    pub exercise_id: Uuid,
    pub exercise_name: String,
    /// Best estimated one-rep max per day
    pub one_rep_max: MetricProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalRecord {
    pub exercise_id: Uuid,
    pub exercise_name: String,
    pub estimated_1rm: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressSummary {
    pub streaks: StreakSummary,
    pub weekly_frequency: f64,
    pub total_volume: f64,
    pub latest_weight: Option<f64>,
    pub bmi: Option<f64>,
    pub personal_records: Vec<PersonalRecord>,
}

/// Best estimated 1RM per exercise per day
type DailyMaxes = HashMap<Uuid, (String, BTreeMap<NaiveDate, f64>)>;

#[derive(Clone)]
pub struct ProgressService {
    repos: Repositories,
    workouts: WorkoutService,
    config: AnalyticsConfig,
}

impl ProgressService {
    pub fn new(repos: Repositories, workouts: WorkoutService, config: AnalyticsConfig) -> Self {
        Self {
            repos,
            workouts,
            config,
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Run the full set of series analyses
    pub fn analyse(&self, points: Vec<DataPoint>) -> MetricProgress {
        let mut points = points;
        points.retain(|p| p.value.is_finite());
        points.sort_by_key(|p| p.date);

        let trend = calculate_trend(&points, &self.config);
        let projection = project_trend(
            &trend,
            self.config.projection_horizon_days,
            PROJECTION_STEP_DAYS,
            self.config.projection_confidence,
        );
        let plateaus = detect_plateaus(
            &points,
            self.config.plateau_window,
            self.config.plateau_cv_threshold,
        );
        let breakthroughs = detect_breakthroughs(&points, self.config.breakthrough_threshold);
        let is_plateaued = is_plateaued(
            &points,
            self.config.plateau_window,
            self.config.plateau_cv_threshold,
        );

        MetricProgress {
            points,
            trend,
            projection,
            plateaus,
            breakthroughs,
            is_plateaued,
        }
    }

    async fn daily_maxes(&self, profile_id: Uuid) -> ApplicationResult<DailyMaxes> {
        let mut maxes: DailyMaxes = HashMap::new();
        let mut record = |exercise_id: Uuid, name: &str, date: NaiveDate, value: f64| {
            if value <= 0.0 {
                return;
            }
            let (_, days) = maxes
                .entry(exercise_id)
                .or_insert_with(|| (name.to_string(), BTreeMap::new()));
            let best = days.entry(date).or_insert(value);
            *best = best.max(value);
        };

        let workouts = self.workouts.list(profile_id, &WorkoutFilter::default()).await?;
        for workout in workouts {
            let detail = self.workouts.get_detail(profile_id, workout.id).await?;
            let date = workout.start_time.date_naive();
            for performed in detail.exercises() {
                for set in performed.sets.iter().filter(|s| s.completed && !s.is_warmup) {
                    let Some(weight) = set.weight else { continue };
                    record(
                        performed.exercise.exercise_id,
                        &performed.exercise.exercise_name,
                        date,
                        estimate_one_rep_max(weight, set.reps, OneRepMaxFormula::default()),
                    );
                }
            }
        }

        let exercises = self.repos.exercises.list_by_profile(profile_id).await?;
        let names: HashMap<Uuid, &str> = exercises.iter().map(|e| (e.id, e.name.as_str())).collect();
        for log in self.repos.max_logs.list_by_profile(profile_id).await? {
            let name = names.get(&log.exercise_id).copied().unwrap_or("Unknown exercise");
            record(log.exercise_id, name, log.date, log.estimated_1rm);
        }

        // Current library names win over names copied into old logs
        for (id, (name, _)) in maxes.iter_mut() {
            if let Some(current) = names.get(id) {
                *name = (*current).to_string();
            }
        }
        Ok(maxes)
    }

    /// Estimated one-rep max over time from logged sets and max tests
    #[instrument(skip(self))]
    pub async fn exercise_progress(
        &self,
        profile_id: Uuid,
        exercise_id: Uuid,
    ) -> ApplicationResult<ExerciseProgress> {
        let exercise = require(self.repos.exercises.as_ref(), profile_id, exercise_id).await?;
        let points = self
            .daily_maxes(profile_id)
            .await?
            .remove(&exercise_id)
            .map(|(_, days)| {
                days.into_iter()
                    .map(|(date, value)| DataPoint::new(date, value))
                    .collect()
            })
            .unwrap_or_default();

        Ok(ExerciseProgress {
            exercise_id,
            exercise_name: exercise.name,
            one_rep_max: self.analyse(points),
        })
    }

    #[instrument(skip(self))]
    pub async fn body_weight_progress(&self, profile_id: Uuid) -> ApplicationResult<MetricProgress> {
        let points = self
            .repos
            .weight_records
            .list_by_profile(profile_id)
            .await?
            .into_iter()
            .map(|r| DataPoint::new(r.date, r.weight))
            .collect();
        Ok(self.analyse(points))
    }

    /// Total volume of finished workouts per day
    #[instrument(skip(self))]
    pub async fn volume_progress(&self, profile_id: Uuid) -> ApplicationResult<MetricProgress> {
        let filter = WorkoutFilter {
            finished_only: true,
            ..Default::default()
        };
        let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for workout in self.workouts.list(profile_id, &filter).await? {
            *per_day.entry(workout.start_time.date_naive()).or_default() +=
                workout.total_volume.unwrap_or_default();
        }
        let points = per_day
            .into_iter()
            .map(|(date, value)| DataPoint::new(date, value))
            .collect();
        Ok(self.analyse(points))
    }

    /// Best estimated 1RM per exercise, highest first
    pub async fn personal_records(&self, profile_id: Uuid) -> ApplicationResult<Vec<PersonalRecord>> {
        let mut records: Vec<PersonalRecord> = self
            .daily_maxes(profile_id)
            .await?
            .into_iter()
            .filter_map(|(exercise_id, (exercise_name, days))| {
                days.into_iter()
                    .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
                    .map(|(date, estimated_1rm)| PersonalRecord {
                        exercise_id,
                        exercise_name,
                        estimated_1rm,
                        date,
                    })
            })
            .collect();
        records.sort_by(|a, b| b.estimated_1rm.total_cmp(&a.estimated_1rm));
        Ok(records)
    }

    #[instrument(skip(self))]
    pub async fn summary(&self, profile_id: Uuid, today: NaiveDate) -> ApplicationResult<ProgressSummary> {
        let filter = WorkoutFilter {
            finished_only: true,
            ..Default::default()
        };
        let workouts = self.workouts.list(profile_id, &filter).await?;
        let dates: Vec<NaiveDate> = workouts.iter().map(|w| w.start_time.date_naive()).collect();
        let total_volume = workouts.iter().filter_map(|w| w.total_volume).sum();

        let latest_weight = self
            .repos
            .weight_records
            .list_by_profile(profile_id)
            .await?
            .into_iter()
            .max_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        let latest_height = self
            .repos
            .height_records
            .list_by_profile(profile_id)
            .await?
            .into_iter()
            .max_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        let bmi = match (&latest_weight, &latest_height) {
            (Some(w), Some(h)) => calculate_bmi(w.weight, h.height),
            _ => None,
        };

        Ok(ProgressSummary {
            streaks: workout_streaks(&dates, today),
            weekly_frequency: weekly_frequency(&dates, FREQUENCY_WEEKS, today),
            total_volume,
            latest_weight: latest_weight.map(|w| w.weight),
            bmi,
            personal_records: self.personal_records(profile_id).await?,
        })
    }
}
