// Progress calculations over in-memory series

pub mod consistency;
pub mod plateau;
pub mod strength;
pub mod trend;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use consistency::{weekly_frequency, workout_streaks, StreakSummary};
pub use plateau::{detect_breakthroughs, detect_plateaus, is_plateaued, Breakthrough, Plateau};
pub use strength::{
    calculate_bmi, calculate_volume, estimate_one_rep_max, BmiCategory, OneRepMaxFormula,
};
pub use trend::{
    calculate_trend, project_trend, ProjectedPoint, TrendAnalysis, TrendConfidence,
    TrendDirection,
};

/// A dated measurement (body weight, estimated 1RM, session volume...)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl DataPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Copy of the series ordered by date, non-finite values dropped
pub(crate) fn sorted_points(points: &[DataPoint]) -> Vec<DataPoint> {
    let mut sorted: Vec<DataPoint> = points
        .iter()
        .copied()
        .filter(|p| p.value.is_finite())
        .collect();
    sorted.sort_by_key(|p| p.date);
    sorted
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
