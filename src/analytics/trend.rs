//! Least-squares trend fitting and projection.
//!
//! The x axis is days elapsed since the first measurement so that
//! irregularly spaced logs are weighted by real time, not by index.

#![allow(clippy::cast_precision_loss)]

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use super::{mean, sorted_points, DataPoint};
use crate::config::AnalyticsConfig;

/// z value used when the t distribution cannot be built
const FALLBACK_CRITICAL_VALUE: f64 = 1.96;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendConfidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub direction: TrendDirection,
    pub confidence: TrendConfidence,
    /// Change per day
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Residual standard error of the fit
    pub standard_error: f64,
    pub sample_size: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub mean_value: f64,
    /// Fitted change over seven days relative to the mean
    pub weekly_change_ratio: f64,
    mean_x: f64,
    sxx: f64,
}

impl TrendAnalysis {
    fn insufficient(sample_size: usize, start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        Self {
            direction: TrendDirection::InsufficientData,
            confidence: TrendConfidence::Low,
            slope: 0.0,
            intercept: 0.0,
            r_squared: 0.0,
            standard_error: 0.0,
            sample_size,
            start_date,
            end_date,
            mean_value: 0.0,
            weekly_change_ratio: 0.0,
            mean_x: 0.0,
            sxx: 0.0,
        }
    }

    pub fn has_data(&self) -> bool {
        self.direction != TrendDirection::InsufficientData
    }

    /// Fitted value on a given date
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        let start = self.start_date?;
        if !self.has_data() {
            return None;
        }
        let x = (date - start).num_days() as f64;
        Some(self.slope.mul_add(x, self.intercept))
    }
}

/// Fit an ordinary least squares line through the series.
///
/// Points are sorted by date first. Fewer than `min_points_for_trend`
/// points, or all points on one day, give `InsufficientData`.
pub fn calculate_trend(points: &[DataPoint], config: &AnalyticsConfig) -> TrendAnalysis {
    let sorted = sorted_points(points);
    let start_date = sorted.first().map(|p| p.date);
    let end_date = sorted.last().map(|p| p.date);
    let n = sorted.len();

    if n < config.min_points_for_trend.max(2) {
        return TrendAnalysis::insufficient(n, start_date, end_date);
    }
    let Some(first) = start_date else {
        return TrendAnalysis::insufficient(n, start_date, end_date);
    };

    let xs: Vec<f64> = sorted
        .iter()
        .map(|p| (p.date - first).num_days() as f64)
        .collect();
    let ys: Vec<f64> = sorted.iter().map(|p| p.value).collect();

    let mean_x = mean(&xs);
    let mean_y = mean(&ys);

    let sxx: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();
    if sxx < f64::EPSILON {
        return TrendAnalysis::insufficient(n, start_date, end_date);
    }
    let sxy: f64 = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();

    let slope = sxy / sxx;
    let intercept = slope.mul_add(-mean_x, mean_y);

    let ss_res: f64 = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| (y - slope.mul_add(*x, intercept)).powi(2))
        .sum();
    let ss_tot: f64 = ys.iter().map(|y| (y - mean_y).powi(2)).sum();

    let r_squared = if ss_tot < f64::EPSILON {
        if ss_res < f64::EPSILON {
            1.0
        } else {
            0.0
        }
    } else {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    };

    let standard_error = if n > 2 {
        (ss_res / (n - 2) as f64).sqrt()
    } else {
        0.0
    };

    let weekly_change_ratio = if mean_y.abs() < f64::EPSILON {
        slope * 7.0
    } else {
        slope * 7.0 / mean_y.abs()
    };

    let direction = if weekly_change_ratio > config.trend_threshold {
        TrendDirection::Increasing
    } else if weekly_change_ratio < -config.trend_threshold {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    TrendAnalysis {
        direction,
        confidence: classify_confidence(n, r_squared),
        slope,
        intercept,
        r_squared,
        standard_error,
        sample_size: n,
        start_date,
        end_date,
        mean_value: mean_y,
        weekly_change_ratio,
        mean_x,
        sxx,
    }
}

fn classify_confidence(sample_size: usize, r_squared: f64) -> TrendConfidence {
    if sample_size >= 10 && r_squared >= 0.7 {
        TrendConfidence::High
    } else if sample_size >= 5 && r_squared >= 0.4 {
        TrendConfidence::Medium
    } else {
        TrendConfidence::Low
    }
}

/// A future value read off the fitted line with its prediction interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Extrapolate the fitted line `horizon_days` past the last measurement.
///
/// The band is the regression prediction interval at `confidence_level`,
/// so it widens the further a point lies from the observed data. Two points
/// leave no residuals to size the band with, so nothing is projected.
pub fn project_trend(
    trend: &TrendAnalysis,
    horizon_days: u32,
    step_days: u32,
    confidence_level: f64,
) -> Vec<ProjectedPoint> {
    let (Some(start), Some(end)) = (trend.start_date, trend.end_date) else {
        return Vec::new();
    };
    if !trend.has_data() || trend.sample_size <= 2 || step_days == 0 {
        return Vec::new();
    }

    let n = trend.sample_size as f64;
    let critical = critical_value(trend.sample_size - 2, confidence_level);

    (1..=horizon_days / step_days)
        .map(|i| i * step_days)
        .map_while(|offset| end.checked_add_signed(Duration::days(i64::from(offset))))
        .map(|date| {
            let x = (date - start).num_days() as f64;
            let value = trend.slope.mul_add(x, trend.intercept);
            let leverage = 1.0 + 1.0 / n + (x - trend.mean_x).powi(2) / trend.sxx;
            let margin = critical * trend.standard_error * leverage.sqrt();
            ProjectedPoint {
                date,
                value,
                lower: value - margin,
                upper: value + margin,
            }
        })
        .collect()
}

fn critical_value(degrees_of_freedom: usize, confidence_level: f64) -> f64 {
    if degrees_of_freedom == 0 {
        return FALLBACK_CRITICAL_VALUE;
    }
    let level = confidence_level.clamp(0.5, 0.999);
    StudentsT::new(0.0, 1.0, degrees_of_freedom as f64)
        .map(|t| t.inverse_cdf(1.0 - (1.0 - level) / 2.0))
        .unwrap_or(FALLBACK_CRITICAL_VALUE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn series(values: &[f64], spacing_days: i64) -> Vec<DataPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| DataPoint::new(start + Duration::days(i as i64 * spacing_days), *v))
            .collect()
    }

    #[test]
    fn test_perfect_line_fit() {
        let points = series(&[100.0, 102.0, 104.0, 106.0, 108.0, 110.0, 112.0, 114.0, 116.0, 118.0], 7);
        let trend = calculate_trend(&points, &AnalyticsConfig::default());

        assert!((trend.slope - 2.0 / 7.0).abs() < 1e-9);
        assert!((trend.r_squared - 1.0).abs() < 1e-9);
        assert_eq!(trend.direction, TrendDirection::Increasing);
        assert_eq!(trend.confidence, TrendConfidence::High);
    }

    #[test]
    fn test_sorts_before_fitting() {
        let mut points = series(&[80.0, 79.0, 78.0, 77.0, 76.0], 7);
        points.reverse();
        let trend = calculate_trend(&points, &AnalyticsConfig::default());

        assert!(trend.slope < 0.0);
        assert_eq!(trend.direction, TrendDirection::Decreasing);
    }

    #[test]
    fn test_small_slope_is_stable() {
        // 0.1 kg per week on an 80 kg mean is well below 1%
        let points = series(&[80.0, 80.1, 80.2, 80.3], 7);
        let trend = calculate_trend(&points, &AnalyticsConfig::default());
        assert_eq!(trend.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_insufficient_data() {
        let config = AnalyticsConfig::default();
        assert_eq!(
            calculate_trend(&series(&[80.0], 1), &config).direction,
            TrendDirection::InsufficientData
        );

        let same_day = series(&[80.0, 81.0, 82.0], 0);
        assert_eq!(
            calculate_trend(&same_day, &config).direction,
            TrendDirection::InsufficientData
        );
    }

    #[test]
    fn test_constant_series_is_stable_with_full_fit() {
        let trend = calculate_trend(&series(&[50.0; 6], 3), &AnalyticsConfig::default());
        assert_eq!(trend.direction, TrendDirection::Stable);
        assert_eq!(trend.r_squared, 1.0);
    }

    #[test]
    fn test_projection_band_widens() {
        let points = series(&[100.0, 103.0, 104.5, 108.0, 109.0, 113.0, 114.0], 7);
        let trend = calculate_trend(&points, &AnalyticsConfig::default());
        let projection = project_trend(&trend, 28, 7, 0.95);

        assert_eq!(projection.len(), 4);
        let widths: Vec<f64> = projection.iter().map(|p| p.upper - p.lower).collect();
        assert!(widths.windows(2).all(|w| w[1] > w[0]));
        assert!(projection.iter().all(|p| p.lower <= p.value && p.value <= p.upper));
        assert_eq!(
            projection[0].date,
            trend.end_date.unwrap() + Duration::days(7)
        );
    }

    #[test]
    fn test_projection_empty_without_trend() {
        let trend = calculate_trend(&series(&[1.0], 1), &AnalyticsConfig::default());
        assert!(project_trend(&trend, 30, 7, 0.95).is_empty());
    }

    #[test]
    fn test_two_points_have_a_trend_but_no_band() {
        let trend = calculate_trend(&series(&[80.0, 82.0], 7), &AnalyticsConfig::default());
        assert_eq!(trend.direction, TrendDirection::Increasing);
        assert!(project_trend(&trend, 28, 7, 0.95).is_empty());
    }

    #[test]
    fn test_projection_stops_at_the_calendar_edge() {
        let points = series(&[100.0, 103.0, 104.5, 108.0], 7);
        let trend = calculate_trend(&points, &AnalyticsConfig::default());
        let projection = project_trend(&trend, u32::MAX, u32::MAX / 4, 0.95);

        assert!(projection.len() < 4);
        assert!(projection.windows(2).all(|w| w[0].date < w[1].date));
    }
}
