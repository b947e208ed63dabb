#![allow(clippy::cast_precision_loss)]

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{mean, sorted_points, DataPoint};

/// Stretch of measurements that barely moved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plateau {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub points: usize,
    pub mean_value: f64,
    pub coefficient_of_variation: f64,
}

impl Plateau {
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

/// A jump between two consecutive measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakthrough {
    pub date: NaiveDate,
    pub previous_value: f64,
    pub value: f64,
    /// Relative change, 0.05 = 5%
    pub change_ratio: f64,
    /// Higher than every earlier measurement
    pub is_personal_best: bool,
}

fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    let std_dev = variance.sqrt();
    if m.abs() < f64::EPSILON {
        if std_dev < f64::EPSILON {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        std_dev / m.abs()
    }
}

/// Slide a `window`-sized window over the date-ordered series and report
/// every run of overlapping windows whose coefficient of variation stays
/// below `cv_threshold`.
pub fn detect_plateaus(points: &[DataPoint], window: usize, cv_threshold: f64) -> Vec<Plateau> {
    let sorted = sorted_points(points);
    if window < 2 || sorted.len() < window {
        return Vec::new();
    }
    let values: Vec<f64> = sorted.iter().map(|p| p.value).collect();

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for start in 0..=values.len() - window {
        let end = start + window - 1;
        if coefficient_of_variation(&values[start..=end]) >= cv_threshold {
            continue;
        }
        match ranges.last_mut() {
            Some((_, last_end)) if start <= *last_end => *last_end = end,
            _ => ranges.push((start, end)),
        }
    }

    ranges
        .into_iter()
        .map(|(start, end)| {
            let slice = &values[start..=end];
            Plateau {
                start_date: sorted[start].date,
                end_date: sorted[end].date,
                points: slice.len(),
                mean_value: mean(slice),
                coefficient_of_variation: coefficient_of_variation(slice),
            }
        })
        .collect()
}

/// Whether the most recent `window` measurements form a plateau
pub fn is_plateaued(points: &[DataPoint], window: usize, cv_threshold: f64) -> bool {
    let sorted = sorted_points(points);
    if window < 2 || sorted.len() < window {
        return false;
    }
    let recent: Vec<f64> = sorted[sorted.len() - window..]
        .iter()
        .map(|p| p.value)
        .collect();
    coefficient_of_variation(&recent) < cv_threshold
}

/// Consecutive increases of at least `threshold` (relative to the previous value)
pub fn detect_breakthroughs(points: &[DataPoint], threshold: f64) -> Vec<Breakthrough> {
    let sorted = sorted_points(points);
    let mut breakthroughs = Vec::new();
    let mut best = f64::NEG_INFINITY;

    for pair in sorted.windows(2) {
        let (previous, current) = (pair[0], pair[1]);
        best = best.max(previous.value);
        if previous.value <= 0.0 {
            continue;
        }
        let change_ratio = (current.value - previous.value) / previous.value;
        if change_ratio >= threshold {
            breakthroughs.push(Breakthrough {
                date: current.date,
                previous_value: previous.value,
                value: current.value,
                change_ratio,
                is_personal_best: current.value > best,
            });
        }
    }
    breakthroughs
}
