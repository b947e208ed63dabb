use blueprint_fitness::analytics::{
    calculate_trend, detect_breakthroughs, estimate_one_rep_max, is_plateaued, project_trend,
    workout_streaks, DataPoint, OneRepMaxFormula, TrendDirection,
};
use blueprint_fitness::config::AnalyticsConfig;
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
}

fn series(values: &[f64]) -> Vec<DataPoint> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| DataPoint::new(day(i as i64 * 3), *v))
        .collect()
}

proptest! {
    #[test]
    fn exact_lines_are_recovered(
        intercept in 50.0f64..150.0,
        slope in -0.5f64..0.5,
        len in 3usize..30,
    ) {
        let points: Vec<DataPoint> = (0..len)
            .map(|i| DataPoint::new(day(i as i64), intercept + slope * i as f64))
            .collect();
        let trend = calculate_trend(&points, &AnalyticsConfig::default());

        prop_assert!((trend.slope - slope).abs() < 1e-6);
        prop_assert!((trend.intercept - intercept).abs() < 1e-6);
        prop_assert!(trend.r_squared > 0.999);
        prop_assert_eq!(trend.sample_size, len);
    }

    #[test]
    fn point_order_does_not_change_the_fit(values in prop::collection::vec(40.0f64..120.0, 3..20)) {
        let points = series(&values);
        let mut reversed = points.clone();
        reversed.reverse();

        let config = AnalyticsConfig::default();
        let forward = calculate_trend(&points, &config);
        let backward = calculate_trend(&reversed, &config);
        prop_assert!((forward.slope - backward.slope).abs() < 1e-9);
        prop_assert_eq!(forward.direction, backward.direction);
    }

    #[test]
    fn projection_bands_contain_the_fit(values in prop::collection::vec(40.0f64..120.0, 3..20)) {
        let trend = calculate_trend(&series(&values), &AnalyticsConfig::default());
        let projection = project_trend(&trend, 28, 7, 0.95);

        prop_assert_eq!(projection.len(), 4);
        for pair in projection.windows(2) {
            prop_assert!(pair[1].upper - pair[1].lower >= pair[0].upper - pair[0].lower - 1e-9);
        }
        for point in &projection {
            prop_assert!(point.lower <= point.value && point.value <= point.upper);
        }
    }

    #[test]
    fn one_rep_max_never_below_the_load(weight in 1.0f64..400.0, reps in 1u32..20) {
        for formula in [OneRepMaxFormula::Epley, OneRepMaxFormula::Brzycki, OneRepMaxFormula::Lombardi] {
            let estimate = estimate_one_rep_max(weight, reps, formula);
            prop_assert!(estimate >= weight - 1e-9);
            prop_assert!(estimate >= estimate_one_rep_max(weight, reps.saturating_sub(1).max(1), formula) - 1e-9);
        }
    }

    #[test]
    fn streaks_are_bounded(offsets in prop::collection::vec(0i64..200, 0..40)) {
        let dates: Vec<NaiveDate> = offsets.iter().map(|o| day(*o)).collect();
        let today = day(200);
        let streaks = workout_streaks(&dates, today);

        prop_assert!(streaks.current_weeks <= streaks.longest_weeks);
        prop_assert_eq!(streaks.total_workouts, dates.len());
        prop_assert!(streaks.longest_weeks as usize <= dates.len());
    }

    #[test]
    fn breakthroughs_meet_the_threshold(values in prop::collection::vec(10.0f64..200.0, 2..25)) {
        for breakthrough in detect_breakthroughs(&series(&values), 0.05) {
            prop_assert!(breakthrough.change_ratio >= 0.05);
            prop_assert!(breakthrough.value > breakthrough.previous_value);
        }
    }
}

#[test]
fn test_flat_series_is_a_stable_plateau() {
    let points = series(&[100.0, 100.5, 99.5, 100.0, 100.2]);
    let config = AnalyticsConfig::default();

    let trend = calculate_trend(&points, &config);
    assert_eq!(trend.direction, TrendDirection::Stable);
    assert!(is_plateaued(&points, config.plateau_window, config.plateau_cv_threshold));
}

#[test]
fn test_single_point_has_no_trend() {
    let trend = calculate_trend(&series(&[80.0]), &AnalyticsConfig::default());
    assert_eq!(trend.direction, TrendDirection::InsufficientData);
    assert!(project_trend(&trend, 28, 7, 0.95).is_empty());
}
