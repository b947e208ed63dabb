#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Training streaks counted in calendar weeks (Monday to Sunday) with at
/// least one workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakSummary {
    /// Consecutive active weeks ending this week or last week
    pub current_weeks: u32,
    pub longest_weeks: u32,
    pub total_workouts: usize,
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn workout_streaks(dates: &[NaiveDate], today: NaiveDate) -> StreakSummary {
    let weeks: BTreeSet<NaiveDate> = dates
        .iter()
        .filter(|d| **d <= today)
        .map(|d| week_start(*d))
        .collect();

    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for week in &weeks {
        run = match previous {
            Some(prev) if *week - prev == Duration::days(7) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*week);
    }

    // The running week may still be empty; a streak through last week is alive
    let this_week = week_start(today);
    let current = match previous {
        Some(last) if last == this_week || last == this_week - Duration::days(7) => run,
        _ => 0,
    };

    StreakSummary {
        current_weeks: current,
        longest_weeks: longest,
        total_workouts: dates.iter().filter(|d| **d <= today).count(),
    }
}

/// Average workouts per week over the `weeks` weeks ending on `today`
pub fn weekly_frequency(dates: &[NaiveDate], weeks: u32, today: NaiveDate) -> f64 {
    if weeks == 0 {
        return 0.0;
    }
    let since = today - Duration::days(i64::from(weeks) * 7);
    let count = dates.iter().filter(|d| **d > since && **d <= today).count();
    count as f64 / f64::from(weeks)
}
