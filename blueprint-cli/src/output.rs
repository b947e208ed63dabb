// Terminal formatting helpers shared by the commands

use blueprint_fitness::analytics::{TrendAnalysis, TrendDirection};
use blueprint_fitness::models::{SetConfiguration, WeightUnit};
use blueprint_fitness::services::MetricProgress;
use colored::Colorize;
use uuid::Uuid;

pub fn heading(title: &str) {
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count().max(32)));
}

/// First block of a UUID, enough to pick a record on the command line
pub fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

pub fn weight(kg: f64, unit: WeightUnit) -> String {
    format!("{:.1} {}", unit.from_kg(kg), unit)
}

pub fn duration(seconds: i64) -> String {
    let minutes = seconds / 60;
    if minutes >= 60 {
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    } else {
        format!("{}m {:02}s", minutes, seconds % 60)
    }
}

pub fn set_configuration(config: &SetConfiguration, unit: WeightUnit) -> String {
    let load = |load: &Option<f64>| match load {
        Some(kg) => format!(" @ {}", weight(*kg, unit)),
        None => String::new(),
    };
    let reps = |min: u32, max: u32| {
        if min == max {
            min.to_string()
        } else {
            format!("{}-{}", min, max)
        }
    };
    match config {
        SetConfiguration::Standard { sets, reps: r, load: l } => {
            format!("{} x {}{}", sets, reps(r.min, r.max), load(l))
        }
        SetConfiguration::Drop {
            sets,
            reps: r,
            drops,
            drop_percentage,
            load: l,
        } => format!(
            "{} x {}{} with {} drop(s) of {:.0}%",
            sets,
            reps(r.min, r.max),
            load(l),
            drops,
            drop_percentage
        ),
        SetConfiguration::Pyramidal {
            start_reps,
            end_reps,
            step,
            mode,
            load: l,
        } => format!(
            "pyramid {}→{} step {} ({:?}){}",
            start_reps, end_reps, step, mode, load(l)
        ),
        SetConfiguration::Timed {
            sets,
            duration_seconds,
        } => format!("{} x {}s", sets, duration_seconds),
    }
}

pub fn direction(direction: TrendDirection) -> String {
    match direction {
        TrendDirection::Increasing => "↑ increasing".green().to_string(),
        TrendDirection::Decreasing => "↓ decreasing".red().to_string(),
        TrendDirection::Stable => "→ stable".yellow().to_string(),
        TrendDirection::InsufficientData => "not enough data".dimmed().to_string(),
    }
}

fn trend_line(trend: &TrendAnalysis, format_value: &dyn Fn(f64) -> String) -> String {
    if !trend.has_data() {
        return direction(trend.direction);
    }
    format!(
        "{}  {}/week  (R² {:.2}, {:?} confidence, n={})",
        direction(trend.direction),
        format_value(trend.slope * 7.0),
        trend.r_squared,
        trend.confidence,
        trend.sample_size
    )
}

/// Print a series report; `format_value` renders values in display units
pub fn metric_progress(progress: &MetricProgress, format_value: &dyn Fn(f64) -> String) {
    if let (Some(latest), Some(best)) = (progress.latest(), progress.best()) {
        println!("Latest:  {} on {}", format_value(latest.value), latest.date);
        println!("Best:    {} on {}", format_value(best.value), best.date);
    }
    println!("Trend:   {}", trend_line(&progress.trend, format_value));

    if let Some(last) = progress.projection.last() {
        println!(
            "Outlook: {} by {} (range {} to {})",
            format_value(last.value),
            last.date,
            format_value(last.lower),
            format_value(last.upper)
        );
    }
    if progress.is_plateaued {
        println!("{}", "Plateau: recent measurements have barely moved".yellow());
    }
    for plateau in &progress.plateaus {
        println!(
            "  flat from {} to {} ({} days) around {}",
            plateau.start_date,
            plateau.end_date,
            plateau.duration_days(),
            format_value(plateau.mean_value)
        );
    }
    for breakthrough in &progress.breakthroughs {
        let marker = if breakthrough.is_personal_best { " PB" } else { "" };
        println!(
            "  {} {} → {} (+{:.1}%){}",
            breakthrough.date,
            format_value(breakthrough.previous_value),
            format_value(breakthrough.value),
            breakthrough.change_ratio * 100.0,
            marker.green()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration() {
        assert_eq!(duration(95), "1m 35s");
        assert_eq!(duration(3900), "1h 05m");
    }

    #[test]
    fn test_weight_in_pounds() {
        assert_eq!(weight(100.0, WeightUnit::Lbs), "220.5 lbs");
        assert_eq!(weight(100.0, WeightUnit::Kg), "100.0 kg");
    }

    #[test]
    fn test_set_configuration() {
        assert_eq!(
            set_configuration(&SetConfiguration::standard(3, 5, Some(100.0)), WeightUnit::Kg),
            "3 x 5 @ 100.0 kg"
        );
    }
}
