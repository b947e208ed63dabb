use serde::{Deserialize, Serialize};

use crate::models::PerformedSet;

/// One-rep-max estimation formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OneRepMaxFormula {
    #[default]
    Epley,
    Brzycki,
    Lombardi,
}

/// Estimate the one-rep max from a multi-rep set. A single rep is its own max.
pub fn estimate_one_rep_max(weight: f64, reps: u32, formula: OneRepMaxFormula) -> f64 {
    if reps == 0 || weight <= 0.0 {
        return 0.0;
    }
    if reps == 1 {
        return weight;
    }
    let r = f64::from(reps);
    match formula {
        OneRepMaxFormula::Epley => weight * (1.0 + r / 30.0),
        // Undefined from 37 reps on
        OneRepMaxFormula::Brzycki => weight * 36.0 / (37.0 - r.min(36.0)),
        OneRepMaxFormula::Lombardi => weight * r.powf(0.10),
    }
}

/// Total load moved across completed working sets
pub fn calculate_volume(sets: &[PerformedSet]) -> f64 {
    sets.iter().map(PerformedSet::volume).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

/// Body mass index from kilograms and centimetres
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if weight_kg <= 0.0 || height_cm <= 0.0 {
        return None;
    }
    let meters = height_cm / 100.0;
    Some(weight_kg / (meters * meters))
}
