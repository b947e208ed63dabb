// Domain models and schema validation

pub mod body_metrics;
pub mod entity;
pub mod exercise;
pub mod max_log;
pub mod profile;
pub mod training_plan;
pub mod validation;
pub mod workout_log;

pub use body_metrics::*;
pub use entity::Entity;
pub use exercise::*;
pub use max_log::*;
pub use profile::*;
pub use training_plan::*;
pub use workout_log::*;
