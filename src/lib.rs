//! Blueprint Fitness: an offline-first training log.
//!
//! Profiles, an exercise library, training plans and workout logs live in
//! a local sled database. Services on top of it handle the bookkeeping and
//! the progress analytics; the `blueprint` binary is a terminal front end.

pub mod analytics;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod queries;
pub mod repository;
pub mod services;
pub mod storage;

pub use config::Config;
pub use error::{ApplicationError, ApplicationResult};
pub use services::AppServices;
pub use storage::Database;
