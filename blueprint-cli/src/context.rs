use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use blueprint_fitness::models::{Exercise, Profile, WeightUnit};
use blueprint_fitness::services::ExerciseFilter;
use blueprint_fitness::{AppServices, Config, Database};
use uuid::Uuid;

/// Loaded configuration, open database and wired services for one invocation
pub struct AppContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub services: AppServices,
}

impl AppContext {
    pub fn open(config_path: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => Config::config_file()?,
        };
        let config = Config::load_from(&config_path)?;
        let db_path = config.db_path()?;
        let db = Database::open(&db_path)
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
        tracing::debug!("Using database at {:?}", db_path);

        let services = AppServices::new(db, config.analytics.clone());
        Ok(Self {
            config,
            config_path,
            services,
        })
    }

    pub fn unit(&self) -> WeightUnit {
        self.config.units.weight_unit
    }

    pub fn set_active_profile(&mut self, profile_id: Option<Uuid>) -> Result<()> {
        self.config.set_active_profile(profile_id);
        self.config.save_to(&self.config_path)
    }

    /// The profile commands act on
    pub async fn active_profile(&self) -> Result<Profile> {
        let id = self.config.profile.active_profile_id.ok_or_else(|| {
            anyhow!("No active profile. Create one with `blueprint profile create <name>`")
        })?;
        match self.services.profiles.touch(id).await {
            Ok(profile) => Ok(profile),
            Err(e) if e.is_not_found() => Err(anyhow!(
                "The active profile no longer exists. Pick another with `blueprint profile use <name>`"
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Find a profile by name or id prefix
    pub async fn resolve_profile(&self, query: &str) -> Result<Profile> {
        let profiles = self.services.profiles.list(true).await?;
        if let Some(profile) = profiles.iter().find(|p| p.name.eq_ignore_ascii_case(query.trim())) {
            return Ok(profile.clone());
        }
        pick_by_id(profiles, query, |p| p.id, "profile")
    }

    /// Find an exercise in the library by name or id prefix
    pub async fn resolve_exercise(&self, profile_id: Uuid, query: &str) -> Result<Exercise> {
        if let Some(exercise) = self.services.exercises.find_by_name(profile_id, query).await? {
            return Ok(exercise);
        }
        let filter = ExerciseFilter {
            include_archived: true,
            ..Default::default()
        };
        let exercises = self.services.exercises.list(profile_id, &filter).await?;
        pick_by_id(exercises, query, |e| e.id, "exercise")
    }
}

/// Select the single candidate whose id equals or starts with `query`
pub fn pick_by_id<T>(
    candidates: Vec<T>,
    query: &str,
    id: impl Fn(&T) -> Uuid,
    what: &str,
) -> Result<T> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        bail!("No {} given", what);
    }
    let mut matches: Vec<T> = candidates
        .into_iter()
        .filter(|c| id(c).to_string().starts_with(&query))
        .collect();
    match matches.len() {
        0 => bail!("No {} matches '{}'", what, query),
        1 => Ok(matches.remove(0)),
        n => bail!("'{}' matches {} {}s; use more of the id", query, n, what),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_by_id_prefix() {
        let ids: Vec<Uuid> = vec![
            Uuid::parse_str("aaaa0000-0000-0000-0000-000000000001").unwrap(),
            Uuid::parse_str("aaab0000-0000-0000-0000-000000000002").unwrap(),
        ];
        assert_eq!(pick_by_id(ids.clone(), "aaab", |u| *u, "thing").unwrap(), ids[1]);
        assert!(pick_by_id(ids.clone(), "aaa", |u| *u, "thing").is_err());
        assert!(pick_by_id(ids, "ffff", |u| *u, "thing").is_err());
    }
}
