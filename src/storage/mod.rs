// Local storage using the sled embedded database.
// One tree per entity table, JSON values keyed by UUID bytes.

use std::path::Path;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::StorageError;
use crate::models::{
    AppliedExercise, Entity, Exercise, ExerciseGroup, HeightRecord, MaxLog, PerformedExerciseLog,
    PerformedGroupLog, PerformedSet, Session, TrainingPlan, WeightRecord, WorkoutLog,
};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Upserted,
    Deleted,
}

/// Published after every successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: &'static str,
    pub id: Uuid,
    pub profile_id: Uuid,
    pub kind: ChangeKind,
}

/// Handle to the local database. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    db: sled::Db,
    changes: broadcast::Sender<ChangeEvent>,
}

impl Database {
    /// Open (or create) the database at `path`
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        tracing::info!("Opening sled database at {:?}", path);
        let db = sled::open(path)?;
        Ok(Self::from_db(db))
    }

    /// In-memory database, discarded on drop
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self::from_db(db))
    }

    fn from_db(db: sled::Db) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { db, changes }
    }

    /// Receive a `ChangeEvent` for every write made after this call
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    fn tree<T: Entity>(&self) -> Result<sled::Tree, StorageError> {
        Ok(self.db.open_tree(T::TABLE)?)
    }

    fn decode<T: Entity>(bytes: &[u8]) -> Result<T, StorageError> {
        serde_json::from_slice(bytes).map_err(|source| StorageError::Decode {
            table: T::TABLE,
            source,
        })
    }

    fn encode<T: Entity>(record: &T) -> Result<Vec<u8>, StorageError> {
        serde_json::to_vec(record).map_err(|source| StorageError::Encode {
            table: T::TABLE,
            source,
        })
    }

    fn publish(&self, event: ChangeEvent) {
        // No live queries is not an error
        let _ = self.changes.send(event);
    }

    pub fn get<T: Entity>(&self, id: Uuid) -> Result<Option<T>, StorageError> {
        self.tree::<T>()?
            .get(id.as_bytes())?
            .map(|value| Self::decode(&value))
            .transpose()
    }

    pub fn list<T: Entity>(&self) -> Result<Vec<T>, StorageError> {
        self.tree::<T>()?
            .iter()
            .values()
            .map(|value| Self::decode(&value?))
            .collect()
    }

    pub fn list_where<T, F>(&self, predicate: F) -> Result<Vec<T>, StorageError>
    where
        T: Entity,
        F: Fn(&T) -> bool,
    {
        let mut records = Vec::new();
        for value in self.tree::<T>()?.iter().values() {
            let record: T = Self::decode(&value?)?;
            if predicate(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }

    pub fn save<T: Entity>(&self, record: &T) -> Result<(), StorageError> {
        let tree = self.tree::<T>()?;
        tree.insert(record.id().as_bytes(), Self::encode(record)?)?;
        tree.flush()?;

        tracing::debug!("Saved {} {}", T::NAME, record.id());
        self.publish(ChangeEvent {
            table: T::TABLE,
            id: record.id(),
            profile_id: record.profile_id(),
            kind: ChangeKind::Upserted,
        });
        Ok(())
    }

    /// Write all records in one batch
    pub fn save_many<T: Entity>(&self, records: &[T]) -> Result<(), StorageError> {
        if records.is_empty() {
            return Ok(());
        }
        let tree = self.tree::<T>()?;
        let mut batch = sled::Batch::default();
        for record in records {
            batch.insert(&record.id().as_bytes()[..], Self::encode(record)?);
        }
        tree.apply_batch(batch)?;
        tree.flush()?;

        tracing::debug!("Saved {} {} records", records.len(), T::NAME);
        for record in records {
            self.publish(ChangeEvent {
                table: T::TABLE,
                id: record.id(),
                profile_id: record.profile_id(),
                kind: ChangeKind::Upserted,
            });
        }
        Ok(())
    }

    /// Returns the removed record, if there was one
    pub fn delete<T: Entity>(&self, id: Uuid) -> Result<Option<T>, StorageError> {
        let tree = self.tree::<T>()?;
        let Some(value) = tree.remove(id.as_bytes())? else {
            return Ok(None);
        };
        tree.flush()?;

        let record: T = Self::decode(&value)?;
        tracing::debug!("Deleted {} {}", T::NAME, id);
        self.publish(ChangeEvent {
            table: T::TABLE,
            id,
            profile_id: record.profile_id(),
            kind: ChangeKind::Deleted,
        });
        Ok(Some(record))
    }

    /// Returns how many of the ids existed
    pub fn delete_many<T: Entity>(&self, ids: &[Uuid]) -> Result<usize, StorageError> {
        let mut deleted = 0;
        for id in ids {
            if self.delete::<T>(*id)?.is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Remove every record of one table owned by `profile_id` in a single batch
    fn clear_table<T: Entity>(&self, profile_id: Uuid) -> Result<usize, StorageError> {
        let tree = self.tree::<T>()?;
        let mut removed = Vec::new();
        let mut batch = sled::Batch::default();
        for entry in tree.iter() {
            let (key, value) = entry?;
            let record: T = Self::decode(&value)?;
            if record.profile_id() == profile_id {
                batch.remove(key);
                removed.push(record.id());
            }
        }
        if removed.is_empty() {
            return Ok(0);
        }
        tree.apply_batch(batch)?;
        tree.flush()?;

        tracing::debug!("Cleared {} {} records", removed.len(), T::NAME);
        for id in &removed {
            self.publish(ChangeEvent {
                table: T::TABLE,
                id: *id,
                profile_id,
                kind: ChangeKind::Deleted,
            });
        }
        Ok(removed.len())
    }

    /// Remove everything a profile owns, leaving the profile record itself.
    /// Logs go before plans and plans before the exercise library.
    pub fn clear_profile(&self, profile_id: Uuid) -> Result<usize, StorageError> {
        let mut removed = 0;
        removed += self.clear_table::<PerformedSet>(profile_id)?;
        removed += self.clear_table::<PerformedExerciseLog>(profile_id)?;
        removed += self.clear_table::<PerformedGroupLog>(profile_id)?;
        removed += self.clear_table::<WorkoutLog>(profile_id)?;
        removed += self.clear_table::<AppliedExercise>(profile_id)?;
        removed += self.clear_table::<ExerciseGroup>(profile_id)?;
        removed += self.clear_table::<Session>(profile_id)?;
        removed += self.clear_table::<TrainingPlan>(profile_id)?;
        removed += self.clear_table::<MaxLog>(profile_id)?;
        removed += self.clear_table::<Exercise>(profile_id)?;
        removed += self.clear_table::<WeightRecord>(profile_id)?;
        removed += self.clear_table::<HeightRecord>(profile_id)?;
        Ok(removed)
    }

    pub fn size_on_disk(&self) -> Result<u64, StorageError> {
        Ok(self.db.size_on_disk()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Profile, WeightRecord};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn weight(profile_id: Uuid, kg: f64) -> WeightRecord {
        WeightRecord::new(
            profile_id,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            kg,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_save_get_delete() {
        let db = Database::temporary().unwrap();
        let profile = Profile::new("Alex").unwrap();

        db.save(&profile).unwrap();
        assert_eq!(db.get::<Profile>(profile.id).unwrap(), Some(profile.clone()));

        let removed = db.delete::<Profile>(profile.id).unwrap();
        assert_eq!(removed.map(|p| p.id), Some(profile.id));
        assert!(db.get::<Profile>(profile.id).unwrap().is_none());
        assert!(db.delete::<Profile>(profile.id).unwrap().is_none());
    }

    #[test]
    fn test_tables_are_separate() {
        let db = Database::temporary().unwrap();
        let profile = Profile::new("Alex").unwrap();
        db.save(&profile).unwrap();
        db.save_many(&[weight(profile.id, 80.0), weight(profile.id, 81.0)])
            .unwrap();

        assert_eq!(db.list::<Profile>().unwrap().len(), 1);
        assert_eq!(db.list::<WeightRecord>().unwrap().len(), 2);
        assert_eq!(
            db.list_where::<WeightRecord, _>(|w| w.weight > 80.5)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_writes_publish_changes() {
        let db = Database::temporary().unwrap();
        let mut changes = db.subscribe();
        let profile = Profile::new("Alex").unwrap();

        db.save(&profile).unwrap();
        db.delete::<Profile>(profile.id).unwrap();

        let first = changes.try_recv().unwrap();
        assert_eq!(first.kind, ChangeKind::Upserted);
        assert_eq!(first.table, "profiles");
        let second = changes.try_recv().unwrap();
        assert_eq!(second.kind, ChangeKind::Deleted);
        assert_eq!(second.profile_id, profile.id);
    }

    #[test]
    fn test_clear_profile_keeps_other_profiles() {
        let db = Database::temporary().unwrap();
        let alex = Profile::new("Alex").unwrap();
        let sam = Profile::new("Sam").unwrap();
        db.save(&alex).unwrap();
        db.save(&sam).unwrap();
        db.save_many(&[weight(alex.id, 80.0), weight(alex.id, 81.0), weight(sam.id, 70.0)])
            .unwrap();

        let mut changes = db.subscribe();
        assert_eq!(db.clear_profile(alex.id).unwrap(), 2);

        for _ in 0..2 {
            let event = changes.try_recv().unwrap();
            assert_eq!(event.kind, ChangeKind::Deleted);
            assert_eq!(event.table, "weight_records");
            assert_eq!(event.profile_id, alex.id);
        }
        assert!(changes.try_recv().is_err());

        let left = db.list::<WeightRecord>().unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].profile_id, sam.id);
        assert!(db.get::<Profile>(alex.id).unwrap().is_some());
        assert_eq!(db.clear_profile(alex.id).unwrap(), 0);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let profile = Profile::new("Alex").unwrap();
        {
            let db = Database::open(dir.path()).unwrap();
            db.save(&profile).unwrap();
        }
        let db = Database::open(dir.path()).unwrap();
        assert!(db.get::<Profile>(profile.id).unwrap().is_some());
    }
}
