use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// A record persisted in its own table of the local database
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Table (sled tree) the records live in
    const TABLE: &'static str;
    /// Human readable name used in errors and logs
    const NAME: &'static str;

    fn id(&self) -> Uuid;

    /// Owning profile. Profiles own themselves.
    fn profile_id(&self) -> Uuid;
}

macro_rules! impl_entity {
    ($ty:ty, $table:literal, $name:literal) => {
        impl $crate::models::Entity for $ty {
            const TABLE: &'static str = $table;
            const NAME: &'static str = $name;

            fn id(&self) -> uuid::Uuid {
                self.id
            }

            fn profile_id(&self) -> uuid::Uuid {
                self.profile_id
            }
        }
    };
}

pub(crate) use impl_entity;
