//! Stable maps - durable typed key/value stores
//!
//! One sled database holds every map. Each map lives in its own tree whose
//! name is derived from a fixed discriminator, so the discriminator is part
//! of the on-disk identity of the map. Values are MessagePack with named
//! fields.
//!
//! A small registry tree remembers which value type each discriminator was
//! first attached with. Attaching a discriminator with a different type is
//! refused rather than letting one map decode another map's values.
//!
//! ## Layout
//!
//! ```text
//! ledger.sled/
//! ├── stable_map_registry   # discriminator -> value type tag
//! ├── stable_map_0          # UserData            (key: caller identity)
//! ├── stable_map_1          # UserSettings        (key: caller identity)
//! ├── stable_map_2          # EnvironmentalFactors (key: factor key)
//! ├── stable_map_3          # UserActivityHistory (key: history key)
//! └── stable_map_4          # BenchmarkData       (key: benchmark id)
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::LedgerError;
use crate::identity::CallerIdentity;
use crate::keys::EntityKey;
use crate::models::{BenchmarkData, EnvironmentalFactors, UserActivityHistory, UserData, UserSettings};

const REGISTRY_TREE: &str = "stable_map_registry";

/// Stable discriminator of a persistent map.
///
/// Never renumber these without migrating the data underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapId(u8);

impl MapId {
    pub const USER_DATA: MapId = MapId(0);
    pub const USER_SETTINGS: MapId = MapId(1);
    pub const ENVIRONMENTAL_FACTORS: MapId = MapId(2);
    pub const USER_ACTIVITY_HISTORY: MapId = MapId(3);
    pub const BENCHMARK_DATA: MapId = MapId(4);

    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    fn tree_name(self) -> String {
        format!("stable_map_{}", self.0)
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Types usable as stable map keys
pub trait StorageKey {
    fn key_bytes(&self) -> &[u8];
}

impl StorageKey for CallerIdentity {
    fn key_bytes(&self) -> &[u8] {
        self.as_str().as_bytes()
    }
}

impl StorageKey for EntityKey {
    fn key_bytes(&self) -> &[u8] {
        self.as_str().as_bytes()
    }
}

/// Types usable as stable map values
pub trait StableValue: Serialize + DeserializeOwned {
    /// Recorded in the registry the first time a map is attached
    const TYPE_TAG: &'static str;
}

impl StableValue for UserData {
    const TYPE_TAG: &'static str = "UserData";
}

impl StableValue for UserSettings {
    const TYPE_TAG: &'static str = "UserSettings";
}

impl StableValue for EnvironmentalFactors {
    const TYPE_TAG: &'static str = "EnvironmentalFactors";
}

impl StableValue for UserActivityHistory {
    const TYPE_TAG: &'static str = "UserActivityHistory";
}

impl StableValue for BenchmarkData {
    const TYPE_TAG: &'static str = "BenchmarkData";
}

/// A durable map from `K` to `V` identified by a [`MapId`]
pub struct StableMap<K, V> {
    id: MapId,
    tree: sled::Tree,
    flush_on_write: bool,
    _types: PhantomData<fn(&K) -> V>,
}

impl<K: StorageKey, V: StableValue> StableMap<K, V> {
    /// Attach to the map with discriminator `id`, creating it if needed
    pub fn attach(db: &sled::Db, id: MapId, flush_on_write: bool) -> Result<Self, LedgerError> {
        let registry = db.open_tree(REGISTRY_TREE)?;
        match registry.get([id.value()])? {
            Some(tag) if &tag[..] != V::TYPE_TAG.as_bytes() => {
                return Err(LedgerError::SchemaMismatch {
                    map_id: id.value(),
                    expected: V::TYPE_TAG.to_string(),
                    found: String::from_utf8_lossy(&tag).into_owned(),
                });
            }
            Some(_) => {}
            None => {
                registry.insert([id.value()], V::TYPE_TAG.as_bytes())?;
                debug!(map_id = id.value(), value_type = V::TYPE_TAG, "Registered stable map");
            }
        }

        let tree = db.open_tree(id.tree_name())?;
        Ok(Self {
            id,
            tree,
            flush_on_write,
            _types: PhantomData,
        })
    }

    pub fn id(&self) -> MapId {
        self.id
    }

    pub fn get(&self, key: &K) -> Result<Option<V>, LedgerError> {
        match self.tree.get(key.key_bytes())? {
            Some(bytes) => Ok(Some(rmp_serde::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Store `value` under `key`, returning whatever it replaced
    pub fn insert(&self, key: &K, value: &V) -> Result<Option<V>, LedgerError> {
        let bytes = rmp_serde::to_vec_named(value)?;
        let previous = self.tree.insert(key.key_bytes(), bytes)?;
        if self.flush_on_write {
            self.tree.flush()?;
        }
        match previous {
            Some(bytes) => Ok(Some(rmp_serde::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn contains_key(&self, key: &K) -> Result<bool, LedgerError> {
        Ok(self.tree.contains_key(key.key_bytes())?)
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

/// The five ledger maps, opened together over one database
pub struct Stores {
    db: sled::Db,
    pub user_data: StableMap<CallerIdentity, UserData>,
    pub user_settings: StableMap<CallerIdentity, UserSettings>,
    pub environmental_factors: StableMap<EntityKey, EnvironmentalFactors>,
    pub user_activity_history: StableMap<EntityKey, UserActivityHistory>,
    pub benchmarks: StableMap<EntityKey, BenchmarkData>,
}

impl Stores {
    /// Open or create the ledger database at `path`
    pub fn open<P: AsRef<Path>>(path: P, cache_capacity: u64, flush_on_write: bool) -> Result<Self, LedgerError> {
        let db = sled::Config::new()
            .path(path.as_ref())
            .cache_capacity(cache_capacity)
            .open()?;
        info!(path = %path.as_ref().display(), "Opened ledger database");
        Self::attach(db, flush_on_write)
    }

    /// Open the database described by `config`
    pub fn from_config(config: &Config) -> Result<Self, LedgerError> {
        std::fs::create_dir_all(&config.storage_dir)?;
        Self::open(config.db_path(), config.cache_capacity_bytes, config.flush_on_write)
    }

    /// Throwaway database removed on drop; for tests and dry runs
    pub fn temporary() -> Result<Self, LedgerError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::attach(db, false)
    }

    fn attach(db: sled::Db, flush_on_write: bool) -> Result<Self, LedgerError> {
        Ok(Self {
            user_data: StableMap::attach(&db, MapId::USER_DATA, flush_on_write)?,
            user_settings: StableMap::attach(&db, MapId::USER_SETTINGS, flush_on_write)?,
            environmental_factors: StableMap::attach(&db, MapId::ENVIRONMENTAL_FACTORS, flush_on_write)?,
            user_activity_history: StableMap::attach(&db, MapId::USER_ACTIVITY_HISTORY, flush_on_write)?,
            benchmarks: StableMap::attach(&db, MapId::BENCHMARK_DATA, flush_on_write)?,
            db,
        })
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), LedgerError> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::factor_key;

    fn factor(value: u64) -> EnvironmentalFactors {
        EnvironmentalFactors {
            id: factor_key("commute", "2024-01-01"),
            factor_name: "grid".into(),
            factor_description: "grid mix".into(),
            factor_value: value,
        }
    }

    #[test]
    fn test_insert_replaces_and_returns_previous() {
        let stores = Stores::temporary().unwrap();
        let key = factor_key("commute", "2024-01-01");

        assert_eq!(stores.environmental_factors.insert(&key, &factor(2)).unwrap(), None);
        let previous = stores.environmental_factors.insert(&key, &factor(3)).unwrap();

        assert_eq!(previous, Some(factor(2)));
        assert_eq!(stores.environmental_factors.get(&key).unwrap(), Some(factor(3)));
        assert_eq!(stores.environmental_factors.len(), 1);
    }

    #[test]
    fn test_maps_are_independent() {
        let stores = Stores::temporary().unwrap();
        let alice = CallerIdentity::new("alice");
        stores
            .user_data
            .insert(&alice, &UserData::new(alice.clone(), "Alice"))
            .unwrap();

        assert!(stores.user_data.contains_key(&alice).unwrap());
        assert!(!stores.user_settings.contains_key(&alice).unwrap());
        assert!(stores.user_settings.is_empty());
        assert_eq!(stores.user_data.id(), MapId::USER_DATA);
        assert_eq!(stores.benchmarks.id().value(), 4);
    }

    #[test]
    fn test_discriminator_reuse_with_other_type_is_refused() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let _ = StableMap::<CallerIdentity, UserData>::attach(&db, MapId::new(9), false).unwrap();

        let err = StableMap::<CallerIdentity, UserSettings>::attach(&db, MapId::new(9), false)
            .err()
            .unwrap();
        assert!(matches!(err, LedgerError::SchemaMismatch { map_id: 9, .. }));

        // Same type re-attaches fine
        assert!(StableMap::<CallerIdentity, UserData>::attach(&db, MapId::new(9), false).is_ok());
    }
}
