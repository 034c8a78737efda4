//! Ledger entities
//!
//! Everything here is persisted through the stable maps in [`crate::store`],
//! so field names are part of the durable schema.

use serde::{Deserialize, Serialize};

use crate::identity::CallerIdentity;
use crate::keys::EntityKey;

/// One recorded activity, already adjusted by its environmental factor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionRecord {
    pub id: EntityKey,
    pub activity_type: String,
    pub description: String,
    /// kg CO2 equivalent after factor adjustment
    pub emissions: u64,
    pub date: String,
}

/// A registered user and their append-only emission history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub identity: CallerIdentity,
    pub username: String,
    pub emissions_records: Vec<EmissionRecord>,
}

impl UserData {
    pub fn new(identity: CallerIdentity, username: impl Into<String>) -> Self {
        Self {
            identity,
            username: username.into(),
            emissions_records: Vec::new(),
        }
    }

    /// Return a copy with `record` appended at the end of the history.
    ///
    /// The stored value is replaced wholesale on write, so the pipeline
    /// builds the next version instead of mutating in place.
    pub fn with_record(&self, record: EmissionRecord) -> Self {
        let mut next = self.clone();
        next.emissions_records.push(record);
        next
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub identity: CallerIdentity,
    pub preferred_units: String,
    pub notifications_enabled: bool,
}

/// Multiplier applied to raw activity quantities for one activity type on one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalFactors {
    pub id: EntityKey,
    pub factor_name: String,
    pub factor_description: String,
    pub factor_value: u64,
}

/// Catalog entry describing a kind of activity. Not consulted by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityType {
    pub id: EntityKey,
    pub activity_name: String,
    pub activity_description: String,
    pub activity_emissions_factor: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkData {
    pub id: EntityKey,
    pub benchmark_name: String,
    pub emissions_threshold: u64,
}

/// Per-activity-type view of a user's records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivityHistory {
    pub identity: CallerIdentity,
    pub activity_type: String,
    pub history: Vec<EmissionRecord>,
}
